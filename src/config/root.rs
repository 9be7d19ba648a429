use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::pipeline::OperationError;
use crate::validation::JsonSchema;

/// Top-level configuration for a quiver instance
///
/// Example:
/// ```json
/// {
///   "defaultOptions": {
///     "queries": {"staleTime": 30000},
///     "mutations": {"retry": 0}
///   },
///   "schemas": {
///     "userId": {"type": "object", "required": ["id"]}
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuiverConfig {
    /// Engine settings merged into every descriptor before overrides
    #[serde(default)]
    pub default_options: DefaultOptions,

    /// Reusable validation schemas (JSON Schema format)
    #[serde(default)]
    pub schemas: HashMap<String, Value>,
}

/// Engine settings per descriptor type
///
/// Paginated queries receive `queries` first and `infiniteQueries` on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultOptions {
    #[serde(default)]
    pub queries: Map<String, Value>,

    #[serde(default)]
    pub infinite_queries: Map<String, Value>,

    #[serde(default)]
    pub mutations: Map<String, Value>,
}

impl QuiverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, OperationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| OperationError::Config {
            message: e.to_string(),
        })?;
        debug!(schemas = config.schemas.len(), "loaded configuration");
        Ok(config)
    }

    pub fn from_value(value: Value) -> Result<Self, OperationError> {
        serde_json::from_value(value).map_err(|e| OperationError::Config {
            message: e.to_string(),
        })
    }

    /// Compile a named schema
    pub fn schema(&self, name: &str) -> Result<JsonSchema, OperationError> {
        let document = self
            .schemas
            .get(name)
            .ok_or_else(|| OperationError::schema(format!("Unknown schema '{}'", name)))?;
        JsonSchema::new(document)
    }
}
