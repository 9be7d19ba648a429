use serde_json::Value;
use thiserror::Error;

use crate::validation::{Issue, ValidationError};

/// Errors that can surface when an operation is invoked
///
/// Nothing here is raised at build time. Handler and middleware failures pass
/// through the chain unchanged unless a middleware deliberately rewrites them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    /// Input or output did not satisfy its schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raised by a user handler (e.g. a failed request)
    #[error("Handler error: {message}")]
    Handler {
        message: String,
        data: Option<Value>,
    },

    /// Raised deliberately by a middleware (e.g. missing credentials)
    #[error("Middleware error: {message}")]
    Middleware {
        message: String,
        data: Option<Value>,
    },

    /// A typed handler could not convert its input or result
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A schema could not be compiled or found
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Configuration could not be loaded
    #[error("Config error: {message}")]
    Config { message: String },
}

impl OperationError {
    /// Create a Handler error
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            data: None,
        }
    }

    /// Create a Middleware error
    pub fn middleware(message: impl Into<String>) -> Self {
        Self::Middleware {
            message: message.into(),
            data: None,
        }
    }

    /// Create a Schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Attach structured data to a Handler or Middleware error
    ///
    /// Other variants are returned unchanged.
    pub fn with_data(mut self, value: Value) -> Self {
        match &mut self {
            Self::Handler { data, .. } | Self::Middleware { data, .. } => *data = Some(value),
            _ => {}
        }
        self
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Issues carried by a validation failure, if this is one
    pub fn validation_issues(&self) -> Option<&[Issue]> {
        match self {
            Self::Validation(err) => Some(&err.issues),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
