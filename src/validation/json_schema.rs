use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use super::{Issue, Outcome, PathSegment, Schema};
use crate::pipeline::OperationError;

/// Schema capability backed by a JSON Schema document
///
/// The document is compiled once. Valid values pass through unchanged; JSON
/// Schema does not coerce.
///
/// # Example
/// ```
/// use quiver::validation::JsonSchema;
/// use serde_json::json;
///
/// let schema = JsonSchema::new(&json!({
///     "type": "object",
///     "properties": {"id": {"type": "integer"}},
///     "required": ["id"]
/// }))
/// .unwrap();
/// ```
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

impl JsonSchema {
    pub fn new(schema: &Value) -> Result<Self, OperationError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| OperationError::schema(format!("Failed to compile schema: {}", e)))?;
        Ok(Self { validator })
    }

    /// Check a value without consuming it
    pub fn check(&self, value: &Value) -> Result<(), Vec<Issue>> {
        if self.validator.is_valid(value) {
            return Ok(());
        }

        Err(self
            .validator
            .iter_errors(value)
            .map(|e| {
                let pointer = e.instance_path.to_string();
                let message = e.to_string();
                match decode_pointer(value, &pointer) {
                    Some(path) => Issue::at(path, message),
                    None => Issue::new(message),
                }
            })
            .collect())
    }
}

#[async_trait]
impl Schema for JsonSchema {
    async fn validate(&self, value: Value) -> Outcome {
        match self.check(&value) {
            Ok(()) => Outcome::Valid(value),
            Err(issues) => Outcome::Invalid(issues),
        }
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").finish_non_exhaustive()
    }
}

/// Turn a JSON pointer into issue path segments, `None` for the root
///
/// Whether a segment is an index depends on the value it points into, so
/// numeric object keys stay keys.
fn decode_pointer(instance: &Value, pointer: &str) -> Option<Vec<PathSegment>> {
    let pointer = pointer.strip_prefix('/')?;

    let mut current = Some(instance);
    let mut segments = Vec::new();

    for raw in pointer.split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let segment = match (current, token.parse::<usize>()) {
            (Some(Value::Array(_)), Ok(index)) => PathSegment::Index(index),
            _ => PathSegment::Key(token),
        };

        current = match (current, &segment) {
            (Some(Value::Array(items)), PathSegment::Index(index)) => items.get(*index),
            (Some(Value::Object(map)), PathSegment::Key(key)) => map.get(key),
            _ => None,
        };
        segments.push(segment);
    }

    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse;
    use serde_json::json;

    fn user_schema() -> JsonSchema {
        JsonSchema::new(&json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["id"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_value_passes_unchanged() {
        let value = json!({"id": 1, "tags": ["a"], "extra": true});
        assert_eq!(parse(&user_schema(), value.clone()).await, Ok(value));
    }

    #[tokio::test]
    async fn test_missing_required_is_root_issue() {
        let err = parse(&user_schema(), json!({"tags": []})).await.unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, None);
        assert!(err.issues[0].message.contains("id"));
    }

    #[tokio::test]
    async fn test_nested_issue_path() {
        let err = parse(&user_schema(), json!({"id": 1, "tags": ["ok", 5]}))
            .await
            .unwrap_err();
        assert_eq!(
            err.issues[0].path,
            Some(vec![PathSegment::Key("tags".into()), PathSegment::Index(1)])
        );
    }

    #[test]
    fn test_invalid_schema_is_reported() {
        let err = JsonSchema::new(&json!({"type": "not-a-type"})).unwrap_err();
        assert!(matches!(err, OperationError::Schema { .. }));
    }

    #[test]
    fn test_decode_pointer_numeric_object_key() {
        let instance = json!({"2024": {"a~b": [0, 1]}});
        assert_eq!(
            decode_pointer(&instance, "/2024/a~0b/1"),
            Some(vec![
                PathSegment::Key("2024".into()),
                PathSegment::Key("a~b".into()),
                PathSegment::Index(1),
            ])
        );
        assert_eq!(decode_pointer(&instance, ""), None);
    }

    #[tokio::test]
    async fn test_empty_key_keeps_its_path() {
        let schema = JsonSchema::new(&json!({"properties": {"": {"type": "string"}}})).unwrap();
        let err = parse(&schema, json!({"": 5})).await.unwrap_err();
        assert_eq!(err.issues[0].path, Some(vec![PathSegment::Key(String::new())]));

        let nested = json!({"": {"": 1}});
        assert_eq!(
            decode_pointer(&nested, "//"),
            Some(vec![PathSegment::Key(String::new()), PathSegment::Key(String::new())])
        );
    }
}
