use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{Issue, ValidationError};

/// Result of asking a validation capability about a value
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The value passed; it may have been coerced (defaults, stripped keys, ...)
    Valid(Value),
    /// The value failed with the listed issues
    Invalid(Vec<Issue>),
}

/// A pluggable validation capability
///
/// Anything that can answer `validate(value) -> value | issues` can guard
/// an operation's input or output. Synchronous validators simply return
/// without awaiting.
#[async_trait]
pub trait Schema: Send + Sync {
    async fn validate(&self, value: Value) -> Outcome;
}

#[async_trait]
impl<S: Schema + ?Sized> Schema for Arc<S> {
    async fn validate(&self, value: Value) -> Outcome {
        (**self).validate(value).await
    }
}

/// Run a schema against a value, turning issues into a [`ValidationError`]
///
/// Only the shape of the outcome is inspected; an invalid outcome without
/// issues is still a failure.
pub async fn parse<S: Schema + ?Sized>(schema: &S, value: Value) -> Result<Value, ValidationError> {
    match schema.validate(value).await {
        Outcome::Valid(value) => Ok(value),
        Outcome::Invalid(issues) => Err(ValidationError::new(issues)),
    }
}

/// Schema backed by a plain function
pub struct FnSchema<F>(F);

#[async_trait]
impl<F> Schema for FnSchema<F>
where
    F: Fn(Value) -> Outcome + Send + Sync,
{
    async fn validate(&self, value: Value) -> Outcome {
        (self.0)(value)
    }
}

/// Build a schema from a function
///
/// # Example
/// ```
/// use quiver::validation::{schema_fn, Issue, Outcome};
///
/// let positive = schema_fn(|value| match value.as_i64() {
///     Some(n) if n > 0 => Outcome::Valid(value),
///     _ => Outcome::Invalid(vec![Issue::new("expected a positive integer")]),
/// });
/// ```
pub fn schema_fn<F>(f: F) -> FnSchema<F>
where
    F: Fn(Value) -> Outcome + Send + Sync,
{
    FnSchema(f)
}
