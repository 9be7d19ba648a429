/// Operations and the builder that produces them
///
/// An operation is a handler classified as a query or a mutation, with its
/// middleware already composed around it.

mod builder;

pub use builder::OperationBuilder;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::pipeline::{Chain, ChainFuture, Context};

/// Whether an operation reads (query) or writes (mutation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// An immutable, composed operation
///
/// Cloning shares the composed chain.
#[derive(Debug, Clone)]
pub struct Operation {
    kind: OperationKind,
    chain: Arc<Chain>,
}

impl Operation {
    /// Start building an operation
    ///
    /// # Example
    /// ```
    /// use quiver::Operation;
    /// use serde_json::json;
    ///
    /// let get_user = Operation::builder()
    ///     .query(|_ctx, input| async move { Ok(json!({"id": input["id"], "name": "Ada"})) });
    /// ```
    pub fn builder() -> OperationBuilder {
        OperationBuilder::new()
    }

    pub(crate) fn new(kind: OperationKind, chain: Chain) -> Self {
        Self {
            kind,
            chain: Arc::new(chain),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_query(&self) -> bool {
        self.kind == OperationKind::Query
    }

    pub fn is_mutation(&self) -> bool {
        self.kind == OperationKind::Mutation
    }

    /// Number of middleware wrapped around the handler
    pub fn middleware_count(&self) -> usize {
        self.chain.len()
    }

    /// Run the composed chain with the given context and input
    pub fn call(&self, context: Context, input: Value) -> ChainFuture {
        tracing::debug!(
            kind = %self.kind,
            middlewares = self.chain.len(),
            "invoking operation"
        );
        self.chain.call(context, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_value(OperationKind::Query).unwrap(), json!("query"));
        assert_eq!(
            serde_json::from_value::<OperationKind>(json!("mutation")).unwrap(),
            OperationKind::Mutation
        );
        assert_eq!(OperationKind::Mutation.to_string(), "mutation");
    }

    #[tokio::test]
    async fn test_call_runs_handler() {
        let op = Operation::builder()
            .mutation(|ctx: Context, input| async move { Ok(json!([ctx.get("env"), input])) });

        assert!(op.is_mutation());
        assert!(!op.is_query());
        assert_eq!(op.middleware_count(), 0);

        let ctx = Context::new().with_var("env", json!("x"));
        assert_eq!(op.call(ctx, json!(3)).await, Ok(json!(["x", 3])));
    }
}
