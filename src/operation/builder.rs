use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::{Operation, OperationKind};
use crate::pipeline::{Chain, Context, Handler, Middleware, Next, OperationError, Request};
use crate::validation::{Schema, parse};

/// One middleware in a builder's list, pointing back at the one added before it
///
/// Derived builders share the links they inherit.
struct Link {
    middleware: Middleware,
    prev: Option<Arc<Link>>,
}

/// Fluent, non-mutating builder for [`Operation`]s
///
/// Every method takes `&self` and returns a new builder, so a partially
/// configured builder can be reused as a base for several operations.
///
/// # Example
/// ```
/// use quiver::{Operation, OperationError};
/// use quiver::validation::JsonSchema;
/// use serde_json::json;
///
/// let authed = Operation::builder().use_fn(|req, next| async move {
///     if req.context.get("token").is_none() {
///         return Err(OperationError::middleware("unauthorized"));
///     }
///     next.run(req.context, req.input).await
/// });
///
/// let schema = JsonSchema::new(&json!({"type": "object", "required": ["id"]})).unwrap();
/// let get_user = authed
///     .input(schema)
///     .query(|_ctx, input| async move { Ok(json!({"id": input["id"]})) });
/// ```
#[derive(Clone, Default)]
pub struct OperationBuilder {
    inputs: Vec<Arc<dyn Schema>>,
    output: Option<Arc<dyn Schema>>,
    middlewares: Option<Arc<Link>>,
    len: usize,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate (and possibly coerce) the input at this point of the chain
    ///
    /// The check sits where it is declared relative to other middleware. A
    /// rejected input fails with [`OperationError::Validation`] and nothing
    /// further down the chain runs.
    pub fn input<S: Schema + 'static>(&self, schema: S) -> Self {
        let schema: Arc<dyn Schema> = Arc::new(schema);

        let guard = {
            let schema = Arc::clone(&schema);
            Middleware::new(move |req: Request, next: Next| {
                let schema = Arc::clone(&schema);
                async move {
                    let input = parse(schema.as_ref(), req.input).await.map_err(|err| {
                        debug!(issues = err.issues.len(), "input rejected");
                        err
                    })?;
                    next.run(req.context, input).await
                }
            })
        };

        let mut builder = self.push(guard);
        builder.inputs.push(schema);
        builder
    }

    /// Validate (and possibly coerce) the value returned by the rest of the chain
    ///
    /// Declaring an output schema twice keeps both checks in order; the
    /// metadata only remembers the last one.
    pub fn output<S: Schema + 'static>(&self, schema: S) -> Self {
        let schema: Arc<dyn Schema> = Arc::new(schema);

        let guard = {
            let schema = Arc::clone(&schema);
            Middleware::new(move |req: Request, next: Next| {
                let schema = Arc::clone(&schema);
                async move {
                    let output = next.run(req.context, req.input).await?;
                    Ok(parse(schema.as_ref(), output).await.map_err(|err| {
                        debug!(issues = err.issues.len(), "output rejected");
                        err
                    })?)
                }
            })
        };

        let mut builder = self.push(guard);
        builder.output = Some(schema);
        builder
    }

    /// Append a middleware
    pub fn use_middleware(&self, middleware: Middleware) -> Self {
        self.push(middleware)
    }

    /// Append a middleware written as a closure
    pub fn use_fn<F, Fut>(&self, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        self.push(Middleware::new(f))
    }

    /// Finalize into a query
    pub fn query<F, Fut>(&self, f: F) -> Operation
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        self.finish(OperationKind::Query, Handler::new(f))
    }

    /// Finalize into a mutation
    pub fn mutation<F, Fut>(&self, f: F) -> Operation
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        self.finish(OperationKind::Mutation, Handler::new(f))
    }

    /// Finalize into a query around an existing handler (e.g. [`Handler::typed`])
    pub fn query_with(&self, handler: Handler) -> Operation {
        self.finish(OperationKind::Query, handler)
    }

    /// Finalize into a mutation around an existing handler
    pub fn mutation_with(&self, handler: Handler) -> Operation {
        self.finish(OperationKind::Mutation, handler)
    }

    /// Input schemas in declaration order
    pub fn inputs(&self) -> &[Arc<dyn Schema>] {
        &self.inputs
    }

    /// The most recently declared output schema
    pub fn output_schema(&self) -> Option<&Arc<dyn Schema>> {
        self.output.as_ref()
    }

    /// Number of middleware accumulated so far, validation included
    pub fn middleware_count(&self) -> usize {
        self.len
    }

    fn push(&self, middleware: Middleware) -> Self {
        Self {
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            middlewares: Some(Arc::new(Link {
                middleware,
                prev: self.middlewares.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Materialize the list oldest-first, which is the execution order
    fn finish(&self, kind: OperationKind, handler: Handler) -> Operation {
        let mut middlewares = Vec::with_capacity(self.len);
        let mut cursor = self.middlewares.as_deref();
        while let Some(link) = cursor {
            middlewares.push(link.middleware.clone());
            cursor = link.prev.as_deref();
        }
        middlewares.reverse();

        Operation::new(kind, Chain::new(middlewares, handler))
    }
}

impl fmt::Debug for OperationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationBuilder")
            .field("inputs", &self.inputs.len())
            .field("output", &self.output.is_some())
            .field("middlewares", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Issue, JsonSchema, Outcome, schema_fn};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    fn tag(name: &'static str, log: Log) -> Middleware {
        Middleware::new(move |req, next| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name.to_string());
                next.run(req.context, req.input).await
            }
        })
    }

    fn id_schema() -> JsonSchema {
        JsonSchema::new(&json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}},
            "required": ["id"]
        }))
        .unwrap()
    }

    /// Keeps only `id` and `name`
    fn user_schema() -> impl Schema {
        schema_fn(|value| match value.as_object() {
            Some(obj) if obj.get("name").is_some_and(Value::is_string) => {
                Outcome::Valid(json!({"id": obj.get("id"), "name": obj["name"]}))
            }
            _ => Outcome::Invalid(vec![Issue::at(["name"], "expected a string")]),
        })
    }

    #[tokio::test]
    async fn test_middleware_runs_in_declaration_order() {
        let log: Log = Arc::default();
        let op = OperationBuilder::new()
            .use_middleware(tag("first", log.clone()))
            .input(schema_fn({
                let log = log.clone();
                move |value| {
                    log.lock().unwrap().push("input".to_string());
                    Outcome::Valid(value)
                }
            }))
            .use_middleware(tag("second", log.clone()))
            .query(|_ctx, input| async move { Ok(input) });

        assert_eq!(op.middleware_count(), 3);
        op.call(Context::new(), json!(null)).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "input", "second"]);
    }

    #[tokio::test]
    async fn test_builder_derivation_does_not_affect_previous_values() {
        let log: Log = Arc::default();
        let base = OperationBuilder::new().use_middleware(tag("base", log.clone()));
        let before = base.query(|_ctx, _input| async { Ok(json!("before")) });

        let extended = base.use_middleware(tag("extra", log.clone()));
        let after = extended.query(|_ctx, _input| async { Ok(json!("after")) });

        assert_eq!(base.middleware_count(), 1);
        assert_eq!(extended.middleware_count(), 2);
        assert_eq!(before.middleware_count(), 1);

        before.call(Context::new(), json!(null)).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["base"]);

        after.call(Context::new(), json!(null)).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["base", "base", "extra"]);
    }

    #[tokio::test]
    async fn test_sibling_builders_share_prefix_independently() {
        let log: Log = Arc::default();
        let base = OperationBuilder::new().use_middleware(tag("shared", log.clone()));
        let left = base.use_middleware(tag("left", log.clone()));
        let right = base.use_middleware(tag("right", log.clone()));

        left.mutation(|_ctx, _input| async { Ok(Value::Null) })
            .call(Context::new(), Value::Null)
            .await
            .unwrap();
        right
            .mutation(|_ctx, _input| async { Ok(Value::Null) })
            .call(Context::new(), Value::Null)
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["shared", "left", "shared", "right"]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = OperationBuilder::new().input(id_schema()).query({
            let calls = calls.clone();
            move |_ctx, input| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(input) }
            }
        });

        let err = op.call(Context::new(), json!({"id": "one"})).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_input_schema_passes_coerced_value() {
        let op = OperationBuilder::new()
            .input(schema_fn(|value| Outcome::Valid(json!({"wrapped": value}))))
            .query(|_ctx, input| async move { Ok(input) });

        assert_eq!(op.call(Context::new(), json!(1)).await, Ok(json!({"wrapped": 1})));
    }

    #[tokio::test]
    async fn test_output_schema_returns_coerced_value() {
        let op = OperationBuilder::new()
            .output(user_schema())
            .query(|_ctx, _input| async {
                Ok(json!({"id": 1, "name": "Ada", "passwordHash": "x"}))
            });

        assert_eq!(
            op.call(Context::new(), Value::Null).await,
            Ok(json!({"id": 1, "name": "Ada"}))
        );
    }

    #[tokio::test]
    async fn test_output_schema_rejects_after_handler_ran() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = OperationBuilder::new().output(user_schema()).query({
            let calls = calls.clone();
            move |_ctx, _input| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!({"id": 1})) }
            }
        });

        let err = op.call(Context::new(), Value::Null).await.unwrap_err();
        assert_eq!(
            err.validation_issues(),
            Some(&[Issue::at(["name"], "expected a string")][..])
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_input_failure_skips_output_validation() {
        let output_checks = Arc::new(AtomicUsize::new(0));
        let op = OperationBuilder::new()
            .input(id_schema())
            .output(schema_fn({
                let output_checks = output_checks.clone();
                move |value| {
                    output_checks.fetch_add(1, Ordering::SeqCst);
                    Outcome::Valid(value)
                }
            }))
            .query(|_ctx, input| async move { Ok(input) });

        assert!(op.call(Context::new(), json!({})).await.is_err());
        assert_eq!(output_checks.load(Ordering::SeqCst), 0);

        assert!(op.call(Context::new(), json!({"id": 2})).await.is_ok());
        assert_eq!(output_checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metadata_accumulates() {
        let builder = OperationBuilder::new()
            .input(id_schema())
            .input(schema_fn(Outcome::Valid))
            .output(schema_fn(Outcome::Valid))
            .use_fn(|req, next| next.run(req.context, req.input));

        assert_eq!(builder.inputs().len(), 2);
        assert!(builder.output_schema().is_some());
        assert_eq!(builder.middleware_count(), 4);
        assert!(OperationBuilder::new().output_schema().is_none());
    }

    #[tokio::test]
    async fn test_typed_handler_through_builder() {
        #[derive(serde::Deserialize)]
        struct Echo {
            text: String,
        }

        let op = OperationBuilder::new().query_with(Handler::typed(
            |_ctx: Context, echo: Echo| async move {
                Ok::<_, OperationError>(echo.text.to_uppercase())
            },
        ));

        assert_eq!(op.call(Context::new(), json!({"text": "hi"})).await, Ok(json!("HI")));
    }
}
