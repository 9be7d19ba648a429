//! Ready-made middleware

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, debug_span};

use super::{Middleware, OperationError};

/// Run the rest of the chain inside a `tracing` span named after the operation
///
/// Logs completion with the elapsed time, or the error that came back.
pub fn trace(name: impl Into<String>) -> Middleware {
    let name: String = name.into();
    let name: Arc<str> = name.into();
    Middleware::new(move |req, next| {
        let span = debug_span!("operation", name = %name);
        async move {
            let started = Instant::now();
            debug!("started");
            let result = next.run(req.context, req.input).await;
            match &result {
                Ok(_) => debug!(elapsed_ms = started.elapsed().as_millis() as u64, "completed"),
                Err(err) => debug!(error = %err, "failed"),
            }
            result
        }
        .instrument(span)
    })
}

/// Rewrite errors coming back from the rest of the chain
///
/// # Example
/// ```
/// use quiver::OperationError;
/// use quiver::pipeline::layers::map_err;
///
/// let hide_details = map_err(|err| match err {
///     OperationError::Handler { .. } => OperationError::handler("request failed"),
///     other => other,
/// });
/// ```
pub fn map_err<F>(f: F) -> Middleware
where
    F: Fn(OperationError) -> OperationError + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Middleware::new(move |req, next| {
        let f = Arc::clone(&f);
        async move { next.run(req.context, req.input).await.map_err(|err| (*f)(err)) }
    })
}

/// Derive a context carrying one more variable for the rest of the chain
pub fn provide(name: impl Into<String>, value: Value) -> Middleware {
    let name: String = name.into();
    let name: Arc<str> = name.into();
    Middleware::new(move |req, next| {
        let context = req.context.with_var(&*name, value.clone());
        next.run(context, req.input)
    })
}
