/// Operation execution pipeline
///
/// This module contains the shared context, the error taxonomy, and the
/// middleware chain that wraps every handler.

mod context;
mod error;
pub mod layers;
mod middleware;

pub use context::Context;
pub use error::OperationError;
pub use middleware::{Chain, ChainFuture, Handler, Middleware, Next, Request};
