use futures::future::{self, BoxFuture, FutureExt};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::{Context, OperationError};

/// Future returned by every link of a chain
pub type ChainFuture = BoxFuture<'static, Result<Value, OperationError>>;

/// What a middleware receives besides `next`
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub context: Context,
    pub input: Value,
}

impl Request {
    pub fn new(context: Context, input: Value) -> Self {
        Self { context, input }
    }

    /// Deserialize the input into a concrete type
    pub fn input_as<T: DeserializeOwned>(&self) -> Result<T, OperationError> {
        Ok(serde_json::from_value(self.input.clone())?)
    }
}

/// The innermost function of a chain
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(Context, Value) -> ChainFuture + Send + Sync>);

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        Self(Arc::new(move |context, input| f(context, input).boxed()))
    }

    /// Wrap a handler working on serde types instead of raw values
    ///
    /// Input that does not deserialize into `I` fails with
    /// [`OperationError::Serialization`] before `f` runs.
    ///
    /// # Example
    /// ```
    /// use quiver::{Context, Handler, OperationError};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Deserialize)]
    /// struct GetUser { id: u64 }
    ///
    /// #[derive(Serialize)]
    /// struct User { id: u64, name: String }
    ///
    /// let handler = Handler::typed(|_ctx: Context, input: GetUser| async move {
    ///     Ok::<_, OperationError>(User { id: input.id, name: "Ada".into() })
    /// });
    /// ```
    pub fn typed<F, Fut, I, O>(f: F) -> Self
    where
        F: Fn(Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, OperationError>> + Send + 'static,
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
    {
        Self(Arc::new(move |context, input| {
            match serde_json::from_value::<I>(input) {
                Ok(input) => {
                    let fut = f(context, input);
                    async move { Ok::<_, OperationError>(serde_json::to_value(fut.await?)?) }.boxed()
                }
                Err(err) => future::ready(Err(err.into())).boxed(),
            }
        }))
    }

    pub fn call(&self, context: Context, input: Value) -> ChainFuture {
        (self.0)(context, input)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(<function>)")
    }
}

/// An interceptor wrapped around a handler
///
/// A middleware receives the current [`Request`] and a [`Next`] that runs the
/// rest of the chain. It may rewrite the context or input before calling
/// `next`, return without calling it, or inspect and replace what it returns.
///
/// # Example
/// ```
/// use quiver::{Middleware, OperationError};
///
/// let require_token = Middleware::new(|req, next| async move {
///     if !req.context.has("token") {
///         return Err(OperationError::middleware("missing token"));
///     }
///     next.run(req.context, req.input).await
/// });
/// ```
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(Request, Next) -> ChainFuture + Send + Sync>);

impl Middleware {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        Self(Arc::new(move |request, next| f(request, next).boxed()))
    }

    pub fn call(&self, request: Request, next: Next) -> ChainFuture {
        (self.0)(request, next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware(<function>)")
    }
}

/// Middleware list composed around a handler
///
/// The first middleware is entered first and left last.
#[derive(Debug)]
pub struct Chain {
    middlewares: Vec<Middleware>,
    handler: Handler,
}

impl Chain {
    pub fn new(middlewares: Vec<Middleware>, handler: Handler) -> Self {
        Self {
            middlewares,
            handler,
        }
    }

    /// Run the whole chain from the outermost middleware
    pub fn call(self: &Arc<Self>, context: Context, input: Value) -> ChainFuture {
        Next {
            chain: Arc::clone(self),
            index: 0,
        }
        .run(context, input)
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// The remainder of a chain, as seen from one middleware
#[derive(Debug, Clone)]
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
}

impl Next {
    /// Invoke the next middleware, or the handler once none are left
    pub fn run(self, context: Context, input: Value) -> ChainFuture {
        match self.chain.middlewares.get(self.index) {
            Some(middleware) => {
                let next = Next {
                    chain: Arc::clone(&self.chain),
                    index: self.index + 1,
                };
                middleware.call(Request::new(context, input), next)
            }
            None => self.chain.handler.call(context, input),
        }
    }
}
