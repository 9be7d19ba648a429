use futures::FutureExt;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::{Binding, merge_options};
use crate::key::{KeyKind, QueryKey, build_key};
use crate::pipeline::{ChainFuture, OperationError};

/// Zero-argument function the engine calls to fetch a query
#[derive(Clone)]
pub struct QueryFn(Arc<dyn Fn() -> ChainFuture + Send + Sync>);

impl QueryFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    pub fn call(&self) -> ChainFuture {
        (self.0)()
    }
}

impl fmt::Debug for QueryFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryFn(<function>)")
    }
}

/// Descriptor for a single query
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub query_key: QueryKey,
    pub query_fn: QueryFn,
    /// Engine settings such as `staleTime` or `enabled`
    pub options: Map<String, Value>,
}

impl QueryOptions {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }
}

/// Per-call replacements for a query descriptor
#[derive(Debug, Clone, Default)]
pub struct QueryOverrides {
    pub query_key: Option<QueryKey>,
    pub query_fn: Option<QueryFn>,
    pub options: Map<String, Value>,
}

impl QueryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn with_query_key(mut self, key: QueryKey) -> Self {
        self.query_key = Some(key);
        self
    }

    pub fn with_query_fn(mut self, query_fn: QueryFn) -> Self {
        self.query_fn = Some(query_fn);
        self
    }
}

impl From<Map<String, Value>> for QueryOverrides {
    fn from(options: Map<String, Value>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// Build a query descriptor
///
/// The returned `query_fn` replays the operation with the context and input
/// captured here, every time it is called.
pub fn query_options(binding: &Binding, input: Value, overrides: QueryOverrides) -> QueryOptions {
    let query_key = overrides
        .query_key
        .unwrap_or_else(|| build_key(&binding.path, Some(input.clone()), Some(KeyKind::Query)));

    let query_fn = overrides.query_fn.unwrap_or_else(|| {
        let operation = binding.operation.clone();
        let context = binding.context.clone();
        QueryFn(Arc::new(move || operation.call(context.clone(), input.clone())))
    });

    QueryOptions {
        query_key,
        query_fn,
        options: merge_options([&binding.defaults.queries, &overrides.options]),
    }
}
