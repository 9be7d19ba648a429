use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use super::{Binding, merge_options};
use crate::key::{KeyKind, QueryKey, build_key};
use crate::pipeline::{ChainFuture, OperationError};

/// What the engine passes when fetching one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub page_param: Value,
}

impl PageContext {
    pub fn new(page_param: Value) -> Self {
        Self { page_param }
    }
}

/// Function the engine calls to fetch one page
#[derive(Clone)]
pub struct InfiniteQueryFn(Arc<dyn Fn(PageContext) -> ChainFuture + Send + Sync>);

impl InfiniteQueryFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(PageContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        Self(Arc::new(move |page| f(page).boxed()))
    }

    pub fn call(&self, page: PageContext) -> ChainFuture {
        (self.0)(page)
    }
}

impl fmt::Debug for InfiniteQueryFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InfiniteQueryFn(<function>)")
    }
}

/// Computes the next (or previous) page parameter from the pages loaded so far
///
/// Receives the edge page and all pages; `None` means there are no more pages.
#[derive(Clone)]
pub struct PageParamFn(Arc<dyn Fn(&Value, &[Value]) -> Option<Value> + Send + Sync>);

impl PageParamFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, page: &Value, pages: &[Value]) -> Option<Value> {
        (self.0)(page, pages)
    }
}

impl fmt::Debug for PageParamFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageParamFn(<function>)")
    }
}

/// Descriptor for a paginated query
#[derive(Debug, Clone)]
pub struct InfiniteQueryOptions {
    pub query_key: QueryKey,
    pub query_fn: InfiniteQueryFn,
    pub initial_page_param: Value,
    pub get_next_page_param: Option<PageParamFn>,
    pub get_previous_page_param: Option<PageParamFn>,
    pub options: Map<String, Value>,
}

impl InfiniteQueryOptions {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Page parameter following the last of `pages`
    pub fn next_page_param(&self, pages: &[Value]) -> Option<Value> {
        let last = pages.last()?;
        self.get_next_page_param.as_ref()?.call(last, pages)
    }

    /// Page parameter preceding the first of `pages`
    pub fn previous_page_param(&self, pages: &[Value]) -> Option<Value> {
        let first = pages.first()?;
        self.get_previous_page_param.as_ref()?.call(first, pages)
    }
}

/// Per-call replacements for a paginated query descriptor
#[derive(Debug, Clone, Default)]
pub struct InfiniteQueryOverrides {
    pub query_key: Option<QueryKey>,
    pub query_fn: Option<InfiniteQueryFn>,
    pub initial_page_param: Option<Value>,
    pub get_next_page_param: Option<PageParamFn>,
    pub get_previous_page_param: Option<PageParamFn>,
    pub options: Map<String, Value>,
}

impl InfiniteQueryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn with_initial_page_param(mut self, page_param: Value) -> Self {
        self.initial_page_param = Some(page_param);
        self
    }

    pub fn with_next_page_param<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.get_next_page_param = Some(PageParamFn::new(f));
        self
    }

    pub fn with_previous_page_param<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.get_previous_page_param = Some(PageParamFn::new(f));
        self
    }

    pub fn with_query_key(mut self, key: QueryKey) -> Self {
        self.query_key = Some(key);
        self
    }

    pub fn with_query_fn(mut self, query_fn: InfiniteQueryFn) -> Self {
        self.query_fn = Some(query_fn);
        self
    }
}

impl From<Map<String, Value>> for InfiniteQueryOverrides {
    fn from(options: Map<String, Value>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// Build a paginated query descriptor
///
/// Each page is fetched with the input captured here plus a `pageParam` field
/// holding the engine's current page parameter. Query defaults apply first,
/// then infinite-query defaults, then overrides.
pub fn infinite_query_options(
    binding: &Binding,
    input: Value,
    overrides: InfiniteQueryOverrides,
) -> InfiniteQueryOptions {
    let query_key = overrides
        .query_key
        .unwrap_or_else(|| build_key(&binding.path, Some(input.clone()), Some(KeyKind::Infinite)));

    let query_fn = overrides.query_fn.unwrap_or_else(|| {
        let operation = binding.operation.clone();
        let context = binding.context.clone();
        InfiniteQueryFn(Arc::new(move |page: PageContext| {
            operation.call(context.clone(), with_page_param(&input, page.page_param))
        }))
    });

    InfiniteQueryOptions {
        query_key,
        query_fn,
        initial_page_param: overrides.initial_page_param.unwrap_or(Value::Null),
        get_next_page_param: overrides.get_next_page_param,
        get_previous_page_param: overrides.get_previous_page_param,
        options: merge_options([
            &binding.defaults.queries,
            &binding.defaults.infinite_queries,
            &overrides.options,
        ]),
    }
}

/// Input object with `pageParam` set, replacing any field of that name
fn with_page_param(input: &Value, page_param: Value) -> Value {
    let mut merged = match input {
        Value::Object(fields) => fields.clone(),
        Value::Null => Map::new(),
        other => {
            warn!(input = %other, "non-object input to paginated query dropped");
            Map::new()
        }
    };
    merged.insert("pageParam".to_string(), page_param);
    Value::Object(merged)
}
