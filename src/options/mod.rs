/// Options builders
///
/// These turn an operation bound to a context and a path into the
/// descriptors a data-fetching engine consumes: a cache key, a function the
/// engine calls to run the operation, and free-form engine settings.

mod infinite;
mod mutation;
mod query;

pub use infinite::{
    InfiniteQueryFn, InfiniteQueryOptions, InfiniteQueryOverrides, PageContext, PageParamFn,
    infinite_query_options,
};
pub use mutation::{MutationFn, MutationOptions, MutationOverrides, mutation_options};
pub use query::{QueryFn, QueryOptions, QueryOverrides, query_options};

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::DefaultOptions;
use crate::key::Path;
use crate::operation::Operation;
use crate::pipeline::Context;

/// An operation together with the context and path it was reached through
#[derive(Debug, Clone)]
pub struct Binding {
    context: Context,
    operation: Operation,
    path: Path,
    defaults: Arc<DefaultOptions>,
}

impl Binding {
    pub fn new(context: Context, operation: Operation, path: Path) -> Self {
        Self {
            context,
            operation,
            path,
            defaults: Arc::default(),
        }
    }

    /// Engine settings applied before any per-call overrides
    pub fn with_defaults(mut self, defaults: Arc<DefaultOptions>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &DefaultOptions {
        &self.defaults
    }
}

/// Merge option maps left to right; later maps win
fn merge_options<'a>(layers: impl IntoIterator<Item = &'a Map<String, Value>>) -> Map<String, Value> {
    let mut merged = Map::new();
    for layer in layers {
        for (name, value) in layer {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}
