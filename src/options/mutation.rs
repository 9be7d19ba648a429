use futures::FutureExt;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::{Binding, merge_options};
use crate::key::{QueryKey, build_key};
use crate::pipeline::{ChainFuture, OperationError};

/// Function the engine calls with the variables of one mutation
#[derive(Clone)]
pub struct MutationFn(Arc<dyn Fn(Value) -> ChainFuture + Send + Sync>);

impl MutationFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        Self(Arc::new(move |variables| f(variables).boxed()))
    }

    pub fn call(&self, variables: Value) -> ChainFuture {
        (self.0)(variables)
    }
}

impl fmt::Debug for MutationFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MutationFn(<function>)")
    }
}

/// Descriptor for a mutation
#[derive(Debug, Clone)]
pub struct MutationOptions {
    pub mutation_key: QueryKey,
    pub mutation_fn: MutationFn,
    pub options: Map<String, Value>,
}

impl MutationOptions {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }
}

/// Per-call replacements for a mutation descriptor
#[derive(Debug, Clone, Default)]
pub struct MutationOverrides {
    pub mutation_key: Option<QueryKey>,
    pub mutation_fn: Option<MutationFn>,
    pub options: Map<String, Value>,
}

impl MutationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn with_mutation_key(mut self, key: QueryKey) -> Self {
        self.mutation_key = Some(key);
        self
    }

    pub fn with_mutation_fn(mut self, mutation_fn: MutationFn) -> Self {
        self.mutation_fn = Some(mutation_fn);
        self
    }
}

impl From<Map<String, Value>> for MutationOverrides {
    fn from(options: Map<String, Value>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// Build a mutation descriptor
///
/// The key is always the bare path. Variables are supplied when the engine
/// calls `mutation_fn`, not when the descriptor is built.
pub fn mutation_options(binding: &Binding, overrides: MutationOverrides) -> MutationOptions {
    let mutation_key = overrides
        .mutation_key
        .unwrap_or_else(|| build_key(&binding.path, None, None));

    let mutation_fn = overrides.mutation_fn.unwrap_or_else(|| {
        let operation = binding.operation.clone();
        let context = binding.context.clone();
        MutationFn(Arc::new(move |variables| {
            operation.call(context.clone(), variables)
        }))
    });

    MutationOptions {
        mutation_key,
        mutation_fn,
        options: merge_options([&binding.defaults.mutations, &overrides.options]),
    }
}
