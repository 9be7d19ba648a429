use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::{Collection, Node};
use crate::config::{DefaultOptions, QuiverConfig};
use crate::key::{KeyKind, Path, QueryKey, build_key};
use crate::operation::{Operation, OperationKind};
use crate::options::{
    Binding, InfiniteQueryOptions, InfiniteQueryOverrides, MutationOptions, MutationOverrides,
    QueryOptions, QueryOverrides, infinite_query_options, mutation_options, query_options,
};
use crate::pipeline::Context;

/// A collection seen from a path, bound to a shared context
///
/// Children are resolved on access only; nothing below this node is visited
/// until [`CollectionView::get`] reaches it. Views are cheap to clone.
///
/// # Example
/// ```
/// use quiver::{Collection, CollectionView, Context, Operation};
/// use serde_json::json;
///
/// let api = Collection::new().collection(
///     "users",
///     Collection::new().operation("get", Operation::builder().query(|_ctx, input| async move { Ok(input) })),
/// );
///
/// let root = CollectionView::root(Context::new().with_var("env", json!("x")), api);
/// let get = root.collection("users").and_then(|users| users.query("get")).unwrap();
///
/// assert_eq!(
///     get.query_options(json!({"id": 1})).query_key.to_value(),
///     json!(["users", "get", {"input": {"id": 1}, "kind": "query"}])
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CollectionView {
    context: Context,
    collection: Arc<Collection>,
    path: Path,
    defaults: Arc<DefaultOptions>,
}

/// What a name resolves to inside a [`CollectionView`]
#[derive(Debug, Clone)]
pub enum Resolved {
    Query(QueryAccessor),
    Mutation(MutationAccessor),
    Collection(CollectionView),
    /// Plain data stored in the collection, handed back unchanged
    Value(Value),
}

impl Resolved {
    pub fn into_query(self) -> Option<QueryAccessor> {
        match self {
            Resolved::Query(accessor) => Some(accessor),
            _ => None,
        }
    }

    pub fn into_mutation(self) -> Option<MutationAccessor> {
        match self {
            Resolved::Mutation(accessor) => Some(accessor),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<CollectionView> {
        match self {
            Resolved::Collection(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Wrap a collection in a root view
pub fn resolve(context: Context, collection: impl Into<Arc<Collection>>) -> CollectionView {
    CollectionView::root(context, collection)
}

impl CollectionView {
    pub fn root(context: Context, collection: impl Into<Arc<Collection>>) -> Self {
        Self {
            context,
            collection: collection.into(),
            path: Path::root(),
            defaults: Arc::default(),
        }
    }

    /// Seed every descriptor produced below this view with configured defaults
    pub fn with_config(mut self, config: &QuiverConfig) -> Self {
        self.defaults = Arc::new(config.default_options.clone());
        self
    }

    /// Resolve one name
    ///
    /// Returns `None` when the collection has no entry of that name.
    pub fn get(&self, name: &str) -> Option<Resolved> {
        let Some(node) = self.collection.get(name) else {
            trace!(path = %self.path, entry = name, "no entry");
            return None;
        };
        let path = self.path.child(name);

        Some(match node {
            Node::Operation(operation) => {
                let binding = Binding::new(self.context.clone(), operation.clone(), path)
                    .with_defaults(Arc::clone(&self.defaults));
                match operation.kind() {
                    OperationKind::Query => Resolved::Query(QueryAccessor { binding }),
                    OperationKind::Mutation => Resolved::Mutation(MutationAccessor { binding }),
                }
            }
            Node::Collection(collection) => Resolved::Collection(CollectionView {
                context: self.context.clone(),
                collection: Arc::clone(collection),
                path,
                defaults: Arc::clone(&self.defaults),
            }),
            Node::Value(value) => Resolved::Value(value.clone()),
        })
    }

    /// Resolve several names in sequence
    ///
    /// Every name but the last must lead to a sub-collection. An empty
    /// sequence resolves to this view.
    pub fn at<I, S>(&self, names: I) -> Option<Resolved>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = Resolved::Collection(self.clone());
        for name in names {
            current = current.into_collection()?.get(name.as_ref())?;
        }
        Some(current)
    }

    pub fn collection(&self, name: &str) -> Option<CollectionView> {
        self.get(name)?.into_collection()
    }

    pub fn query(&self, name: &str) -> Option<QueryAccessor> {
        self.get(name)?.into_query()
    }

    pub fn mutation(&self, name: &str) -> Option<MutationAccessor> {
        self.get(name)?.into_mutation()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bare key of this subtree; every key produced below starts with it
    pub fn key(&self) -> QueryKey {
        build_key(&self.path, None, None)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collection.names()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

/// Descriptor builders for a query operation
#[derive(Debug, Clone)]
pub struct QueryAccessor {
    binding: Binding,
}

impl QueryAccessor {
    pub fn query_options(&self, input: Value) -> QueryOptions {
        self.query_options_with(input, QueryOverrides::default())
    }

    pub fn query_options_with(&self, input: Value, overrides: QueryOverrides) -> QueryOptions {
        query_options(&self.binding, input, overrides)
    }

    pub fn infinite_query_options(&self, input: Value) -> InfiniteQueryOptions {
        self.infinite_query_options_with(input, InfiniteQueryOverrides::default())
    }

    pub fn infinite_query_options_with(
        &self,
        input: Value,
        overrides: InfiniteQueryOverrides,
    ) -> InfiniteQueryOptions {
        infinite_query_options(&self.binding, input, overrides)
    }

    /// Key `query_options(input)` would use
    pub fn query_key(&self, input: Value) -> QueryKey {
        build_key(self.binding.path(), Some(input), Some(KeyKind::Query))
    }

    /// Key `infinite_query_options(input)` would use
    pub fn infinite_query_key(&self, input: Value) -> QueryKey {
        build_key(self.binding.path(), Some(input), Some(KeyKind::Infinite))
    }

    pub fn path(&self) -> &Path {
        self.binding.path()
    }

    pub fn operation(&self) -> &Operation {
        self.binding.operation()
    }
}

/// Descriptor builder for a mutation operation
#[derive(Debug, Clone)]
pub struct MutationAccessor {
    binding: Binding,
}

impl MutationAccessor {
    pub fn mutation_options(&self) -> MutationOptions {
        self.mutation_options_with(MutationOverrides::default())
    }

    pub fn mutation_options_with(&self, overrides: MutationOverrides) -> MutationOptions {
        mutation_options(&self.binding, overrides)
    }

    pub fn mutation_key(&self) -> QueryKey {
        build_key(self.binding.path(), None, None)
    }

    pub fn path(&self) -> &Path {
        self.binding.path()
    }

    pub fn operation(&self) -> &Operation {
        self.binding.operation()
    }
}
