use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::key::Path;
use crate::operation::Operation;

/// An entry of a [`Collection`]
///
/// Operations and sub-collections are distinct variants; everything else,
/// arrays and `null` included, is plain data.
#[derive(Debug, Clone)]
pub enum Node {
    Operation(Operation),
    Collection(Arc<Collection>),
    Value(Value),
}

impl From<Operation> for Node {
    fn from(operation: Operation) -> Self {
        Node::Operation(operation)
    }
}

impl From<Collection> for Node {
    fn from(collection: Collection) -> Self {
        Node::Collection(Arc::new(collection))
    }
}

impl From<Arc<Collection>> for Node {
    fn from(collection: Arc<Collection>) -> Self {
        Node::Collection(collection)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

/// A named tree of operations
///
/// # Example
/// ```
/// use quiver::{Collection, Operation};
/// use serde_json::json;
///
/// let api = Collection::new()
///     .collection(
///         "users",
///         Collection::new()
///             .operation("get", Operation::builder().query(|_ctx, input| async move { Ok(input) }))
///             .operation("create", Operation::builder().mutation(|_ctx, input| async move { Ok(input) })),
///     )
///     .value("version", json!("v2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: BTreeMap<String, Node>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(self, name: impl Into<String>, operation: Operation) -> Self {
        self.with(name, operation)
    }

    pub fn collection(self, name: impl Into<String>, collection: impl Into<Arc<Collection>>) -> Self {
        self.with(name, Node::Collection(collection.into()))
    }

    pub fn value(self, name: impl Into<String>, value: Value) -> Self {
        self.with(name, value)
    }

    /// Add any node, replacing an existing entry of the same name
    pub fn with(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.insert(name, node);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.entries.insert(name.into(), node.into())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every operation in the tree with its path, depth first in name order
    pub fn operations(&self) -> Vec<(Path, &Operation)> {
        let mut found = Vec::new();
        self.collect_operations(&Path::root(), &mut found);
        found
    }

    fn collect_operations<'a>(&'a self, prefix: &Path, found: &mut Vec<(Path, &'a Operation)>) {
        for (name, node) in &self.entries {
            match node {
                Node::Operation(operation) => found.push((prefix.child(name), operation)),
                Node::Collection(collection) => {
                    collection.collect_operations(&prefix.child(name), found)
                }
                Node::Value(_) => {}
            }
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Collection {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use serde_json::json;

    fn noop_query() -> Operation {
        Operation::builder().query(|_ctx, input| async move { Ok(input) })
    }

    fn noop_mutation() -> Operation {
        Operation::builder().mutation(|_ctx, input| async move { Ok(input) })
    }

    #[test]
    fn test_build_collection() {
        let api = Collection::new()
            .operation("health", noop_query())
            .collection("users", Collection::new().operation("create", noop_mutation()))
            .value("tags", json!(["a", "b"]));

        assert_eq!(api.len(), 3);
        assert_eq!(api.names().collect::<Vec<_>>(), vec!["health", "tags", "users"]);
        assert!(matches!(api.get("health"), Some(Node::Operation(_))));
        assert!(matches!(api.get("users"), Some(Node::Collection(_))));
        assert!(matches!(api.get("tags"), Some(Node::Value(Value::Array(_)))));
        assert!(api.get("missing").is_none());
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut api = Collection::new().operation("get", noop_query());
        let previous = api.insert("get", noop_mutation());

        assert!(matches!(previous, Some(Node::Operation(op)) if op.is_query()));
        assert!(matches!(api.get("get"), Some(Node::Operation(op)) if op.is_mutation()));
        assert_eq!(api.len(), 1);
    }

    #[test]
    fn test_operations_lists_paths() {
        let api = Collection::new()
            .collection(
                "users",
                Collection::new()
                    .operation("get", noop_query())
                    .collection("admin", Collection::new().operation("ban", noop_mutation())),
            )
            .operation("health", noop_query())
            .value("version", json!(2));

        let found: Vec<(String, OperationKind)> = api
            .operations()
            .into_iter()
            .map(|(path, op)| (path.to_string(), op.kind()))
            .collect();

        assert_eq!(
            found,
            vec![
                ("health".to_string(), OperationKind::Query),
                ("users.admin.ban".to_string(), OperationKind::Mutation),
                ("users.get".to_string(), OperationKind::Query),
            ]
        );
    }

    #[test]
    fn test_from_iterator() {
        let api: Collection = [("a", Node::from(noop_query())), ("b", Node::from(json!(null)))]
            .into_iter()
            .collect();
        assert_eq!(api.len(), 2);
    }
}
