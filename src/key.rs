//! Cache keys derived from collection paths

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Names traversed from the collection root to an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path with `segment` appended; `self` is left as is
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Which descriptor a key was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Query,
    Infinite,
}

/// One element of a [`QueryKey`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Path(String),
    Marker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<KeyKind>,
    },
}

/// Ordered key identifying a cached entry in the fetching engine
///
/// Serializes as a JSON array, e.g. `["users", "get", {"input": {"id": 1}, "kind": "query"}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The trailing marker, if the key has one
    pub fn marker(&self) -> Option<(Option<&Value>, Option<KeyKind>)> {
        match self.0.last()? {
            KeySegment::Marker { input, kind } => Some((input.as_ref(), *kind)),
            KeySegment::Path(_) => None,
        }
    }

    /// Whether `prefix` matches the beginning of this key
    ///
    /// Engines use this to invalidate a whole subtree of a collection.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|segment| match segment {
                    KeySegment::Path(name) => Value::String(name.clone()),
                    KeySegment::Marker { input, kind } => {
                        let mut marker = serde_json::Map::new();
                        if let Some(input) = input {
                            marker.insert("input".to_string(), input.clone());
                        }
                        if let Some(kind) = kind {
                            let kind = match kind {
                                KeyKind::Query => "query",
                                KeyKind::Infinite => "infinite",
                            };
                            marker.insert("kind".to_string(), Value::String(kind.to_string()));
                        }
                        Value::Object(marker)
                    }
                })
                .collect(),
        )
    }

    /// Stable string form, equal for structurally equal keys
    ///
    /// Object keys are emitted in sorted order, so `{"a":1,"b":2}` and
    /// `{"b":2,"a":1}` hash the same.
    pub fn hash_key(&self) -> String {
        canonical(self.to_value()).to_string()
    }
}

/// Rebuild objects with their keys in sorted order
fn canonical(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}

impl From<&Path> for QueryKey {
    fn from(path: &Path) -> Self {
        QueryKey(path.0.iter().cloned().map(KeySegment::Path).collect())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash_key())
    }
}

/// Build the cache key for an operation at `path`
///
/// `None` and JSON `null` inputs count as absent. With neither an input nor a
/// kind the key is the bare path; otherwise one trailing marker carries
/// whichever of the two is present.
///
/// # Example
/// ```
/// use quiver::key::{build_key, KeyKind, Path};
/// use serde_json::json;
///
/// let path: Path = ["users", "get"].into_iter().collect();
/// let key = build_key(&path, Some(json!({"id": 1})), Some(KeyKind::Query));
///
/// assert_eq!(
///     key.to_value(),
///     json!(["users", "get", {"input": {"id": 1}, "kind": "query"}])
/// );
/// ```
pub fn build_key(path: &Path, input: Option<Value>, kind: Option<KeyKind>) -> QueryKey {
    let input = input.filter(|value| !value.is_null());
    let mut key = QueryKey::from(path);

    if input.is_some() || kind.is_some() {
        key.0.push(KeySegment::Marker { input, kind });
    }

    key
}
