use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared values handed to every handler and middleware
///
/// The context is immutable from the point of view of the chain - methods that
/// modify it return a new Context. Clones share storage until one of them is
/// changed, so handing the same context to many concurrent invocations is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    /// Variable storage
    variables: Arc<HashMap<String, Value>>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a derived context with a variable set
    ///
    /// # Example
    /// ```
    /// use quiver::Context;
    /// use serde_json::json;
    ///
    /// let ctx = Context::new()
    ///     .with_var("token", json!("secret"))
    ///     .with_var("baseUrl", json!("https://api.example.com"));
    /// ```
    pub fn with_var(mut self, name: impl Into<String>, value: Value) -> Self {
        Arc::make_mut(&mut self.variables).insert(name.into(), value);
        self
    }

    /// Set a variable on this context only (other clones are unaffected)
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        Arc::make_mut(&mut self.variables).insert(name.into(), value);
    }

    /// Get a variable by name (top-level only)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Get a value using a dotted path (e.g., "auth.token" or "servers.0.url")
    ///
    /// # Example
    /// ```
    /// use quiver::Context;
    /// use serde_json::json;
    ///
    /// let ctx = Context::new()
    ///     .with_var("auth", json!({"token": "abc", "scopes": ["read"]}));
    ///
    /// assert_eq!(ctx.get_path("auth.token"), Some(&json!("abc")));
    /// assert_eq!(ctx.get_path("auth.scopes.0"), Some(&json!("read")));
    /// ```
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.variables.get(parts.next()?)?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get all variables
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Check if a variable exists
    pub fn has(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Check if a path exists
    pub fn has_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            variables: Arc::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_context() {
        let ctx = Context::new();
        assert!(ctx.variables().is_empty());
    }

    #[test]
    fn test_with_var() {
        let ctx = Context::new()
            .with_var("env", json!("staging"))
            .with_var("retries", json!(3));

        assert_eq!(ctx.get("env"), Some(&json!("staging")));
        assert_eq!(ctx.get("retries"), Some(&json!(3)));
    }

    #[test]
    fn test_derived_context_leaves_original_untouched() {
        let base = Context::new().with_var("env", json!("x"));
        let derived = base.clone().with_var("user", json!({"id": 7}));

        assert!(!base.has("user"));
        assert_eq!(derived.get_path("user.id"), Some(&json!(7)));
        assert_eq!(derived.get("env"), Some(&json!("x")));
    }

    #[test]
    fn test_set_var_only_affects_one_clone() {
        let original = Context::new().with_var("token", json!("a"));
        let mut copy = original.clone();
        copy.set_var("token", json!("b"));

        assert_eq!(original.get("token"), Some(&json!("a")));
        assert_eq!(copy.get("token"), Some(&json!("b")));
    }

    #[test]
    fn test_get_path_nested() {
        let ctx = Context::new().with_var(
            "servers",
            json!([{"url": "https://a"}, {"url": "https://b"}]),
        );

        assert_eq!(ctx.get_path("servers.1.url"), Some(&json!("https://b")));
        assert_eq!(ctx.get_path("servers.9.url"), None);
        assert_eq!(ctx.get_path("servers.first"), None);
        assert_eq!(ctx.get_path("missing.path"), None);
    }

    #[test]
    fn test_has_path() {
        let ctx = Context::new().with_var("auth", json!({"token": "t"}));

        assert!(ctx.has("auth"));
        assert!(ctx.has_path("auth.token"));
        assert!(!ctx.has_path("auth.user"));
        assert!(!ctx.has("user"));
    }

    #[test]
    fn test_from_iterator() {
        let ctx: Context = [("env", json!("x")), ("token", json!(null))]
            .into_iter()
            .collect();

        assert!(ctx.has("token"));
        assert_eq!(ctx.get("env"), Some(&json!("x")));
    }
}
