use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::{Issue, Outcome, PathSegment, Schema};

/// Schema capability backed by a Rust type
///
/// The value is deserialized into `T` (serde defaults apply, unknown fields
/// are dropped unless `T` denies them), checked with `T`'s `validator` rules,
/// and serialized back. The coerced value is what flows downstream.
///
/// # Example
/// ```
/// use quiver::validation::Typed;
/// use serde::{Deserialize, Serialize};
/// use validator::Validate;
///
/// #[derive(Serialize, Deserialize, Validate)]
/// struct NewUser {
///     #[validate(email)]
///     email: String,
///     #[serde(default)]
///     admin: bool,
/// }
///
/// let schema = Typed::<NewUser>::new();
/// ```
pub struct Typed<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn coerce(&self, value: Value) -> Outcome {
        let typed: T = match serde_json::from_value(value) {
            Ok(typed) => typed,
            Err(err) => return Outcome::Invalid(vec![Issue::new(err.to_string())]),
        };

        if let Err(errors) = typed.validate() {
            return Outcome::Invalid(flatten_errors(&errors));
        }

        match serde_json::to_value(&typed) {
            Ok(value) => Outcome::Valid(value),
            Err(err) => Outcome::Invalid(vec![Issue::new(err.to_string())]),
        }
    }
}

impl<T> Default for Typed<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

#[async_trait]
impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Serialize + Validate + 'static,
{
    async fn validate(&self, value: Value) -> Outcome {
        self.coerce(value)
    }
}

/// Flatten nested `validator` errors into path-addressed issues
///
/// Issues are sorted by path; `validator` keeps fields in a hash map.
fn flatten_errors(errors: &ValidationErrors) -> Vec<Issue> {
    let mut issues = Vec::new();
    collect(errors, &[], &mut issues);
    issues.sort_by_key(Issue::dotted_path);
    issues
}

fn collect(errors: &ValidationErrors, prefix: &[PathSegment], issues: &mut Vec<Issue>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let mut path = prefix.to_vec();
        // `__all__` holds struct-level (schema) errors
        if field != "__all__" {
            path.push(PathSegment::Key(field));
        }

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    issues.push(Issue {
                        path: (!path.is_empty()).then(|| path.clone()),
                        message: error.to_string(),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::Index(*index));
                    collect(inner, &item_path, issues);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct Address {
        #[validate(length(min = 1, message = "city is required"))]
        city: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct Signup {
        #[validate(email(message = "invalid email"))]
        email: String,
        #[serde(default)]
        newsletter: bool,
        #[validate(nested)]
        addresses: Vec<Address>,
    }

    #[tokio::test]
    async fn test_coerces_defaults_and_strips_unknown_keys() {
        let parsed = parse(
            &Typed::<Signup>::new(),
            json!({"email": "a@b.io", "addresses": [], "referrer": "ad"}),
        )
        .await
        .unwrap();

        assert_eq!(
            parsed,
            json!({"email": "a@b.io", "newsletter": false, "addresses": []})
        );
    }

    #[tokio::test]
    async fn test_field_and_nested_issues() {
        let err = parse(
            &Typed::<Signup>::new(),
            json!({"email": "nope", "addresses": [{"city": "Oslo"}, {"city": ""}]}),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.issues,
            vec![
                Issue::at(
                    [PathSegment::from("addresses"), PathSegment::Index(1), "city".into()],
                    "city is required"
                ),
                Issue::at(["email"], "invalid email"),
            ]
        );
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_single_root_issue() {
        let err = parse(&Typed::<Signup>::new(), json!("not an object"))
            .await
            .unwrap_err();

        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, None);
    }
}
