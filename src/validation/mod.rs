/// Validation adapter
///
/// Any capability answering `validate(value) -> value | issues` can guard an
/// operation. Two capabilities ship with the crate: [`JsonSchema`] for JSON
/// Schema documents and [`Typed`] for serde types carrying `validator` rules.

mod issue;
mod json_schema;
mod schema;
mod typed;

pub use issue::{Issue, PathSegment, ValidationError};
pub use json_schema::JsonSchema;
pub use schema::{FnSchema, Outcome, Schema, parse, schema_fn};
pub use typed::Typed;
