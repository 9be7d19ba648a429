/// Configuration types for quiver
///
/// This module contains types for parsing and representing the JSON
/// configuration that seeds descriptors with engine defaults and names
/// reusable validation schemas.

mod root;

pub use root::{DefaultOptions, QuiverConfig};
