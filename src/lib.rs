//! quiver - Organize API calls as a tree of operations
//!
//! This library turns a tree of handlers into path-addressed descriptors for
//! a data-fetching engine: each query or mutation gets a deterministic cache
//! key and a function that runs the handler through its middleware.
//!
//! # Example
//! ```
//! use quiver::{Collection, CollectionView, Context, Operation};
//! use serde_json::json;
//!
//! let api = Collection::new().collection(
//!     "users",
//!     Collection::new()
//!         .operation("get", Operation::builder().query(|_ctx, input| async move {
//!             Ok(json!({"id": input["id"], "name": "Ada"}))
//!         })),
//! );
//!
//! let root = CollectionView::root(Context::new().with_var("env", json!("prod")), api);
//! let options = root.at(["users", "get"]).and_then(|r| r.into_query()).unwrap()
//!     .query_options(json!({"id": 1}));
//!
//! assert_eq!(
//!     options.query_key.to_value(),
//!     json!(["users", "get", {"input": {"id": 1}, "kind": "query"}])
//! );
//! ```

pub mod collection;
pub mod config;
pub mod key;
pub mod operation;
pub mod options;
pub mod pipeline;
pub mod validation;

// Re-export commonly used types
pub use collection::{Collection, CollectionView, MutationAccessor, QueryAccessor, Resolved};
pub use config::QuiverConfig;
pub use key::{KeyKind, Path, QueryKey, build_key};
pub use operation::{Operation, OperationBuilder, OperationKind};
pub use options::{InfiniteQueryOptions, MutationOptions, PageContext, QueryOptions};
pub use pipeline::{Context, Handler, Middleware, Next, OperationError, Request};
pub use validation::{Issue, ValidationError};
