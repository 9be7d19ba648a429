/// Operation collections and their resolver
///
/// A [`Collection`] is a named tree of operations. A [`CollectionView`]
/// walks it lazily, handing out descriptor builders for each operation it
/// reaches together with the path it was reached by.

mod node;
mod view;

pub use node::{Collection, Node};
pub use view::{CollectionView, MutationAccessor, QueryAccessor, Resolved, resolve};
