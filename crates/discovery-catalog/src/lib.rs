//! Discovery Catalog
//!
//! The category hierarchy behind every product listing surface.
//!
//! # Architecture
//!
//! ```text
//! CatalogBackend ──fetch one level──► CategoryTreeStore ──snapshot()──► TreeSnapshot
//!        ▲                              │  (moka: coalesced level +          │
//!        └──────── brands_for ──────────┘   brand caches, epoch-keyed)       ▼
//!                                                              filter state / query builder
//! ```
//!
//! The tree is at most three levels deep and loads lazily: a node's children
//! are fetched only when that node is selected or explicitly requested.
//!
//! # Example
//!
//! ```rust,ignore
//! use discovery_catalog::CategoryTreeStore;
//!
//! # async fn example(backend: std::sync::Arc<dyn discovery_catalog::CatalogBackend>) -> discovery_catalog::CatalogResult<()> {
//! let store = CategoryTreeStore::new(backend);
//! let roots = store.load_roots().await?;
//! let phones = store.load_children(roots[0].id).await?;
//! let crumbs = store.path_to(phones[0].id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod error;
pub mod store;
pub mod tree;
pub mod types;

// Re-exports for convenience
pub use backend::CatalogBackend;
pub use error::{CatalogError, CatalogResult, TransportError};
pub use store::{CategoryTreeStore, StoreStats};
pub use tree::{AttachReport, CategoryTree, TreeSnapshot};
pub use types::{
    CategoryId, CategoryKey, CategoryNode, CategoryRecord, CategoryRef, ChildrenState, MAX_DEPTH,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
