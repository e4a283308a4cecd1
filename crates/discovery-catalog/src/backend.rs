//! Category backend seam
//!
//! The store never talks HTTP itself; it asks a [`CatalogBackend`] for one
//! level of the hierarchy at a time.

use crate::error::TransportError;
use crate::types::{CategoryId, CategoryRecord};

/// Source of category and brand data
///
/// Implement this trait to plug a transport into [`crate::CategoryTreeStore`].
#[async_trait::async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch the ordered children of `parent`, or the roots when `None`
    async fn fetch_categories(
        &self,
        parent: Option<CategoryId>,
    ) -> Result<Vec<CategoryRecord>, TransportError>;

    /// Fetch the brand names available in `category`
    async fn fetch_brands(&self, category: CategoryId) -> Result<Vec<String>, TransportError>;
}
