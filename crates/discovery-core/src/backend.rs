//! Product listing backend seam

use discovery_catalog::TransportError;
use discovery_facets::{PageResult, ProductSummary, QueryParams};

/// Source of product listing pages
///
/// Implement this trait to plug a transport into [`crate::FetchOrchestrator`].
#[async_trait::async_trait]
pub trait ProductBackend: Send + Sync {
    /// Fetch one page of products matching `params`
    async fn fetch_page(
        &self,
        params: &QueryParams,
    ) -> Result<PageResult<ProductSummary>, TransportError>;
}
