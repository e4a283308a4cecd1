//! Discovery HTTP
//!
//! [`HttpBackend`] speaks the storefront's JSON API over `reqwest` and plugs
//! into both backend seams: [`CatalogBackend`] for categories and brands,
//! [`ProductBackend`] for listing pages.
//!
//! | call | request |
//! |---|---|
//! | roots | `GET {categories_path}` |
//! | children | `GET {categories_path}?parentId={id}` |
//! | brands | `GET {brands_path}?categoryId={id}` |
//! | listing | `GET {products_path}?page=..&limit=..&sortBy=..` |

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use discovery_catalog::{CatalogBackend, CategoryId, CategoryRecord, TransportError};
use discovery_core::{BackendConfig, ProductBackend};
use discovery_facets::{PageResult, ProductSummary, QueryParams};
use serde::de::DeserializeOwned;
use url::Url;

/// Errors raised while building the transport
#[derive(Debug, thiserror::Error)]
pub enum HttpSetupError {
    /// Base URL plus endpoint path is not a valid URL
    #[error("invalid endpoint url '{url}': {source}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parse failure
        source: url::ParseError,
    },

    /// HTTP client could not be built
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// JSON-over-HTTP backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    categories: Url,
    brands: Url,
    products: Url,
}

impl HttpBackend {
    /// Build a backend for `config`
    ///
    /// # Errors
    /// Returns an error if an endpoint URL is invalid or the client cannot
    /// be built.
    pub fn new(config: &BackendConfig) -> Result<Self, HttpSetupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            categories: endpoint(&config.base_url, &config.categories_path)?,
            brands: endpoint(&config.base_url, &config.brands_path)?,
            products: endpoint(&config.base_url, &config.products_path)?,
        })
    }

    /// Request URL for one category level
    #[must_use]
    pub fn categories_url(&self, parent: Option<CategoryId>) -> Url {
        let mut url = self.categories.clone();
        if let Some(parent) = parent {
            url.query_pairs_mut()
                .append_pair("parentId", &parent.to_string());
        }
        url
    }

    /// Request URL for a category's brand list
    #[must_use]
    pub fn brands_url(&self, category: CategoryId) -> Url {
        let mut url = self.brands.clone();
        url.query_pairs_mut()
            .append_pair("categoryId", &category.to_string());
        url
    }

    /// Request URL for a listing page
    #[must_use]
    pub fn products_url(&self, params: &QueryParams) -> Url {
        let mut url = self.products.clone();
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params.to_pairs() {
                query.append_pair(name, &value);
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "backend returned error status");
            return Err(TransportError::status(status.as_u16(), url.as_str()));
        }
        response.json::<T>().await.map_err(transport_error)
    }
}

#[async_trait::async_trait]
impl CatalogBackend for HttpBackend {
    async fn fetch_categories(
        &self,
        parent: Option<CategoryId>,
    ) -> Result<Vec<CategoryRecord>, TransportError> {
        self.get_json(self.categories_url(parent)).await
    }

    async fn fetch_brands(&self, category: CategoryId) -> Result<Vec<String>, TransportError> {
        self.get_json(self.brands_url(category)).await
    }
}

#[async_trait::async_trait]
impl ProductBackend for HttpBackend {
    async fn fetch_page(
        &self,
        params: &QueryParams,
    ) -> Result<PageResult<ProductSummary>, TransportError> {
        self.get_json(self.products_url(params)).await
    }
}

fn endpoint(base: &str, path: &str) -> Result<Url, HttpSetupError> {
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|source| HttpSetupError::InvalidUrl { url: raw, source })
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        let url = err.url().map(Url::to_string).unwrap_or_default();
        TransportError::status(status.as_u16(), url)
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
