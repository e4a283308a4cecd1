//! Error types for the discovery engine
//!
//! Provides error handling for:
//! - Listing fetch failures and illegal phase transitions
//! - Configuration loading and validation
//! - Category tree failures surfaced through a listing surface
//!
//! [`DiscoveryError`] is the top-level type returned by [`crate::ListingSurface`].

use crate::phase::FetchPhase;
use discovery_catalog::{CatalogError, TransportError};
use discovery_facets::SurfaceKind;
use std::path::PathBuf;

/// Main discovery error type
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Category tree failure
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Listing fetch failure
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DiscoveryError {
    /// Check if the same call can succeed when retried
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Catalog(err) => err.is_retryable(),
            Self::Fetch(err) => err.is_retryable(),
            Self::Config(_) => false,
        }
    }

    /// Message suitable for showing to a shopper
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(err) => err.user_message(),
            Self::Catalog(CatalogError::NodeNotFound(_)) => {
                "This category is unavailable.".to_string()
            }
            Self::Catalog(_) => {
                "Categories could not be loaded. Please try again.".to_string()
            }
            Self::Config(_) => "The store is misconfigured.".to_string(),
        }
    }
}

/// Listing fetch errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Backend request failed
    #[error("listing request failed: {0}")]
    Transport(#[from] TransportError),

    /// Phase change outside the transition table
    #[error("illegal phase transition {from:?} -> {to:?}")]
    IllegalTransition { from: FetchPhase, to: FetchPhase },

    /// Retry requested before any dispatch
    #[error("nothing to retry")]
    NothingToRetry,
}

impl FetchError {
    /// Check if retrying can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Message suitable for showing to a shopper
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(TransportError::Timeout) => {
                "The store took too long to answer. Please try again.".to_string()
            }
            Self::Transport(_) => "Products could not be loaded. Please try again.".to_string(),
            Self::IllegalTransition { .. } | Self::NothingToRetry => {
                "Something went wrong.".to_string()
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Backend base URL is empty
    #[error("backend base_url must not be empty")]
    EmptyBaseUrl,

    /// Surface override names no known surface
    #[error("unknown surface '{0}' in [surfaces]")]
    UnknownSurface(String),

    /// A surface has page size zero
    #[error("page size for surface '{0}' must be positive")]
    ZeroPageSize(SurfaceKind),

    /// Category cache would hold nothing
    #[error("category_cache_capacity must be positive")]
    ZeroCacheCapacity,

    /// Pagination window is zero or even
    #[error("pagination window must be odd and positive, got {0}")]
    InvalidWindow(u32),
}

/// Result type alias for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
