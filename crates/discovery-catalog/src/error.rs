//! Error types for the category catalog
//!
//! Provides error handling for:
//! - Transport failures reported by backend collaborators
//! - Tree ingestion violations (depth, slug uniqueness, cycles)
//! - Lookups against nodes that are not in the tree

use crate::types::CategoryId;

/// Failure reported by a backend transport
///
/// Cloneable so a single failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the connection broke
    #[error("request failed: {0}")]
    Request(String),

    /// Backend answered with a non-success status
    #[error("backend returned status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Transport gave up waiting
    #[error("request timed out")]
    Timeout,
}

impl TransportError {
    /// Create status error
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }
}

/// Errors raised by the category tree store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Backend fetch failed
    #[error("category fetch failed: {0}")]
    Transport(#[from] TransportError),

    /// Node is not (or no longer) in the tree
    #[error("category not found: {0}")]
    NodeNotFound(CategoryId),

    /// Node would sit below the deepest allowed level
    #[error("category {id} would sit at level {level}")]
    DepthExceeded {
        /// Refused category
        id: CategoryId,
        /// Level it would have occupied
        level: u8,
    },

    /// Slug already belongs to another node
    #[error("slug '{slug}' already used by category {existing}")]
    DuplicateSlug {
        /// Contested slug
        slug: String,
        /// Current owner of the slug
        existing: CategoryId,
    },

    /// Slug is blank
    #[error("category {0} has an empty slug")]
    EmptySlug(CategoryId),

    /// Node would become its own ancestor
    #[error("category {0} would create a cycle")]
    Cycle(CategoryId),
}

impl CatalogError {
    /// Check if retrying the same call can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let err = TransportError::status(503, "http://shop/categories");
        assert_eq!(
            err.to_string(),
            "backend returned status 503 for http://shop/categories"
        );
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(CatalogError::from(TransportError::Timeout).is_retryable());
        assert!(!CatalogError::NodeNotFound(CategoryId(9)).is_retryable());
    }
}
