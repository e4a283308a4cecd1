//! Listing surface profiles
//!
//! The four listing pages share one engine and differ only in the values
//! captured by [`SurfaceProfile`].

use crate::sort::SortKey;
use discovery_catalog::CategoryKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing surfaces served by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    /// Category browsing
    Category,
    /// Best-seller listing
    BestSellers,
    /// Flash-sale listing
    FlashSale,
    /// Keyword search results
    Search,
}

impl SurfaceKind {
    /// Every surface
    pub const ALL: [SurfaceKind; 4] = [
        SurfaceKind::Category,
        SurfaceKind::BestSellers,
        SurfaceKind::FlashSale,
        SurfaceKind::Search,
    ];

    /// Stable name used in config and logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::BestSellers => "best-sellers",
            Self::FlashSale => "flash-sale",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SurfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown surface '{s}'"))
    }
}

/// Per-surface defaults and enabled facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    /// Which surface this is
    pub kind: SurfaceKind,
    /// Sort used when the URL names none
    pub default_sort: SortKey,
    /// Page size sent as `limit`
    pub page_size: u32,
    /// How the URL names the category
    pub category_key: CategoryKey,
    /// Listing status sent as `status`, if any
    pub status: Option<String>,
}

impl SurfaceProfile {
    /// Built-in profile for `kind`
    #[must_use]
    pub fn for_kind(kind: SurfaceKind) -> Self {
        let (default_sort, page_size, category_key) = match kind {
            SurfaceKind::Category => (SortKey::Newest, 20, CategoryKey::Slug),
            SurfaceKind::BestSellers => (SortKey::SoldQuantity, 20, CategoryKey::Id),
            SurfaceKind::FlashSale => (SortKey::Newest, 24, CategoryKey::Id),
            SurfaceKind::Search => (SortKey::Newest, 20, CategoryKey::Id),
        };
        Self {
            kind,
            default_sort,
            page_size,
            category_key,
            status: None,
        }
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// With listing status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Check if the discount facet is offered
    #[inline]
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.kind == SurfaceKind::FlashSale
    }

    /// Check if the keyword facet is offered
    #[inline]
    #[must_use]
    pub fn has_keyword(&self) -> bool {
        self.kind == SurfaceKind::Search
    }
}
