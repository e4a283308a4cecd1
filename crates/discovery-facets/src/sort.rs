//! Sort keys and the fixed sort-parameter table
//!
//! Listing URLs carry a sort id (`newest`, `price-asc`, ...). The backend
//! wants an explicit field + direction pair. [`sort_params`] is the single
//! place that maps one to the other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sortable product field as named by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Creation timestamp
    CreatedAt,
    /// Units sold
    SoldQuantity,
    /// Unit price
    Price,
    /// Average review score
    AverageRating,
}

impl SortField {
    /// Backend parameter value
    #[inline]
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::SoldQuantity => "soldQuantity",
            Self::Price => "price",
            Self::AverageRating => "averageRating",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Backend parameter value
    #[inline]
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort choice offered to shoppers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Most recently added first
    #[default]
    Newest,
    /// Best sellers first (`popular`)
    Popular,
    /// Best sellers first (`soldQuantity`)
    SoldQuantity,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Best rated first
    AverageRating,
}

impl SortKey {
    /// Every sort key, in menu order
    pub const ALL: [SortKey; 6] = [
        SortKey::Newest,
        SortKey::Popular,
        SortKey::SoldQuantity,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::AverageRating,
    ];

    /// URL id of this key
    #[inline]
    #[must_use]
    pub fn as_id(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Popular => "popular",
            Self::SoldQuantity => "soldQuantity",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::AverageRating => "averageRating",
        }
    }

    /// Parse a URL id; `None` for anything outside the table
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_id() == id)
    }

    /// Backend field + direction for this key
    #[inline]
    #[must_use]
    pub fn params(self) -> (SortField, SortOrder) {
        sort_params(self.as_id())
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

/// Map a sort id to the backend `(sortBy, orderBy)` pair
///
/// Unrecognized ids fall back to newest first.
#[must_use]
pub fn sort_params(id: &str) -> (SortField, SortOrder) {
    match id {
        "newest" => (SortField::CreatedAt, SortOrder::Desc),
        "popular" | "soldQuantity" => (SortField::SoldQuantity, SortOrder::Desc),
        "price-asc" => (SortField::Price, SortOrder::Asc),
        "price-desc" => (SortField::Price, SortOrder::Desc),
        "averageRating" => (SortField::AverageRating, SortOrder::Desc),
        _ => (SortField::CreatedAt, SortOrder::Desc),
    }
}
