//! Listing response models

use serde::{Deserialize, Serialize};

/// One page of listing results with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Items on this page
    pub content: Vec<T>,
    /// Items across all pages
    pub total_elements: u64,
    /// Number of pages
    pub total_pages: u32,
    /// Page index, 0-based
    pub number: u32,
    /// Check if this is the first page
    pub first: bool,
    /// Check if this is the last page
    pub last: bool,
}

impl<T> PageResult<T> {
    /// Empty result on page 0
    #[must_use]
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            number: 0,
            first: true,
            last: true,
        }
    }

    /// Check if the page has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Product card data returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product id
    pub id: u64,
    /// Display name
    pub name: String,
    /// URL slug
    #[serde(default)]
    pub slug: String,
    /// Current price in store currency
    pub price: u64,
    /// Discount percent, when discounted
    #[serde(default)]
    pub discount_percent: Option<u8>,
    /// Average star rating
    #[serde(default)]
    pub average_rating: Option<f32>,
    /// Units sold
    #[serde(default)]
    pub sold_quantity: u64,
    /// Brand name
    #[serde(default)]
    pub brand_name: Option<String>,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,
}
