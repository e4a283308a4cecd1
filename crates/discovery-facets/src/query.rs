//! Query builder
//!
//! Translates a [`FilterState`] into the backend's product-listing
//! parameters. The category reference is resolved against a tree snapshot;
//! a reference the tree cannot resolve produces [`QueryPlan::NoOp`] and the
//! caller must not hit the network.

use crate::state::FilterState;
use crate::sort::{SortField, SortOrder};
use discovery_catalog::{CategoryId, CategoryRef, CategoryTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outbound product-listing parameters
///
/// `None` fields are omitted from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Page index, 0-based
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Sort field
    pub sort_by: SortField,
    /// Sort direction
    pub order_by: SortOrder,
    /// Deepest selected category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Selected brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// Lower price bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u64>,
    /// Upper price bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u64>,
    /// Rating floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    /// Listing status from the surface profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Search keyword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Lower discount bound, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_min: Option<u8>,
    /// Upper discount bound, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_max: Option<u8>,
}

impl QueryParams {
    /// Parameters as `(name, value)` pairs in wire order, nulls omitted
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.as_param().to_string()),
            ("orderBy", self.order_by.as_param().to_string()),
        ];
        let optional = [
            ("categoryId", self.category_id.map(|id| id.to_string())),
            ("brandName", self.brand_name.clone()),
            ("priceMin", self.price_min.map(|v| v.to_string())),
            ("priceMax", self.price_max.map(|v| v.to_string())),
            ("minRating", self.min_rating.map(|v| v.to_string())),
            ("status", self.status.clone()),
            ("keyword", self.keyword.clone()),
            ("discountMin", self.discount_min.map(|v| v.to_string())),
            ("discountMax", self.discount_max.map(|v| v.to_string())),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        );
        pairs
    }
}

/// Why a plan skips the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// Category reference does not resolve in the tree
    UnresolvableCategory(CategoryRef),
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvableCategory(reference) => {
                write!(f, "category {reference} does not exist")
            }
        }
    }
}

/// Result of building a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Issue a listing request with these parameters
    Fetch(QueryParams),
    /// Skip the request
    NoOp(NoOpReason),
}

impl QueryPlan {
    /// Parameters, when the plan fetches
    #[inline]
    #[must_use]
    pub fn params(&self) -> Option<&QueryParams> {
        match self {
            Self::Fetch(params) => Some(params),
            Self::NoOp(_) => None,
        }
    }

    /// Check if the plan skips the network
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp(_))
    }
}

/// Build the listing query for `state`
///
/// `tree` only needs to contain the selected category; callers deep-linking
/// into an unloaded branch expand it first.
#[must_use]
pub fn build(state: &FilterState, tree: &CategoryTree) -> QueryPlan {
    let category_id = match state.category() {
        None => None,
        Some(reference) => match tree.resolve(reference) {
            Some(node) => Some(node.id),
            None => {
                tracing::debug!(
                    surface = %state.surface(),
                    category = %reference,
                    "category reference does not resolve"
                );
                return QueryPlan::NoOp(NoOpReason::UnresolvableCategory(reference.clone()));
            }
        },
    };

    let profile = state.profile();
    let (sort_by, order_by) = state.sort().params();
    let (discount_min, discount_max) = if profile.has_discount() {
        state.discount().bounds()
    } else {
        (None, None)
    };

    QueryPlan::Fetch(QueryParams {
        page: state.page(),
        limit: state.limit(),
        sort_by,
        order_by,
        category_id,
        brand_name: state.brand().name().map(str::to_string),
        price_min: state.price_min(),
        price_max: state.price_max(),
        min_rating: state.rating().map(|r| r.stars()),
        status: profile.status.clone(),
        keyword: state.keyword().map(str::to_string),
        discount_min,
        discount_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::{Brand, PriceRange};
    use crate::profile::{SurfaceKind, SurfaceProfile};
    use crate::state::FacetChange;
    use crate::url_sync::from_url;
    use discovery_catalog::CategoryRecord;

    fn tree() -> CategoryTree {
        let mut tree = CategoryTree::new();
        tree.attach(None, &[CategoryRecord::new(1, "Electronics", "electronics")])
            .unwrap();
        tree.attach(Some(CategoryId(1)), &[CategoryRecord::new(11, "Phones", "phones")])
            .unwrap();
        tree
    }

    #[test]
    fn defaults_send_no_facets() {
        let state = FilterState::new(SurfaceProfile::for_kind(SurfaceKind::BestSellers));
        let QueryPlan::Fetch(params) = build(&state, &tree()) else {
            panic!("expected fetch");
        };
        assert_eq!(params.sort_by, SortField::SoldQuantity);
        assert_eq!(params.order_by, SortOrder::Desc);
        assert_eq!(params.limit, 20);
        assert_eq!(
            params.to_pairs(),
            vec![
                ("page", "0".to_string()),
                ("limit", "20".to_string()),
                ("sortBy", "soldQuantity".to_string()),
                ("orderBy", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn brand_all_is_never_sent() {
        let state = FilterState::new(SurfaceProfile::for_kind(SurfaceKind::Search))
            .set_filter(FacetChange::Brand(Brand::Named("ALL".into())))
            .set_filter(FacetChange::Price(PriceRange::All));
        let plan = build(&state, &tree());
        let params = plan.params().unwrap();
        assert_eq!(params.brand_name, None);
        assert_eq!(params.price_min, None);
        let json = serde_json::to_value(params).unwrap();
        assert!(json.get("brandName").is_none());
    }

    #[test]
    fn unknown_category_skips_the_network() {
        let state = from_url(
            "subcategorySlug=ghost",
            SurfaceProfile::for_kind(SurfaceKind::Category),
        );
        assert_eq!(
            build(&state, &tree()),
            QueryPlan::NoOp(NoOpReason::UnresolvableCategory(CategoryRef::Slug("ghost".into())))
        );
    }

    #[test]
    fn slug_resolves_to_id() {
        let state = from_url(
            "subcategorySlug=phones",
            SurfaceProfile::for_kind(SurfaceKind::Category),
        );
        let plan = build(&state, &tree());
        assert_eq!(plan.params().unwrap().category_id, Some(CategoryId(11)));
    }

    #[test]
    fn discount_and_status_only_where_configured() {
        let profile = SurfaceProfile::for_kind(SurfaceKind::FlashSale).with_status("ACTIVE");
        let state = from_url("discount=70%2B", profile);
        let params = build(&state, &tree()).params().cloned().unwrap();
        assert_eq!(params.discount_min, Some(70));
        assert_eq!(params.discount_max, None);
        assert_eq!(params.status.as_deref(), Some("ACTIVE"));
        assert_eq!(params.limit, 24);
    }
}
