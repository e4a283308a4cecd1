//! URL synchronization
//!
//! Encodes a [`FilterState`] into listing query-string parameters and decodes
//! them back at mount. Only values that differ from the surface default are
//! written, in a fixed order, so equal states always produce equal URLs.
//! Decoding never fails: anything unknown or malformed falls back to the
//! default for that field.

use crate::facet::{normalize_keyword, Brand, DiscountRange, PriceRange, RatingFloor};
use crate::profile::SurfaceProfile;
use crate::sort::SortKey;
use crate::state::FilterState;
use discovery_catalog::{CategoryId, CategoryKey, CategoryRef};
use std::sync::Arc;
use url::form_urlencoded;

/// Query-string parameter names
pub mod params {
    /// Page number, 1-based in the URL
    pub const PAGE: &str = "page";
    /// Price preset id
    pub const PRICE_RANGE: &str = "priceRange";
    /// Rating floor
    pub const RATING: &str = "rating";
    /// Brand name or `all`
    pub const BRAND: &str = "brand";
    /// Category id (id-keyed surfaces)
    pub const CATEGORY_ID: &str = "categoryId";
    /// Category slug (slug-keyed surfaces)
    pub const SUBCATEGORY_SLUG: &str = "subcategorySlug";
    /// Sort id
    pub const SORT_BY: &str = "sortBy";
    /// Discount preset id (flash sale)
    pub const DISCOUNT: &str = "discount";
    /// Search keyword (search)
    pub const KEYWORD: &str = "keyword";
}

/// Decode a listing query string into a filter state
///
/// A single leading `?` is accepted. When a parameter repeats, the last
/// occurrence wins.
#[must_use]
pub fn from_url(query: &str, profile: impl Into<Arc<SurfaceProfile>>) -> FilterState {
    let mut state = FilterState::new(profile);
    let query = query.strip_prefix('?').unwrap_or(query);

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.as_ref();
        match key.as_ref() {
            params::PAGE => {
                state.page = parse_page(value).unwrap_or(0);
            }
            params::PRICE_RANGE => {
                state.price = PriceRange::from_id(value).unwrap_or_default();
            }
            params::RATING => state.rating = RatingFloor::from_id(value),
            params::BRAND => state.brand = Brand::from_input(value),
            params::SORT_BY => {
                state.sort = SortKey::from_id(value).unwrap_or(state.profile.default_sort);
            }
            params::CATEGORY_ID if state.profile.category_key == CategoryKey::Id => {
                state.category = value.parse::<CategoryId>().ok().map(CategoryRef::Id);
            }
            params::SUBCATEGORY_SLUG if state.profile.category_key == CategoryKey::Slug => {
                state.category = (!value.is_empty()).then(|| CategoryRef::Slug(value.to_string()));
            }
            params::DISCOUNT if state.profile.has_discount() => {
                state.discount = DiscountRange::from_id(value).unwrap_or_default();
            }
            params::KEYWORD if state.profile.has_keyword() => {
                state.keyword = normalize_keyword(value);
            }
            other => {
                tracing::trace!(param = other, surface = %state.profile.kind, "ignoring url parameter");
            }
        }
    }
    state
}

/// Encode a filter state as a query string (without the leading `?`)
#[must_use]
pub fn to_url(state: &FilterState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());

    match &state.category {
        Some(CategoryRef::Id(id)) => {
            out.append_pair(params::CATEGORY_ID, &id.to_string());
        }
        Some(CategoryRef::Slug(slug)) => {
            out.append_pair(params::SUBCATEGORY_SLUG, slug);
        }
        None => {}
    }
    if let Some(keyword) = &state.keyword {
        out.append_pair(params::KEYWORD, keyword);
    }
    if let Some(brand) = state.brand.name() {
        out.append_pair(params::BRAND, brand);
    }
    if state.price != PriceRange::All {
        out.append_pair(params::PRICE_RANGE, state.price.as_id());
    }
    if let Some(rating) = state.rating {
        out.append_pair(params::RATING, &rating.stars().to_string());
    }
    if state.discount != DiscountRange::All {
        out.append_pair(params::DISCOUNT, state.discount.as_id());
    }
    if state.sort != state.profile.default_sort {
        out.append_pair(params::SORT_BY, state.sort.as_id());
    }
    if state.page != 0 {
        out.append_pair(params::PAGE, &(u64::from(state.page) + 1).to_string());
    }

    out.finish()
}

fn parse_page(value: &str) -> Option<u32> {
    let one_based: u64 = value.trim().parse().ok()?;
    one_based.checked_sub(1).and_then(|p| u32::try_from(p).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SurfaceKind;
    use crate::state::FacetChange;

    fn profile(kind: SurfaceKind) -> SurfaceProfile {
        SurfaceProfile::for_kind(kind)
    }

    #[test]
    fn defaults_encode_to_empty_query() {
        let state = FilterState::new(profile(SurfaceKind::Search));
        assert_eq!(to_url(&state), "");
    }

    #[test]
    fn recognized_parameters_decode() {
        let state = from_url(
            "?categoryId=11&brand=Acme&priceRange=500-1000&rating=4&sortBy=price-desc&page=3",
            profile(SurfaceKind::BestSellers),
        );
        assert_eq!(state.category(), Some(&CategoryRef::Id(CategoryId(11))));
        assert_eq!(state.brand(), &Brand::Named("Acme".into()));
        assert_eq!(state.price_min(), Some(500_000));
        assert_eq!(state.price_max(), Some(1_000_000));
        assert_eq!(state.rating().map(RatingFloor::stars), Some(4));
        assert_eq!(state.sort(), SortKey::PriceDesc);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let state = from_url(
            "page=zero&priceRange=cheap&rating=9&sortBy=relevance&categoryId=abc&brand=all",
            profile(SurfaceKind::BestSellers),
        );
        assert_eq!(state, FilterState::new(profile(SurfaceKind::BestSellers)));

        let state = from_url("page=0", profile(SurfaceKind::Search));
        assert_eq!(state.page(), 0);
    }

    #[test]
    fn surface_specific_parameters_are_gated() {
        let query = "discount=30-50&keyword=red+shoes&subcategorySlug=phones";
        let sale = from_url(query, profile(SurfaceKind::FlashSale));
        assert_eq!(sale.discount(), DiscountRange::From30To50);
        assert_eq!(sale.keyword(), None);
        assert_eq!(sale.category(), None);

        let search = from_url(query, profile(SurfaceKind::Search));
        assert_eq!(search.keyword(), Some("red shoes"));
        assert_eq!(search.discount(), DiscountRange::All);

        let category = from_url(query, profile(SurfaceKind::Category));
        assert_eq!(category.category(), Some(&CategoryRef::Slug("phones".into())));
    }

    #[test]
    fn encoding_order_is_fixed() {
        let state = FilterState::new(profile(SurfaceKind::Search))
            .set_filter(FacetChange::Sort(SortKey::AverageRating))
            .set_filter(FacetChange::Keyword("tv".into()))
            .set_filter(FacetChange::Brand(Brand::Named("A&B".into())))
            .set_filter(FacetChange::Page(1));
        assert_eq!(to_url(&state), "keyword=tv&brand=A%26B&sortBy=averageRating&page=2");
    }

    #[test]
    fn last_occurrence_wins() {
        let state = from_url("page=3&page=oops", profile(SurfaceKind::Search));
        assert_eq!(state.page(), 0);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let state = FilterState::new(profile(SurfaceKind::Search)).set_filter(FacetChange::Page(u32::MAX));
        let url = to_url(&state);
        assert_eq!(url, "page=4294967296");
        assert_eq!(from_url(&url, profile(SurfaceKind::Search)).page(), u32::MAX);
        assert_eq!(from_url("page=4294967297", profile(SurfaceKind::Search)).page(), 0);
    }
}
