//! Filter state for one listing surface
//!
//! [`FilterState`] is an immutable value: every operation returns a new
//! state. Two policies live here and nowhere else:
//! - changing any facet restarts pagination at page 0
//! - selecting a category replaces any deeper selection and drops a brand the
//!   new category does not carry

use crate::facet::{normalize_keyword, Brand, DiscountRange, PriceRange, RatingFloor};
use crate::profile::{SurfaceKind, SurfaceProfile};
use crate::sort::SortKey;
use discovery_catalog::{CategoryId, CategoryNode, CategoryRef, CategoryTree};
use std::sync::Arc;

/// One facet change requested by the shopper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetChange {
    /// Select a brand or `All`
    Brand(Brand),
    /// Select a price preset
    Price(PriceRange),
    /// Select a rating floor (`None` clears it)
    Rating(Option<RatingFloor>),
    /// Select a sort key
    Sort(SortKey),
    /// Move to a page (0-based)
    Page(u32),
    /// Select a discount preset (flash sale only)
    Discount(DiscountRange),
    /// Replace the search keyword (search only); blank clears it
    Keyword(String),
    /// Drop the category selection
    ClearCategory,
}

impl FacetChange {
    /// Short facet name for logs
    #[must_use]
    pub fn facet(&self) -> &'static str {
        match self {
            Self::Brand(_) => "brand",
            Self::Price(_) => "price",
            Self::Rating(_) => "rating",
            Self::Sort(_) => "sort",
            Self::Page(_) => "page",
            Self::Discount(_) => "discount",
            Self::Keyword(_) => "keyword",
            Self::ClearCategory => "category",
        }
    }
}

/// Category selection expanded to its three levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySelection {
    /// Top-level category
    pub parent: CategoryId,
    /// Second-level category, if selected
    pub child: Option<CategoryId>,
    /// Third-level category, if selected
    pub grandchild: Option<CategoryId>,
}

impl CategorySelection {
    /// Most specific selected category
    #[must_use]
    pub fn deepest(&self) -> CategoryId {
        self.grandchild.or(self.child).unwrap_or(self.parent)
    }
}

/// Facet selections plus pagination position for one listing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub(crate) profile: Arc<SurfaceProfile>,
    pub(crate) category: Option<CategoryRef>,
    pub(crate) brand: Brand,
    pub(crate) price: PriceRange,
    pub(crate) rating: Option<RatingFloor>,
    pub(crate) sort: SortKey,
    pub(crate) page: u32,
    pub(crate) discount: DiscountRange,
    pub(crate) keyword: Option<String>,
}

impl FilterState {
    /// Default state for a surface
    #[must_use]
    pub fn new(profile: impl Into<Arc<SurfaceProfile>>) -> Self {
        let profile = profile.into();
        Self {
            sort: profile.default_sort,
            profile,
            category: None,
            brand: Brand::All,
            price: PriceRange::All,
            rating: None,
            page: 0,
            discount: DiscountRange::All,
            keyword: None,
        }
    }

    /// Default state of the same surface
    #[must_use]
    pub fn reset(&self) -> Self {
        Self::new(Arc::clone(&self.profile))
    }

    /// Replace one facet
    ///
    /// Any change other than [`FacetChange::Page`] restarts at page 0.
    /// Facets the surface does not offer are ignored.
    #[must_use]
    pub fn set_filter(&self, change: FacetChange) -> Self {
        let mut next = self.clone();
        match change {
            FacetChange::Page(page) => {
                next.page = page;
                return next;
            }
            FacetChange::Brand(brand) => next.brand = brand.normalized(),
            FacetChange::Price(price) => next.price = price,
            FacetChange::Rating(rating) => next.rating = rating,
            FacetChange::Sort(sort) => next.sort = sort,
            FacetChange::Discount(discount) if self.profile.has_discount() => {
                next.discount = discount;
            }
            FacetChange::Keyword(keyword) if self.profile.has_keyword() => {
                next.keyword = normalize_keyword(&keyword);
            }
            FacetChange::ClearCategory => next.category = None,
            ignored => {
                tracing::debug!(
                    surface = %self.profile.kind,
                    facet = ignored.facet(),
                    "facet not offered on this surface"
                );
                return self.clone();
            }
        }
        next.page = 0;
        next
    }

    /// Select `node` as the category
    ///
    /// Any child or grandchild selected before is replaced. The current brand
    /// survives only if `brands` (the new category's brand list) contains it;
    /// pass an empty list when the list could not be fetched.
    #[must_use]
    pub fn set_category(&self, node: &CategoryNode, brands: &[String]) -> Self {
        let mut next = self.clone();
        next.category = Some(CategoryRef::to_node(node, self.profile.category_key));
        if let Brand::Named(current) = &self.brand {
            let carried = brands.iter().any(|b| b.eq_ignore_ascii_case(current));
            if !carried {
                tracing::debug!(brand = %current, category_id = %node.id, "brand not carried; resetting");
                next.brand = Brand::All;
            }
        }
        next.page = 0;
        next
    }

    /// Expand the category reference into its levels using `tree`
    #[must_use]
    pub fn selection(&self, tree: &CategoryTree) -> Option<CategorySelection> {
        let node = tree.resolve(self.category.as_ref()?)?;
        let mut levels: Vec<CategoryId> = tree.path_to(node.id)?.iter().map(|n| n.id).collect();
        levels.push(node.id);
        Some(CategorySelection {
            parent: levels[0],
            child: levels.get(1).copied(),
            grandchild: levels.get(2).copied(),
        })
    }

    /// Check if any narrowing facet is active (drives "clear filters")
    #[must_use]
    pub fn has_active_facets(&self) -> bool {
        self.category.is_some()
            || !self.brand.is_all()
            || self.price != PriceRange::All
            || self.rating.is_some()
            || self.discount != DiscountRange::All
            || self.keyword.is_some()
    }

    /// Surface profile
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }

    /// Surface kind
    #[inline]
    #[must_use]
    pub fn surface(&self) -> SurfaceKind {
        self.profile.kind
    }

    /// Category reference
    #[inline]
    #[must_use]
    pub fn category(&self) -> Option<&CategoryRef> {
        self.category.as_ref()
    }

    /// Brand facet
    #[inline]
    #[must_use]
    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    /// Price preset
    #[inline]
    #[must_use]
    pub fn price(&self) -> PriceRange {
        self.price
    }

    /// Lower price bound in store currency
    #[inline]
    #[must_use]
    pub fn price_min(&self) -> Option<u64> {
        self.price.bounds().0
    }

    /// Upper price bound in store currency
    #[inline]
    #[must_use]
    pub fn price_max(&self) -> Option<u64> {
        self.price.bounds().1
    }

    /// Rating floor
    #[inline]
    #[must_use]
    pub fn rating(&self) -> Option<RatingFloor> {
        self.rating
    }

    /// Sort key
    #[inline]
    #[must_use]
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Page index, 0-based
    #[inline]
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size
    #[inline]
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.profile.page_size
    }

    /// Discount preset
    #[inline]
    #[must_use]
    pub fn discount(&self) -> DiscountRange {
        self.discount
    }

    /// Search keyword
    #[inline]
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_catalog::{CategoryKey, ChildrenState};

    fn node(id: u64, slug: &str, parent: Option<u64>, level: u8) -> CategoryNode {
        CategoryNode {
            id: CategoryId(id),
            slug: slug.into(),
            name: slug.into(),
            parent_id: parent.map(CategoryId),
            level,
            children: ChildrenState::NotLoaded,
        }
    }

    fn best_sellers() -> FilterState {
        FilterState::new(SurfaceProfile::for_kind(SurfaceKind::BestSellers))
    }

    #[test]
    fn facet_change_restarts_pagination() {
        let state = best_sellers().set_filter(FacetChange::Page(4));
        assert_eq!(state.page(), 4);

        let sorted = state.set_filter(FacetChange::Sort(SortKey::PriceAsc));
        assert_eq!(sorted.page(), 0);
        assert_eq!(sorted.sort(), SortKey::PriceAsc);
    }

    #[test]
    fn unsupported_facets_are_ignored() {
        let state = best_sellers().set_filter(FacetChange::Page(2));
        let same = state.set_filter(FacetChange::Discount(DiscountRange::Over70));
        assert_eq!(same, state);
        let same = state.set_filter(FacetChange::Keyword("shoes".into()));
        assert_eq!(same.keyword(), None);
    }

    #[test]
    fn category_selection_keeps_carried_brand() {
        let state = best_sellers().set_filter(FacetChange::Brand(Brand::Named("Acme".into())));
        let phones = node(11, "phones", Some(1), 2);

        let kept = state.set_category(&phones, &["acme".to_string()]);
        assert_eq!(kept.brand(), &Brand::Named("Acme".into()));
        assert_eq!(kept.category(), Some(&CategoryRef::Id(CategoryId(11))));

        let dropped = state.set_category(&phones, &["Other".to_string()]);
        assert_eq!(dropped.brand(), &Brand::All);
    }

    #[test]
    fn category_surface_references_by_slug() {
        let state = FilterState::new(SurfaceProfile::for_kind(SurfaceKind::Category));
        assert_eq!(state.profile().category_key, CategoryKey::Slug);
        let next = state.set_category(&node(11, "phones", Some(1), 2), &[]);
        assert_eq!(next.category(), Some(&CategoryRef::Slug("phones".into())));
    }

    #[test]
    fn reset_returns_surface_defaults() {
        let state = best_sellers()
            .set_filter(FacetChange::Price(PriceRange::Over5000))
            .set_filter(FacetChange::Page(3));
        let reset = state.reset();
        assert_eq!(reset, best_sellers());
        assert!(state.has_active_facets());
        assert!(!reset.has_active_facets());
    }
}
