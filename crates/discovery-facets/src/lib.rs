//! Discovery Facets
//!
//! Everything a listing surface needs between the URL and the backend request,
//! without any I/O:
//!
//! ```text
//! query string ──from_url──► FilterState ──build(tree)──► QueryPlan
//!      ▲                        │ set_filter / set_category      │
//!      └────────to_url──────────┘                                ▼
//!                                          Fetch(QueryParams) | NoOp(reason)
//!
//! PageResult ──Pagination::from_result──► window + navigation flags
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use discovery_facets::{build, from_url, to_url, FacetChange, SortKey, SurfaceKind, SurfaceProfile};
//!
//! let profile = SurfaceProfile::for_kind(SurfaceKind::BestSellers);
//! let state = from_url("?brand=Acme&page=3", profile)
//!     .set_filter(FacetChange::Sort(SortKey::PriceAsc));
//! assert_eq!(state.page(), 0);
//! assert_eq!(to_url(&state), "brand=Acme&sortBy=price-asc");
//! let plan = build(&state, &tree);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod facet;
pub mod page;
pub mod pagination;
pub mod profile;
pub mod query;
pub mod sort;
pub mod state;
pub mod url_sync;

// Re-exports for convenience
pub use facet::{normalize_keyword, Brand, DiscountRange, PriceRange, RatingFloor, PRICE_UNIT};
pub use page::{PageResult, ProductSummary};
pub use pagination::{clamp_page, PageSlot, Pagination, DEFAULT_WINDOW};
pub use profile::{SurfaceKind, SurfaceProfile};
pub use query::{build, NoOpReason, QueryParams, QueryPlan};
pub use sort::{sort_params, SortField, SortKey, SortOrder};
pub use state::{CategorySelection, FacetChange, FilterState};
pub use url_sync::{from_url, params, to_url};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
