//! Discovery Core
//!
//! Runs product listing surfaces on top of the category store and the
//! facet layer:
//!
//! ```text
//!   URL ──mount──► ListingSurface ──set_filter / set_category / go_to_page──┐
//!                      │                                                   │
//!                      ▼                                                   ▼
//!              CategoryTreeStore (shared)                       FetchOrchestrator
//!                                                   generation ─► ProductBackend
//!                                                                          │
//!                    watch::Receiver<ListingView> ◄── commit if current ───┘
//! ```
//!
//! Responses are committed last-dispatched-wins: a response whose generation
//! has been superseded is dropped. There is no automatic retry; failed views
//! carry a retryable [`Notice`] and [`ListingSurface::retry`] repeats the
//! request.
//!
//! # Example
//!
//! ```rust,ignore
//! use discovery_core::{DiscoveryConfig, ListingSurface};
//! use discovery_facets::{FacetChange, SurfaceKind, PriceRange};
//!
//! let config = DiscoveryConfig::load("discovery.toml")?;
//! let surface = ListingSurface::from_config(&config, SurfaceKind::BestSellers, store, products);
//! surface.mount("?categoryId=11&page=2").await?;
//! surface.set_filter(FacetChange::Price(PriceRange::From500To1000)).await?;
//! println!("{}", surface.to_url());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod surface;

// Re-exports for convenience
pub use backend::ProductBackend;
pub use config::{BackendConfig, DiscoveryConfig, SurfaceConfig, ENV_BASE_URL, ENV_LOG};
pub use error::{ConfigError, DiscoveryError, DiscoveryResult, FetchError};
pub use orchestrator::{DispatchOutcome, FetchOrchestrator, ListingView, Notice};
pub use phase::{allowed_transitions, validate_transition, FetchPhase};
pub use surface::ListingSurface;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
