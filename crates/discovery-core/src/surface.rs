//! Listing surface
//!
//! Glues the shared category store, one filter state and one orchestrator
//! into the object a page binds to. Each surface instance owns its state;
//! nothing here is global except the category store it was handed.

use crate::backend::ProductBackend;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryResult;
use crate::orchestrator::{DispatchOutcome, FetchOrchestrator, ListingView};
use discovery_catalog::{CatalogError, CategoryId, CategoryNode, CategoryTreeStore};
use discovery_facets::{
    from_url, to_url, CategorySelection, FacetChange, FilterState, Pagination, SurfaceKind,
    SurfaceProfile, DEFAULT_WINDOW,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Filter state plus the ticket of the newest category-changing call
///
/// `mount`, `set_category` and `reset` take a ticket before awaiting the
/// category tree. A call whose ticket is no longer the newest when its
/// awaits finish must not touch the filter state.
#[derive(Debug)]
struct Selected {
    filter: FilterState,
    ticket: u64,
}

impl Selected {
    fn next_ticket(&mut self) -> u64 {
        self.ticket += 1;
        self.ticket
    }
}

/// One listing page: category, best sellers, flash sale or search
pub struct ListingSurface {
    profile: Arc<SurfaceProfile>,
    store: Arc<CategoryTreeStore>,
    orchestrator: FetchOrchestrator,
    state: Mutex<Selected>,
    window: u32,
}

impl std::fmt::Debug for ListingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingSurface")
            .field("surface", &self.profile.kind)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl ListingSurface {
    /// Create a surface with default filter state
    #[must_use]
    pub fn new(
        profile: SurfaceProfile,
        store: Arc<CategoryTreeStore>,
        products: Arc<dyn ProductBackend>,
    ) -> Self {
        let profile = Arc::new(profile);
        Self {
            orchestrator: FetchOrchestrator::new(profile.kind, products),
            state: Mutex::new(Selected {
                filter: FilterState::new(Arc::clone(&profile)),
                ticket: 0,
            }),
            profile,
            store,
            window: DEFAULT_WINDOW,
        }
    }

    /// Create a surface of `kind` as configured
    #[must_use]
    pub fn from_config(
        config: &DiscoveryConfig,
        kind: SurfaceKind,
        store: Arc<CategoryTreeStore>,
        products: Arc<dyn ProductBackend>,
    ) -> Self {
        Self::new(config.profile(kind), store, products).with_window(config.pagination_window)
    }

    /// With pagination window width
    #[inline]
    #[must_use]
    pub fn with_window(mut self, width: u32) -> Self {
        self.window = width;
        self
    }

    /// Decode `query`, make sure its category is in the tree and fetch
    ///
    /// The decoded state is adopted before the tree is loaded, so facet
    /// changes made meanwhile build on it. The fetch then uses the state as
    /// it is once the tree is ready. A newer `mount`, `set_category` or
    /// `reset` started meanwhile takes over and this call returns
    /// [`DispatchOutcome::Superseded`].
    ///
    /// A category tree that cannot be loaded is logged and does not prevent
    /// the fetch; an unresolved category then yields a "no such category"
    /// view without a request.
    ///
    /// # Errors
    /// Returns an error only for an illegal phase transition.
    pub async fn mount(&self, query: &str) -> DiscoveryResult<DispatchOutcome> {
        let decoded = from_url(query, Arc::clone(&self.profile));
        tracing::debug!(surface = %self.profile.kind, query, "mounting listing");
        let ticket = {
            let mut state = self.state.lock();
            state.filter = decoded.clone();
            state.next_ticket()
        };

        if let Err(err) = self.store.load_roots().await {
            tracing::warn!(surface = %self.profile.kind, error = %err, "category roots unavailable");
        }
        if let Some(reference) = decoded.category() {
            if let Err(err) = self.store.locate(reference).await {
                tracing::warn!(category = %reference, error = %err, "could not expand category tree");
            }
        }

        let Some(current) = self.current_if(ticket) else {
            tracing::debug!(surface = %self.profile.kind, ticket, "mount superseded");
            return Ok(DispatchOutcome::Superseded);
        };
        self.dispatch(current).await
    }

    /// Change one facet and fetch
    ///
    /// # Errors
    /// Returns an error only for an illegal phase transition.
    pub async fn set_filter(&self, change: FacetChange) -> DiscoveryResult<DispatchOutcome> {
        let next = {
            let mut state = self.state.lock();
            state.filter = state.filter.set_filter(change);
            state.filter.clone()
        };
        self.dispatch(next).await
    }

    /// Select a category and fetch
    ///
    /// The node's children are loaded so the next facet level is ready, and
    /// its brand list decides whether the current brand survives. A brand list
    /// that cannot be fetched counts as empty.
    ///
    /// The category is applied on top of whatever facets were changed while
    /// those loads ran. If a newer `set_category`, `mount` or `reset` started
    /// meanwhile, this selection is dropped and
    /// [`DispatchOutcome::Superseded`] is returned.
    ///
    /// # Errors
    /// Returns `CatalogError::NodeNotFound` if `id` is not in the tree.
    pub async fn set_category(&self, id: CategoryId) -> DiscoveryResult<DispatchOutcome> {
        let node = self
            .store
            .find_by_id(id)
            .ok_or(CatalogError::NodeNotFound(id))?;
        let ticket = self.state.lock().next_ticket();

        if node.can_have_children() {
            if let Err(err) = self.store.load_children(id).await {
                tracing::warn!(category_id = %id, error = %err, "children not loaded");
            }
        }
        let brands = match self.store.brands_for(id).await {
            Ok(brands) => brands,
            Err(err) => {
                tracing::warn!(category_id = %id, error = %err, "brand list unavailable; resetting brand");
                Arc::new(Vec::new())
            }
        };

        let next = {
            let mut state = self.state.lock();
            if state.ticket != ticket {
                tracing::debug!(
                    surface = %self.profile.kind,
                    category_id = %id,
                    "category selection superseded"
                );
                return Ok(DispatchOutcome::Superseded);
            }
            state.filter = state.filter.set_category(&node, &brands);
            state.filter.clone()
        };
        tracing::debug!(surface = %self.profile.kind, category_id = %id, level = node.level, "category selected");
        self.dispatch(next).await
    }

    /// Jump to a typed 1-based page number
    ///
    /// Returns `Ok(None)` when there is no committed page yet or the input is
    /// not a number.
    ///
    /// # Errors
    /// Returns an error only for an illegal phase transition.
    pub async fn go_to_page(&self, input: &str) -> DiscoveryResult<Option<DispatchOutcome>> {
        let Some(page) = self.pagination().and_then(|p| p.go_to(input)) else {
            tracing::debug!(surface = %self.profile.kind, input, "ignoring page input");
            return Ok(None);
        };
        self.set_filter(FacetChange::Page(page)).await.map(Some)
    }

    /// Repeat the last request
    ///
    /// # Errors
    /// Returns `FetchError::NothingToRetry` before the first dispatch.
    pub async fn retry(&self) -> DiscoveryResult<DispatchOutcome> {
        let outcome = self.orchestrator.retry().await?;
        self.adopt(&outcome);
        Ok(outcome)
    }

    /// Back to defaults and `Idle`
    ///
    /// # Errors
    /// Returns an error only for an illegal phase transition.
    pub fn reset(&self) -> DiscoveryResult<()> {
        let mut state = self.state.lock();
        state.filter = state.filter.reset();
        state.next_ticket();
        self.orchestrator.reset()?;
        Ok(())
    }

    /// Query string for the current state
    #[must_use]
    pub fn to_url(&self) -> String {
        to_url(&self.state.lock().filter)
    }

    /// Current filter state
    #[must_use]
    pub fn state(&self) -> FilterState {
        self.state.lock().filter.clone()
    }

    /// Latest view
    #[must_use]
    pub fn view(&self) -> ListingView {
        self.orchestrator.view()
    }

    /// Watch committed views
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListingView> {
        self.orchestrator.subscribe()
    }

    /// Pagination model for the committed page
    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        self.orchestrator
            .view()
            .result
            .map(|page| Pagination::from_result(&*page, self.window))
    }

    /// Selected category expanded to its levels
    #[must_use]
    pub fn selection(&self) -> Option<CategorySelection> {
        self.state.lock().filter.selection(&self.store.snapshot())
    }

    /// Selected category and its ancestors, root first
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<CategoryNode> {
        let snapshot = self.store.snapshot();
        let state = self.state.lock();
        let Some(node) = state.filter.category().and_then(|r| snapshot.resolve(r)) else {
            return Vec::new();
        };
        let mut crumbs: Vec<CategoryNode> = snapshot
            .path_to(node.id)
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect();
        crumbs.push(node.clone());
        crumbs
    }

    /// Surface profile
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }

    /// Fetch orchestrator
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    async fn dispatch(&self, state: FilterState) -> DiscoveryResult<DispatchOutcome> {
        let outcome = self.orchestrator.dispatch(state, self.store.snapshot()).await?;
        self.adopt(&outcome);
        Ok(outcome)
    }

    // The orchestrator may have clamped the page; keep the URL in step.
    fn adopt(&self, outcome: &DispatchOutcome) {
        let Some(committed) = outcome.view().and_then(|view| view.state.as_ref()) else {
            return;
        };
        if outcome.view().map(|v| v.generation) != Some(self.orchestrator.generation()) {
            return;
        }
        let mut state = self.state.lock();
        let only_page_differs = state.filter.page() != committed.page()
            && state.filter.set_filter(FacetChange::Page(committed.page())) == *committed;
        if only_page_differs {
            state.filter = committed.clone();
        }
    }

    fn current_if(&self, ticket: u64) -> Option<FilterState> {
        let state = self.state.lock();
        (state.ticket == ticket).then(|| state.filter.clone())
    }
}
