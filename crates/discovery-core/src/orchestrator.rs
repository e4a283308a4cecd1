//! Fetch orchestrator
//!
//! Owns the request lifecycle of one listing surface:
//! - every dispatch gets a strictly increasing generation number
//! - only a response whose generation is still current may commit
//! - committed views are published on a `watch` channel
//!
//! Requests are never cancelled. A superseded response simply finds a newer
//! generation when it resolves and is dropped. Locks are taken only inside
//! the synchronous helpers, never across the backend call.

use crate::backend::ProductBackend;
use crate::error::FetchError;
use crate::phase::{validate_transition, FetchPhase};
use discovery_catalog::{CategoryRef, TransportError, TreeSnapshot};
use discovery_facets::{
    build, clamp_page, FacetChange, FilterState, NoOpReason, PageResult, ProductSummary,
    QueryParams, QueryPlan, SurfaceKind,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Why a committed view has no products to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Selected category does not exist; nothing was requested
    NoSuchCategory(CategoryRef),
    /// Backend request failed; a manual retry may help
    RequestFailed(FetchError),
    /// Request succeeded with zero matches
    NoMatches,
}

impl Notice {
    /// Message suitable for showing to a shopper
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoSuchCategory(_) => "This category is unavailable.".to_string(),
            Self::RequestFailed(err) => err.user_message(),
            Self::NoMatches => "No products match these filters.".to_string(),
        }
    }

    /// Check if a retry button makes sense
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailed(err) if err.is_retryable())
    }
}

/// What a listing surface currently shows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingView {
    /// Generation that produced this view
    pub generation: u64,
    /// Lifecycle phase
    pub phase: FetchPhase,
    /// Filter state this view belongs to (page already clamped)
    pub state: Option<FilterState>,
    /// Committed page; kept while a newer request is loading
    pub result: Option<Arc<PageResult<ProductSummary>>>,
    /// Reason the view is empty, if it is
    pub notice: Option<Notice>,
}

impl ListingView {
    /// Products to render (empty unless a page is committed)
    #[must_use]
    pub fn items(&self) -> &[ProductSummary] {
        self.result.as_deref().map_or(&[], |page| page.content.as_slice())
    }

    /// Check if a request is in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Loading
    }
}

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Response was current and committed
    Committed(ListingView),
    /// Plan was a no-op; the view was committed without a request
    Skipped(ListingView),
    /// A newer dispatch started before this one resolved
    Superseded,
}

impl DispatchOutcome {
    /// Committed view, unless superseded
    #[must_use]
    pub fn view(&self) -> Option<&ListingView> {
        match self {
            Self::Committed(view) | Self::Skipped(view) => Some(view),
            Self::Superseded => None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    phase: FetchPhase,
    total_pages: Option<u32>,
    last: Option<(FilterState, TreeSnapshot)>,
    view: ListingView,
}

struct Ticket {
    generation: u64,
    state: FilterState,
    plan: QueryPlan,
}

/// Request lifecycle of one listing surface
pub struct FetchOrchestrator {
    surface: SurfaceKind,
    backend: Arc<dyn ProductBackend>,
    inner: Mutex<Inner>,
    views: watch::Sender<ListingView>,
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FetchOrchestrator")
            .field("surface", &self.surface)
            .field("generation", &inner.generation)
            .field("phase", &inner.phase)
            .finish_non_exhaustive()
    }
}

impl FetchOrchestrator {
    /// Create an idle orchestrator
    #[must_use]
    pub fn new(surface: SurfaceKind, backend: Arc<dyn ProductBackend>) -> Self {
        let (views, _) = watch::channel(ListingView::default());
        Self {
            surface,
            backend,
            inner: Mutex::new(Inner::default()),
            views,
        }
    }

    /// Fetch the listing for `state`
    ///
    /// The page is first clamped against the last known page count. When the
    /// page count was unknown and the backend reports the requested page past
    /// the end, one follow-up request for the last page is made instead of
    /// committing an empty page.
    ///
    /// # Errors
    /// Returns `FetchError::IllegalTransition` if the phase table is violated.
    /// Network failures are not errors here: they commit an `Error` view.
    pub async fn dispatch(
        &self,
        state: FilterState,
        tree: TreeSnapshot,
    ) -> Result<DispatchOutcome, FetchError> {
        let mut state = state;
        let mut corrected = false;
        loop {
            let ticket = self.begin(state, &tree)?;
            let params = match ticket.plan {
                QueryPlan::NoOp(reason) => return self.skip(ticket.generation, ticket.state, reason),
                QueryPlan::Fetch(params) => params,
            };

            tracing::debug!(
                surface = %self.surface,
                generation = ticket.generation,
                page = params.page,
                "dispatching listing request"
            );
            let response = self.backend.fetch_page(&params).await;

            if let Ok(page) = &response {
                if !corrected && page.total_pages > 0 && params.page >= page.total_pages {
                    match self.note_overshoot(ticket.generation, page.total_pages) {
                        Some(last) => {
                            tracing::debug!(
                                surface = %self.surface,
                                requested = params.page,
                                last,
                                "page past the end; requesting last page"
                            );
                            state = ticket.state.set_filter(FacetChange::Page(last));
                            corrected = true;
                            continue;
                        }
                        None => return Ok(DispatchOutcome::Superseded),
                    }
                }
            }
            return self.settle(ticket.generation, ticket.state, &params, response);
        }
    }

    /// Re-dispatch the last filter state
    ///
    /// # Errors
    /// Returns `FetchError::NothingToRetry` if nothing was dispatched since
    /// the last reset.
    pub async fn retry(&self) -> Result<DispatchOutcome, FetchError> {
        let last = self.inner.lock().last.clone();
        let (state, tree) = last.ok_or(FetchError::NothingToRetry)?;
        tracing::info!(surface = %self.surface, "manual retry");
        self.dispatch(state, tree).await
    }

    /// Return to `Idle` and forget the committed result
    ///
    /// In-flight requests become stale.
    ///
    /// # Errors
    /// Returns `FetchError::IllegalTransition` if the phase table is violated.
    pub fn reset(&self) -> Result<(), FetchError> {
        let mut inner = self.inner.lock();
        if inner.phase != FetchPhase::Idle {
            validate_transition(inner.phase, FetchPhase::Idle)?;
        }
        inner.generation += 1;
        inner.phase = FetchPhase::Idle;
        inner.total_pages = None;
        inner.last = None;
        inner.view = ListingView {
            generation: inner.generation,
            ..ListingView::default()
        };
        self.views.send_replace(inner.view.clone());
        tracing::debug!(surface = %self.surface, generation = inner.generation, "reset");
        Ok(())
    }

    /// Latest view
    #[must_use]
    pub fn view(&self) -> ListingView {
        self.inner.lock().view.clone()
    }

    /// Watch published views
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListingView> {
        self.views.subscribe()
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.inner.lock().phase
    }

    /// Page count of the last committed result
    #[must_use]
    pub fn total_pages(&self) -> Option<u32> {
        self.inner.lock().total_pages
    }

    /// Surface this orchestrator serves
    #[inline]
    #[must_use]
    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    fn begin(&self, state: FilterState, tree: &TreeSnapshot) -> Result<Ticket, FetchError> {
        let mut inner = self.inner.lock();
        validate_transition(inner.phase, FetchPhase::Loading)?;

        let mut state = state;
        if let Some(total) = inner.total_pages {
            let clamped = clamp_page(i64::from(state.page()), total);
            if clamped != state.page() {
                tracing::debug!(
                    surface = %self.surface,
                    requested = state.page(),
                    clamped,
                    "clamping page to known page count"
                );
                state = state.set_filter(FacetChange::Page(clamped));
            }
        }

        let plan = build(&state, tree);
        inner.generation += 1;
        inner.phase = FetchPhase::Loading;
        inner.last = Some((state.clone(), tree.clone()));
        inner.view = ListingView {
            generation: inner.generation,
            phase: FetchPhase::Loading,
            state: Some(state.clone()),
            result: inner.view.result.clone(),
            notice: None,
        };
        self.views.send_replace(inner.view.clone());

        Ok(Ticket {
            generation: inner.generation,
            state,
            plan,
        })
    }

    fn skip(
        &self,
        generation: u64,
        state: FilterState,
        reason: NoOpReason,
    ) -> Result<DispatchOutcome, FetchError> {
        let mut inner = self.inner.lock();
        validate_transition(inner.phase, FetchPhase::Success)?;
        let NoOpReason::UnresolvableCategory(reference) = reason;
        tracing::info!(
            surface = %self.surface,
            generation,
            category = %reference,
            "skipping request for unknown category"
        );
        inner.phase = FetchPhase::Success;
        inner.total_pages = None;
        inner.view = ListingView {
            generation,
            phase: FetchPhase::Success,
            state: Some(state),
            result: None,
            notice: Some(Notice::NoSuchCategory(reference)),
        };
        self.views.send_replace(inner.view.clone());
        Ok(DispatchOutcome::Skipped(inner.view.clone()))
    }

    fn note_overshoot(&self, generation: u64, total_pages: u32) -> Option<u32> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(surface = %self.surface, generation, "stale response discarded");
            return None;
        }
        inner.total_pages = Some(total_pages);
        Some(total_pages - 1)
    }

    fn settle(
        &self,
        generation: u64,
        state: FilterState,
        params: &QueryParams,
        response: Result<PageResult<ProductSummary>, TransportError>,
    ) -> Result<DispatchOutcome, FetchError> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(
                surface = %self.surface,
                generation,
                current = inner.generation,
                "stale response discarded"
            );
            return Ok(DispatchOutcome::Superseded);
        }

        let view = match response {
            Ok(page) => {
                validate_transition(inner.phase, FetchPhase::Success)?;
                tracing::debug!(
                    surface = %self.surface,
                    generation,
                    items = page.content.len(),
                    total_pages = page.total_pages,
                    "listing committed"
                );
                inner.phase = FetchPhase::Success;
                inner.total_pages = Some(page.total_pages);
                let notice = page.is_empty().then_some(Notice::NoMatches);
                ListingView {
                    generation,
                    phase: FetchPhase::Success,
                    state: Some(state),
                    result: Some(Arc::new(page)),
                    notice,
                }
            }
            Err(err) => {
                validate_transition(inner.phase, FetchPhase::Error)?;
                tracing::warn!(
                    surface = %self.surface,
                    generation,
                    page = params.page,
                    error = %err,
                    "listing request failed"
                );
                inner.phase = FetchPhase::Error;
                ListingView {
                    generation,
                    phase: FetchPhase::Error,
                    state: Some(state),
                    result: None,
                    notice: Some(Notice::RequestFailed(FetchError::Transport(err))),
                }
            }
        };
        inner.view = view.clone();
        self.views.send_replace(view.clone());
        Ok(DispatchOutcome::Committed(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_catalog::CategoryTree;
    use discovery_facets::SurfaceProfile;
    use parking_lot::Mutex as PlMutex;

    /// Answers with a fixed page count and records requested pages
    struct Pages {
        total_pages: u32,
        fail: bool,
        requested: PlMutex<Vec<u32>>,
    }

    impl Pages {
        fn new(total_pages: u32) -> Arc<Self> {
            Arc::new(Self {
                total_pages,
                fail: false,
                requested: PlMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ProductBackend for Pages {
        async fn fetch_page(
            &self,
            params: &QueryParams,
        ) -> Result<PageResult<ProductSummary>, TransportError> {
            self.requested.lock().push(params.page);
            if self.fail {
                return Err(TransportError::Timeout);
            }
            let in_range = params.page < self.total_pages;
            Ok(PageResult {
                content: if in_range {
                    vec![ProductSummary {
                        id: u64::from(params.page),
                        name: format!("item {}", params.page),
                        slug: String::new(),
                        price: 1_000,
                        discount_percent: None,
                        average_rating: None,
                        sold_quantity: 0,
                        brand_name: None,
                        thumbnail: None,
                    }]
                } else {
                    Vec::new()
                },
                total_elements: u64::from(self.total_pages),
                total_pages: self.total_pages,
                number: params.page,
                first: params.page == 0,
                last: params.page + 1 >= self.total_pages,
            })
        }
    }

    fn state() -> FilterState {
        FilterState::new(SurfaceProfile::for_kind(SurfaceKind::Search))
    }

    fn tree() -> TreeSnapshot {
        TreeSnapshot::from(CategoryTree::new())
    }

    #[tokio::test]
    async fn success_commits_and_records_page_count() {
        let backend = Pages::new(4);
        let orchestrator = FetchOrchestrator::new(SurfaceKind::Search, backend.clone());
        let outcome = orchestrator.dispatch(state(), tree()).await.unwrap();
        let view = outcome.view().unwrap();
        assert_eq!(view.phase, FetchPhase::Success);
        assert_eq!(view.items().len(), 1);
        assert_eq!(orchestrator.total_pages(), Some(4));
        assert_eq!(orchestrator.generation(), 1);
    }

    #[tokio::test]
    async fn known_page_count_clamps_before_the_request() {
        let backend = Pages::new(3);
        let orchestrator = FetchOrchestrator::new(SurfaceKind::Search, backend.clone());
        orchestrator.dispatch(state(), tree()).await.unwrap();
        let outcome = orchestrator
            .dispatch(state().set_filter(FacetChange::Page(40)), tree())
            .await
            .unwrap();
        assert_eq!(*backend.requested.lock(), vec![0, 2]);
        assert_eq!(outcome.view().unwrap().state.as_ref().unwrap().page(), 2);
    }

    #[tokio::test]
    async fn overshoot_on_first_request_is_corrected_once() {
        let backend = Pages::new(3);
        let orchestrator = FetchOrchestrator::new(SurfaceKind::Search, backend.clone());
        let outcome = orchestrator
            .dispatch(state().set_filter(FacetChange::Page(9)), tree())
            .await
            .unwrap();
        assert_eq!(*backend.requested.lock(), vec![9, 2]);
        assert_eq!(outcome.view().unwrap().items().len(), 1);
    }

    #[tokio::test]
    async fn failure_commits_error_view_and_retry_repeats() {
        let backend = Arc::new(Pages {
            total_pages: 1,
            fail: true,
            requested: PlMutex::new(Vec::new()),
        });
        let orchestrator = FetchOrchestrator::new(SurfaceKind::Search, backend.clone());
        let outcome = orchestrator.dispatch(state(), tree()).await.unwrap();
        let view = outcome.view().unwrap();
        assert_eq!(view.phase, FetchPhase::Error);
        assert!(view.notice.as_ref().unwrap().is_retryable());

        orchestrator.retry().await.unwrap();
        assert_eq!(backend.requested.lock().len(), 2);
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let orchestrator = FetchOrchestrator::new(SurfaceKind::Search, Pages::new(2));
        orchestrator.dispatch(state(), tree()).await.unwrap();
        orchestrator.reset().unwrap();
        assert_eq!(orchestrator.phase(), FetchPhase::Idle);
        assert!(orchestrator.view().result.is_none());
        assert_eq!(orchestrator.retry().await, Err(FetchError::NothingToRetry));
    }
}
