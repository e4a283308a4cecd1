//! Category tree store using moka
//!
//! Provides the process-wide category cache every listing surface reads from:
//! - Lazy, level-at-a-time loading through a [`CatalogBackend`]
//! - Coalesced fetches (concurrent callers share one in-flight request)
//! - Per-category brand lists for the cascading brand reset
//! - Copy-on-write snapshots for synchronous lookups
//! - Explicit invalidation for the category admin collaborator

use crate::backend::CatalogBackend;
use crate::error::{CatalogError, CatalogResult, TransportError};
use crate::tree::{CategoryTree, TreeSnapshot};
use crate::types::{CategoryId, CategoryNode, CategoryRecord, CategoryRef, ChildrenState, MAX_DEPTH};
use futures::future::join_all;
use moka::future::Cache;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of cached fetch results
pub const DEFAULT_CAPACITY: u64 = 1_024;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Nodes currently in the tree
    pub node_count: usize,
    /// Cached category levels
    pub cached_levels: u64,
    /// Cached brand lists
    pub cached_brand_lists: u64,
    /// Number of invalidations so far
    pub epoch: u64,
}

/// Cache key for one level of the hierarchy
///
/// Carries the invalidation epoch so a fetch that started before
/// [`CategoryTreeStore::invalidate`] can never be served afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LevelKey {
    epoch: u64,
    parent: Option<CategoryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BrandKey {
    epoch: u64,
    category: CategoryId,
}

enum Begin {
    Ready(Vec<CategoryNode>),
    Fetch,
    Detached,
}

/// Lazily loaded category hierarchy shared by all listing surfaces
pub struct CategoryTreeStore {
    backend: Arc<dyn CatalogBackend>,
    tree: RwLock<Arc<CategoryTree>>,
    levels: Cache<LevelKey, Arc<Vec<CategoryRecord>>>,
    brands: Cache<BrandKey, Arc<Vec<String>>>,
    epoch: AtomicU64,
}

impl std::fmt::Debug for CategoryTreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryTreeStore")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl CategoryTreeStore {
    /// Create store with default cache capacity
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self::with_capacity(backend, DEFAULT_CAPACITY)
    }

    /// Create store with explicit cache capacity
    #[must_use]
    pub fn with_capacity(backend: Arc<dyn CatalogBackend>, max_capacity: u64) -> Self {
        Self {
            backend,
            tree: RwLock::new(Arc::new(CategoryTree::new())),
            levels: Cache::new(max_capacity),
            brands: Cache::new(max_capacity),
            epoch: AtomicU64::new(0),
        }
    }

    /// Load and cache the top-level categories
    ///
    /// Idempotent: once loaded, no further I/O happens until
    /// [`invalidate`](Self::invalidate). Concurrent first calls share a single
    /// request.
    ///
    /// # Errors
    /// Returns `CatalogError::Transport` if the fetch fails; calling again
    /// retries.
    pub async fn load_roots(&self) -> CatalogResult<Vec<CategoryNode>> {
        self.load_level(None).await
    }

    /// Load and attach the children of `id`
    ///
    /// If the node is not in the tree (for example it was dropped by an
    /// invalidation while the request was in flight) the call resolves to an
    /// empty list and the node can be requested again later.
    ///
    /// # Errors
    /// Returns `CatalogError::Transport` if the fetch fails; the node is
    /// marked [`ChildrenState::Failed`] and calling again retries.
    pub async fn load_children(&self, id: CategoryId) -> CatalogResult<Vec<CategoryNode>> {
        self.load_level(Some(id)).await
    }

    /// Find a node by id in the current tree
    #[must_use]
    pub fn find_by_id(&self, id: CategoryId) -> Option<CategoryNode> {
        self.tree.read().find_by_id(id).cloned()
    }

    /// Find a node by slug in the current tree
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<CategoryNode> {
        self.tree.read().find_by_slug(slug).cloned()
    }

    /// Ancestor chain of `id`, root first; empty for a root
    #[must_use]
    pub fn path_to(&self, id: CategoryId) -> Option<Vec<CategoryNode>> {
        self.tree
            .read()
            .path_to(id)
            .map(|chain| chain.into_iter().cloned().collect())
    }

    /// Children load state of `id`
    #[must_use]
    pub fn children_state(&self, id: CategoryId) -> Option<ChildrenState> {
        self.tree.read().children_state(Some(id)).cloned()
    }

    /// Immutable view of the tree as it is now
    #[must_use]
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::new(Arc::clone(&*self.tree.read()))
    }

    /// Resolve `reference`, expanding the tree level by level if needed
    ///
    /// Used when a listing is mounted from a deep link whose category sits
    /// below levels nobody has opened yet. Branches that fail to load are
    /// skipped.
    ///
    /// # Errors
    /// Returns `CatalogError::Transport` only if the top level cannot be loaded.
    pub async fn locate(&self, reference: &CategoryRef) -> CatalogResult<Option<CategoryNode>> {
        if let Some(node) = self.snapshot().resolve(reference) {
            return Ok(Some(node.clone()));
        }

        let mut frontier: Vec<CategoryId> = self.load_roots().await?.iter().map(|n| n.id).collect();
        for _ in 1..MAX_DEPTH {
            if let Some(node) = self.snapshot().resolve(reference) {
                return Ok(Some(node.clone()));
            }
            let levels = join_all(frontier.iter().map(|id| self.load_children(*id))).await;
            frontier = levels
                .into_iter()
                .filter_map(|level| {
                    level
                        .map_err(|err| tracing::warn!(%err, "skipping branch while locating category"))
                        .ok()
                })
                .flatten()
                .map(|n| n.id)
                .collect();
            if frontier.is_empty() {
                break;
            }
        }

        let found = self.snapshot().resolve(reference).cloned();
        if found.is_none() {
            tracing::debug!(category = %reference, "category not present in tree");
        }
        Ok(found)
    }

    /// Brand names available in `category` (cached)
    ///
    /// # Errors
    /// Returns `CatalogError::Transport` if the fetch fails.
    pub async fn brands_for(&self, category: CategoryId) -> CatalogResult<Arc<Vec<String>>> {
        let key = BrandKey {
            epoch: self.epoch.load(Ordering::Acquire),
            category,
        };
        let backend = Arc::clone(&self.backend);
        self.brands
            .try_get_with(key, async move {
                backend.fetch_brands(category).await.map(Arc::new)
            })
            .await
            .map_err(|err: Arc<TransportError>| CatalogError::Transport((*err).clone()))
    }

    /// Drop every cached node, level and brand list
    pub fn invalidate(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        *self.tree.write() = Arc::new(CategoryTree::new());
        self.levels.invalidate_all();
        self.brands.invalidate_all();
        tracing::info!(epoch, "category tree invalidated");
    }

    /// Get store statistics
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            node_count: self.tree.read().len(),
            cached_levels: self.levels.entry_count(),
            cached_brand_lists: self.brands.entry_count(),
            epoch: self.epoch.load(Ordering::Acquire),
        }
    }

    async fn load_level(&self, parent: Option<CategoryId>) -> CatalogResult<Vec<CategoryNode>> {
        loop {
            let epoch = self.epoch.load(Ordering::Acquire);
            match self.begin(parent) {
                Begin::Ready(nodes) => return Ok(nodes),
                Begin::Detached => {
                    tracing::warn!(parent = ?parent, "category no longer in tree; children not loaded");
                    return Ok(Vec::new());
                }
                Begin::Fetch => {}
            }

            let backend = Arc::clone(&self.backend);
            let fetched = self
                .levels
                .try_get_with(LevelKey { epoch, parent }, async move {
                    backend.fetch_categories(parent).await.map(Arc::new)
                })
                .await;

            if self.epoch.load(Ordering::Acquire) != epoch {
                tracing::debug!(parent = ?parent, "tree invalidated during fetch; reloading");
                continue;
            }
            return self.finish(parent, fetched);
        }
    }

    fn begin(&self, parent: Option<CategoryId>) -> Begin {
        let mut guard = self.tree.write();
        let loaded = match guard.children_state(parent) {
            None => return Begin::Detached,
            Some(state) => state.is_loaded(),
        };
        if loaded {
            return Begin::Ready(Self::level_nodes(&guard, parent));
        }

        let at_max_depth = parent
            .and_then(|id| guard.find_by_id(id))
            .is_some_and(|node| !node.can_have_children());
        let tree = Arc::make_mut(&mut *guard);
        if at_max_depth {
            tree.set_children_state(parent, ChildrenState::Loaded(Vec::new()));
            return Begin::Ready(Vec::new());
        }
        tree.set_children_state(parent, ChildrenState::Loading);
        Begin::Fetch
    }

    fn finish(
        &self,
        parent: Option<CategoryId>,
        fetched: Result<Arc<Vec<CategoryRecord>>, Arc<TransportError>>,
    ) -> CatalogResult<Vec<CategoryNode>> {
        let mut guard = self.tree.write();
        let records = match fetched {
            Ok(records) => records,
            Err(err) => {
                Arc::make_mut(&mut *guard).set_children_state(parent, ChildrenState::Failed);
                tracing::warn!(parent = ?parent, err = %err, "category fetch failed");
                return Err(CatalogError::Transport((*err).clone()));
            }
        };

        if guard.children_state(parent).is_some_and(ChildrenState::is_loaded) {
            return Ok(Self::level_nodes(&guard, parent));
        }

        match Arc::make_mut(&mut *guard).attach(parent, &records) {
            Ok(report) => {
                for err in &report.rejected {
                    tracing::warn!(parent = ?parent, %err, "category rejected");
                }
                let discarded_inline = records.iter().filter(|r| !r.children.is_empty()).count();
                if discarded_inline > 0 {
                    tracing::debug!(parent = ?parent, discarded_inline, "ignoring inline children");
                }
                tracing::debug!(parent = ?parent, accepted = report.accepted.len(), "category level loaded");
                Ok(Self::level_nodes(&guard, parent))
            }
            Err(CatalogError::NodeNotFound(id)) => {
                tracing::warn!(category_id = %id, "category removed before children arrived");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn level_nodes(tree: &CategoryTree, parent: Option<CategoryId>) -> Vec<CategoryNode> {
        let nodes = match parent {
            None => tree.roots(),
            Some(id) => tree.children_of(id).unwrap_or_default(),
        };
        nodes.into_iter().cloned().collect()
    }
}
