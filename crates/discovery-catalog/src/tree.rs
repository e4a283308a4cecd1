//! In-memory category hierarchy
//!
//! [`CategoryTree`] is a flat arena keyed by [`CategoryId`] with a slug index.
//! Parents reference children by id through [`ChildrenState`], so depth-three
//! walks never recurse. [`TreeSnapshot`] is the immutable, shareable view the
//! filter and query layers read from.

use crate::error::CatalogError;
use crate::types::{CategoryId, CategoryNode, CategoryRecord, CategoryRef, ChildrenState, MAX_DEPTH};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

/// Outcome of attaching one fetched level to the tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    /// Ids attached, in backend order
    pub accepted: Vec<CategoryId>,
    /// Records refused, with the reason
    pub rejected: Vec<CatalogError>,
}

/// Category hierarchy arena
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    slugs: HashMap<String, CategoryId>,
    roots: ChildrenState,
}

impl CategoryTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently known
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Load state of the top level
    #[inline]
    #[must_use]
    pub fn roots_state(&self) -> &ChildrenState {
        &self.roots
    }

    /// Top-level nodes in backend order (empty until loaded)
    #[must_use]
    pub fn roots(&self) -> Vec<&CategoryNode> {
        self.roots
            .loaded()
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Look up a node by id
    #[inline]
    #[must_use]
    pub fn find_by_id(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    /// Look up a node by slug
    #[inline]
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&CategoryNode> {
        self.slugs.get(slug).and_then(|id| self.nodes.get(id))
    }

    /// Resolve a URL category reference
    #[must_use]
    pub fn resolve(&self, reference: &CategoryRef) -> Option<&CategoryNode> {
        match reference {
            CategoryRef::Id(id) => self.find_by_id(*id),
            CategoryRef::Slug(slug) => self.find_by_slug(slug),
        }
    }

    /// Children of `id`, or `None` if the node is unknown or not loaded
    #[must_use]
    pub fn children_of(&self, id: CategoryId) -> Option<Vec<&CategoryNode>> {
        let node = self.nodes.get(&id)?;
        node.children.loaded().map(|ids| self.collect(ids))
    }

    /// Ancestor chain of `id`, root first, excluding the node itself
    ///
    /// Returns `None` if the node is unknown. A root yields an empty chain.
    #[must_use]
    pub fn path_to(&self, id: CategoryId) -> Option<Vec<&CategoryNode>> {
        let mut current = self.nodes.get(&id)?;
        let mut chain = Vec::with_capacity(usize::from(MAX_DEPTH));
        while let Some(parent_id) = current.parent_id {
            let parent = self.nodes.get(&parent_id)?;
            chain.push(parent);
            if chain.len() > usize::from(MAX_DEPTH) {
                return None;
            }
            current = parent;
        }
        chain.reverse();
        Some(chain)
    }

    /// Children state of `parent` (`None` addresses the top level)
    #[must_use]
    pub fn children_state(&self, parent: Option<CategoryId>) -> Option<&ChildrenState> {
        match parent {
            None => Some(&self.roots),
            Some(id) => self.nodes.get(&id).map(|n| &n.children),
        }
    }

    /// Set children state of `parent`; returns `false` if the node is unknown
    pub(crate) fn set_children_state(&mut self, parent: Option<CategoryId>, state: ChildrenState) -> bool {
        match parent {
            None => {
                self.roots = state;
                true
            }
            Some(id) => match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.children = state;
                    true
                }
                None => false,
            },
        }
    }

    /// Attach one fetched level under `parent` and mark it loaded
    ///
    /// Records that would break depth, slug uniqueness or acyclicity are
    /// refused individually; the rest of the level is still attached.
    ///
    /// # Errors
    /// Returns `CatalogError::NodeNotFound` if `parent` is not in the tree.
    pub fn attach(
        &mut self,
        parent: Option<CategoryId>,
        records: &[CategoryRecord],
    ) -> Result<AttachReport, CatalogError> {
        let level = match parent {
            None => 1,
            Some(id) => {
                let node = self.nodes.get(&id).ok_or(CatalogError::NodeNotFound(id))?;
                node.level + 1
            }
        };

        let mut report = AttachReport::default();
        for record in records {
            match self.admit(parent, level, record) {
                Ok(()) => report.accepted.push(record.id),
                Err(err) => report.rejected.push(err),
            }
        }

        self.set_children_state(parent, ChildrenState::Loaded(report.accepted.clone()));
        Ok(report)
    }

    fn admit(
        &mut self,
        parent: Option<CategoryId>,
        level: u8,
        record: &CategoryRecord,
    ) -> Result<(), CatalogError> {
        if level > MAX_DEPTH {
            return Err(CatalogError::DepthExceeded {
                id: record.id,
                level,
            });
        }
        if record.slug.trim().is_empty() {
            return Err(CatalogError::EmptySlug(record.id));
        }
        if let Some(parent_id) = parent {
            let is_ancestor = parent_id == record.id
                || self
                    .path_to(parent_id)
                    .is_some_and(|chain| chain.iter().any(|n| n.id == record.id));
            if is_ancestor {
                return Err(CatalogError::Cycle(record.id));
            }
        }
        if let Some(&existing) = self.slugs.get(&record.slug) {
            if existing != record.id {
                return Err(CatalogError::DuplicateSlug {
                    slug: record.slug.clone(),
                    existing,
                });
            }
        }

        match self.nodes.get_mut(&record.id) {
            Some(node) if node.parent_id == parent => {
                // Re-fetch of a known level: refresh labels, keep children state.
                if node.slug != record.slug {
                    self.slugs.remove(&node.slug);
                    self.slugs.insert(record.slug.clone(), record.id);
                }
                node.slug.clone_from(&record.slug);
                node.name.clone_from(&record.name);
            }
            Some(_) => return Err(CatalogError::Cycle(record.id)),
            None => {
                self.slugs.insert(record.slug.clone(), record.id);
                self.nodes.insert(
                    record.id,
                    CategoryNode {
                        id: record.id,
                        slug: record.slug.clone(),
                        name: record.name.clone(),
                        parent_id: parent,
                        level,
                        children: ChildrenState::NotLoaded,
                    },
                );
            }
        }
        Ok(())
    }

    fn collect(&self, ids: &[CategoryId]) -> Vec<&CategoryNode> {
        ids.iter().filter_map(|id| self.nodes.get(id)).collect()
    }
}

/// Immutable view of the tree at one point in time
///
/// Cloning is a reference-count bump. Later loads never change a snapshot
/// already handed out.
#[derive(Debug, Clone, Default)]
pub struct TreeSnapshot(Arc<CategoryTree>);

impl TreeSnapshot {
    /// Wrap a tree
    #[inline]
    #[must_use]
    pub fn new(tree: Arc<CategoryTree>) -> Self {
        Self(tree)
    }
}

impl From<CategoryTree> for TreeSnapshot {
    fn from(tree: CategoryTree) -> Self {
        Self(Arc::new(tree))
    }
}

impl Deref for TreeSnapshot {
    type Target = CategoryTree;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: u64, slug: &str) -> CategoryRecord {
        CategoryRecord::new(id, slug.to_uppercase(), slug)
    }

    fn electronics() -> CategoryTree {
        let mut tree = CategoryTree::new();
        tree.attach(None, &[record(1, "electronics"), record(2, "fashion")])
            .unwrap();
        tree.attach(Some(CategoryId(1)), &[record(11, "phones")]).unwrap();
        tree.attach(Some(CategoryId(11)), &[record(111, "android")]).unwrap();
        tree
    }

    #[test]
    fn levels_follow_parents() {
        let tree = electronics();
        assert_eq!(tree.find_by_id(CategoryId(1)).unwrap().level, 1);
        assert_eq!(tree.find_by_id(CategoryId(11)).unwrap().level, 2);
        assert_eq!(tree.find_by_slug("android").unwrap().level, 3);
    }

    #[test]
    fn path_to_is_root_first() {
        let tree = electronics();
        let path: Vec<_> = tree
            .path_to(CategoryId(111))
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(path, vec![CategoryId(1), CategoryId(11)]);
        assert!(tree.path_to(CategoryId(1)).unwrap().is_empty());
        assert!(tree.path_to(CategoryId(999)).is_none());
    }

    #[test]
    fn fourth_level_is_rejected() {
        let mut tree = electronics();
        let report = tree
            .attach(Some(CategoryId(111)), &[record(1111, "too-deep")])
            .unwrap();
        assert!(report.accepted.is_empty());
        assert!(matches!(
            report.rejected[0],
            CatalogError::DepthExceeded { level: 4, .. }
        ));
        assert!(tree.find_by_slug("too-deep").is_none());
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let mut tree = electronics();
        let report = tree
            .attach(Some(CategoryId(2)), &[record(21, "phones"), record(22, "shoes")])
            .unwrap();
        assert_eq!(report.accepted, vec![CategoryId(22)]);
        assert_eq!(
            report.rejected,
            vec![CatalogError::DuplicateSlug {
                slug: "phones".into(),
                existing: CategoryId(11)
            }]
        );
    }

    #[test]
    fn ancestor_cannot_be_reattached_below_itself() {
        let mut tree = electronics();
        let report = tree.attach(Some(CategoryId(11)), &[record(1, "electronics")]).unwrap();
        assert_eq!(report.rejected, vec![CatalogError::Cycle(CategoryId(1))]);
        assert_eq!(tree.find_by_id(CategoryId(1)).unwrap().parent_id, None);
    }

    #[test]
    fn empty_level_is_loaded_not_unknown() {
        let mut tree = electronics();
        tree.attach(Some(CategoryId(2)), &[]).unwrap();
        assert_eq!(tree.children_of(CategoryId(2)).unwrap().len(), 0);
        assert!(tree.children_of(CategoryId(111)).is_none());
    }

    #[test]
    fn attach_under_unknown_parent_fails() {
        let mut tree = CategoryTree::new();
        assert_eq!(
            tree.attach(Some(CategoryId(5)), &[]),
            Err(CatalogError::NodeNotFound(CategoryId(5)))
        );
    }

    #[test]
    fn refetch_refreshes_labels() {
        let mut tree = electronics();
        tree.attach(None, &[CategoryRecord::new(1, "Gadgets", "gadgets")])
            .unwrap();
        let node = tree.find_by_id(CategoryId(1)).unwrap();
        assert_eq!(node.name, "Gadgets");
        assert!(tree.find_by_slug("electronics").is_none());
        assert!(node.children.is_loaded());
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let mut tree = electronics();
        let snapshot = TreeSnapshot::from(tree.clone());
        tree.attach(Some(CategoryId(2)), &[record(21, "shoes")]).unwrap();
        assert!(snapshot.find_by_slug("shoes").is_none());
        assert!(tree.find_by_slug("shoes").is_some());
    }

    proptest! {
        #[test]
        fn prop_attach_keeps_tree_consistent(
            levels in proptest::collection::vec(
                (0usize..8, proptest::collection::vec((1u64..40, "[a-d]{1,2}"), 0..5)),
                0..12,
            ),
        ) {
            let mut tree = CategoryTree::new();
            for (pick, records) in levels {
                let records: Vec<CategoryRecord> = records
                    .into_iter()
                    .map(|(id, slug)| CategoryRecord::new(id, slug.clone(), slug))
                    .collect();
                let mut known: Vec<CategoryId> = tree.nodes.keys().copied().collect();
                known.sort();
                let parent = if known.is_empty() || pick == 0 {
                    None
                } else {
                    Some(known[pick % known.len()])
                };
                let _ = tree.attach(parent, &records);
            }

            for node in tree.nodes.values() {
                prop_assert!(node.level >= 1 && node.level <= MAX_DEPTH);
                let path = tree.path_to(node.id).unwrap();
                prop_assert_eq!(path.len(), usize::from(node.level - 1));
                prop_assert_eq!(tree.find_by_slug(&node.slug).map(|n| n.id), Some(node.id));
            }
            prop_assert_eq!(tree.slugs.len(), tree.nodes.len());
        }
    }
}
