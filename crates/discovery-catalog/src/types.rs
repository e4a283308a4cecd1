//! Category model types
//!
//! Defines the category hierarchy as the engine sees it:
//! - Stable category identifiers
//! - Wire records returned by the category endpoint
//! - Tree nodes with an explicit children load state
//! - Category references as carried by listing URLs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Deepest level a category may sit at (parent → child → grandchild)
pub const MAX_DEPTH: u8 = 3;

/// Stable category identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl CategoryId {
    /// Get raw numeric value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for CategoryId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Category as returned by the category endpoint
///
/// The endpoint answers with a recursive shape; nested `children` are accepted
/// on the wire but the store only ingests the top level of each response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Category identifier
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// URL-safe unique key
    pub slug: String,
    /// Nested children, if the backend chose to inline them
    #[serde(default)]
    pub children: Vec<CategoryRecord>,
}

impl CategoryRecord {
    /// Create a leaf record
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            children: Vec::new(),
        }
    }
}

/// Load state of a node's children
///
/// `Loaded` with an empty list means "has no children"; `NotLoaded` means
/// nobody asked yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildrenState {
    /// Children were never requested
    #[default]
    NotLoaded,
    /// A fetch is in flight
    Loading,
    /// Children fetched, in backend order
    Loaded(Vec<CategoryId>),
    /// Last fetch failed; requesting again retries
    Failed,
}

impl ChildrenState {
    /// Children ids when loaded
    #[inline]
    #[must_use]
    pub fn loaded(&self) -> Option<&[CategoryId]> {
        match self {
            Self::Loaded(ids) => Some(ids),
            _ => None,
        }
    }

    /// Check if children are known
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Check if the last attempt failed
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// One entry of the category hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Category identifier
    pub id: CategoryId,
    /// URL-safe unique key
    pub slug: String,
    /// Display name
    pub name: String,
    /// Parent category, `None` for roots
    pub parent_id: Option<CategoryId>,
    /// Depth in the tree, 1 for roots
    pub level: u8,
    /// Children load state
    pub children: ChildrenState,
}

impl CategoryNode {
    /// Check if this is a top-level category
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if the node can have children at all
    #[inline]
    #[must_use]
    pub fn can_have_children(&self) -> bool {
        self.level < MAX_DEPTH
    }
}

/// Category reference as carried by a listing URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryRef {
    /// Reference by numeric id (`categoryId=`)
    Id(CategoryId),
    /// Reference by slug (`subcategorySlug=`)
    Slug(String),
}

impl CategoryRef {
    /// Build a reference to `node` in the requested form
    #[must_use]
    pub fn to_node(node: &CategoryNode, key: CategoryKey) -> Self {
        match key {
            CategoryKey::Id => Self::Id(node.id),
            CategoryKey::Slug => Self::Slug(node.slug.clone()),
        }
    }
}

impl fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Which form of [`CategoryRef`] a surface uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKey {
    /// Numeric id
    #[default]
    Id,
    /// Slug
    Slug,
}
