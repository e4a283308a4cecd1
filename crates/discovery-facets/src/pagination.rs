//! Pagination model
//!
//! Derived purely from a [`PageResult`]: navigation flags plus a sliding
//! window of page numbers centered on the current page.

use crate::page::PageResult;

/// Default number of page buttons in the window
pub const DEFAULT_WINDOW: u32 = 5;

/// One entry of the pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    /// A page button (0-based index)
    Page {
        /// Page index
        index: u32,
        /// Check if this is the current page
        current: bool,
    },
    /// Gap between the window and an edge
    Ellipsis,
}

/// Navigation model for one result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Current page index
    pub current: u32,
    /// Number of pages
    pub total_pages: u32,
    /// Check if a previous page exists
    pub can_go_previous: bool,
    /// Check if a next page exists
    pub can_go_next: bool,
    /// Page buttons and ellipses, left to right
    pub window: Vec<PageSlot>,
}

impl Pagination {
    /// Build the model for `page` with a window of `width` buttons
    ///
    /// A `width` of zero is treated as one.
    #[must_use]
    pub fn from_result<T>(page: &PageResult<T>, width: u32) -> Self {
        let total = page.total_pages;
        let current = if total == 0 { 0 } else { page.number.min(total - 1) };
        Self {
            current,
            total_pages: total,
            can_go_previous: !page.first,
            can_go_next: !page.last,
            window: window(current, total, width.max(1)),
        }
    }

    /// Parse a typed 1-based page number into a page index
    ///
    /// Non-numeric input and numbers that overflow are rejected; anything
    /// else is clamped into range.
    #[must_use]
    pub fn go_to(&self, input: &str) -> Option<u32> {
        let requested: i64 = input.trim().parse().ok()?;
        Some(clamp_page(requested.saturating_sub(1), self.total_pages))
    }
}

/// Clamp a 0-based page index to `[0, total_pages - 1]`
///
/// With no pages at all the only valid index is 0.
#[must_use]
pub fn clamp_page(page: i64, total_pages: u32) -> u32 {
    let last = i64::from(total_pages.saturating_sub(1));
    u32::try_from(page.clamp(0, last)).unwrap_or(0)
}

fn window(current: u32, total: u32, width: u32) -> Vec<PageSlot> {
    if total == 0 {
        return Vec::new();
    }
    let width = width.min(total);
    let start = current
        .saturating_sub(width / 2)
        .min(total - width);
    let end = start + width - 1;

    let mut slots = Vec::with_capacity(width as usize + 2);
    if start > 0 {
        slots.push(PageSlot::Ellipsis);
    }
    slots.extend((start..=end).map(|index| PageSlot::Page {
        index,
        current: index == current,
    }));
    if end < total - 1 {
        slots.push(PageSlot::Ellipsis);
    }
    slots
}
