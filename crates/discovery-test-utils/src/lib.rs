//! Testing utilities for the discovery workspace
//!
//! Scripted in-memory backends and a small electronics catalog fixture.

#![allow(missing_docs)]

use discovery_catalog::{
    CatalogBackend, CategoryId, CategoryRecord, CategoryTree, TransportError, TreeSnapshot,
};
use discovery_core::ProductBackend;
use discovery_facets::{PageResult, ProductSummary, QueryParams};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Category backend answering from scripted levels
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    levels: HashMap<Option<CategoryId>, Vec<CategoryRecord>>,
    brands: HashMap<CategoryId, Vec<String>>,
    failures: Mutex<HashMap<Option<CategoryId>, usize>>,
    brand_failures: Mutex<HashMap<CategoryId, usize>>,
    delay: Option<Duration>,
    brand_delays: HashMap<CategoryId, Duration>,
    category_calls: Mutex<Vec<Option<CategoryId>>>,
    brand_calls: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, parent: Option<u64>, records: Vec<CategoryRecord>) -> Self {
        self.levels.insert(parent.map(CategoryId), records);
        self
    }

    pub fn with_brands(mut self, category: u64, brands: &[&str]) -> Self {
        self.brands.insert(
            CategoryId(category),
            brands.iter().map(|b| (*b).to_string()).collect(),
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay brand answers for `category`
    pub fn with_brand_delay(mut self, category: u64, delay: Duration) -> Self {
        self.brand_delays.insert(CategoryId(category), delay);
        self
    }

    /// Fail the next `times` category fetches for `parent`
    pub fn fail_level(&self, parent: Option<u64>, times: usize) {
        self.failures.lock().insert(parent.map(CategoryId), times);
    }

    /// Fail the next `times` brand fetches for `category`
    pub fn fail_brands(&self, category: u64, times: usize) {
        self.brand_failures.lock().insert(CategoryId(category), times);
    }

    /// Number of category fetches made for `parent`
    pub fn category_calls(&self, parent: Option<u64>) -> usize {
        let parent = parent.map(CategoryId);
        self.category_calls.lock().iter().filter(|p| **p == parent).count()
    }

    pub fn total_category_calls(&self) -> usize {
        self.category_calls.lock().len()
    }

    pub fn brand_calls(&self) -> usize {
        self.brand_calls.load(Ordering::SeqCst)
    }

    fn take_failure<K: std::hash::Hash + Eq>(failures: &Mutex<HashMap<K, usize>>, key: K) -> bool {
        let mut failures = failures.lock();
        match failures.get_mut(&key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait::async_trait]
impl CatalogBackend for ScriptedCatalog {
    async fn fetch_categories(
        &self,
        parent: Option<CategoryId>,
    ) -> Result<Vec<CategoryRecord>, TransportError> {
        self.category_calls.lock().push(parent);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if Self::take_failure(&self.failures, parent) {
            return Err(TransportError::status(503, "scripted://categories"));
        }
        Ok(self.levels.get(&parent).cloned().unwrap_or_default())
    }

    async fn fetch_brands(&self, category: CategoryId) -> Result<Vec<String>, TransportError> {
        self.brand_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.brand_delays.get(&category) {
            tokio::time::sleep(*delay).await;
        }
        if Self::take_failure(&self.brand_failures, category) {
            return Err(TransportError::Timeout);
        }
        Ok(self.brands.get(&category).cloned().unwrap_or_default())
    }
}

/// Scripted answer for one product request
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub outcome: Result<PageResult<ProductSummary>, TransportError>,
}

/// Product backend answering scripted replies in call order
///
/// Once the script runs out, every request gets a page of `total_items`
/// generated products.
#[derive(Debug)]
pub struct ScriptedProducts {
    script: Mutex<VecDeque<Reply>>,
    total_items: u64,
    requests: Mutex<Vec<QueryParams>>,
}

impl ScriptedProducts {
    pub fn new(total_items: u64) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            total_items,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next unanswered call
    pub fn push(&self, delay: Duration, outcome: Result<PageResult<ProductSummary>, TransportError>) {
        self.script.lock().push_back(Reply { delay, outcome });
    }

    /// Queue a generated page answered after `delay`
    pub fn push_page(&self, delay: Duration, page: u32, limit: u32, tag: &str) {
        let result = generated_page(self.total_items, page, limit, tag);
        self.push(delay, Ok(result));
    }

    pub fn push_failure(&self, delay: Duration, error: TransportError) {
        self.push(delay, Err(error));
    }

    pub fn requests(&self) -> Vec<QueryParams> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait::async_trait]
impl ProductBackend for ScriptedProducts {
    async fn fetch_page(
        &self,
        params: &QueryParams,
    ) -> Result<PageResult<ProductSummary>, TransportError> {
        self.requests.lock().push(params.clone());
        let reply = self.script.lock().pop_front();
        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.outcome
            }
            None => Ok(generated_page(self.total_items, params.page, params.limit, "item")),
        }
    }
}

/// Product with the given id and price
pub fn product(id: u64, name: &str, price: u64) -> ProductSummary {
    ProductSummary {
        id,
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        price,
        discount_percent: None,
        average_rating: Some(4.5),
        sold_quantity: id * 3,
        brand_name: None,
        thumbnail: None,
    }
}

/// Page `page` of `total_items` products, names prefixed with `tag`
pub fn generated_page(total_items: u64, page: u32, limit: u32, tag: &str) -> PageResult<ProductSummary> {
    let limit = u64::from(limit.max(1));
    let total_pages = u32::try_from(total_items.div_ceil(limit)).unwrap_or(u32::MAX);
    let start = u64::from(page) * limit;
    let end = (start + limit).min(total_items);
    let content = (start..end)
        .map(|id| product(id, &format!("{tag} {id}"), 1_000 * (id + 1)))
        .collect();
    PageResult {
        content,
        total_elements: total_items,
        total_pages,
        number: page,
        first: page == 0,
        last: page.saturating_add(1) >= total_pages,
    }
}

fn record(id: u64, name: &str, slug: &str) -> CategoryRecord {
    CategoryRecord::new(id, name, slug)
}

/// Electronics(1) > Phones(11) > Android(111) / iOS(112), Laptops(12);
/// Fashion(2) > Shoes(21)
pub fn electronics_catalog() -> ScriptedCatalog {
    ScriptedCatalog::new()
        .with_level(
            None,
            vec![record(1, "Electronics", "electronics"), record(2, "Fashion", "fashion")],
        )
        .with_level(
            Some(1),
            vec![record(11, "Phones", "phones"), record(12, "Laptops", "laptops")],
        )
        .with_level(
            Some(11),
            vec![record(111, "Android", "android"), record(112, "iOS", "ios")],
        )
        .with_level(Some(2), vec![record(21, "Shoes", "shoes")])
        .with_brands(1, &["Samsung", "Apple", "Sony"])
        .with_brands(11, &["Samsung", "Apple"])
        .with_brands(111, &["Samsung"])
        .with_brands(112, &["Apple"])
        .with_brands(12, &["Apple", "Lenovo"])
        .with_brands(2, &["Nike"])
        .with_brands(21, &["Nike"])
}

/// The electronics catalog fully attached
pub fn electronics_tree() -> TreeSnapshot {
    let mut tree = CategoryTree::new();
    let levels: [(Option<u64>, Vec<CategoryRecord>); 4] = [
        (None, vec![record(1, "Electronics", "electronics"), record(2, "Fashion", "fashion")]),
        (Some(1), vec![record(11, "Phones", "phones"), record(12, "Laptops", "laptops")]),
        (Some(11), vec![record(111, "Android", "android"), record(112, "iOS", "ios")]),
        (Some(2), vec![record(21, "Shoes", "shoes")]),
    ];
    for (parent, records) in levels {
        tree.attach(parent.map(CategoryId), &records)
            .expect("fixture parents are attached first");
    }
    TreeSnapshot::from(tree)
}
