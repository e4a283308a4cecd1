use discovery_catalog::{CategoryId, CategoryRef, CategoryTreeStore, ChildrenState};
use discovery_test_utils::electronics_catalog;
use std::sync::Arc;
use std::time::Duration;

fn names(nodes: &[discovery_catalog::CategoryNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

#[tokio::test]
async fn test_loading_is_lazy_per_level() {
    let backend = Arc::new(electronics_catalog());
    let store = CategoryTreeStore::new(backend.clone());

    let roots = store.load_roots().await.unwrap();
    assert_eq!(names(&roots), vec!["Electronics", "Fashion"]);
    assert_eq!(backend.total_category_calls(), 1);
    assert_eq!(store.children_state(CategoryId(1)), Some(ChildrenState::NotLoaded));

    let phones = store.load_children(CategoryId(1)).await.unwrap();
    assert_eq!(names(&phones), vec!["Phones", "Laptops"]);
    assert_eq!(backend.category_calls(Some(2)), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_concurrent_loads_coalesce() {
    let backend = Arc::new(electronics_catalog().with_delay(Duration::from_millis(200)));
    let store = CategoryTreeStore::new(backend.clone());

    let (a, b, c) = tokio::join!(store.load_roots(), store.load_roots(), store.load_roots());
    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 2);
    assert_eq!(c.unwrap().len(), 2);
    assert_eq!(backend.category_calls(None), 1);
}

#[tokio::test]
async fn test_path_to_android() {
    let store = CategoryTreeStore::new(Arc::new(electronics_catalog()));
    store.load_roots().await.unwrap();
    store.load_children(CategoryId(1)).await.unwrap();
    store.load_children(CategoryId(11)).await.unwrap();

    let path = store.path_to(CategoryId(111)).unwrap();
    assert_eq!(names(&path), vec!["Electronics", "Phones"]);
    assert_eq!(store.find_by_slug("android").unwrap().level, 3);
    assert!(store.path_to(CategoryId(1)).unwrap().is_empty());
}

#[tokio::test]
async fn test_third_level_never_fetches_children() {
    let backend = Arc::new(electronics_catalog());
    let store = CategoryTreeStore::new(backend.clone());
    store.load_roots().await.unwrap();
    store.load_children(CategoryId(1)).await.unwrap();
    store.load_children(CategoryId(11)).await.unwrap();

    let before = backend.total_category_calls();
    assert!(store.load_children(CategoryId(111)).await.unwrap().is_empty());
    assert_eq!(backend.total_category_calls(), before);
    assert_eq!(
        store.children_state(CategoryId(111)),
        Some(ChildrenState::Loaded(Vec::new()))
    );
}

#[tokio::test]
async fn test_transport_failure_marks_failed_then_recovers() {
    let backend = Arc::new(electronics_catalog());
    backend.fail_level(Some(1), 1);
    let store = CategoryTreeStore::new(backend.clone());
    store.load_roots().await.unwrap();

    assert!(store.load_children(CategoryId(1)).await.is_err());
    assert_eq!(store.children_state(CategoryId(1)), Some(ChildrenState::Failed));

    let children = store.load_children(CategoryId(1)).await.unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(backend.category_calls(Some(1)), 2);
}

#[tokio::test]
async fn test_locate_expands_deep_link() {
    let backend = Arc::new(electronics_catalog());
    let store = CategoryTreeStore::new(backend.clone());

    let node = store
        .locate(&CategoryRef::Slug("android".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(node.id, CategoryId(111));

    let missing = store.locate(&CategoryRef::Id(CategoryId(999))).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_brand_lists_are_cached_until_invalidated() {
    let backend = Arc::new(electronics_catalog());
    let store = CategoryTreeStore::new(backend.clone());

    let brands = store.brands_for(CategoryId(11)).await.unwrap();
    assert_eq!(*brands, vec!["Samsung".to_string(), "Apple".to_string()]);
    store.brands_for(CategoryId(11)).await.unwrap();
    assert_eq!(backend.brand_calls(), 1);

    store.invalidate();
    store.brands_for(CategoryId(11)).await.unwrap();
    assert_eq!(backend.brand_calls(), 2);
}

#[tokio::test]
async fn test_snapshot_is_stable_across_loads() {
    let store = CategoryTreeStore::new(Arc::new(electronics_catalog()));
    store.load_roots().await.unwrap();
    let before = store.snapshot();
    store.load_children(CategoryId(1)).await.unwrap();

    assert!(before.find_by_slug("phones").is_none());
    assert!(store.snapshot().find_by_slug("phones").is_some());
}
