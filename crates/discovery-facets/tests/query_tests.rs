use discovery_catalog::{CategoryId, CategoryRef, CategoryTree};
use discovery_facets::{
    build, from_url, FacetChange, FilterState, NoOpReason, PageResult, Pagination, QueryParams,
    QueryPlan, SortField, SortOrder, SurfaceKind, SurfaceProfile,
};
use discovery_test_utils::electronics_tree;
use pretty_assertions::assert_eq;

fn fetch(plan: QueryPlan) -> QueryParams {
    match plan {
        QueryPlan::Fetch(params) => params,
        QueryPlan::NoOp(reason) => panic!("unexpected no-op: {reason}"),
    }
}

#[test]
fn test_deepest_category_is_sent() {
    let tree = electronics_tree();
    let profile = SurfaceProfile::for_kind(SurfaceKind::BestSellers);
    let mut state = FilterState::new(profile);
    let mut sent = Vec::new();
    for id in [1, 11, 111] {
        state = state.set_category(tree.find_by_id(CategoryId(id)).unwrap(), &[]);
        sent.push(fetch(build(&state, &tree)).category_id);
    }
    assert_eq!(
        sent,
        vec![Some(CategoryId(1)), Some(CategoryId(11)), Some(CategoryId(111))]
    );
}

#[test]
fn test_category_surface_resolves_slug_path() {
    let tree = electronics_tree();
    let state = from_url(
        "subcategorySlug=android&sortBy=price-asc",
        SurfaceProfile::for_kind(SurfaceKind::Category),
    );
    let params = fetch(build(&state, &tree));
    assert_eq!(params.category_id, Some(CategoryId(111)));
    assert_eq!((params.sort_by, params.order_by), (SortField::Price, SortOrder::Asc));
}

#[test]
fn test_price_preset_scenarios() {
    let tree = CategoryTree::new();
    let profile = SurfaceProfile::for_kind(SurfaceKind::Search);

    let params = fetch(build(&from_url("priceRange=500-1000", profile.clone()), &tree));
    assert_eq!((params.price_min, params.price_max), (Some(500_000), Some(1_000_000)));

    let params = fetch(build(&from_url("priceRange=all", profile), &tree));
    assert_eq!((params.price_min, params.price_max), (None, None));
}

#[test]
fn test_full_parameter_set() {
    let tree = electronics_tree();
    let profile = SurfaceProfile::for_kind(SurfaceKind::FlashSale).with_status("ON_SALE");
    let state = from_url(
        "categoryId=12&brand=Lenovo&priceRange=1000-2000&rating=4&discount=10-30&page=2",
        profile,
    );
    let pairs = fetch(build(&state, &tree)).to_pairs();
    let expected: Vec<(&str, String)> = vec![
        ("page", "1".into()),
        ("limit", "24".into()),
        ("sortBy", "createdAt".into()),
        ("orderBy", "desc".into()),
        ("categoryId", "12".into()),
        ("brandName", "Lenovo".into()),
        ("priceMin", "1000000".into()),
        ("priceMax", "2000000".into()),
        ("minRating", "4".into()),
        ("status", "ON_SALE".into()),
        ("discountMin", "10".into()),
        ("discountMax", "30".into()),
    ];
    assert_eq!(pairs, expected);
}

#[test]
fn test_unloaded_category_is_a_noop() {
    let state = from_url("categoryId=111", SurfaceProfile::for_kind(SurfaceKind::Search));
    let plan = build(&state, &CategoryTree::new());
    assert_eq!(
        plan,
        QueryPlan::NoOp(NoOpReason::UnresolvableCategory(CategoryRef::Id(CategoryId(111))))
    );
    assert!(plan.is_noop());
}

#[test]
fn test_search_keyword_is_sent_trimmed() {
    let state = FilterState::new(SurfaceProfile::for_kind(SurfaceKind::Search))
        .set_filter(FacetChange::Keyword("  usb   charger ".into()));
    let params = fetch(build(&state, &CategoryTree::new()));
    assert_eq!(params.keyword.as_deref(), Some("usb charger"));
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["keyword"], "usb charger");
    assert_eq!(json["sortBy"], "createdAt");
    assert!(json.get("categoryId").is_none());
}

#[test]
fn test_pagination_from_backend_page() {
    let page: PageResult<serde_json::Value> = serde_json::from_str(
        r#"{"content": [], "totalElements": 200, "totalPages": 10, "number": 4, "first": false, "last": false}"#,
    )
    .unwrap();
    let pagination = Pagination::from_result(&page, 5);
    assert_eq!(pagination.current, 4);
    assert_eq!(pagination.go_to("10"), Some(9));
    assert_eq!(pagination.go_to("11"), Some(9));
    assert_eq!(pagination.go_to("abc"), None);
}
