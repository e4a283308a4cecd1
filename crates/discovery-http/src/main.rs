//! `discovery-probe`: load the category tree, fetch a listing page or
//! normalize a listing URL from the command line.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use discovery_catalog::{CategoryNode, CategoryRef, CategoryTreeStore};
use discovery_core::{DiscoveryConfig, ListingSurface, ListingView};
use discovery_facets::{build, from_url, to_url, PageSlot, QueryPlan, SurfaceKind};
use discovery_http::HttpBackend;
use std::sync::Arc;
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let surface_arg = || {
        Arg::new("surface")
            .long("surface")
            .default_value("search")
            .value_parser(value_parser!(SurfaceKind))
            .help("Listing surface: category, best-sellers, flash-sale or search")
    };

    let cli = Command::new("discovery-probe")
        .version(discovery_http::VERSION)
        .about("Drive the product discovery engine against a live backend")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .help("Override the backend base URL"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("tree")
                .about("Print the category tree")
                .arg(
                    Arg::new("expand")
                        .long("expand")
                        .help("Slug or id of a category to expand down to"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("Fetch one listing page")
                .arg(surface_arg())
                .arg(
                    Arg::new("query")
                        .default_value("")
                        .help("Listing query string, e.g. 'brand=Apple&page=2'"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the page as JSON"),
                ),
        )
        .subcommand(
            Command::new("url")
                .about("Normalize a listing query string without touching the network")
                .arg(surface_arg())
                .arg(Arg::new("query").required(true).help("Listing query string")),
        );

    let matches = cli.get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config.log_filter)?;

    match matches.subcommand() {
        Some(("tree", args)) => run_tree(&config, args).await,
        Some(("list", args)) => run_list(&config, args).await,
        Some(("url", args)) => run_url(&config, args),
        _ => Ok(()),
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<DiscoveryConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DiscoveryConfig::load(path)?,
        None => DiscoveryConfig::new().with_env_overrides(),
    };
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.as_str());
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

fn store(config: &DiscoveryConfig, backend: Arc<HttpBackend>) -> Arc<CategoryTreeStore> {
    Arc::new(CategoryTreeStore::with_capacity(
        backend,
        config.category_cache_capacity,
    ))
}

async fn run_tree(config: &DiscoveryConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let store = store(config, backend);

    let roots = store.load_roots().await.context("loading root categories")?;
    let Some(expand) = args.get_one::<String>("expand") else {
        for root in &roots {
            print_node(root);
        }
        return Ok(());
    };

    let reference = match expand.parse() {
        Ok(id) => CategoryRef::Id(id),
        Err(_) => CategoryRef::Slug(expand.clone()),
    };
    let node = store
        .locate(&reference)
        .await?
        .with_context(|| format!("no category matches '{expand}'"))?;
    if !node.children.is_loaded() && node.can_have_children() {
        store.load_children(node.id).await?;
    }

    let tree = store.snapshot();
    let path = store.path_to(node.id).unwrap_or_default();
    let trail: Vec<&str> = path.iter().map(|n| n.name.as_str()).collect();
    println!("{}", trail.join(" > "));
    for child in tree.children_of(node.id).unwrap_or_default() {
        print!("  ");
        print_node(child);
    }
    Ok(())
}

fn print_node(node: &CategoryNode) {
    println!("{:>6}  {:<24} level {}", node.id, node.slug, node.level);
}

async fn run_list(config: &DiscoveryConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let kind = args
        .get_one::<SurfaceKind>("surface")
        .copied()
        .unwrap_or(SurfaceKind::Search);
    let query = args.get_one::<String>("query").map_or("", String::as_str);

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let surface = ListingSurface::from_config(config, kind, store(config, backend.clone()), backend);
    let outcome = surface.mount(query).await?;
    let view = outcome.view().cloned().unwrap_or_else(|| surface.view());

    if args.get_flag("json") {
        if let Some(page) = &view.result {
            println!("{}", serde_json::to_string_pretty(&**page)?);
        }
        return Ok(());
    }

    print_view(&view);
    if let Some(pagination) = surface.pagination() {
        let window: Vec<String> = pagination
            .window
            .iter()
            .map(|slot| match slot {
                PageSlot::Page { index, current: true } => format!("[{}]", index + 1),
                PageSlot::Page { index, .. } => (index + 1).to_string(),
                PageSlot::Ellipsis => "...".to_string(),
            })
            .collect();
        println!("pages: {}", window.join(" "));
    }
    println!("url: ?{}", surface.to_url());
    Ok(())
}

fn print_view(view: &ListingView) {
    println!("{} (generation {})", view.phase, view.generation);
    if let Some(notice) = &view.notice {
        println!("! {}", notice.message());
    }
    for item in view.items() {
        let discount = item
            .discount_percent
            .map(|d| format!(" -{d}%"))
            .unwrap_or_default();
        println!("{:>8}  {:<40} {:>10}{}", item.id, item.name, item.price, discount);
    }
}

fn run_url(config: &DiscoveryConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let kind = args
        .get_one::<SurfaceKind>("surface")
        .copied()
        .unwrap_or(SurfaceKind::Search);
    let query = args.get_one::<String>("query").map_or("", String::as_str);

    let state = from_url(query, config.profile(kind));
    println!("canonical: ?{}", to_url(&state));

    // No tree is loaded offline, so only category-free states resolve.
    let tree = discovery_catalog::CategoryTree::new();
    match build(&state, &tree) {
        QueryPlan::Fetch(params) => {
            let pairs: Vec<String> = params
                .to_pairs()
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("request:   {}", pairs.join("&"));
        }
        QueryPlan::NoOp(reason) => println!("request:   none ({reason})"),
    }
    Ok(())
}
