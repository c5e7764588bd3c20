//! Newslist CLI
//!
//! Renders one listing page from a query-index JSON file, then waits for the
//! background walk and prints the reconciled total, pager and year facet.
//!
//! # Usage
//!
//! ```bash
//! # Search
//! newslist --index query-index.json --block query= --q "vaccine trial"
//!
//! # Category browse, page 2 of 2023
//! newslist --index query-index.json --block "category=press releases" --year 2023 --page 2
//!
//! # Plain browse with a raw query string
//! newslist --index query-index.json --query-string "from_date=2023-01-01&to_date=2023-06-30"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use newsroom_index::JsonFileIndex;
use newsroom_listing::{
    link_with_param, BlockConfig, FieldPolicy, ListingConfig, ListingItem, ListingPage,
    NewsListing, PagerEntry, PaginationPlan, QueryParams, ResultSummary, SearchState, TotalState,
    Validatable,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newslist")]
#[command(about = "Render a filtered, paginated article listing", long_about = None)]
struct Cli {
    /// Query-index JSON file
    #[arg(short, long)]
    index: PathBuf,

    /// YAML configuration (schema v1)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block configuration as key=value (`query=` for search)
    #[arg(short, long, default_value = "")]
    block: String,

    /// Raw request query string
    #[arg(long)]
    query_string: Option<String>,

    /// Search keywords
    #[arg(long)]
    q: Option<String>,

    /// Range start (YYYY-MM-DD)
    #[arg(long)]
    from_date: Option<String>,

    /// Range end (YYYY-MM-DD)
    #[arg(long)]
    to_date: Option<String>,

    #[arg(long)]
    year: Option<String>,

    #[arg(long)]
    page: Option<String>,

    /// Category field policy (strict or lenient), overriding the config
    #[arg(long)]
    field_policy: Option<String>,

    /// Print the immediate page only
    #[arg(long)]
    no_wait: bool,

    /// Print the final page as JSON
    #[arg(long)]
    json: bool,
}

/// JSON rendering of a listing page
#[derive(Serialize)]
struct PageView<'a> {
    items: &'a [ListingItem],
    total: TotalState,
    summary: Option<ResultSummary>,
    pagination: Option<&'a PaginationPlan>,
    years: &'a [i32],
    search: Option<&'a SearchState>,
}

impl<'a> From<&'a ListingPage> for PageView<'a> {
    fn from(page: &'a ListingPage) -> Self {
        Self {
            items: &page.items,
            total: page.total,
            summary: page.summary,
            pagination: page.pagination.as_ref(),
            years: &page.years,
            search: page.search.as_ref(),
        }
    }
}

impl Cli {
    /// Query string with individual flags applied over `--query-string`
    fn query(&self) -> String {
        let mut query = self.query_string.clone().unwrap_or_default();
        let overrides = [
            ("q", &self.q),
            ("from_date", &self.from_date),
            ("to_date", &self.to_date),
            ("year", &self.year),
            ("page", &self.page),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                query = link_with_param("", &query, name, value)
                    .trim_start_matches('?')
                    .to_string();
            }
        }
        query
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ListingConfig::from_yaml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ListingConfig::default(),
    };
    if let Some(policy) = &cli.field_policy {
        config.field_policy = FieldPolicy::parse(policy).context("invalid --field-policy")?;
    }
    config.validate().context("invalid listing config")?;

    let index = Arc::new(JsonFileIndex::from_file(&cli.index));
    let listing = NewsListing::new(index, config);

    let block = BlockConfig::parse(&cli.block);
    let query = cli.query();
    let params = QueryParams::parse(&query);
    info!("Rendering {:?} with ?{}", block.mode(), query);

    let mut page = listing
        .render(&block, &params)
        .await
        .context("rendering listing")?;

    if cli.json {
        if !cli.no_wait {
            listing.reconcile(&mut page).await;
        }
        let view = PageView::from(&page);
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    // links keep the normalized parameters
    let base = params.to_query_string();
    print_page(&page, &base);

    if cli.no_wait || !page.is_pending() {
        return Ok(());
    }

    match listing.reconcile(&mut page).await {
        Some(_) => print_reconciled(&page, &base),
        None => println!("\nTotal unavailable: the index walk did not complete"),
    }
    Ok(())
}

fn print_page(page: &ListingPage, base: &str) {
    match &page.search {
        Some(SearchState::Form) => {
            println!("Enter keywords to search");
            return;
        }
        Some(SearchState::MissingKeyword) => {
            println!("At least one keyword is required.");
            return;
        }
        Some(SearchState::Results { query }) => {
            println!("Results for \"{}\"", query);
            if page.items.is_empty() {
                println!("0 RESULTS WERE FOUND");
            } else {
                println!("ALL RESULTS");
            }
        }
        None => {}
    }
    if let Some(provisional) = page.provisional {
        println!("{}", provisional);
    }

    for item in &page.items {
        println!();
        println!("{}  {}", item.display_date(), item.title);
        println!("  {}", item.path);
        if !item.description_html.is_empty() {
            println!("  {}", item.description_html);
        }
    }

    if !page.years.is_empty() {
        println!();
        print_years(&page.years, base);
    }
    if let TotalState::Known(total) = page.total {
        print_totals(page, total, base);
    }
}

fn print_reconciled(page: &ListingPage, base: &str) {
    if let TotalState::Known(total) = page.total {
        print_totals(page, total, base);
    }
    if !page.years.is_empty() {
        print_years(&page.years, base);
    }
}

fn print_totals(page: &ListingPage, total: u64, base: &str) {
    println!("\nTotal: {}", total);
    if let Some(summary) = page.summary {
        println!("{}", summary);
    }
    if let Some(plan) = &page.pagination {
        println!("{}", render_pager(plan));
        if plan.has_previous() {
            println!("Previous: {}", page_link(base, plan.current_page - 1));
        }
        if plan.has_next() {
            println!("Next: {}", page_link(base, plan.current_page + 1));
        }
    }
}

fn page_link(base: &str, page: usize) -> String {
    link_with_param("", base, "page", &page.to_string())
}

/// Selecting a year starts again from the first page
fn year_link(base: &str, year: i32) -> String {
    let with_year = link_with_param("", base, "year", &year.to_string());
    link_with_param("", &with_year, "page", "")
}

fn print_years(years: &[i32], base: &str) {
    println!("Years: {}", join_years(years));
    for &year in years {
        println!("  {}: {}", year, year_link(base, year));
    }
}

fn render_pager(plan: &PaginationPlan) -> String {
    plan.entries()
        .iter()
        .map(|entry| match entry {
            PagerEntry::Previous { enabled: true } => "<".to_string(),
            PagerEntry::Previous { enabled: false } => "(<)".to_string(),
            PagerEntry::Page {
                number,
                is_current: true,
            } => format!("[{}]", number),
            PagerEntry::Page { number, .. } => number.to_string(),
            PagerEntry::Ellipsis => "...".to_string(),
            PagerEntry::Next { enabled: true } => ">".to_string(),
            PagerEntry::Next { enabled: false } => "(>)".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_years(years: &[i32]) -> String {
    years
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
