/*
 * Newsroom Listing - Incremental Filtered Pagination
 *
 * Renders filtered, paginated article listings over a remote index without
 * downloading the whole index up front.
 *
 * Architecture:
 * - Predicates + FilterChain (query, category, date range, year)
 * - Lazy IndexWalker (foreground walk to the display window, background drain)
 * - ListingCoordinator (session identity, year facet, reconciliation)
 * - Pagination window calculator
 * - NewsListing service (search / category / plain modes)
 */

// Public modules
pub mod config;
pub mod coordinator;
pub mod description;
pub mod error;
pub mod facet;
pub mod listing;
pub mod pagination;
pub mod predicate;
pub mod request;
pub mod sanitize;
pub mod session;
pub mod walker;
pub mod window;

// Re-exports
pub use config::{ConfigError, FieldPolicy, ListingConfig, Validatable};
pub use coordinator::{ListingCoordinator, Reconciliation};
pub use description::{extract_description, DEFAULT_MAX_DESCRIPTION_CHARS};
pub use error::{ListingError, Result};
pub use facet::{years_of, YearFacet};
pub use listing::{ListingItem, ListingPage, NewsListing, SearchState, TotalState};
pub use pagination::{total_pages, PagerEntry, PaginationPlan};
pub use predicate::{
    matches_category, matches_date_range, matches_query, matches_year, ArticlePredicate,
    DateRange, Filter, FilterChain,
};
pub use request::{link_with_param, BlockConfig, ListingMode, QueryParams, YearParam};
pub use sanitize::{sanitize_query, sanitize_query_with_limit};
pub use session::{FetchSession, SessionHandle, SessionId, SessionSnapshot, SessionState};
pub use walker::{BoundedPage, Completion, IndexWalker, WalkOutcome, WalkSummary};
pub use window::{DisplayWindow, ProvisionalSummary, ResultSummary};
