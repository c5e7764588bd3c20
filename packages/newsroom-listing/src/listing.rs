//! Listing service
//!
//! Turns a block configuration and request parameters into the page of
//! articles to display, then settles the total once the walk completes.

use chrono::NaiveDate;
use newsroom_index::{ArticleIndex, ArticleRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::ListingConfig;
use crate::coordinator::{ListingCoordinator, Reconciliation};
use crate::description::extract_description;
use crate::error::Result;
use crate::facet::years_of;
use crate::pagination::{total_pages, PaginationPlan};
use crate::predicate::{DateRange, Filter, FilterChain};
use crate::request::{BlockConfig, ListingMode, QueryParams, YearParam};
use crate::sanitize::sanitize_query_with_limit;
use crate::session::{SessionHandle, SessionId};
use crate::walker::{Completion, IndexWalker};
use crate::window::{DisplayWindow, ProvisionalSummary, ResultSummary};

/// Result count, known up front only for unfiltered listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TotalState {
    Known(u64),
    Pending,
}

/// What the search header shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchState {
    /// No `q` parameter: just the search form
    Form,
    /// `q` present but empty after sanitizing
    MissingKeyword,
    Results { query: String },
}

/// One article card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingItem {
    pub title: String,
    pub path: String,
    pub published_on: Option<NaiveDate>,
    pub description_html: String,
}

impl ListingItem {
    pub fn from_record(record: &ArticleRecord, max_description_chars: usize) -> Self {
        Self {
            title: record.title.clone(),
            path: record.path.clone(),
            published_on: record.published_date(),
            description_html: extract_description(record, max_description_chars),
        }
    }

    /// "May 02, 2024"
    pub fn display_date(&self) -> String {
        self.published_on
            .map(|date| date.format("%B %d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// One rendered listing
#[derive(Debug)]
pub struct ListingPage {
    pub mode: ListingMode,
    pub session_id: SessionId,
    pub items: Vec<ListingItem>,
    pub window: DisplayWindow,
    pub total: TotalState,
    /// Present once the total is known and exceeds one page
    pub pagination: Option<PaginationPlan>,
    pub provisional: Option<ProvisionalSummary>,
    pub summary: Option<ResultSummary>,
    /// Year selector entries (category listings only)
    pub years: Vec<i32>,
    pub search: Option<SearchState>,
    /// Walk progress; `None` when nothing was walked
    pub session: Option<SessionHandle>,
    completion: Option<Completion>,
}

impl ListingPage {
    fn new(mode: ListingMode, session_id: SessionId, window: DisplayWindow) -> Self {
        Self {
            mode,
            session_id,
            items: Vec::new(),
            window,
            total: TotalState::Pending,
            pagination: None,
            provisional: None,
            summary: None,
            years: Vec::new(),
            search: None,
            session: None,
            completion: None,
        }
    }

    /// True while a completion is still outstanding
    pub fn is_pending(&self) -> bool {
        self.completion.is_some()
    }
}

pub struct NewsListing {
    config: ListingConfig,
    walker: IndexWalker,
    coordinator: Arc<ListingCoordinator>,
}

impl NewsListing {
    pub fn new(index: Arc<dyn ArticleIndex>, config: ListingConfig) -> Self {
        Self {
            walker: IndexWalker::from_config(index, &config),
            coordinator: Arc::new(ListingCoordinator::new(config.page_size)),
            config,
        }
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<ListingCoordinator> {
        &self.coordinator
    }

    /// Render the listing for `block` and `params`
    ///
    /// Starts a new session; a render still in flight becomes stale.
    ///
    /// # Errors
    ///
    /// - `ListingError::FieldMissing` under the strict field policy
    /// - `ListingError::Transport` when an unfiltered page cannot be fetched
    ///
    /// A transport failure while walking is not an error: the page shows the
    /// matches found so far and its total stays pending.
    pub async fn render(&self, block: &BlockConfig, params: &QueryParams) -> Result<ListingPage> {
        let mode = block.mode();
        let session_id = SessionId::new();
        self.coordinator.begin_session(session_id, params.page);
        let window = DisplayWindow::select(params.page, self.config.page_size);
        let policy = self.config.field_policy;

        match mode.clone() {
            ListingMode::Search => {
                let query =
                    sanitize_query_with_limit(params.q.as_deref(), self.config.query_max_chars);
                if query.is_empty() {
                    let state = match params.q {
                        None => SearchState::Form,
                        Some(_) => SearchState::MissingKeyword,
                    };
                    info!("Search session {} without keyword: {:?}", session_id, state);
                    let mut page = ListingPage::new(mode, session_id, window);
                    page.total = TotalState::Known(0);
                    page.search = Some(state);
                    return Ok(page);
                }

                let chain = FilterChain::new(policy).with(Filter::query(&query));
                let mut page = self.walk(mode, session_id, window, chain).await?;
                page.search = Some(SearchState::Results { query });
                Ok(page)
            }
            ListingMode::Category { key, value } => {
                let mut chain = FilterChain::new(policy)
                    .with(Filter::category(key, value))
                    .with_facet(self.coordinator.facet());
                let range = params.date_range();
                if range.is_active() {
                    chain = chain.with(Filter::DateRange(range));
                } else if let Some(year) = params.year {
                    chain = chain.with(match year {
                        YearParam::Selected(year) => Filter::Year(year),
                        YearParam::Malformed => Filter::DateRange(DateRange::Malformed),
                    });
                }

                self.walk(mode, session_id, window, chain).await
            }
            ListingMode::Plain => {
                let range = params.date_range();
                if range.is_active() {
                    let chain = FilterChain::new(policy).with(Filter::DateRange(range));
                    return self.walk(mode, session_id, window, chain).await;
                }
                self.bounded(mode, session_id, params.page).await
            }
        }
    }

    /// Wait for the render's walk to finish and apply the final total
    ///
    /// `None` when nothing is pending, the walk was aborted, or a newer render
    /// superseded this one.
    pub async fn reconcile(&self, page: &mut ListingPage) -> Option<Reconciliation> {
        let completion = page.completion.take()?;
        let reconciliation = self.coordinator.await_completion(completion).await?;

        page.total = TotalState::Known(reconciliation.final_total);
        page.pagination = reconciliation.pagination.clone();
        page.summary = reconciliation.summary;
        if matches!(page.mode, ListingMode::Category { .. }) {
            page.years = reconciliation.years.clone();
        }
        Some(reconciliation)
    }

    async fn walk(
        &self,
        mode: ListingMode,
        session_id: SessionId,
        window: DisplayWindow,
        chain: FilterChain,
    ) -> Result<ListingPage> {
        info!(
            "Session {} rendering {:?} window {}..{} with filters: {}",
            session_id,
            mode,
            window.start,
            window.end,
            chain.describe()
        );
        let outcome = self
            .walker
            .walk_session(session_id, Arc::new(chain), window.end)
            .await?;

        let mut page = ListingPage::new(mode, session_id, window);
        page.items = self.items(window.slice(&outcome.matches));
        page.provisional = window.provisional_summary(outcome.matches.len());
        if matches!(page.mode, ListingMode::Category { .. }) {
            // immediate matches seed the year selector until the walk completes
            page.years = years_of(&outcome.matches);
        }
        page.session = Some(outcome.session);
        page.completion = Some(outcome.completion);
        Ok(page)
    }

    async fn bounded(
        &self,
        mode: ListingMode,
        session_id: SessionId,
        page_number: usize,
    ) -> Result<ListingPage> {
        let page_size = self.config.page_size;
        let requested = DisplayWindow::select(page_number, page_size);
        info!(
            "Session {} fetching page {} of {} unfiltered",
            session_id, page_number, self.config.collection
        );
        let fetched = self.walker.fetch_bounded(page_size, requested.start).await?;

        // the transport already sliced the page
        let window = DisplayWindow::first(page_size);
        let mut page = ListingPage::new(mode, session_id, window);
        page.items = self.items(window.slice(&fetched.items));
        page.total = TotalState::Known(fetched.total);
        page.summary = requested.summary(fetched.total);
        page.pagination = (fetched.total > page_size as u64).then(|| {
            PaginationPlan::compute(total_pages(fetched.total, page_size), page_number)
        });
        Ok(page)
    }

    fn items(&self, records: &[ArticleRecord]) -> Vec<ListingItem> {
        records
            .iter()
            .map(|record| ListingItem::from_record(record, self.config.description_max_chars))
            .collect()
    }
}
