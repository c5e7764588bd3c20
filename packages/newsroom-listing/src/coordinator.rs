//! Reconciliation coordinator
//!
//! Tracks which fetch session is current and turns that session's completion
//! into the final pager, facet years and result summary. Completions of
//! superseded sessions are ignored.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::facet::{years_of, YearFacet};
use crate::pagination::{total_pages, PaginationPlan};
use crate::session::SessionId;
use crate::walker::{Completion, WalkSummary};
use crate::window::{DisplayWindow, ResultSummary};

/// Everything that changes once a session's total is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub session_id: SessionId,
    pub final_total: u64,
    pub total_pages: usize,
    /// `None` when every result fits on one page
    pub pagination: Option<PaginationPlan>,
    /// Facet years, newest first
    pub years: Vec<i32>,
    pub summary: Option<ResultSummary>,
}

#[derive(Debug, Default)]
struct CurrentSession {
    id: Option<SessionId>,
    page: usize,
    reconciled: bool,
    facet: Arc<YearFacet>,
}

pub struct ListingCoordinator {
    page_size: usize,
    current: Mutex<CurrentSession>,
    tx: watch::Sender<Option<Reconciliation>>,
}

impl ListingCoordinator {
    pub fn new(page_size: usize) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            page_size,
            current: Mutex::new(CurrentSession::default()),
            tx,
        }
    }

    /// Facet shared with the filter chain of the current session
    pub fn facet(&self) -> Arc<YearFacet> {
        Arc::clone(&self.current.lock().facet)
    }

    /// Make `session_id` current for display page `page`
    ///
    /// Starts an empty year facet. A superseded session still draining keeps
    /// writing to its own facet, never to this one.
    pub fn begin_session(&self, session_id: SessionId, page: usize) {
        let mut current = self.current.lock();
        if let Some(previous) = current.id {
            debug!("Session {} superseded by {}", previous, session_id);
        }
        *current = CurrentSession {
            id: Some(session_id),
            page: page.max(1),
            reconciled: false,
            facet: Arc::new(YearFacet::new()),
        };
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current.lock().id
    }

    /// Apply a completion; `None` for stale or already reconciled sessions
    pub fn reconcile(&self, summary: WalkSummary) -> Option<Reconciliation> {
        let reconciliation = {
            let mut current = self.current.lock();
            if current.id != Some(summary.session_id) {
                info!(
                    "Ignoring stale completion of session {}",
                    summary.session_id
                );
                return None;
            }
            if current.reconciled {
                debug!("Session {} already reconciled", summary.session_id);
                return None;
            }
            current.reconciled = true;
            self.build(&summary, current.page, &current.facet)
        };

        info!(
            "Session {} reconciled: {} results over {} pages",
            reconciliation.session_id, reconciliation.final_total, reconciliation.total_pages
        );
        self.tx.send_replace(Some(reconciliation.clone()));
        Some(reconciliation)
    }

    /// Wait for a walker completion and reconcile it
    ///
    /// `None` when the session was aborted or is no longer current.
    pub async fn await_completion(&self, completion: Completion) -> Option<Reconciliation> {
        let session_id = completion.session_id();
        match completion.wait().await {
            Some(summary) => self.reconcile(summary),
            None => {
                debug!("Session {} ended without completing", session_id);
                None
            }
        }
    }

    /// Receiver for widgets that depend on the final total
    pub fn subscribe(&self) -> watch::Receiver<Option<Reconciliation>> {
        self.tx.subscribe()
    }

    fn build(&self, summary: &WalkSummary, page: usize, facet: &YearFacet) -> Reconciliation {
        let total_pages = total_pages(summary.final_total, self.page_size);
        let pagination = (summary.final_total > self.page_size as u64)
            .then(|| PaginationPlan::compute(total_pages, page));

        let years = if facet.is_empty() {
            years_of(&summary.matches)
        } else {
            facet.years()
        };

        Reconciliation {
            session_id: summary.session_id,
            final_total: summary.final_total,
            total_pages,
            pagination,
            years,
            summary: DisplayWindow::select(page, self.page_size).summary(summary.final_total),
        }
    }
}
