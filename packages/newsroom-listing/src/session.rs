//! Fetch session state machine
//!
//! One session per navigation. The walker drives it through
//! `Walking -> Draining -> Completed`, or into `Aborted` on a transport or
//! strict-mode failure; snapshots expose its progress to callers.

use crate::error::{ListingError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of one fetch session (one navigation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle
///
/// `Walking` is the foreground phase, `Draining` the background phase that
/// runs past the display target to learn the total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    Walking {
        started_at: DateTime<Utc>,
    },
    Draining {
        started_at: DateTime<Utc>,
        drain_started_at: DateTime<Utc>,
    },
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        final_total: u64,
    },
    Aborted {
        started_at: DateTime<Utc>,
        aborted_at: DateTime<Utc>,
        error: String,
    },
}

impl SessionState {
    pub fn state_name(&self) -> &'static str {
        match self {
            SessionState::Walking { .. } => "walking",
            SessionState::Draining { .. } => "draining",
            SessionState::Completed { .. } => "completed",
            SessionState::Aborted { .. } => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed { .. } | SessionState::Aborted { .. }
        )
    }

    fn started_at(&self) -> DateTime<Utc> {
        match self {
            SessionState::Walking { started_at }
            | SessionState::Draining { started_at, .. }
            | SessionState::Completed { started_at, .. }
            | SessionState::Aborted { started_at, .. } => *started_at,
        }
    }
}

/// Progress of one walk over the index
#[derive(Debug, Clone)]
pub struct FetchSession {
    pub id: SessionId,
    pub state: SessionState,
    pub pages_fetched: usize,
    pub records_seen: usize,
    pub matches_found: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FetchSession {
    pub fn start(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: SessionState::Walking { started_at: now },
            pages_fetched: 0,
            records_seen: 0,
            matches_found: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn invalid(&self, to: &str) -> ListingError {
        ListingError::InvalidStateTransition {
            from: self.state.state_name().to_string(),
            to: to.to_string(),
        }
    }

    /// Account for one fetched page
    pub fn record_page(&mut self, records: usize, matches: usize) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid("record_page"));
        }
        self.pages_fetched += 1;
        self.records_seen += records;
        self.matches_found += matches;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition: WALKING → DRAINING
    pub fn begin_drain(&mut self) -> Result<()> {
        match &self.state {
            SessionState::Walking { started_at } => {
                let now = Utc::now();
                self.state = SessionState::Draining {
                    started_at: *started_at,
                    drain_started_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("draining")),
        }
    }

    /// Transition: WALKING | DRAINING → COMPLETED
    pub fn complete(&mut self) -> Result<u64> {
        if self.state.is_terminal() {
            return Err(self.invalid("completed"));
        }
        let now = Utc::now();
        let started_at = self.state.started_at();
        let final_total = self.matches_found as u64;
        self.state = SessionState::Completed {
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
            final_total,
        };
        self.updated_at = now;
        Ok(final_total)
    }

    /// Transition: WALKING | DRAINING → ABORTED
    pub fn abort(&mut self, error: impl Into<String>) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid("aborted"));
        }
        let now = Utc::now();
        self.state = SessionState::Aborted {
            started_at: self.state.started_at(),
            aborted_at: now,
            error: error.into(),
        };
        self.updated_at = now;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let final_total = match &self.state {
            SessionState::Completed { final_total, .. } => Some(*final_total),
            _ => None,
        };
        SessionSnapshot {
            session_id: self.id,
            state: self.state.state_name(),
            pages_fetched: self.pages_fetched,
            matches_found: self.matches_found,
            is_complete: final_total.is_some(),
            final_total,
            aborted: matches!(self.state, SessionState::Aborted { .. }),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: &'static str,
    pub pages_fetched: usize,
    pub matches_found: usize,
    pub is_complete: bool,
    pub final_total: Option<u64>,
    pub aborted: bool,
}

/// Shared handle to a session driven by the walker
///
/// The background drain task holds the other reference.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    inner: Arc<Mutex<FetchSession>>,
}

impl SessionHandle {
    pub(crate) fn new(session: FetchSession) -> Self {
        Self {
            id: session.id,
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut FetchSession) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
