//! Lazy index walker
//!
//! Walks the index chunk by chunk, testing records against a predicate. The
//! foreground phase stops as soon as enough matches exist to fill the display
//! window; a background task then drains the rest of the index so the final
//! match count can be reported through a one-shot `Completion`.
//!
//! Requests within a session are strictly sequential. The transport may serve
//! fewer records than asked for; only an empty page or reaching the reported
//! total ends the walk.

use newsroom_index::{ArticleIndex, ArticleRecord, IndexPage};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::ListingConfig;
use crate::error::Result;
use crate::predicate::ArticlePredicate;
use crate::session::{FetchSession, SessionHandle, SessionId};

/// Final state of a drained session
#[derive(Debug, Clone)]
pub struct WalkSummary {
    pub session_id: SessionId,
    pub final_total: u64,
    /// Every match of the session, in index order
    pub matches: Vec<ArticleRecord>,
}

/// Resolves once the session has seen the whole index
///
/// Never resolves for an aborted session: `wait` yields `None`.
#[derive(Debug)]
pub struct Completion {
    session_id: SessionId,
    rx: oneshot::Receiver<WalkSummary>,
}

impl Completion {
    fn channel(session_id: SessionId) -> (oneshot::Sender<WalkSummary>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { session_id, rx })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn wait(self) -> Option<WalkSummary> {
        self.rx.await.ok()
    }

    /// Non-blocking check; `None` while the drain is still running
    pub fn try_take(&mut self) -> Option<WalkSummary> {
        self.rx.try_recv().ok()
    }
}

/// Result of the foreground phase
#[derive(Debug)]
pub struct WalkOutcome {
    pub session: SessionHandle,
    /// Matches found before the walk stopped; at least `target` unless the
    /// index was exhausted or the transport failed
    pub matches: Vec<ArticleRecord>,
    pub completion: Completion,
}

/// One bounded round trip
#[derive(Debug, Clone)]
pub struct BoundedPage {
    pub items: Vec<ArticleRecord>,
    pub total: u64,
}

#[derive(Clone)]
pub struct IndexWalker {
    index: Arc<dyn ArticleIndex>,
    path: String,
    collection: String,
    chunk_size: usize,
}

impl IndexWalker {
    pub fn new(
        index: Arc<dyn ArticleIndex>,
        path: impl Into<String>,
        collection: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            index,
            path: path.into(),
            collection: collection.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(index: Arc<dyn ArticleIndex>, config: &ListingConfig) -> Self {
        Self::new(
            index,
            config.index_path.clone(),
            config.collection.clone(),
            config.chunk_size,
        )
    }

    /// Single round trip of `limit` records at `offset`, total known at once
    pub async fn fetch_bounded(&self, limit: usize, offset: usize) -> Result<BoundedPage> {
        let page = self
            .index
            .fetch_page(&self.path, &self.collection, limit, offset)
            .await?;
        debug!(
            "Bounded fetch of {}: {} records at offset {} (total {})",
            self.collection,
            page.data.len(),
            offset,
            page.total
        );
        Ok(BoundedPage {
            total: page.total as u64,
            items: page.data,
        })
    }

    /// Walk under a fresh session
    pub async fn walk(
        &self,
        predicate: Arc<dyn ArticlePredicate>,
        target: usize,
    ) -> Result<WalkOutcome> {
        self.walk_session(SessionId::new(), predicate, target).await
    }

    /// Walk until `target` matches are found or the index is exhausted
    ///
    /// A transport failure aborts the session but still returns the partial
    /// matches. Only a strict-mode predicate failure is an `Err`.
    pub async fn walk_session(
        &self,
        session_id: SessionId,
        predicate: Arc<dyn ArticlePredicate>,
        target: usize,
    ) -> Result<WalkOutcome> {
        let session = SessionHandle::new(FetchSession::start(session_id));
        let (tx, completion) = Completion::channel(session_id);
        info!(
            "Session {} walking {} for {} matches",
            session_id, self.collection, target
        );

        let mut matches = Vec::new();
        let mut offset = 0;
        let mut exhausted = false;

        while matches.len() < target {
            let page = match self.fetch_chunk(offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Session {} aborted in foreground: {}", session_id, e);
                    session.with(|s| s.abort(e.to_string()))?;
                    drop(tx);
                    return Ok(WalkOutcome {
                        session,
                        matches,
                        completion,
                    });
                }
            };

            let last = page.is_last();
            offset = page.next_offset();
            if let Err(e) = self.absorb(&session, predicate.as_ref(), page, &mut matches) {
                session.with(|s| s.abort(e.to_string()))?;
                return Err(e);
            }
            if last {
                exhausted = true;
                break;
            }
        }

        if exhausted {
            let final_total = session.with(FetchSession::complete)?;
            info!(
                "Session {} exhausted the index in foreground: {} matches",
                session_id, final_total
            );
            let summary = WalkSummary {
                session_id,
                final_total,
                matches: matches.clone(),
            };
            if tx.send(summary).is_err() {
                debug!("Session {} completion dropped before send", session_id);
            }
        } else {
            session.with(FetchSession::begin_drain)?;
            info!(
                "Session {} reached {} matches at offset {}, draining in background",
                session_id,
                matches.len(),
                offset
            );
            let walker = self.clone();
            let drain_session = session.clone();
            let seen = matches.clone();
            tokio::spawn(async move {
                walker.drain(drain_session, predicate, offset, seen, tx).await;
            });
        }

        Ok(WalkOutcome {
            session,
            matches,
            completion,
        })
    }

    async fn drain(
        self,
        session: SessionHandle,
        predicate: Arc<dyn ArticlePredicate>,
        mut offset: usize,
        mut matches: Vec<ArticleRecord>,
        tx: oneshot::Sender<WalkSummary>,
    ) {
        let session_id = session.id();
        loop {
            let page = match self.fetch_chunk(offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Session {} aborted while draining: {}", session_id, e);
                    let _ = session.with(|s| s.abort(e.to_string()));
                    return;
                }
            };

            let last = page.is_last();
            offset = page.next_offset();
            if let Err(e) = self.absorb(&session, predicate.as_ref(), page, &mut matches) {
                warn!("Session {} aborted while draining: {}", session_id, e);
                let _ = session.with(|s| s.abort(e.to_string()));
                return;
            }
            if last {
                break;
            }
        }

        let final_total = match session.with(FetchSession::complete) {
            Ok(total) => total,
            Err(e) => {
                warn!("Session {} could not complete: {}", session_id, e);
                return;
            }
        };
        info!(
            "Session {} drained: {} matches in total",
            session_id, final_total
        );

        let summary = WalkSummary {
            session_id,
            final_total,
            matches,
        };
        if tx.send(summary).is_err() {
            debug!("Session {} completion no longer awaited", session_id);
        }
    }

    async fn fetch_chunk(&self, offset: usize) -> Result<IndexPage> {
        let page = self
            .index
            .fetch_page(&self.path, &self.collection, self.chunk_size, offset)
            .await?;
        debug!(
            "Fetched {} records of {} at offset {} (total {})",
            page.data.len(),
            self.collection,
            offset,
            page.total
        );
        Ok(page)
    }

    fn absorb(
        &self,
        session: &SessionHandle,
        predicate: &dyn ArticlePredicate,
        page: IndexPage,
        matches: &mut Vec<ArticleRecord>,
    ) -> Result<()> {
        let records = page.data.len();
        let before = matches.len();
        for record in page.data {
            if predicate.test(&record)? {
                matches.push(record);
            }
        }
        let found = matches.len() - before;
        session.with(|s| s.record_page(records, found))
    }
}
