//! Session supersession tests
//!
//! A render that is still draining when the user navigates again must never
//! publish its total, pager or years.

mod common;

use async_trait::async_trait;
use newsroom_index::{ArticleIndex, InMemoryIndex, IndexPage};
use newsroom_listing::{BlockConfig, NewsListing, QueryParams, TotalState};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Holds the first request at or past `hold_from` until released
struct GatedIndex {
    inner: InMemoryIndex,
    hold_from: usize,
    armed: AtomicBool,
    held: Notify,
    release: Notify,
}

impl GatedIndex {
    fn new(inner: InMemoryIndex, hold_from: usize) -> Self {
        Self {
            inner,
            hold_from,
            armed: AtomicBool::new(true),
            held: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ArticleIndex for GatedIndex {
    async fn fetch_page(
        &self,
        path: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> newsroom_index::Result<IndexPage> {
        if offset >= self.hold_from && self.armed.swap(false, Ordering::SeqCst) {
            self.held.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_page(path, collection, limit, offset).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_superseded_drain_is_never_reconciled() {
    // "vaccine" walk on page 1 stops after the chunk at offset 35
    let index = Arc::new(GatedIndex::new(common::index(60), 42));
    let listing = NewsListing::new(index.clone(), common::config());
    let updates = listing.coordinator().subscribe();

    let mut first = listing
        .render(&BlockConfig::search(), &QueryParams::parse("q=vaccine"))
        .await
        .unwrap();
    assert!(first.is_pending());
    index.held.notified().await;

    let second = listing
        .render(&BlockConfig::default(), &QueryParams::parse("page=2"))
        .await
        .unwrap();
    assert_eq!(
        listing.coordinator().current_session(),
        Some(second.session_id)
    );

    index.release.notify_one();
    assert!(listing.reconcile(&mut first).await.is_none());
    assert_eq!(first.total, TotalState::Pending);
    assert!(first.pagination.is_none());

    // the stale walk still ran to completion
    let snapshot = first.session.as_ref().unwrap().snapshot();
    assert!(snapshot.is_complete);
    assert_eq!(snapshot.final_total, Some(15));

    assert!(updates.borrow().is_none());
}

#[tokio::test]
async fn test_stale_drain_does_not_leak_years() {
    let listing = NewsListing::new(Arc::new(common::index(60)), common::config());
    let mut updates = listing.coordinator().subscribe();

    // Blog walk drains every year in the background
    let mut stale = listing
        .render(&BlockConfig::new("category", "blog"), &QueryParams::default())
        .await
        .unwrap();
    assert!(stale.is_pending());

    let mut current = listing
        .render(
            &BlockConfig::new("category", "press releases"),
            &QueryParams::parse("from_date=2023-01-01&to_date=2023-06-30"),
        )
        .await
        .unwrap();

    assert!(listing.reconcile(&mut stale).await.is_none());

    let reconciliation = listing.reconcile(&mut current).await.unwrap();
    assert_eq!(reconciliation.session_id, current.session_id);
    assert_eq!(current.years, vec![2023]);
    assert_eq!(current.total, TotalState::Known(5));

    assert!(updates.has_changed().unwrap());
    let published = updates.borrow_and_update().clone().unwrap();
    assert_eq!(published.session_id, current.session_id);
    assert_eq!(published.years, vec![2023]);
}

#[tokio::test]
async fn test_repeated_render_supersedes_identical_request() {
    let listing = NewsListing::new(Arc::new(common::index(60)), common::config());
    let params = QueryParams::parse("q=vaccine");

    let mut first = listing
        .render(&BlockConfig::search(), &params)
        .await
        .unwrap();
    let mut second = listing
        .render(&BlockConfig::search(), &params)
        .await
        .unwrap();
    assert_ne!(first.session_id, second.session_id);

    assert!(listing.reconcile(&mut first).await.is_none());
    let reconciliation = listing.reconcile(&mut second).await.unwrap();
    assert_eq!(reconciliation.final_total, 15);

    // completion already consumed
    assert!(listing.reconcile(&mut second).await.is_none());
    assert_eq!(second.total, TotalState::Known(15));
}
