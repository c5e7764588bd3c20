//! Year facet state
//!
//! Years are kept in first-seen order. Index order is reverse-chronological,
//! so the selector lists the newest year first.

use newsroom_index::ArticleRecord;
use parking_lot::Mutex;

/// Years observed while walking the current session
///
/// Owned by the `ListingCoordinator` and shared by `Arc` with the filter chain
/// that observes records. Every navigation starts a fresh facet.
#[derive(Debug, Default)]
pub struct YearFacet {
    years: Mutex<Vec<i32>>,
}

impl YearFacet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, year: i32) {
        let mut years = self.years.lock();
        if !years.contains(&year) {
            years.push(year);
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.years.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.years.lock().is_empty()
    }
}

/// Distinct publish years of `records`, first-seen order
pub fn years_of(records: &[ArticleRecord]) -> Vec<i32> {
    let mut years = Vec::new();
    for year in records.iter().filter_map(ArticleRecord::published_year) {
        if !years.contains(&year) {
            years.push(year);
        }
    }
    years
}
