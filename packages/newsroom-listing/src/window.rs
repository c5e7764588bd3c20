//! Display window selection
//!
//! Maps a 1-based page offset onto a half-open `[start, end)` range of the
//! filtered match list.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayWindow {
    pub start: usize,
    pub end: usize,
}

impl DisplayWindow {
    /// Window for `page_offset` (0 is treated as 1)
    pub fn select(page_offset: usize, page_size: usize) -> Self {
        let start = (page_offset.max(1) - 1).saturating_mul(page_size);
        Self {
            start,
            end: start.saturating_add(page_size),
        }
    }

    /// Window covering the first page, used when the transport already sliced
    pub fn first(page_size: usize) -> Self {
        Self::select(1, page_size)
    }

    /// Indices of the window that exist in a list of `len` items
    pub fn clamp(&self, len: usize) -> Range<usize> {
        self.start.min(len)..self.end.min(len)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.clamp(items.len())]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// "Showing X - Y of Z" line for this window; `None` when there are no
    /// results
    pub fn summary(&self, total: u64) -> Option<ResultSummary> {
        if total == 0 {
            return None;
        }
        Some(ResultSummary {
            first: self.start as u64 + 1,
            last: (self.end as u64).min(total),
            total,
        })
    }

    /// Count line over the matches found so far; `None` when the window is
    /// empty
    pub fn provisional_summary(&self, found: usize) -> Option<ProvisionalSummary> {
        let range = self.clamp(found);
        if range.is_empty() {
            return None;
        }
        Some(ProvisionalSummary {
            first: range.start as u64 + 1,
            last: range.end as u64,
        })
    }
}

/// Count line shown before the total is known: "Showing X - Y results"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalSummary {
    pub first: u64,
    pub last: u64,
}

impl std::fmt::Display for ProvisionalSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Showing {} - {} results", self.first, self.last)
    }
}

/// Result count line shown above a filtered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub first: u64,
    pub last: u64,
    pub total: u64,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Showing {} - {} of {} results",
            self.first, self.last, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_third_page() {
        let window = DisplayWindow::select(3, 10);
        assert_eq!((window.start, window.end), (20, 30));
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn test_select_zero_is_first_page() {
        assert_eq!(DisplayWindow::select(0, 10), DisplayWindow::first(10));
    }

    #[test]
    fn test_clamp_and_slice() {
        let items: Vec<u32> = (0..25).collect();

        let window = DisplayWindow::select(3, 10);
        assert_eq!(window.clamp(items.len()), 20..25);
        assert_eq!(window.slice(&items), &[20, 21, 22, 23, 24]);

        let past_end = DisplayWindow::select(9, 10);
        assert!(past_end.slice(&items).is_empty());
    }

    #[test]
    fn test_summary_caps_last_at_total() {
        let summary = DisplayWindow::select(3, 10).summary(25).unwrap();
        assert_eq!(summary.to_string(), "Showing 21 - 25 of 25 results");

        let full = DisplayWindow::select(1, 10).summary(42).unwrap();
        assert_eq!(full.to_string(), "Showing 1 - 10 of 42 results");
    }

    #[test]
    fn test_summary_none_without_results() {
        assert!(DisplayWindow::select(1, 10).summary(0).is_none());
    }

    #[test]
    fn test_provisional_summary() {
        let window = DisplayWindow::select(1, 10);
        assert_eq!(
            window.provisional_summary(7).unwrap().to_string(),
            "Showing 1 - 7 results"
        );
        assert!(window.provisional_summary(0).is_none());
        assert!(DisplayWindow::select(2, 10).provisional_summary(10).is_none());
    }
}
