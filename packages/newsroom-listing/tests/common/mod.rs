//! Shared fixtures for listing integration tests

#![allow(dead_code)]

use newsroom_index::{ArticleRecord, InMemoryIndex};
use newsroom_listing::ListingConfig;

/// 2024-01-01T00:00:00Z
pub const NEWEST: i64 = 1_704_067_200;
/// Spacing between consecutive articles (20 days)
pub const STEP: i64 = 20 * 86_400;

/// Newest-first articles spanning 2024 back to 2020
///
/// - even articles are tagged "Press Releases, Corporate", odd ones "Blog"
/// - every fourth article mentions "vaccine" in its title
pub fn articles(n: usize) -> Vec<ArticleRecord> {
    (0..n)
        .map(|i| {
            let title = if i % 4 == 0 {
                format!("Vaccine trial update {i}")
            } else {
                format!("Quarterly results {i}")
            };
            let category = if i % 2 == 0 {
                "Press Releases, Corporate"
            } else {
                "Blog"
            };
            ArticleRecord::new(title, format!("/news/{i}"), NEWEST - i as i64 * STEP)
                .with_description(format!("Teaser {i}"))
                .with_long_description(format!(
                    "<p>RAHWAY, N.J., May 2, 2024 – Article {i} body text.</p>"
                ))
                .with_field("category", category)
        })
        .collect()
}

pub fn index(n: usize) -> InMemoryIndex {
    InMemoryIndex::with_collection("articles", articles(n))
}

pub fn is_press(record: &ArticleRecord) -> bool {
    record
        .field("category")
        .is_some_and(|c| c.contains("Press Releases"))
}

/// Small chunks so every walk drains in the background
pub fn config() -> ListingConfig {
    ListingConfig {
        chunk_size: 7,
        ..ListingConfig::default()
    }
}

pub fn paths(records: &[ArticleRecord]) -> Vec<String> {
    records.iter().map(|r| r.path.clone()).collect()
}
