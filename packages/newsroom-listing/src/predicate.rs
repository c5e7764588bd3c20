//! Article predicates
//!
//! Each `matches_*` function tests one record against one criterion. A
//! `FilterChain` ANDs several `Filter`s together, evaluating the cheapest
//! first, and is what the walker runs over the index.

use chrono::NaiveDate;
use newsroom_index::ArticleRecord;
use std::sync::Arc;
use tracing::warn;

use crate::config::FieldPolicy;
use crate::error::{ListingError, Result};
use crate::facet::YearFacet;

// ═══════════════════════════════════════════════════════════════════════════
// Single-criterion predicates
// ═══════════════════════════════════════════════════════════════════════════

/// Every whitespace-separated query token occurs in the title or in the raw
/// long description (markup included), case-insensitively
pub fn matches_query(record: &ArticleRecord, query: &str) -> bool {
    let tokens = query_tokens(query);
    matches_tokens(record, &tokens)
}

fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

fn matches_tokens(record: &ArticleRecord, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let title = record.title.to_lowercase();
    let long_description = record.long_description_html.to_lowercase();
    tokens
        .iter()
        .all(|token| title.contains(token.as_str()) || long_description.contains(token.as_str()))
}

/// Record's publish date lies in `from..=to`
///
/// A missing bound disables the filter; `from > to` matches nothing.
pub fn matches_date_range(
    record: &ArticleRecord,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> bool {
    let (Some(from), Some(to)) = (from, to) else {
        return true;
    };
    if from > to {
        return false;
    }
    record
        .published_date()
        .is_some_and(|date| date >= from && date <= to)
}

pub fn matches_year(record: &ArticleRecord, year: Option<i32>) -> bool {
    match year {
        None => true,
        Some(year) => record.published_year() == Some(year),
    }
}

/// `value` is one of the comma-separated tags in the record's `key` field
///
/// # Errors
///
/// `ListingError::FieldMissing` when the record has no `key` field.
pub fn matches_category(record: &ArticleRecord, key: &str, value: &str) -> Result<bool> {
    let key = key.trim();
    let field = record
        .field(key)
        .ok_or_else(|| ListingError::field_missing(key, &record.path))?;
    let wanted = value.trim().to_lowercase();
    Ok(field
        .to_lowercase()
        .split(',')
        .any(|tag| tag.trim() == wanted))
}

// ═══════════════════════════════════════════════════════════════════════════
// Date range
// ═══════════════════════════════════════════════════════════════════════════

/// Date-range criterion as read from request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// Both bounds present and parsed
    Bounded { from: NaiveDate, to: NaiveDate },
    /// A bound is absent: no filtering
    Unbounded,
    /// A bound failed to parse: nothing matches
    Malformed,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) => Self::Bounded { from, to },
            _ => Self::Unbounded,
        }
    }

    /// Parse `YYYY-MM-DD` bounds (the date part of an RFC 3339 timestamp is
    /// accepted too); blank bounds count as absent
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Self {
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());
        let (Some(from), Some(to)) = (from, to) else {
            return Self::Unbounded;
        };
        match (parse_calendar_date(from), parse_calendar_date(to)) {
            (Some(from), Some(to)) => Self::Bounded { from, to },
            _ => Self::Malformed,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Unbounded)
    }

    /// False for an inverted or malformed range
    pub fn is_satisfiable(&self) -> bool {
        match self {
            Self::Bounded { from, to } => from <= to,
            Self::Unbounded => true,
            Self::Malformed => false,
        }
    }

    pub fn matches(&self, record: &ArticleRecord) -> bool {
        match *self {
            Self::Bounded { from, to } => matches_date_range(record, Some(from), Some(to)),
            Self::Unbounded => true,
            Self::Malformed => false,
        }
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.date_naive())
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Filter composition
// ═══════════════════════════════════════════════════════════════════════════

/// Anything the walker can test records with
pub trait ArticlePredicate: Send + Sync {
    /// `Err` only for strict-mode configuration faults
    fn test(&self, record: &ArticleRecord) -> Result<bool>;
}

impl<F> ArticlePredicate for F
where
    F: Fn(&ArticleRecord) -> bool + Send + Sync,
{
    fn test(&self, record: &ArticleRecord) -> Result<bool> {
        Ok(self(record))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Lowercased query tokens
    Query(Vec<String>),
    Category { key: String, value: String },
    DateRange(DateRange),
    Year(i32),
}

impl Filter {
    pub fn query(query: &str) -> Self {
        Self::Query(query_tokens(query))
    }

    pub fn category(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Category {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Relative evaluation cost; cheaper filters run first
    pub fn cost(&self) -> u8 {
        match self {
            Self::Year(_) => 1,
            Self::DateRange(_) => 2,
            Self::Category { .. } => 3,
            Self::Query(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Category { .. } => "category",
            Self::DateRange(_) => "date_range",
            Self::Year(_) => "year",
        }
    }
}

/// Conjunction of filters
///
/// With a year facet attached, the year filter runs last and the year of every
/// record passing the other filters is recorded first, so the facet offers
/// every year of the category rather than only the selected one.
pub struct FilterChain {
    filters: Vec<Filter>,
    policy: FieldPolicy,
    facet: Option<Arc<YearFacet>>,
}

impl FilterChain {
    pub fn new(policy: FieldPolicy) -> Self {
        Self {
            filters: Vec::new(),
            policy,
            facet: None,
        }
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self.filters.sort_by_key(Filter::cost);
        self
    }

    pub fn with_facet(mut self, facet: Arc<YearFacet>) -> Self {
        self.facet = Some(facet);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter names in evaluation order, for logs
    pub fn describe(&self) -> String {
        if self.filters.is_empty() {
            return "all".to_string();
        }
        self.filters
            .iter()
            .map(Filter::name)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn evaluate(&self, filter: &Filter, record: &ArticleRecord) -> Result<bool> {
        match filter {
            Filter::Query(tokens) => Ok(matches_tokens(record, tokens)),
            Filter::DateRange(range) => Ok(range.matches(record)),
            Filter::Year(year) => Ok(matches_year(record, Some(*year))),
            Filter::Category { key, value } => match matches_category(record, key, value) {
                Ok(hit) => Ok(hit),
                Err(err) if self.policy == FieldPolicy::Lenient => {
                    warn!("Treating record as non-matching: {}", err);
                    Ok(false)
                }
                Err(err) => Err(err),
            },
        }
    }
}

impl ArticlePredicate for FilterChain {
    fn test(&self, record: &ArticleRecord) -> Result<bool> {
        let mut deferred_year = None;
        for filter in &self.filters {
            if let (Some(_), Filter::Year(year)) = (&self.facet, filter) {
                deferred_year = Some(*year);
                continue;
            }
            if !self.evaluate(filter, record)? {
                return Ok(false);
            }
        }

        if let Some(facet) = &self.facet {
            if let Some(year) = record.published_year() {
                facet.observe(year);
            }
        }
        Ok(matches_year(record, deferred_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn epoch(y: i32, m: u32, d: u32, h: u32) -> i64 {
        date(y, m, d).and_hms_opt(h, 30, 0).unwrap().and_utc().timestamp()
    }

    fn article(title: &str, body: &str) -> ArticleRecord {
        ArticleRecord::new(title, "/news/x", epoch(2023, 6, 15, 12)).with_long_description(body)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Query Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_query_empty_matches_everything() {
        let record = article("Anything", "");
        assert!(matches_query(&record, ""));
        assert!(matches_query(&record, "   "));
    }

    #[test]
    fn test_query_all_tokens_required() {
        let record = article("New Vaccine Approved", "<p>The <b>FDA</b> approved it</p>");

        assert!(matches_query(&record, "vaccine"));
        assert!(matches_query(&record, "VACCINE fda"));
        assert!(!matches_query(&record, "vaccine oncology"));
    }

    #[test]
    fn test_query_searches_raw_markup() {
        let record = article("Title", "<p class=\"abstract\">text</p>");
        assert!(matches_query(&record, "abstract"));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Date Range Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_date_range_inclusive_and_time_stripped() {
        let record = ArticleRecord::new("t", "/p", epoch(2023, 6, 15, 23));

        assert!(matches_date_range(&record, Some(date(2023, 6, 15)), Some(date(2023, 6, 15))));
        assert!(matches_date_range(&record, Some(date(2023, 6, 1)), Some(date(2023, 6, 30))));
        assert!(!matches_date_range(&record, Some(date(2023, 6, 16)), Some(date(2023, 6, 30))));
    }

    #[test]
    fn test_date_range_missing_bound_disables_filter() {
        let record = ArticleRecord::new("t", "/p", 0);
        assert!(matches_date_range(&record, None, Some(date(2000, 1, 1))));
        assert!(matches_date_range(&record, Some(date(2000, 1, 1)), None));
    }

    #[test]
    fn test_date_range_inverted_is_unsatisfiable() {
        let record = ArticleRecord::new("t", "/p", epoch(2023, 6, 15, 0));
        assert!(!matches_date_range(&record, Some(date(2023, 7, 1)), Some(date(2023, 6, 1))));

        let range = DateRange::new(Some(date(2023, 7, 1)), Some(date(2023, 6, 1)));
        assert!(!range.is_satisfiable());
        assert!(!range.matches(&record));
    }

    #[test]
    fn test_date_range_parse() {
        assert_eq!(DateRange::parse(None, Some("2023-01-01")), DateRange::Unbounded);
        assert_eq!(DateRange::parse(Some(""), Some("2023-01-01")), DateRange::Unbounded);
        assert_eq!(
            DateRange::parse(Some("2023-01-01"), Some("2023-12-31T10:00:00Z")),
            DateRange::Bounded {
                from: date(2023, 1, 1),
                to: date(2023, 12, 31)
            }
        );
        let malformed = DateRange::parse(Some("last week"), Some("2023-01-01"));
        assert_eq!(malformed, DateRange::Malformed);
        assert!(malformed.is_active());
        assert!(!malformed.matches(&ArticleRecord::new("t", "/p", 0)));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Year / Category Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_year() {
        let record = ArticleRecord::new("t", "/p", epoch(2021, 12, 31, 22));
        assert!(matches_year(&record, Some(2021)));
        assert!(!matches_year(&record, Some(2022)));
        assert!(matches_year(&record, None));
    }

    #[test]
    fn test_category_trims_and_lowercases() {
        let record = ArticleRecord::new("t", "/p", 0).with_field("category", "Press Releases , Finance");

        assert!(matches_category(&record, "category", "press releases").unwrap());
        assert!(matches_category(&record, " category ", "  FINANCE ").unwrap());
        assert!(!matches_category(&record, "category", "press").unwrap());
    }

    #[test]
    fn test_category_missing_field() {
        let record = ArticleRecord::new("t", "/news/a", 0);
        let err = matches_category(&record, "category", "x").unwrap_err();
        assert!(matches!(err, ListingError::FieldMissing { ref key, .. } if key == "category"));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FilterChain Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_chain_orders_cheapest_first() {
        let chain = FilterChain::new(FieldPolicy::Lenient)
            .with(Filter::query("a"))
            .with(Filter::category("category", "x"))
            .with(Filter::Year(2020));

        assert_eq!(chain.describe(), "year AND category AND query");
        assert_eq!(FilterChain::new(FieldPolicy::Lenient).describe(), "all");
    }

    #[test]
    fn test_chain_lenient_degrades_missing_field() {
        let chain = FilterChain::new(FieldPolicy::Lenient).with(Filter::category("category", "x"));
        let record = ArticleRecord::new("t", "/p", 0);
        assert!(!chain.test(&record).unwrap());
    }

    #[test]
    fn test_chain_strict_surfaces_missing_field() {
        let chain = FilterChain::new(FieldPolicy::Strict).with(Filter::category("category", "x"));
        let record = ArticleRecord::new("t", "/p", 0);
        assert!(matches!(
            chain.test(&record),
            Err(ListingError::FieldMissing { .. })
        ));
    }

    #[test]
    fn test_chain_facet_sees_years_outside_selected_year() {
        let facet = Arc::new(YearFacet::new());
        let chain = FilterChain::new(FieldPolicy::Lenient)
            .with(Filter::category("category", "news"))
            .with(Filter::Year(2022))
            .with_facet(facet.clone());

        let hit = ArticleRecord::new("a", "/a", epoch(2022, 5, 1, 0)).with_field("category", "News");
        let other_year =
            ArticleRecord::new("b", "/b", epoch(2019, 5, 1, 0)).with_field("category", "News");
        let other_category =
            ArticleRecord::new("c", "/c", epoch(2018, 5, 1, 0)).with_field("category", "Blog");

        assert!(chain.test(&hit).unwrap());
        assert!(!chain.test(&other_year).unwrap());
        assert!(!chain.test(&other_category).unwrap());
        assert_eq!(facet.years(), vec![2022, 2019]);
    }

    #[test]
    fn test_closure_is_a_predicate() {
        let predicate = |r: &ArticleRecord| r.title.starts_with('A');
        assert!(predicate.test(&ArticleRecord::new("Alpha", "/a", 0)).unwrap());
        assert!(!predicate.test(&ArticleRecord::new("Beta", "/b", 0)).unwrap());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Properties
    // ═══════════════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn prop_adding_tokens_never_widens_matches(
            title in "[a-e ]{0,12}",
            body in "[a-e ]{0,12}",
            q1 in "[a-e]{1,3}",
            q2 in "[a-e]{1,3}",
        ) {
            let record = article(&title, &body);
            let combined = format!("{q1} {q2}");
            if matches_query(&record, &combined) {
                prop_assert!(matches_query(&record, &q1));
            }
        }

        #[test]
        fn prop_single_day_range_is_date_equality(
            secs in 0i64..4_000_000_000,
            day_offset in -3i64..3,
        ) {
            let record = ArticleRecord::new("t", "/p", secs);
            let record_date = record.published_date().unwrap();
            let d = record_date + chrono::Duration::days(day_offset);
            prop_assert_eq!(
                matches_date_range(&record, Some(d), Some(d)),
                d == record_date
            );
        }
    }
}
