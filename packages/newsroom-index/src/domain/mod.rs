//! Domain layer for the article index
//!
//! # Domain Models
//!
//! - `ArticleRecord`: one immutable row of the remote query index
//! - `IndexPage`: one page (`limit`/`offset` slice) of a collection
//!
//! # Port Trait
//!
//! - `ArticleIndex`: read-only, paged access to an ordered collection
//!
//! # Examples
//!
//! ```rust,ignore
//! use newsroom_index::domain::ArticleIndex;
//!
//! async fn first_page(index: &dyn ArticleIndex) -> Result<()> {
//!     let page = index.fetch_page("/query-index.json", "articles", 10, 0).await?;
//!     println!("{} of {}", page.data.len(), page.total);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Domain Models
// ═══════════════════════════════════════════════════════════════════════════

/// One article row of the query index
///
/// Records are immutable values; the listing engine only reads them.
///
/// Wire names follow the index document (`longdescriptionextracted`,
/// `publisheddateinseconds`). Any other string-valued column is kept as a
/// category-tag field holding a comma-joined tag list.
///
/// # Examples
///
/// ```rust
/// use newsroom_index::domain::ArticleRecord;
///
/// let record = ArticleRecord::new("Quarterly results", "/news/q3", 1_700_000_000)
///     .with_field("category", "Press Releases, Finance");
/// assert_eq!(record.published_year(), Some(2023));
/// assert_eq!(record.field("category"), Some("Press Releases, Finance"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireRecord")]
pub struct ArticleRecord {
    pub title: String,
    pub path: String,
    pub description: String,
    /// Raw long description, still carrying its HTML markup
    #[serde(rename = "longdescriptionextracted")]
    pub long_description_html: String,
    #[serde(rename = "publisheddateinseconds")]
    pub published_at_epoch_seconds: i64,
    /// Category-tag fields (`key -> "tag a, tag b"`)
    #[serde(flatten)]
    pub categories: BTreeMap<String, String>,
}

impl ArticleRecord {
    /// Create a record with empty descriptions and no category fields
    pub fn new(
        title: impl Into<String>,
        path: impl Into<String>,
        published_at_epoch_seconds: i64,
    ) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            description: String::new(),
            long_description_html: String::new(),
            published_at_epoch_seconds,
            categories: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_long_description(mut self, html: impl Into<String>) -> Self {
        self.long_description_html = html.into();
        self
    }

    /// Add (or replace) a category-tag field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.categories.insert(key.into(), value.into());
        self
    }

    /// Look up a field by its wire name
    ///
    /// The named text columns are addressable too, so a listing may be
    /// configured against e.g. `title`. The epoch column is not a text field.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "title" => Some(&self.title),
            "path" => Some(&self.path),
            "description" => Some(&self.description),
            "longdescriptionextracted" => Some(&self.long_description_html),
            _ => self.categories.get(key).map(String::as_str),
        }
    }

    /// Publish timestamp (UTC); `None` when the epoch value is out of range
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.published_at_epoch_seconds, 0)
    }

    /// Publish calendar date with the time of day stripped
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published_at().map(|ts| ts.date_naive())
    }

    pub fn published_year(&self) -> Option<i32> {
        self.published_at().map(|ts| ts.year())
    }
}

/// Deserialization shape of a record
///
/// The index emits every column as a string, but hand-written fixtures use
/// numbers for the epoch; both are accepted. Non-string extra columns are
/// dropped since they cannot hold tag lists.
#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "longdescriptionextracted")]
    long_description_html: String,
    #[serde(
        default,
        rename = "publisheddateinseconds",
        deserialize_with = "deserialize_epoch_seconds"
    )]
    published_at_epoch_seconds: i64,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl From<WireRecord> for ArticleRecord {
    fn from(wire: WireRecord) -> Self {
        let categories = wire
            .extra
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();

        Self {
            title: wire.title,
            path: wire.path,
            description: wire.description,
            long_description_html: wire.long_description_html,
            published_at_epoch_seconds: wire.published_at_epoch_seconds,
            categories,
        }
    }
}

fn deserialize_epoch_seconds<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Epoch::deserialize(deserializer)? {
        Epoch::Int(v) => Ok(v),
        Epoch::Float(v) => Ok(v.trunc() as i64),
        Epoch::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|v| v.trunc() as i64))
                .map_err(|_| serde::de::Error::custom(format!("invalid epoch seconds: {s:?}")))
        }
    }
}

/// One page of an index collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPage {
    /// Records in index order (reverse-chronological for articles)
    pub data: Vec<ArticleRecord>,
    /// Total number of records in the collection
    pub total: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

impl IndexPage {
    /// True when no record exists past this page
    pub fn is_last(&self) -> bool {
        self.data.is_empty() || self.offset + self.data.len() >= self.total
    }

    /// Offset of the first record after this page
    pub fn next_offset(&self) -> usize {
        self.offset + self.data.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Trait: ArticleIndex
// ═══════════════════════════════════════════════════════════════════════════

/// Paged, read-only access to the remote article index
///
/// # Contract
///
/// - Pages preserve the collection's native order
/// - `total` is the size of the whole collection, not of the page
/// - An `offset` past the end yields an empty page, not an error
///
/// # Implementations
///
/// - `InMemoryIndex`: fixture collections with optional failure injection
/// - `JsonFileIndex`: a query-index JSON document on disk
#[async_trait]
pub trait ArticleIndex: Send + Sync {
    /// Fetch `limit` records of `collection` starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if:
    /// - The transport fails (`ErrorKind::Transport`, `ErrorKind::IO`)
    /// - The document cannot be decoded (`ErrorKind::Serialization`)
    /// - The collection is unknown (`ErrorKind::CollectionNotFound`)
    async fn fetch_page(
        &self,
        path: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> Result<IndexPage>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
