//! newsroom-index - paged access to the article query index
//!
//! The remote content index is an ordered (reverse-chronological) collection
//! of article rows, readable one `limit`/`offset` page at a time. This crate
//! holds the record model and the port every listing reads through.
//!
//! ## Core Principles
//!
//! 1. **Immutable records**: `ArticleRecord` is never mutated after decoding
//! 2. **Native order**: adapters return records in index order, never re-sorted
//! 3. **Transport-agnostic**: listings depend on `ArticleIndex`, not on an adapter
//!
//! ## Usage
//!
//! ```rust,ignore
//! use newsroom_index::{ArticleIndex, InMemoryIndex, ArticleRecord};
//!
//! let index = InMemoryIndex::with_collection("articles", records);
//! let page = index.fetch_page("/query-index.json", "articles", 10, 0).await?;
//! assert_eq!(page.total, records_len);
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, IndexError, Result};

pub use domain::{ArticleIndex, ArticleRecord, IndexPage};
#[cfg(feature = "fs")]
pub use infrastructure::JsonFileIndex;
pub use infrastructure::{InMemoryIndex, PageRequest};
