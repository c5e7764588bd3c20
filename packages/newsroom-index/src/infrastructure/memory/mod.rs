//! In-memory adapter for ArticleIndex
//!
//! Serves fixture collections page by page. Used by tests and by callers that
//! already hold the whole index.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{ArticleIndex, ArticleRecord, IndexPage};
use crate::{IndexError, Result};

/// One recorded `fetch_page` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

pub struct InMemoryIndex {
    collections: HashMap<String, Vec<ArticleRecord>>,
    /// Fail every request once this many pages have been served
    fail_after_pages: Option<usize>,
    requests: Mutex<Vec<PageRequest>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            collections: HashMap::new(),
            fail_after_pages: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Index holding a single collection
    pub fn with_collection(collection: impl Into<String>, records: Vec<ArticleRecord>) -> Self {
        Self::new().collection(collection, records)
    }

    pub fn collection(mut self, name: impl Into<String>, records: Vec<ArticleRecord>) -> Self {
        self.collections.insert(name.into(), records);
        self
    }

    /// Simulate a transport outage after `pages` successful responses
    pub fn fail_after_pages(mut self, pages: usize) -> Self {
        self.fail_after_pages = Some(pages);
        self
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleIndex for InMemoryIndex {
    async fn fetch_page(
        &self,
        path: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> Result<IndexPage> {
        let served = {
            let mut requests = self.requests.lock();
            requests.push(PageRequest { limit, offset });
            requests.len() - 1
        };

        if let Some(max) = self.fail_after_pages {
            if served >= max {
                return Err(IndexError::transport(format!(
                    "simulated outage fetching {} (offset {})",
                    path, offset
                )));
            }
        }

        let records = self
            .collections
            .get(collection)
            .ok_or_else(|| IndexError::collection_not_found(collection))?;

        let start = offset.min(records.len());
        let end = offset.saturating_add(limit).min(records.len());
        debug!(
            "Serving {}[{}..{}] of {} from memory",
            collection,
            start,
            end,
            records.len()
        );

        Ok(IndexPage {
            data: records[start..end].to_vec(),
            total: records.len(),
            offset,
            limit,
        })
    }
}
