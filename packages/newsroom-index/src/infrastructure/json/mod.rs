//! JSON-file adapter for ArticleIndex
//!
//! Reads a query-index document from disk. Two document shapes are accepted:
//!
//! - single sheet: `{"total": .., "offset": .., "limit": .., "data": [..]}`
//! - multi sheet: `{":names": ["articles", ..], "articles": {<single sheet>}, ..}`
//!
//! A single-sheet document answers for any collection name. Parsed documents
//! are cached per file; the file is never re-read.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{ArticleIndex, ArticleRecord, IndexPage};
use crate::{IndexError, Result};

#[derive(Debug, Deserialize)]
struct Sheet {
    #[serde(default)]
    data: Vec<ArticleRecord>,
}

#[derive(Debug)]
enum IndexDocument {
    Single(Vec<ArticleRecord>),
    Multi(HashMap<String, Vec<ArticleRecord>>),
}

impl IndexDocument {
    fn parse(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let object = value
            .as_object()
            .ok_or_else(|| IndexError::serialization("index document is not a JSON object"))?;

        if object.contains_key("data") {
            let sheet: Sheet = serde_json::from_value(value)?;
            return Ok(Self::Single(sheet.data));
        }

        let mut sheets = HashMap::new();
        for (name, body) in object {
            if name.starts_with(':') {
                continue;
            }
            let sheet: Sheet = serde_json::from_value(body.clone())?;
            sheets.insert(name.clone(), sheet.data);
        }
        Ok(Self::Multi(sheets))
    }

    fn records(&self, collection: &str) -> Result<&[ArticleRecord]> {
        match self {
            Self::Single(records) => Ok(records),
            Self::Multi(sheets) => sheets
                .get(collection)
                .map(Vec::as_slice)
                .ok_or_else(|| IndexError::collection_not_found(collection)),
        }
    }
}

/// Where index paths resolve to
#[derive(Debug, Clone)]
enum Source {
    /// Every index path maps to this one file
    File(PathBuf),
    /// Index paths resolve relative to this directory
    Root(PathBuf),
}

pub struct JsonFileIndex {
    source: Source,
    documents: Mutex<HashMap<PathBuf, Arc<IndexDocument>>>,
}

impl JsonFileIndex {
    /// Serve every index path from `file`
    pub fn from_file(file: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(file.into()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve index paths such as `/query-index.json` under `root`
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Root(root.into()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.source {
            Source::File(file) => file.clone(),
            Source::Root(root) => root.join(path.trim_start_matches('/')),
        }
    }

    async fn load(&self, file: &Path) -> Result<Arc<IndexDocument>> {
        let cached = self.documents.lock().get(file).cloned();
        if let Some(doc) = cached {
            return Ok(doc);
        }

        let bytes = tokio::fs::read(file).await.map_err(|e| {
            IndexError::transport(format!("failed to read {}: {}", file.display(), e)).with_source(e)
        })?;
        let doc = Arc::new(IndexDocument::parse(&bytes)?);
        info!("Loaded index document {}", file.display());

        self.documents
            .lock()
            .insert(file.to_path_buf(), doc.clone());
        Ok(doc)
    }
}

#[async_trait]
impl ArticleIndex for JsonFileIndex {
    async fn fetch_page(
        &self,
        path: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> Result<IndexPage> {
        let file = self.resolve(path);
        let doc = self.load(&file).await?;
        let records = doc.records(collection)?;

        let start = offset.min(records.len());
        let end = offset.saturating_add(limit).min(records.len());
        debug!("Serving {}[{}..{}] from {}", collection, start, end, file.display());

        Ok(IndexPage {
            data: records[start..end].to_vec(),
            total: records.len(),
            offset,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const SINGLE: &str = r#"{
        "total": 3, "offset": 0, "limit": 3,
        "data": [
            {"title": "C", "path": "/c", "publisheddateinseconds": "300"},
            {"title": "B", "path": "/b", "publisheddateinseconds": "200"},
            {"title": "A", "path": "/a", "publisheddateinseconds": "100"}
        ]
    }"#;

    const MULTI: &str = r#"{
        ":names": ["articles", "videos"],
        ":type": "multi-sheet",
        "articles": {"total": 1, "offset": 0, "limit": 1,
            "data": [{"title": "News", "path": "/n", "category": "Press"}]},
        "videos": {"total": 0, "offset": 0, "limit": 0, "data": []}
    }"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_single_sheet_paging() {
        let file = write_temp(SINGLE);
        let index = JsonFileIndex::from_file(file.path());

        let page = index.fetch_page("/query-index.json", "articles", 2, 1).await.unwrap();
        assert_eq!(page.total, 3);
        let titles: Vec<_> = page.data.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(page.data[1].published_at_epoch_seconds, 100);
    }

    #[tokio::test]
    async fn test_multi_sheet_collections() {
        let file = write_temp(MULTI);
        let index = JsonFileIndex::from_file(file.path());

        let articles = index.fetch_page("/q.json", "articles", 10, 0).await.unwrap();
        assert_eq!(articles.data.len(), 1);
        assert_eq!(articles.data[0].field("category"), Some("Press"));

        let videos = index.fetch_page("/q.json", "videos", 10, 0).await.unwrap();
        assert!(videos.data.is_empty());

        let err = index.fetch_page("/q.json", "podcasts", 10, 0).await.unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::CollectionNotFound);
    }

    #[tokio::test]
    async fn test_root_resolution_and_missing_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("query-index.json"), SINGLE).unwrap();
        let index = JsonFileIndex::from_root(dir.path());

        let page = index.fetch_page("/query-index.json", "articles", 10, 0).await.unwrap();
        assert_eq!(page.data.len(), 3);

        let err = index.fetch_page("/missing.json", "articles", 10, 0).await.unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let file = write_temp("[1, 2, 3]");
        let index = JsonFileIndex::from_file(file.path());

        let err = index.fetch_page("/q.json", "articles", 10, 0).await.unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Serialization);
    }
}
