//! Append-only document history over an injected key-value store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uiforge_dsl::UiDocument;

/// Store key holding the whole history array.
pub const HISTORY_KEY: &str = "history.v1";
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt history payload: {0}")]
    Corrupt(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), bytes);
        Ok(())
    }
}

/// One JSON file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Upload,
    Sample,
    Converted,
    Chat,
    Hybrid,
    Restored,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceTag::Upload => "upload",
            SourceTag::Sample => "sample",
            SourceTag::Converted => "converted",
            SourceTag::Chat => "chat",
            SourceTag::Hybrid => "hybrid",
            SourceTag::Restored => "restored",
        };
        f.write_str(s)
    }
}

/// Immutable snapshot. The document is kept as written and re-validated on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source_tag: SourceTag,
    pub document: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_text: Option<String>,
}

impl HistoryRecord {
    pub fn new(source_tag: SourceTag, document: &UiDocument) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            source_tag,
            document: document.to_json(),
            summary: None,
            generated_code: None,
            qa_text: None,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_generated(mut self, generated_code: Option<String>, qa_text: Option<String>) -> Self {
        self.generated_code = generated_code;
        self.qa_text = qa_text;
        self
    }
}

/// Capped, append-only record list stored under [`HISTORY_KEY`].
pub struct History {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl History {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    async fn load_all(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        match self.store.load(HISTORY_KEY).await? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt(e.to_string())),
        }
    }

    async fn save_all(&self, records: &[HistoryRecord]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(records).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.store.save(HISTORY_KEY, bytes).await
    }

    /// Append a record, dropping the oldest beyond the cap.
    pub async fn append(&self, record: HistoryRecord) -> Result<HistoryRecord, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await?;
        records.push(record.clone());
        if records.len() > self.limit {
            let excess = records.len() - self.limit;
            records.drain(..excess);
        }
        self.save_all(&records).await?;
        tracing::info!(id = %record.id, source = %record.source_tag, "history record written");
        Ok(record)
    }

    /// Most recent first.
    pub async fn list(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut records = self.load_all().await?;
        records.reverse();
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save_all(&records).await?;
        tracing::info!(id, "history record deleted");
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.save_all(&[]).await
    }
}
