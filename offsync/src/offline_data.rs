//! Last-known-good payloads kept for offline reads.
//!
//! Separate from the HTTP buckets: the application saves arbitrary JSON
//! values under its own keys, all kept in one storage document:
//!
//! ```json
//! { "products": { "data": [...], "savedAt": "2024-05-01T10:00:00Z" } }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use offsync_backend::{BackendError, BackendResult, DeleteStatus, FormatError, Storage, StorageExt};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::Config;

/// One saved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntry {
    /// The saved value.
    pub data: serde_json::Value,
    /// When it was saved.
    pub saved_at: DateTime<Utc>,
}

type Document = BTreeMap<String, DataEntry>;

/// Key-value store of JSON payloads.
///
/// Unreadable storage reads as empty; writes go through a read-modify-write
/// of the whole document under an async mutex.
#[derive(Debug)]
pub struct OfflineData<S> {
    storage: S,
    key: String,
    write_lock: Mutex<()>,
}

impl<S> OfflineData<S>
where
    S: Storage,
{
    /// Data store under `key`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Data store under the configured key.
    pub fn from_config(storage: S, config: &Config) -> Self {
        Self::new(storage, config.storage_keys.data.clone())
    }

    async fn document(&self) -> Document {
        match self.storage.get_json::<Document>(&self.key).await {
            Ok(document) => document.unwrap_or_default(),
            Err(error) => {
                warn!(key = %self.key, error = %error, "offline data unreadable, treating as empty");
                Document::new()
            }
        }
    }

    /// Saves `value` under `key`, replacing any previous value.
    pub async fn save<T>(&self, key: &str, value: &T) -> BackendResult<()>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_value(value)
            .map_err(|e| BackendError::from(FormatError::Serialize(Box::new(e))))?;
        let _guard = self.write_lock.lock().await;
        let mut document = self.document().await;
        document.insert(
            key.to_owned(),
            DataEntry {
                data,
                saved_at: Utc::now(),
            },
        );
        self.storage.set_json(&self.key, &document).await
    }

    /// The value saved under `key`, if it exists and decodes as `T`.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let entry = self.entry(key).await?;
        match serde_json::from_value(entry.data) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, error = %error, "offline data has unexpected shape");
                None
            }
        }
    }

    /// The raw entry saved under `key`.
    pub async fn entry(&self, key: &str) -> Option<DataEntry> {
        self.document().await.remove(key)
    }

    /// Removes one key.
    pub async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.document().await;
        if document.remove(key).is_none() {
            return Ok(DeleteStatus::Missing);
        }
        self.storage.set_json(&self.key, &document).await?;
        Ok(DeleteStatus::Deleted(1))
    }

    /// Removes every key.
    pub async fn clear(&self) -> BackendResult<DeleteStatus> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove(&self.key).await
    }
}
