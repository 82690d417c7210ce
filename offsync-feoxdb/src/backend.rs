use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use bytes::Bytes;
use feoxdb::{FeoxError, FeoxStore};
use offsync_backend::{Backend, BackendError, BackendResult, DeleteStatus, FormatError, Storage};
use offsync_core::{BackendLabel, BucketName, CachedResponse, RequestKey};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::debug;

use crate::FeOxDbError;

const BUCKET_INDEX: &str = "bucket-index";

fn storage_key(key: &str) -> Vec<u8> {
    format!("storage:{key}").into_bytes()
}

fn index_key(bucket: &BucketName) -> Vec<u8> {
    format!("bucket:{bucket}:index").into_bytes()
}

fn entry_key(bucket: &BucketName, key: &RequestKey) -> Vec<u8> {
    format!("bucket:{bucket}:entry:{key}").into_bytes()
}

fn store_error(error: FeoxError) -> BackendError {
    BackendError::ConnectionError(Box::new(error))
}

fn encode_json<T: Serialize>(value: &T) -> BackendResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| FormatError::Serialize(Box::new(e)).into())
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> BackendResult<T> {
    serde_json::from_slice(bytes).map_err(|e| FormatError::Deserialize(Box::new(e)).into())
}

fn get(store: &FeoxStore, key: &[u8]) -> BackendResult<Option<Vec<u8>>> {
    match store.get(key) {
        Ok(value) => Ok(Some(value.to_vec())),
        Err(FeoxError::KeyNotFound) => Ok(None),
        Err(e) => Err(store_error(e)),
    }
}

fn put(store: &FeoxStore, key: &[u8], value: &[u8]) -> BackendResult<()> {
    store.insert(key, value).map_err(store_error)?;
    Ok(())
}

fn delete(store: &FeoxStore, key: &[u8]) -> BackendResult<bool> {
    if !store.contains_key(key) {
        return Ok(false);
    }
    store.delete(key).map_err(store_error)?;
    Ok(true)
}

fn read_list<T: DeserializeOwned>(store: &FeoxStore, key: &[u8]) -> BackendResult<Vec<T>> {
    match get(store, key)? {
        Some(bytes) => decode_json(&bytes),
        None => Ok(Vec::new()),
    }
}

fn count(n: usize) -> u32 {
    n.min(u32::MAX as usize) as u32
}

/// Disk-based buckets and storage using FeOxDB.
///
/// Every bucket keeps a JSON index of its keys next to the bincode-encoded
/// entries, and the database keeps an index of existing buckets, so buckets
/// can be enumerated and dropped without scanning the store. Index updates are
/// serialized through one async mutex.
///
/// ```no_run
/// use offsync_feoxdb::FeOxDbBackend;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/lib/storefront")
///     .max_file_size(512 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), offsync_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap. Clones share the same database.
#[derive(Clone)]
pub struct FeOxDbBackend {
    store: Arc<FeoxStore>,
    index_lock: Arc<Mutex<()>>,
    label: BackendLabel,
}

impl std::fmt::Debug for FeOxDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbBackend")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl FeOxDbBackend {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder {
        FeOxDbBackendBuilder::default()
    }

    /// Memory-only backend. Data is lost when dropped.
    ///
    /// ```
    /// use offsync_feoxdb::FeOxDbBackend;
    ///
    /// let backend = FeOxDbBackend::in_memory().expect("in-memory store");
    /// ```
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }

    /// Forces pending writes to disk. No-op in memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }

    async fn blocking<T, F>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(&FeoxStore) -> BackendResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| BackendError::InternalError(Box::new(e)))?
    }
}

/// Builder for [`FeOxDbBackend`].
#[derive(Debug)]
pub struct FeOxDbBackendBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    label: BackendLabel,
}

impl Default for FeOxDbBackendBuilder {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            label: BackendLabel::new_static("feoxdb"),
        }
    }
}

impl FeOxDbBackendBuilder {
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory. If the path is a directory,
    /// `offsync.db` is created inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocated size of the database file. Ignored in memory-only mode.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage. Writes fail once the limit is reached.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Label used in logs and metrics. Default: `"feoxdb"`.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Opens the database.
    pub fn build(self) -> Result<FeOxDbBackend, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("offsync.db");
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }
        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }
        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        Ok(FeOxDbBackend {
            store: Arc::new(builder.build()?),
            index_lock: Arc::new(Mutex::new(())),
            label: self.label,
        })
    }
}

#[async_trait]
impl Backend for FeOxDbBackend {
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>> {
        let entry = entry_key(bucket, key);
        self.blocking(move |store| match get(store, &entry)? {
            Some(bytes) => {
                let (value, _): (CachedResponse, _) =
                    decode_from_slice(&bytes, bincode_config())
                        .map_err(|e| FormatError::Deserialize(Box::new(e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        })
        .await
    }

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()> {
        let encoded = encode_to_vec(&value, bincode_config())
            .map_err(|e| FormatError::Serialize(Box::new(e)))?;
        let bucket = bucket.clone();
        let key = key.clone();

        let _guard = self.index_lock.lock().await;
        self.blocking(move |store| {
            put(store, &entry_key(&bucket, &key), &encoded)?;

            let index = index_key(&bucket);
            let mut keys: Vec<RequestKey> = read_list(store, &index)?;
            if !keys.contains(&key) {
                keys.push(key);
                put(store, &index, &encode_json(&keys)?)?;
            }

            let mut buckets: Vec<BucketName> = read_list(store, BUCKET_INDEX.as_bytes())?;
            if !buckets.contains(&bucket) {
                buckets.push(bucket);
                put(store, BUCKET_INDEX.as_bytes(), &encode_json(&buckets)?)?;
            }
            Ok(())
        })
        .await
    }

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus> {
        let bucket = bucket.clone();
        let key = key.clone();

        let _guard = self.index_lock.lock().await;
        self.blocking(move |store| {
            if !delete(store, &entry_key(&bucket, &key))? {
                return Ok(DeleteStatus::Missing);
            }
            let index = index_key(&bucket);
            let mut keys: Vec<RequestKey> = read_list(store, &index)?;
            keys.retain(|existing| existing != &key);
            put(store, &index, &encode_json(&keys)?)?;
            Ok(DeleteStatus::Deleted(1))
        })
        .await
    }

    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>> {
        let index = index_key(bucket);
        self.blocking(move |store| read_list(store, &index)).await
    }

    async fn buckets(&self) -> BackendResult<Vec<BucketName>> {
        self.blocking(|store| read_list(store, BUCKET_INDEX.as_bytes()))
            .await
    }

    async fn clear(&self, bucket: &BucketName) -> BackendResult<()> {
        let bucket = bucket.clone();

        let _guard = self.index_lock.lock().await;
        self.blocking(move |store| {
            let index = index_key(&bucket);
            let keys: Vec<RequestKey> = read_list(store, &index)?;
            for key in &keys {
                delete(store, &entry_key(&bucket, key))?;
            }
            put(store, &index, &encode_json(&Vec::<RequestKey>::new())?)?;
            Ok(())
        })
        .await?;
        debug!(backend = %self.label, "bucket cleared");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus> {
        let bucket = bucket.clone();

        let _guard = self.index_lock.lock().await;
        self.blocking(move |store| {
            let mut buckets: Vec<BucketName> = read_list(store, BUCKET_INDEX.as_bytes())?;
            if !buckets.contains(&bucket) {
                return Ok(DeleteStatus::Missing);
            }

            let index = index_key(&bucket);
            let keys: Vec<RequestKey> = read_list(store, &index)?;
            for key in &keys {
                delete(store, &entry_key(&bucket, key))?;
            }
            delete(store, &index)?;

            buckets.retain(|existing| existing != &bucket);
            put(store, BUCKET_INDEX.as_bytes(), &encode_json(&buckets)?)?;
            Ok(DeleteStatus::Deleted(count(keys.len())))
        })
        .await
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}

#[async_trait]
impl Storage for FeOxDbBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Bytes>> {
        let key = storage_key(key);
        self.blocking(move |store| Ok(get(store, &key)?.map(Bytes::from)))
            .await
    }

    async fn set(&self, key: &str, value: Bytes) -> BackendResult<()> {
        let key = storage_key(key);
        self.blocking(move |store| put(store, &key, &value)).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let key = storage_key(key);
        self.blocking(move |store| {
            Ok(if delete(store, &key)? {
                DeleteStatus::Deleted(1)
            } else {
                DeleteStatus::Missing
            })
        })
        .await
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
    use tempfile::TempDir;

    fn entry(body: &'static str) -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        CachedResponse::new(StatusCode::OK, headers, Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn test_write_and_read_entry() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let bucket = BucketName::from("dynamic-pages");
        let key = RequestKey::get("/products");

        backend.write(&bucket, &key, entry("<h1>")).await.unwrap();
        let stored = backend.read(&bucket, &key).await.unwrap().unwrap();
        assert_eq!(stored.body().as_ref(), b"<h1>");
        assert_eq!(stored.headers()[CONTENT_TYPE], "text/html");
        assert!(backend.read(&bucket, &RequestKey::get("/cart")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bucket_enumeration() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let shell = BucketName::from("app-shell");
        let assets = BucketName::from("static-assets");

        backend.write(&shell, &RequestKey::get("/"), entry("a")).await.unwrap();
        backend.write(&shell, &RequestKey::get("/home"), entry("b")).await.unwrap();
        backend.write(&shell, &RequestKey::get("/home"), entry("c")).await.unwrap();
        backend
            .write(&assets, &RequestKey::get("/favicon.png"), entry("d"))
            .await
            .unwrap();

        assert_eq!(backend.buckets().await.unwrap(), vec![shell.clone(), assets]);
        assert_eq!(
            backend.keys(&shell).await.unwrap(),
            vec![RequestKey::get("/"), RequestKey::get("/home")]
        );
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let bucket = BucketName::from("api-responses");
        let first = RequestKey::get("/api/products");
        let second = RequestKey::get("/api/orders");
        backend.write(&bucket, &first, entry("1")).await.unwrap();
        backend.write(&bucket, &second, entry("2")).await.unwrap();

        assert_eq!(
            Backend::remove(&backend, &bucket, &first).await.unwrap(),
            DeleteStatus::Deleted(1)
        );
        assert_eq!(
            Backend::remove(&backend, &bucket, &first).await.unwrap(),
            DeleteStatus::Missing
        );
        assert_eq!(backend.keys(&bucket).await.unwrap(), vec![second.clone()]);

        backend.clear(&bucket).await.unwrap();
        assert!(backend.read(&bucket, &second).await.unwrap().is_none());
        assert_eq!(backend.buckets().await.unwrap(), vec![bucket]);
    }

    #[tokio::test]
    async fn test_delete_bucket() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let stale = BucketName::from("store-pwa-v1");
        let key = RequestKey::get("/");
        backend.write(&stale, &key, entry("old")).await.unwrap();

        assert_eq!(backend.delete_bucket(&stale).await.unwrap(), DeleteStatus::Deleted(1));
        assert_eq!(backend.delete_bucket(&stale).await.unwrap(), DeleteStatus::Missing);
        assert!(backend.buckets().await.unwrap().is_empty());
        assert!(backend.read(&stale, &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_storage_keys_do_not_collide_with_buckets() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        backend
            .set(BUCKET_INDEX, Bytes::from_static(b"not an index"))
            .await
            .unwrap();
        assert!(backend.buckets().await.unwrap().is_empty());
        assert_eq!(
            backend.get(BUCKET_INDEX).await.unwrap(),
            Some(Bytes::from_static(b"not an index"))
        );
        assert_eq!(
            Storage::remove(&backend, BUCKET_INDEX).await.unwrap(),
            DeleteStatus::Deleted(1)
        );
        assert_eq!(backend.get(BUCKET_INDEX).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_persists_buckets_and_storage() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("offsync.db");
        let bucket = BucketName::from("app-shell");
        let key = RequestKey::get("/products");

        {
            let backend = FeOxDbBackend::builder()
                .path(temp_dir.path())
                .build()
                .unwrap();
            backend.write(&bucket, &key, entry("persisted")).await.unwrap();
            backend
                .set("authToken", Bytes::from_static(b"secret"))
                .await
                .unwrap();
            backend.flush();
        }

        let backend = FeOxDbBackend::builder().path(&db_path).build().unwrap();
        let stored = backend.read(&bucket, &key).await.unwrap().unwrap();
        assert_eq!(stored.body().as_ref(), b"persisted");
        assert_eq!(backend.buckets().await.unwrap(), vec![bucket]);
        assert_eq!(
            backend.get("authToken").await.unwrap(),
            Some(Bytes::from_static(b"secret"))
        );
    }

    #[tokio::test]
    async fn test_builder_with_label() {
        let backend = FeOxDbBackend::builder()
            .label("storefront")
            .build()
            .unwrap();
        assert_eq!(Backend::label(&backend).as_str(), "storefront");
    }
}
