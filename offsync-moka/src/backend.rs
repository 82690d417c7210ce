//! Moka backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use offsync_backend::{Backend, BackendResult, DeleteStatus};
use offsync_core::{BackendLabel, BucketName, CachedResponse, RequestKey};
use tracing::debug;

use crate::builder::{BucketSettings, MokaBackendBuilder, NoCapacity};
use crate::metrics;

/// In-memory cache buckets.
///
/// Cloning is cheap and clones share the same buckets.
///
/// # Caveats
///
/// - Data is **not persisted**; buckets are lost on process restart.
/// - Capacity is per bucket. A full bucket evicts its own entries only.
#[derive(Clone)]
pub struct MokaBackend {
    buckets: Arc<DashMap<BucketName, Cache<RequestKey, CachedResponse>>>,
    settings: BucketSettings,
    label: BackendLabel,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("buckets", &self.buckets.len())
            .field("capacity", &self.settings.capacity())
            .finish()
    }
}

impl MokaBackend {
    /// Creates a builder. Capacity must be set before `build()`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    pub(crate) fn from_settings(settings: BucketSettings, label: BackendLabel) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            settings,
            label,
        }
    }

    /// Underlying cache of `bucket`, if the bucket exists.
    ///
    /// Mostly useful in tests, e.g. to run Moka's pending maintenance.
    pub fn bucket_cache(&self, bucket: &BucketName) -> Option<Cache<RequestKey, CachedResponse>> {
        self.buckets.get(bucket).map(|cache| cache.value().clone())
    }

    fn bucket_or_create(&self, bucket: &BucketName) -> Cache<RequestKey, CachedResponse> {
        self.buckets
            .entry(bucket.clone())
            .or_insert_with(|| self.settings.new_cache())
            .value()
            .clone()
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>> {
        match self.bucket_cache(bucket) {
            Some(cache) => Ok(cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()> {
        let cache = self.bucket_or_create(bucket);
        cache.insert(key.clone(), value).await;
        metrics::record_bucket_size(self.label.as_str(), bucket.as_str(), cache.entry_count());
        Ok(())
    }

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus> {
        let Some(cache) = self.bucket_cache(bucket) else {
            return Ok(DeleteStatus::Missing);
        };
        match cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>> {
        let Some(cache) = self.bucket_cache(bucket) else {
            return Ok(Vec::new());
        };
        let mut keys: Vec<RequestKey> = cache.iter().map(|(key, _)| (*key).clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn buckets(&self) -> BackendResult<Vec<BucketName>> {
        let mut names: Vec<BucketName> = self
            .buckets
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn clear(&self, bucket: &BucketName) -> BackendResult<()> {
        if let Some(mut cache) = self.buckets.get_mut(bucket) {
            *cache = self.settings.new_cache();
            debug!(backend = %self.label, bucket = %bucket, "bucket cleared");
        }
        metrics::record_bucket_size(self.label.as_str(), bucket.as_str(), 0);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus> {
        match self.buckets.remove(bucket) {
            Some((_, cache)) => {
                let entries = cache.iter().count();
                metrics::record_bucket_size(self.label.as_str(), bucket.as_str(), 0);
                Ok(DeleteStatus::Deleted(entries.min(u32::MAX as usize) as u32))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
