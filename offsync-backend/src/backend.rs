use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use http::Response;
use offsync_core::{BackendLabel, BucketName, CachedResponse, RequestKey};
use tracing::{debug, warn};

use crate::{BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// Named cache buckets of stored responses.
///
/// A bucket springs into existence on its first write and disappears only
/// through [`Backend::delete_bucket`]. Writing an existing key overwrites it.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>>;

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()>;

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus>;

    /// Keys currently stored in `bucket`. Unknown buckets are empty.
    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>>;

    /// Every bucket that currently exists.
    async fn buckets(&self) -> BackendResult<Vec<BucketName>>;

    /// Removes every entry from `bucket` but keeps the bucket itself.
    async fn clear(&self, bucket: &BucketName) -> BackendResult<()> {
        for key in self.keys(bucket).await? {
            self.remove(bucket, &key).await?;
        }
        Ok(())
    }

    /// Drops `bucket` with all its entries.
    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus>;

    /// Name of this backend for logs and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

#[async_trait]
impl<B> Backend for Box<B>
where
    B: Backend + ?Sized,
{
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>> {
        (**self).read(bucket, key).await
    }

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()> {
        (**self).write(bucket, key, value).await
    }

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus> {
        (**self).remove(bucket, key).await
    }

    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>> {
        (**self).keys(bucket).await
    }

    async fn buckets(&self) -> BackendResult<Vec<BucketName>> {
        (**self).buckets().await
    }

    async fn clear(&self, bucket: &BucketName) -> BackendResult<()> {
        (**self).clear(bucket).await
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus> {
        (**self).delete_bucket(bucket).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>> {
        (**self).read(bucket, key).await
    }

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()> {
        (**self).write(bucket, key, value).await
    }

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus> {
        (**self).remove(bucket, key).await
    }

    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>> {
        (**self).keys(bucket).await
    }

    async fn buckets(&self) -> BackendResult<Vec<BucketName>> {
        (**self).buckets().await
    }

    async fn clear(&self, bucket: &BucketName) -> BackendResult<()> {
        (**self).clear(bucket).await
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus> {
        (**self).delete_bucket(bucket).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

/// Bucket-aware helpers built on [`Backend`].
pub trait CacheBackend: Backend {
    /// First entry for `key` found in `buckets`, searched in order.
    ///
    /// Read failures are logged and treated as misses.
    fn lookup(
        &self,
        buckets: &[BucketName],
        key: &RequestKey,
    ) -> impl Future<Output = Option<(BucketName, CachedResponse)>> + Send {
        async move {
            for bucket in buckets {
                match self.read(bucket, key).await {
                    Ok(Some(value)) => {
                        debug!(backend = %self.label(), bucket = %bucket, key = %key, "cache hit");
                        return Some((bucket.clone(), value));
                    }
                    Ok(None) => {}
                    Err(error) => {
                        warn!(
                            backend = %self.label(),
                            bucket = %bucket,
                            key = %key,
                            error = %error,
                            "cache read failed"
                        );
                    }
                }
            }
            None
        }
    }

    /// Stores a copy of `response` if it is a successful answer to a `GET`.
    ///
    /// Returns whether anything was written.
    fn store(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        response: &Response<Bytes>,
    ) -> impl Future<Output = BackendResult<bool>> + Send {
        async move {
            if !key.is_get() || !response.status().is_success() {
                return Ok(false);
            }
            self.write(bucket, key, CachedResponse::from_response(response))
                .await?;
            debug!(backend = %self.label(), bucket = %bucket, key = %key, "response stored");
            Ok(true)
        }
    }

    /// Writes every entry into `bucket`.
    fn populate(
        &self,
        bucket: &BucketName,
        entries: Vec<(RequestKey, CachedResponse)>,
    ) -> impl Future<Output = BackendResult<usize>> + Send {
        async move {
            let count = entries.len();
            for (key, value) in entries {
                self.write(bucket, &key, value).await?;
            }
            Ok(count)
        }
    }

    /// Deletes every bucket not listed in `known`, returning the removed names.
    fn retain_buckets(
        &self,
        known: &[BucketName],
    ) -> impl Future<Output = BackendResult<Vec<BucketName>>> + Send {
        async move {
            let mut removed = Vec::new();
            for bucket in self.buckets().await? {
                if known.contains(&bucket) {
                    continue;
                }
                self.delete_bucket(&bucket).await?;
                debug!(backend = %self.label(), bucket = %bucket, "stale bucket deleted");
                removed.push(bucket);
            }
            Ok(removed)
        }
    }
}

impl<B> CacheBackend for B where B: Backend + ?Sized {}
