use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Response, StatusCode};
use offsync_backend::{Backend, BackendError, BackendResult, CacheBackend, DeleteStatus};
use offsync_core::{BucketName, CachedResponse, RequestKey};

#[derive(Default)]
struct MapBackend {
    buckets: Mutex<BTreeMap<BucketName, BTreeMap<RequestKey, CachedResponse>>>,
    broken: Option<BucketName>,
}

#[async_trait]
impl Backend for MapBackend {
    async fn read(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
    ) -> BackendResult<Option<CachedResponse>> {
        if self.broken.as_ref() == Some(bucket) {
            return Err(BackendError::internal("bucket unreadable"));
        }
        let buckets = self.buckets.lock().unwrap();
        Ok(buckets.get(bucket).and_then(|entries| entries.get(key)).cloned())
    }

    async fn write(
        &self,
        bucket: &BucketName,
        key: &RequestKey,
        value: CachedResponse,
    ) -> BackendResult<()> {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.clone())
            .or_default()
            .insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, bucket: &BucketName, key: &RequestKey) -> BackendResult<DeleteStatus> {
        let mut buckets = self.buckets.lock().unwrap();
        Ok(match buckets.get_mut(bucket).and_then(|e| e.remove(key)) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self, bucket: &BucketName) -> BackendResult<Vec<RequestKey>> {
        let buckets = self.buckets.lock().unwrap();
        Ok(buckets
            .get(bucket)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn buckets(&self) -> BackendResult<Vec<BucketName>> {
        Ok(self.buckets.lock().unwrap().keys().cloned().collect())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<DeleteStatus> {
        Ok(match self.buckets.lock().unwrap().remove(bucket) {
            Some(entries) => DeleteStatus::Deleted(entries.len() as u32),
            None => DeleteStatus::Missing,
        })
    }
}

fn response(status: StatusCode, body: &'static str) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(body.as_bytes()));
    *response.status_mut() = status;
    response
}

#[tokio::test]
async fn store_skips_non_success_and_non_get() {
    let backend = MapBackend::default();
    let bucket = BucketName::from("api-responses");

    let get = RequestKey::get("/api/products");
    assert!(backend.store(&bucket, &get, &response(StatusCode::OK, "[]")).await.unwrap());
    assert!(!backend
        .store(&bucket, &get, &response(StatusCode::INTERNAL_SERVER_ERROR, "boom"))
        .await
        .unwrap());

    let post = RequestKey::new(&Method::POST, "/api/products");
    assert!(!backend.store(&bucket, &post, &response(StatusCode::OK, "{}")).await.unwrap());

    let stored = backend.read(&bucket, &get).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"[]");
    assert_eq!(backend.keys(&bucket).await.unwrap(), vec![get]);
}

#[tokio::test]
async fn lookup_searches_in_order_and_skips_errors() {
    let broken = BucketName::from("dynamic-pages");
    let backend = MapBackend {
        broken: Some(broken.clone()),
        ..Default::default()
    };
    let shell = BucketName::from("app-shell");
    let key = RequestKey::get("/products");
    backend
        .write(&shell, &key, CachedResponse::from_response(&response(StatusCode::OK, "shell")))
        .await
        .unwrap();

    let (bucket, hit) = backend.lookup(&[broken, shell.clone()], &key).await.unwrap();
    assert_eq!(bucket, shell);
    assert_eq!(hit.body().as_ref(), b"shell");

    assert!(backend.lookup(&[shell], &RequestKey::get("/cart")).await.is_none());
}

#[tokio::test]
async fn retain_buckets_deletes_unknown() {
    let backend = MapBackend::default();
    let key = RequestKey::get("/");
    let entry = CachedResponse::from_response(&response(StatusCode::OK, "x"));
    for name in ["app-shell", "api-responses", "store-pwa-v1"] {
        backend.write(&BucketName::from(name), &key, entry.clone()).await.unwrap();
    }

    let known = [BucketName::from("app-shell"), BucketName::from("api-responses")];
    let removed = backend.retain_buckets(&known).await.unwrap();
    assert_eq!(removed, vec![BucketName::from("store-pwa-v1")]);
    let mut expected = known.to_vec();
    expected.sort();
    assert_eq!(backend.buckets().await.unwrap(), expected);
}

#[tokio::test]
async fn default_clear_empties_bucket() {
    let backend = MapBackend::default();
    let bucket = BucketName::from("static-assets");
    let entries = vec![
        (
            RequestKey::get("/favicon.png"),
            CachedResponse::from_response(&response(StatusCode::OK, "png")),
        ),
        (
            RequestKey::get("/static/css/main.css"),
            CachedResponse::from_response(&response(StatusCode::OK, "css")),
        ),
    ];
    assert_eq!(backend.populate(&bucket, entries).await.unwrap(), 2);
    backend.clear(&bucket).await.unwrap();
    assert!(backend.keys(&bucket).await.unwrap().is_empty());
}
