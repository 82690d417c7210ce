use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use offsync_backend::{Backend, CacheBackend, DeleteStatus};
use offsync_core::{Bucket, BucketName, BucketSet, CachedResponse, RequestKey};
use offsync_moka::MokaBackend;

fn entry(body: &'static str) -> CachedResponse {
    CachedResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
}

#[tokio::test]
async fn buckets_are_created_on_first_write() {
    let backend = MokaBackend::builder().max_entries(100).build();
    assert!(backend.buckets().await.unwrap().is_empty());

    let bucket = BucketName::from("api-responses");
    let key = RequestKey::get("/api/products");
    backend.write(&bucket, &key, entry("[]")).await.unwrap();

    assert_eq!(backend.buckets().await.unwrap(), vec![bucket.clone()]);
    let stored = backend.read(&bucket, &key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"[]");
}

#[tokio::test]
async fn rewrite_overwrites_entry() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let bucket = BucketName::from("dynamic-pages");
    let key = RequestKey::get("/products");
    backend.write(&bucket, &key, entry("old")).await.unwrap();
    backend.write(&bucket, &key, entry("new")).await.unwrap();

    let stored = backend.read(&bucket, &key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"new");
    assert_eq!(backend.keys(&bucket).await.unwrap(), vec![key]);
}

#[tokio::test]
async fn buckets_are_isolated() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let pages = BucketName::from("dynamic-pages");
    let shell = BucketName::from("app-shell");
    let key = RequestKey::get("/home");
    backend.write(&shell, &key, entry("shell")).await.unwrap();

    assert!(backend.read(&pages, &key).await.unwrap().is_none());
    backend.clear(&shell).await.unwrap();
    assert!(backend.read(&shell, &key).await.unwrap().is_none());
    assert_eq!(backend.buckets().await.unwrap(), vec![shell]);
}

#[tokio::test]
async fn delete_bucket_reports_entries() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let bucket = BucketName::from("static-assets");
    backend.write(&bucket, &RequestKey::get("/a.js"), entry("a")).await.unwrap();
    backend.write(&bucket, &RequestKey::get("/b.css"), entry("b")).await.unwrap();

    assert_eq!(backend.delete_bucket(&bucket).await.unwrap(), DeleteStatus::Deleted(2));
    assert_eq!(backend.delete_bucket(&bucket).await.unwrap(), DeleteStatus::Missing);
    assert!(backend.keys(&bucket).await.unwrap().is_empty());
}

#[tokio::test]
async fn version_upgrade_keeps_only_known_buckets() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let current = BucketSet::versioned("v2");
    let previous = BucketSet::versioned("v1");
    let key = RequestKey::get("/");

    for bucket in Bucket::ALL {
        backend.write(current.name(bucket), &key, entry("v2")).await.unwrap();
        backend.write(previous.name(bucket), &key, entry("v1")).await.unwrap();
    }

    let removed = backend.retain_buckets(current.known()).await.unwrap();
    assert_eq!(removed.len(), 4);

    let mut expected = current.known().to_vec();
    expected.sort();
    assert_eq!(backend.buckets().await.unwrap(), expected);
}

#[tokio::test]
async fn byte_capacity_evicts_within_bucket() {
    let backend = MokaBackend::builder().max_bytes(1_000).build();
    let bucket = BucketName::from("api-responses");
    let body: &'static str = Box::leak("x".repeat(300).into_boxed_str());

    for id in 0..10 {
        let key = RequestKey::get(format!("/api/products/{id}"));
        backend.write(&bucket, &key, entry(body)).await.unwrap();
    }
    let cache = backend.bucket_cache(&bucket).unwrap();
    cache.run_pending_tasks().await;

    assert!(cache.entry_count() < 10);
    assert!(cache.weighted_size() <= 1_000);
}
