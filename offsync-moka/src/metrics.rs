//! Per-bucket size gauges.
//!
//! Enable the `metrics` feature to record:
//!
//! - `offsync_moka_bucket_entries` - entries currently held by a bucket (gauge)
//!
//! Labels: `backend`, `bucket`.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the bucket entry gauge.
    pub static ref MOKA_BUCKET_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "offsync_moka_bucket_entries",
            "Current number of entries in a Moka cache bucket."
        );
        "offsync_moka_bucket_entries"
    };
}

/// Records the entry count of one bucket.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_bucket_size(backend: &str, bucket: &str, entries: u64) {
    metrics::gauge!(
        *MOKA_BUCKET_ENTRIES,
        "backend" => backend.to_string(),
        "bucket" => bucket.to_string()
    )
    .set(entries as f64);
}

/// Records the entry count of one bucket (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_bucket_size(_backend: &str, _bucket: &str, _entries: u64) {}
