//! Metrics declaration and recording helpers.
//!
//! With the `metrics` feature enabled the following are recorded:
//!
//! - `offsync_response_total{kind,source}` - dispatched responses (counter)
//! - `offsync_sync_replayed_total` - actions replayed successfully (counter)
//! - `offsync_sync_failed_total` - replay attempts that failed (counter)
//! - `offsync_queue_length` - actions waiting for replay (gauge)
//!
//! Without the feature every helper is a no-op.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Dispatched responses by kind and source.
    pub static ref RESPONSE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "offsync_response_total",
            "Total number of responses returned by the dispatcher."
        );
        "offsync_response_total"
    };
    /// Successfully replayed actions.
    pub static ref SYNC_REPLAYED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "offsync_sync_replayed_total",
            "Total number of offline actions replayed successfully."
        );
        "offsync_sync_replayed_total"
    };
    /// Failed replay attempts.
    pub static ref SYNC_FAILED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "offsync_sync_failed_total",
            "Total number of offline action replays that failed."
        );
        "offsync_sync_failed_total"
    };
    /// Queue length.
    pub static ref QUEUE_LENGTH_GAUGE: &'static str = {
        metrics::describe_gauge!(
            "offsync_queue_length",
            "Number of offline actions waiting for replay."
        );
        "offsync_queue_length"
    };
}

/// Counts one dispatched response.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_response(kind: &'static str, source: &'static str) {
    metrics::counter!(*RESPONSE_COUNTER, "kind" => kind, "source" => source).increment(1);
}

/// Counts one dispatched response (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_response(_kind: &'static str, _source: &'static str) {}

/// Records the outcome of a sync pass.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_sync(replayed: usize, failed: usize) {
    metrics::counter!(*SYNC_REPLAYED_COUNTER).increment(replayed as u64);
    metrics::counter!(*SYNC_FAILED_COUNTER).increment(failed as u64);
}

/// Records the outcome of a sync pass (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_sync(_replayed: usize, _failed: usize) {}

/// Sets the queue length gauge.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_queue_length(len: usize) {
    metrics::gauge!(*QUEUE_LENGTH_GAUGE).set(len as f64);
}

/// Sets the queue length gauge (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_queue_length(_len: usize) {}
