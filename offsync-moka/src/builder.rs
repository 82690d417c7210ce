//! Builder for configuring [`MokaBackend`].

use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use offsync_core::{BackendLabel, CachedResponse, RequestKey};

use crate::backend::MokaBackend;

/// Marker type: capacity has not been configured yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: each bucket holds at most `n` entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: each bucket holds at most about `n` bytes.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

#[derive(Debug, Clone, Copy)]
pub(crate) enum Capacity {
    Entries(u64),
    Bytes(u64),
}

/// Settings every bucket cache is created with.
#[derive(Clone)]
pub(crate) struct BucketSettings {
    capacity: Capacity,
    policy: EvictionPolicy,
}

impl BucketSettings {
    pub(crate) fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub(crate) fn new_cache(&self) -> Cache<RequestKey, CachedResponse> {
        match self.capacity {
            Capacity::Entries(entries) => CacheBuilder::new(entries)
                .eviction_policy(self.policy.clone())
                .build(),
            Capacity::Bytes(bytes) => CacheBuilder::new(bytes)
                .weigher(entry_weight)
                .eviction_policy(self.policy.clone())
                .build(),
        }
    }
}

/// Approximate memory cost of one entry.
fn entry_weight(key: &RequestKey, value: &CachedResponse) -> u32 {
    const OVERHEAD: usize = 96;
    let headers: usize = value
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();
    let size = OVERHEAD + key.method().len() + key.url().len() + headers + value.body().len();
    size.min(u32::MAX as usize) as u32
}

/// Builder for a [`MokaBackend`].
///
/// Capacity applies to every bucket separately and must be set with exactly
/// one of [`max_entries`](Self::max_entries) or [`max_bytes`](Self::max_bytes)
/// before `build()` becomes available.
///
/// ```
/// use offsync_moka::{EvictionPolicy, MokaBackend};
///
/// let backend = MokaBackend::builder()
///     .label("pages")
///     .max_bytes(16 * 1024 * 1024)
///     .eviction_policy(EvictionPolicy::tiny_lfu())
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    label: BackendLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: BackendLabel::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Limits each bucket by entry count.
    pub fn max_entries(self, entries: u64) -> MokaBackendBuilder<EntryCapacity> {
        MokaBackendBuilder {
            capacity: EntryCapacity(entries),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Limits each bucket by approximate size in bytes.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets the label used in logs and metrics. Default: `"moka"`.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// Defaults to TinyLFU for entry capacity and LRU for byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the backend.
    pub fn build(self) -> MokaBackend {
        let settings = BucketSettings {
            capacity: Capacity::Entries(self.capacity.0),
            policy: self
                .eviction_policy
                .unwrap_or_else(EvictionPolicy::tiny_lfu),
        };
        MokaBackend::from_settings(settings, self.label)
    }
}

impl MokaBackendBuilder<ByteCapacity> {
    /// Builds the backend.
    ///
    /// LRU is the default here: TinyLFU admission may reject a heavy entry
    /// even when eviction could make room for it.
    pub fn build(self) -> MokaBackend {
        let settings = BucketSettings {
            capacity: Capacity::Bytes(self.capacity.0),
            policy: self.eviction_policy.unwrap_or_else(EvictionPolicy::lru),
        };
        MokaBackend::from_settings(settings, self.label)
    }
}
