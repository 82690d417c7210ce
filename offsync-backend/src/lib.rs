//! Storage seams for offsync.
//!
//! Two kinds of storage sit under the dispatcher and the queue:
//!
//! - [`Backend`]: named cache buckets mapping a [`RequestKey`](offsync_core::RequestKey)
//!   to a [`CachedResponse`](offsync_core::CachedResponse). [`CacheBackend`] adds the
//!   bucket-aware helpers the dispatcher uses.
//! - [`Storage`]: small durable key → bytes store for the action queue, the
//!   auth token and offline data. [`StorageExt`] layers JSON on top of it.
//!
//! Implementations live in `offsync-moka` (in-memory buckets) and
//! `offsync-feoxdb` (persistent buckets and storage). [`MemoryStorage`] is a
//! process-local [`Storage`] for tests and ephemeral clients.
mod backend;
mod error;
mod memory;
mod storage;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use error::{BackendError, FormatError};
pub use memory::MemoryStorage;
pub use storage::{Storage, StorageExt};

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// That many records were deleted.
    Deleted(u32),
    /// Nothing was stored under the key.
    Missing,
}
