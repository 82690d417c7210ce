//! Persistent offsync storage on [FeOxDB](https://docs.rs/feoxdb).
//!
//! [`FeOxDbBackend`] implements both [`Backend`](offsync_backend::Backend)
//! (named cache buckets that survive restarts) and
//! [`Storage`](offsync_backend::Storage) (the durable key-value store behind
//! the action queue, the auth token and offline data), so one database file
//! can hold everything a client needs offline.
#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{FeOxDbBackend, FeOxDbBackendBuilder};
pub use error::FeOxDbError;
