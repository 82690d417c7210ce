//! In-memory cache buckets for offsync, backed by [Moka](https://docs.rs/moka).
//!
//! Every bucket is its own bounded `moka::future::Cache`, so buckets are
//! enumerated, cleared and dropped independently. Contents are lost when the
//! process exits; use `offsync-feoxdb` when buckets must survive restarts.
//!
//! ```
//! use offsync_moka::MokaBackend;
//!
//! let backend = MokaBackend::builder().max_entries(1_000).build();
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaBackend;
pub use builder::{ByteCapacity, EntryCapacity, MokaBackendBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
