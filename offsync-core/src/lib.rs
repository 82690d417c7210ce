#![warn(missing_docs)]
//! # offsync-core
//!
//! Core traits and types for the offsync offline-first HTTP layer.
//!
//! This crate holds the vocabulary shared by every other offsync crate:
//!
//! - **Identify** cached requests ([`RequestKey`])
//! - **Name** cache buckets ([`Bucket`], [`BucketName`], [`BucketSet`])
//! - **Store** responses ([`CachedResponse`])
//! - **Record** offline mutations ([`OfflineAction`], [`NewAction`])
//! - **Call** the network ([`Upstream`])
//! - **Report** where a response came from ([`ResponseSource`])
//!
//! Storage backends live in `offsync-backend` and its implementations
//! (`offsync-moka`, `offsync-feoxdb`); the dispatcher and queue live in `offsync`.

pub mod action;
pub mod bucket;
pub mod key;
pub mod label;
pub mod response;
pub mod source;
pub mod upstream;

pub use action::{ActionId, ActionMethod, NewAction, OfflineAction, UnsupportedMethod};
pub use bucket::{Bucket, BucketName, BucketSet};
pub use key::RequestKey;
pub use label::BackendLabel;
pub use response::CachedResponse;
pub use source::{DEFAULT_SOURCE_HEADER, ResponseSource};
pub use upstream::{BoxError, Upstream, UpstreamError, UpstreamFn, upstream_fn};

#[doc(hidden)]
pub use smol_str::SmolStr;
