#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Dispatcher and queue configuration.
pub mod config;

/// Online/offline flag shared by the queue and the host.
pub mod connectivity;

/// Request dispatch over the cache buckets.
///
/// [`Dispatcher::route`] decides whether a request is intercepted and
/// [`Dispatcher::dispatch`] serves it.
pub mod dispatcher;

/// Error types for configuration and install.
pub mod error;

/// Install and activation of a [`Dispatcher`].
pub mod lifecycle;

/// Metrics collection.
///
/// When the `metrics` feature is enabled this module records dispatched
/// responses by kind and source, sync outcomes and the queue length.
pub mod metrics;

/// Durable key/value store for offline JSON documents.
pub mod offline_data;

/// Durable replay queue for offline mutations.
pub mod queue;

/// Request classification.
pub mod route;

/// Per-kind caching strategies.
pub mod strategy;

/// Locally built fallback responses.
pub mod synthetic;

/// Bearer token storage.
pub mod token;

pub use config::{Config, ConfigBuilder, Manifest, StorageKeys};
pub use connectivity::Connectivity;
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::{ConfigError, InstallError};
pub use lifecycle::{ActivateReport, InstallReport, WorkerState};
pub use offline_data::{DataEntry, OfflineData};
pub use queue::{ActionQueue, SkipReason, SyncReport, SyncStatus};
pub use route::{AcceptsHtml, Matcher, PathExtension, PathPrefix, RequestHead, RequestKind, RouteTable};
pub use strategy::Strategy;
pub use token::TokenStore;

pub use offsync_backend::{Backend, BackendError, CacheBackend, DeleteStatus, Storage, StorageExt};
pub use offsync_core::{
    ActionId, ActionMethod, Bucket, BucketName, BucketSet, CachedResponse, NewAction,
    OfflineAction, RequestKey, ResponseSource, Upstream, UpstreamError, upstream_fn,
};

/// The `offsync` prelude.
///
/// ```rust
/// use offsync::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ActionQueue, Backend, CacheBackend, Config, Connectivity, Dispatcher, NewAction, Storage,
        StorageExt, Upstream,
    };
}
