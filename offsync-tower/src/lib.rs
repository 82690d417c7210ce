//! Tower middleware for the offsync dispatcher.
//!
//! [`OfflineLayer`] wraps any HTTP tower service (a hyper client, a proxy
//! handler) with an offsync [`Dispatcher`]. Intercepted `GET` requests are
//! served according to their kind's caching strategy; everything else, and
//! every request before the dispatcher is activated, goes straight to the
//! wrapped service.
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::Full;
//! use offsync::{Config, Dispatcher};
//! use offsync_moka::MokaBackend;
//! use offsync_tower::OfflineLayer;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let backend = MokaBackend::builder().max_entries(1_000).build();
//! let dispatcher = Dispatcher::new(backend, Config::default()).unwrap();
//!
//! let service = ServiceBuilder::new()
//!     .layer(OfflineLayer::new(dispatcher))
//!     .service(service_fn(|_req: Request<Full<Bytes>>| async {
//!         Ok::<_, std::convert::Infallible>(Response::new(Full::new(Bytes::from("hello"))))
//!     }));
//! # let _ = service;
//! ```
//!
//! # Response headers
//!
//! Dispatched responses carry the source header (default `x-offsync-source`):
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `NETWORK` | Fetched from the wrapped service |
//! | `CACHE` | Served from a cache bucket |
//! | `SYNTHETIC` | Built locally because nothing else could answer |
//!
//! Pass-through responses are left untouched.
//!
//! [`Dispatcher`]: offsync::Dispatcher

#![warn(missing_docs)]

/// Response body type.
pub mod body;
/// Tower layer.
pub mod layer;
/// The tower service applying the dispatcher.
pub mod service;
/// Upstream adapter over tower services.
pub mod upstream;

pub use body::OffsyncBody;
pub use layer::OfflineLayer;
pub use offsync_core::DEFAULT_SOURCE_HEADER;
pub use service::OfflineService;
pub use upstream::TowerUpstream;
