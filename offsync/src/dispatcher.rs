//! The cache dispatcher.
//!
//! [`Dispatcher`] decides whether a request is intercepted at all
//! ([`Dispatcher::route`]) and, if so, serves it according to the
//! [`Strategy`] of its [`RequestKind`] ([`Dispatcher::dispatch`]). Framework
//! integrations call the two in sequence and forward everything `route`
//! declines straight to the network.
//!
//! Cache failures never reach the caller: a failed read is a miss and a
//! failed write is skipped, both logged at `warn`.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Response};
use offsync_backend::{Backend, CacheBackend};
use offsync_core::{
    Bucket, BucketName, BucketSet, CachedResponse, RequestKey, ResponseSource, Upstream,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ConfigError;
use crate::lifecycle::WorkerState;
use crate::metrics;
use crate::route::{RequestHead, RequestKind, RouteTable};
use crate::strategy::{Fallback, Order, Strategy, Synthetic};
use crate::synthetic;

/// Response returned by [`Dispatcher::dispatch`].
#[derive(Debug)]
pub struct Dispatched {
    /// The response for the caller.
    pub response: Response<Bytes>,
    /// Where it came from.
    pub source: ResponseSource,
    /// How the request was classified.
    pub kind: RequestKind,
}

pub(crate) struct Inner<B> {
    pub(crate) backend: B,
    pub(crate) config: Config,
    pub(crate) buckets: BucketSet,
    pub(crate) routes: RouteTable,
    pub(crate) state: watch::Sender<WorkerState>,
}

/// Offline-first dispatcher over a bucket [`Backend`].
///
/// Cheap to clone; clones share the backend and the lifecycle state.
pub struct Dispatcher<B> {
    pub(crate) inner: Arc<Inner<B>>,
}

impl<B> Clone for Dispatcher<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> std::fmt::Debug for Dispatcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &*self.inner.state.borrow())
            .field("routes", &self.inner.routes)
            .finish_non_exhaustive()
    }
}

impl<B> Dispatcher<B>
where
    B: Backend,
{
    /// Creates a dispatcher in the [`WorkerState::Parsed`] state.
    pub fn new(backend: B, config: Config) -> Result<Self, ConfigError> {
        let routes = config.route_table()?;
        Ok(Self::with_routes(backend, config, routes))
    }

    /// Creates a dispatcher with a custom classification table.
    pub fn with_routes(backend: B, config: Config, routes: RouteTable) -> Self {
        let buckets = config.buckets();
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                buckets,
                routes,
                state,
            }),
        }
    }

    /// The bucket backend.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Bucket names in use.
    pub fn buckets(&self) -> &BucketSet {
        &self.inner.buckets
    }

    /// Classifies a request regardless of method or state.
    pub fn classify(&self, head: &RequestHead) -> RequestKind {
        self.inner.routes.classify(head)
    }

    /// Kind of the request if the dispatcher intercepts it.
    ///
    /// Only `GET` requests are intercepted, and only once the dispatcher is
    /// [`WorkerState::Activated`]. `None` means "send it to the network as is".
    pub fn route(&self, head: &RequestHead) -> Option<RequestKind> {
        if *head.method() != Method::GET || !self.state().controls_requests() {
            return None;
        }
        Some(self.classify(head))
    }

    /// Serves an intercepted request.
    ///
    /// `request` is handed to `upstream` at most once; a cache-first hit
    /// drops it unsent.
    pub async fn dispatch<Req, U>(
        &self,
        kind: RequestKind,
        head: &RequestHead,
        request: Req,
        upstream: &mut U,
    ) -> Dispatched
    where
        U: Upstream<Req>,
    {
        let key = head.key();
        let strategy = Strategy::for_kind(kind);
        let store = self.inner.buckets.name(strategy.store).clone();

        if strategy.order == Order::CacheFirst
            && let Some((bucket, cached)) = self.inner.backend.lookup(&[store.clone()], &key).await
        {
            return self.finish(kind, cached.into_response(), ResponseSource::Cache(bucket));
        }

        match upstream.call(request).await {
            Ok(response) => {
                if let Err(error) = self.inner.backend.store(&store, &key, &response).await {
                    warn!(bucket = %store, key = %key, error = %error, "cache write failed");
                }
                self.finish(kind, response, ResponseSource::Network)
            }
            Err(error) => {
                debug!(kind = %kind, key = %key, error = %error, "network unavailable");
                if strategy.order == Order::NetworkFirst {
                    for fallback in strategy.fallbacks {
                        if let Some((bucket, cached)) = self.fallback(*fallback, &key).await {
                            return self.finish(
                                kind,
                                cached.into_response(),
                                ResponseSource::Cache(bucket),
                            );
                        }
                    }
                }
                let response = match strategy.synthetic {
                    Synthetic::NotFound => synthetic::not_found(),
                    Synthetic::OfflineApi => synthetic::offline_api(&self.inner.config.offline_message),
                    Synthetic::OfflinePage => {
                        synthetic::offline_page(&self.inner.config.offline_message)
                    }
                };
                self.finish(kind, response, ResponseSource::Synthetic)
            }
        }
    }

    async fn fallback(
        &self,
        fallback: Fallback,
        key: &RequestKey,
    ) -> Option<(BucketName, CachedResponse)> {
        match fallback {
            Fallback::Entry(bucket) => {
                let name = self.inner.buckets.name(bucket).clone();
                self.inner.backend.lookup(&[name], key).await
            }
            Fallback::ShellRoot => {
                let name = self.inner.buckets.name(Bucket::AppShell).clone();
                let root = RequestKey::get(self.inner.config.shell_root.as_str());
                self.inner.backend.lookup(&[name], &root).await
            }
        }
    }

    fn finish(
        &self,
        kind: RequestKind,
        response: Response<Bytes>,
        source: ResponseSource,
    ) -> Dispatched {
        debug!(
            kind = %kind,
            status = %response.status(),
            source = source.as_str(),
            "request dispatched"
        );
        metrics::record_response(kind.as_str(), source.as_str());
        Dispatched {
            response,
            source,
            kind,
        }
    }
}
