//! Adapter implementing [`Upstream`] for tower services.
//!
//! Used by [`OfflineService`](crate::OfflineService) for intercepted requests,
//! and usable directly for [`Dispatcher::install`](offsync::Dispatcher::install)
//! and [`ActionQueue::sync`](offsync::ActionQueue::sync).

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use offsync_core::{BoxError, Upstream, UpstreamError};
use tower::{Service, ServiceExt};

/// [`Upstream`] over a tower HTTP service. Response bodies are buffered.
pub struct TowerUpstream<S, ReqBody, ResBody> {
    service: S,
    _phantom: PhantomData<fn(ReqBody) -> ResBody>,
}

impl<S, ReqBody, ResBody> TowerUpstream<S, ReqBody, ResBody> {
    /// Wraps a service.
    pub fn new(service: S) -> Self {
        Self {
            service,
            _phantom: PhantomData,
        }
    }

    /// Unwraps the service.
    pub fn into_inner(self) -> S {
        self.service
    }
}

impl<S: Clone, ReqBody, ResBody> Clone for TowerUpstream<S, ReqBody, ResBody> {
    fn clone(&self) -> Self {
        Self::new(self.service.clone())
    }
}

impl<S, ReqBody, ResBody> fmt::Debug for TowerUpstream<S, ReqBody, ResBody> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TowerUpstream").finish_non_exhaustive()
    }
}

impl<S, ReqBody, ResBody> Upstream<Request<ReqBody>> for TowerUpstream<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Future = BoxFuture<'static, Result<Response<Bytes>, UpstreamError>>;

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let clone = self.service.clone();
        let service = std::mem::replace(&mut self.service, clone);
        Box::pin(async move {
            let response = service
                .oneshot(req)
                .await
                .map_err(UpstreamError::transport)?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(UpstreamError::body)?
                .to_bytes();
            Ok(Response::from_parts(parts, body))
        })
    }
}
