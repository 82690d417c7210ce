use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::{HeaderName, Request, Response};
use hyper::body::Body as HttpBody;
use offsync::{Dispatcher, RequestHead};
use offsync_backend::Backend;
use offsync_core::BoxError;
use tower::Service;
use tracing::trace;

use crate::body::OffsyncBody;
use crate::upstream::TowerUpstream;

/// Tower service built by [`OfflineLayer`](crate::OfflineLayer).
pub struct OfflineService<S, B> {
    inner: S,
    dispatcher: Dispatcher<B>,
    source_header: HeaderName,
}

impl<S, B> OfflineService<S, B> {
    /// Wraps `inner` with `dispatcher`.
    pub fn new(inner: S, dispatcher: Dispatcher<B>, source_header: HeaderName) -> Self {
        Self {
            inner,
            dispatcher,
            source_header,
        }
    }
}

impl<S, B> Clone for OfflineService<S, B>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            dispatcher: self.dispatcher.clone(),
            source_header: self.source_header.clone(),
        }
    }
}

impl<S, B, ReqBody, ResBody> Service<Request<ReqBody>> for OfflineService<S, B>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    B: Backend + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<OffsyncBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // The ready service goes with this request; the clone stays for the next.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let head = RequestHead::from_request(&req);
        let Some(kind) = self.dispatcher.route(&head) else {
            trace!(method = %head.method(), uri = %head.uri(), "passing through");
            let future = inner.call(req);
            return Box::pin(async move {
                let response = future.await?;
                Ok(response.map(OffsyncBody::Passthrough))
            });
        };

        let dispatcher = self.dispatcher.clone();
        let source_header = self.source_header.clone();
        Box::pin(async move {
            let mut upstream = TowerUpstream::<S, ReqBody, ResBody>::new(inner);
            let dispatched = dispatcher.dispatch(kind, &head, req, &mut upstream).await;
            let mut response = dispatched.response.map(OffsyncBody::complete);
            response
                .headers_mut()
                .insert(source_header, dispatched.source.header_value());
            Ok(response)
        })
    }
}
