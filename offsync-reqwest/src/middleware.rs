//! reqwest-middleware integration.

use async_trait::async_trait;
use http::{Extensions, HeaderName, Uri};
use offsync::{Dispatcher, RequestHead};
use offsync_backend::Backend;
use offsync_core::DEFAULT_SOURCE_HEADER;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, trace};

use crate::upstream::NextUpstream;

/// Middleware applying an offsync [`Dispatcher`] to a reqwest client.
///
/// Intercepted responses carry the source header (default
/// `x-offsync-source`). Requests the dispatcher declines, and requests whose
/// URL cannot be expressed as an HTTP URI, are forwarded unchanged.
///
/// ```no_run
/// use offsync::{Config, Dispatcher};
/// use offsync_moka::MokaBackend;
/// use offsync_reqwest::OfflineMiddleware;
/// use reqwest_middleware::ClientBuilder;
///
/// let backend = MokaBackend::builder().max_entries(1_000).build();
/// let dispatcher = Dispatcher::new(backend, Config::default()).unwrap();
/// let client = ClientBuilder::new(reqwest::Client::new())
///     .with(OfflineMiddleware::new(dispatcher))
///     .build();
/// ```
pub struct OfflineMiddleware<B> {
    dispatcher: Dispatcher<B>,
    source_header: HeaderName,
}

impl<B> OfflineMiddleware<B> {
    /// Middleware with the default source header.
    pub fn new(dispatcher: Dispatcher<B>) -> Self {
        Self {
            dispatcher,
            source_header: DEFAULT_SOURCE_HEADER,
        }
    }

    /// Sets the header carrying the response source.
    pub fn source_header(mut self, name: HeaderName) -> Self {
        self.source_header = name;
        self
    }
}

impl<B> Clone for OfflineMiddleware<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            source_header: self.source_header.clone(),
        }
    }
}

fn request_head(req: &Request) -> Option<RequestHead> {
    let uri: Uri = req.url().as_str().parse().ok()?;
    Some(RequestHead::new(
        req.method().clone(),
        uri,
        req.headers().clone(),
    ))
}

#[async_trait]
impl<B> Middleware for OfflineMiddleware<B>
where
    B: Backend + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let Some(head) = request_head(&req) else {
            debug!(url = %req.url(), "url is not a valid uri, bypassing");
            return next.run(req, extensions).await;
        };
        let Some(kind) = self.dispatcher.route(&head) else {
            trace!(method = %head.method(), uri = %head.uri(), "passing through");
            return next.run(req, extensions).await;
        };

        let mut upstream = NextUpstream::new(next, extensions.clone());
        let dispatched = self.dispatcher.dispatch(kind, &head, req, &mut upstream).await;

        let mut response = dispatched.response;
        response
            .headers_mut()
            .insert(self.source_header.clone(), dispatched.source.header_value());
        Ok(Response::from(response))
    }
}
