use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::Extensions;
use offsync_core::{Upstream, UpstreamError};
use reqwest_middleware::Next;

/// [`Upstream`] running the rest of a reqwest-middleware chain.
///
/// The response body is buffered so the dispatcher can store it.
pub struct NextUpstream<'a> {
    next: Next<'a>,
    extensions: Extensions,
}

impl<'a> NextUpstream<'a> {
    /// Wraps the remaining chain.
    pub fn new(next: Next<'a>, extensions: Extensions) -> Self {
        Self { next, extensions }
    }
}

impl<'a> Upstream<reqwest::Request> for NextUpstream<'a> {
    type Future = Pin<Box<dyn Future<Output = Result<http::Response<Bytes>, UpstreamError>> + Send + 'a>>;

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let next = self.next.clone();
        let mut extensions = std::mem::take(&mut self.extensions);

        Box::pin(async move {
            let response = next
                .run(req, &mut extensions)
                .await
                .map_err(UpstreamError::transport)?;
            buffer(response).await
        })
    }
}

/// Reads a reqwest response into an [`http::Response`] with a buffered body.
pub(crate) async fn buffer(response: reqwest::Response) -> Result<http::Response<Bytes>, UpstreamError> {
    let mut builder = http::Response::builder()
        .status(response.status())
        .version(response.version());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(response.headers().clone());
    }
    let body = response.bytes().await.map_err(UpstreamError::body)?;
    builder.body(body).map_err(UpstreamError::body)
}
