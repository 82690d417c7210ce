use bytes::Bytes;
use futures::future::BoxFuture;
use offsync_core::{Upstream, UpstreamError};
use reqwest::{Client, Url};

use crate::upstream::buffer;

/// [`Upstream`] sending requests through a [`reqwest::Client`].
///
/// Origin-relative request URIs (`/products`, as found in the install
/// manifest and in queued actions) are resolved against `base_url`; absolute
/// URIs are sent as they are.
#[derive(Debug, Clone)]
pub struct ClientUpstream {
    client: Client,
    base_url: Url,
}

impl ClientUpstream {
    /// Upstream for the origin at `base_url`.
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Origin requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, uri: &http::Uri) -> Result<Url, UpstreamError> {
        let url = match uri.scheme() {
            Some(_) => Url::parse(&uri.to_string()),
            None => self.base_url.join(&uri.to_string()),
        };
        url.map_err(UpstreamError::transport)
    }
}

impl Upstream<http::Request<Bytes>> for ClientUpstream {
    type Future = BoxFuture<'static, Result<http::Response<Bytes>, UpstreamError>>;

    fn call(&mut self, req: http::Request<Bytes>) -> Self::Future {
        let client = self.client.clone();
        let url = self.resolve(req.uri());
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = client
                .request(parts.method, url?)
                .headers(parts.headers)
                .body(body)
                .send()
                .await
                .map_err(UpstreamError::transport)?;
            buffer(response).await
        })
    }
}
