//! The network side of the dispatcher.

use std::error::Error as StdError;
use std::future::Future;

use bytes::Bytes;
use http::Response;
use thiserror::Error;

/// Boxed error used for foreign transport and body errors.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure to obtain a response from the network.
///
/// Any non-2xx *response* is not an error; it is returned as-is.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response (unreachable, refused, reset).
    #[error("upstream transport error: {0}")]
    Transport(#[source] BoxError),
    /// A response arrived but its body could not be read.
    #[error("upstream body error: {0}")]
    Body(#[source] BoxError),
}

impl UpstreamError {
    /// Wraps a transport error.
    pub fn transport(error: impl Into<BoxError>) -> Self {
        UpstreamError::Transport(error.into())
    }

    /// Wraps a body error.
    pub fn body(error: impl Into<BoxError>) -> Self {
        UpstreamError::Body(error.into())
    }
}

/// Something that can send a request to the network and buffer the response.
///
/// Framework adapters (`offsync-tower`, `offsync-reqwest`) implement this for
/// their own request types; the dispatcher, the installer and the replay loop
/// only ever see this trait.
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, Response};
/// use offsync_core::{Upstream, UpstreamError, upstream_fn};
///
/// let mut upstream = upstream_fn(|_req: Request<Bytes>| async {
///     Ok::<_, UpstreamError>(Response::new(Bytes::from_static(b"ok")))
/// });
/// let _future = upstream.call(Request::new(Bytes::new()));
/// ```
pub trait Upstream<Req> {
    /// Future resolving to the buffered response.
    type Future: Future<Output = Result<Response<Bytes>, UpstreamError>> + Send;

    /// Sends the request.
    fn call(&mut self, req: Req) -> Self::Future;
}

/// [`Upstream`] backed by a closure. See [`upstream_fn`].
#[derive(Clone, Copy, Debug)]
pub struct UpstreamFn<F> {
    f: F,
}

/// Creates an [`Upstream`] from a closure returning a future.
pub fn upstream_fn<F>(f: F) -> UpstreamFn<F> {
    UpstreamFn { f }
}

impl<F, Req, Fut> Upstream<Req> for UpstreamFn<F>
where
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = Result<Response<Bytes>, UpstreamError>> + Send,
{
    type Future = Fut;

    fn call(&mut self, req: Req) -> Self::Future {
        (self.f)(req)
    }
}
