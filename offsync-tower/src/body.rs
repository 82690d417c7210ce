use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

/// Body of a response returned by [`OfflineService`](crate::OfflineService).
///
/// - [`Complete`](OffsyncBody::Complete): the dispatcher produced the
///   response, from cache, network or locally; the body is fully buffered.
/// - [`Passthrough`](OffsyncBody::Passthrough): the request was not
///   intercepted and the wrapped service's body streams through untouched.
#[pin_project(project = OffsyncBodyProj)]
#[derive(Debug)]
pub enum OffsyncBody<B> {
    /// Buffered body, yielded once.
    Complete(Option<Bytes>),
    /// Body of the wrapped service.
    Passthrough(#[pin] B),
}

impl<B> OffsyncBody<B> {
    /// Buffered body. An empty buffer is an already finished body.
    pub fn complete(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            OffsyncBody::Complete(None)
        } else {
            OffsyncBody::Complete(Some(bytes))
        }
    }
}

impl<B> HttpBody for OffsyncBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            OffsyncBodyProj::Complete(data) => Poll::Ready(data.take().map(|bytes| Ok(Frame::data(bytes)))),
            OffsyncBodyProj::Passthrough(body) => match body.poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            OffsyncBody::Complete(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            OffsyncBody::Complete(None) => SizeHint::with_exact(0),
            OffsyncBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            OffsyncBody::Complete(data) => data.is_none(),
            OffsyncBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}
