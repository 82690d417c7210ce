use http::HeaderName;
use offsync::Dispatcher;
use offsync_core::DEFAULT_SOURCE_HEADER;
use tower::Layer;

use crate::service::OfflineService;

/// Tower [`Layer`] applying an offsync [`Dispatcher`].
///
/// The dispatcher is shared: install and activate it through the same
/// handle (or a clone) that was given to the layer.
pub struct OfflineLayer<B> {
    dispatcher: Dispatcher<B>,
    source_header: HeaderName,
}

impl<B> OfflineLayer<B> {
    /// Layer with the default `x-offsync-source` header.
    pub fn new(dispatcher: Dispatcher<B>) -> Self {
        Self {
            dispatcher,
            source_header: DEFAULT_SOURCE_HEADER,
        }
    }

    /// Header carrying the [`ResponseSource`](offsync_core::ResponseSource)
    /// of dispatched responses.
    pub fn source_header(mut self, name: HeaderName) -> Self {
        self.source_header = name;
        self
    }

    /// The wrapped dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }
}

impl<B> Clone for OfflineLayer<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            source_header: self.source_header.clone(),
        }
    }
}

impl<B> std::fmt::Debug for OfflineLayer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineLayer")
            .field("dispatcher", &self.dispatcher)
            .field("source_header", &self.source_header)
            .finish()
    }
}

impl<S, B> Layer<S> for OfflineLayer<B> {
    type Service = OfflineService<S, B>;

    fn layer(&self, inner: S) -> Self::Service {
        OfflineService::new(inner, self.dispatcher.clone(), self.source_header.clone())
    }
}
