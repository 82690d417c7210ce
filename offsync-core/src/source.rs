//! Where a dispatched response came from.

use http::{HeaderName, HeaderValue};

use crate::BucketName;

/// Default header carrying the [`ResponseSource`] of a response.
pub const DEFAULT_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-offsync-source");

/// Origin of a response returned by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Live response from the network (stored or not).
    Network,
    /// Served from the named bucket.
    Cache(BucketName),
    /// Built locally because neither network nor cache could answer.
    Synthetic,
}

impl ResponseSource {
    /// Value written to the source header.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }

    /// Upper-case name of the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "NETWORK",
            ResponseSource::Cache(_) => "CACHE",
            ResponseSource::Synthetic => "SYNTHETIC",
        }
    }

    /// Bucket the response was read from, if any.
    pub fn bucket(&self) -> Option<&BucketName> {
        match self {
            ResponseSource::Cache(bucket) => Some(bucket),
            _ => None,
        }
    }
}
