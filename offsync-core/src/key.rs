//! Request identity used to address cache bucket entries.

use std::fmt;

use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of a cached request: HTTP method plus origin-relative URL.
///
/// Absolute URLs are reduced to their path and query, so the manifest entry
/// `/products` and a runtime request to `https://shop.example/products` address
/// the same bucket entry.
///
/// ```
/// use offsync_core::RequestKey;
/// use http::{Method, Uri};
///
/// let uri: Uri = "https://shop.example/api/products?page=2".parse().unwrap();
/// let key = RequestKey::from_parts(&Method::GET, &uri);
/// assert_eq!(key.url(), "/api/products?page=2");
/// assert_eq!(key.to_string(), "GET /api/products?page=2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    method: SmolStr,
    url: SmolStr,
}

impl RequestKey {
    /// Creates a key from a method and an already origin-relative URL.
    pub fn new(method: &Method, url: impl Into<SmolStr>) -> Self {
        Self {
            method: SmolStr::new(method.as_str()),
            url: url.into(),
        }
    }

    /// Shorthand for a `GET` key.
    pub fn get(url: impl Into<SmolStr>) -> Self {
        Self::new(&Method::GET, url)
    }

    /// Creates a key from a request method and URI.
    ///
    /// Scheme and authority are dropped. A URI without a path maps to `/`.
    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/");
        let url = if url.starts_with('/') {
            SmolStr::new(url)
        } else {
            SmolStr::from(format!("/{url}"))
        };
        Self {
            method: SmolStr::new(method.as_str()),
            url,
        }
    }

    /// The request method, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The origin-relative URL (`path?query`).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The path component, without the query string.
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(&self.url, |(path, _)| path)
    }

    /// Whether this key identifies a `GET` request.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET.as_str()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
