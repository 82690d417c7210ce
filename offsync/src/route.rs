//! Request classification.
//!
//! A [`RouteTable`] is an ordered list of `(matcher, kind)` pairs; the first
//! matching entry decides the [`RequestKind`], and requests nothing matches are
//! [`RequestKind::Default`]. [`RouteTable::from_config`] builds the standard
//! table: API prefix, then static extension, then `Accept: text/html`.

use std::fmt;

use http::{HeaderMap, Method, Request, Uri, header::ACCEPT};
use offsync_core::RequestKey;
use regex::Regex;

use crate::config::Config;
use crate::error::ConfigError;

/// What the dispatcher needs to know about a request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestHead {
    /// Creates a head from its parts.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Copies method, URI and headers out of a request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request.uri().clone(),
            request.headers().clone(),
        )
    }

    /// Shorthand for a `GET` without headers.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri, HeaderMap::new())
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// URI path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Cache identity of the request.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_parts(&self.method, &self.uri)
    }

    /// Whether any `Accept` header mentions `text/html`.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.contains("text/html"))
    }
}

/// Classification of an intercepted `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Path under the API prefix.
    Api,
    /// Path ending in a static asset extension.
    StaticAsset,
    /// Navigation to an HTML page.
    Html,
    /// Anything else.
    Default,
}

impl RequestKind {
    /// Lower-case name, used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Api => "api",
            RequestKind::StaticAsset => "static",
            RequestKind::Html => "html",
            RequestKind::Default => "default",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classification rule.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Whether the rule applies to `head`.
    fn matches(&self, head: &RequestHead) -> bool;
}

/// Path starts with a prefix.
#[derive(Debug, Clone)]
pub struct PathPrefix(String);

impl PathPrefix {
    /// Matches paths starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl Matcher for PathPrefix {
    fn matches(&self, head: &RequestHead) -> bool {
        head.path().starts_with(&self.0)
    }
}

/// Path ends with one of a set of extensions.
#[derive(Debug, Clone)]
pub struct PathExtension(Regex);

impl PathExtension {
    /// Builds the matcher from extensions given without the dot.
    pub fn new<I, S>(extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = extensions
            .into_iter()
            .map(|ext| regex::escape(ext.as_ref()))
            .collect();
        let pattern = format!(r"\.({})$", alternatives.join("|"));
        Regex::new(&pattern)
            .map(Self)
            .map_err(|_| ConfigError::InvalidExtension(alternatives.join(",")))
    }
}

impl Matcher for PathExtension {
    fn matches(&self, head: &RequestHead) -> bool {
        self.0.is_match(head.path())
    }
}

/// `Accept` header mentions `text/html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptsHtml;

impl Matcher for AcceptsHtml {
    fn matches(&self, head: &RequestHead) -> bool {
        head.accepts_html()
    }
}

/// Ordered classification rules; the first match wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<(Box<dyn Matcher>, RequestKind)>,
}

impl RouteTable {
    /// Empty table. Every request classifies as [`RequestKind::Default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule after the existing ones.
    pub fn route(mut self, matcher: impl Matcher + 'static, kind: RequestKind) -> Self {
        self.routes.push((Box::new(matcher), kind));
        self
    }

    /// Standard table: API prefix, static extension, HTML accept.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new()
            .route(PathPrefix::new(config.api_prefix.clone()), RequestKind::Api)
            .route(
                PathExtension::new(&config.static_extensions)?,
                RequestKind::StaticAsset,
            )
            .route(AcceptsHtml, RequestKind::Html))
    }

    /// Kind of the first matching rule.
    pub fn classify(&self, head: &RequestHead) -> RequestKind {
        self.routes
            .iter()
            .find(|(matcher, _)| matcher.matches(head))
            .map_or(RequestKind::Default, |(_, kind)| *kind)
    }
}
