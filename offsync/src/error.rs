use http::StatusCode;
use offsync_backend::BackendError;
use offsync_core::UpstreamError;
use thiserror::Error;

/// Invalid [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The API prefix must be an absolute path.
    #[error("api prefix {0:?} must start with '/'")]
    InvalidPrefix(String),

    /// The shell root must be an absolute path.
    #[error("shell root {0:?} must start with '/'")]
    InvalidShellRoot(String),

    /// Static extensions must be non-empty and made of alphanumerics.
    #[error("invalid static asset extension {0:?}")]
    InvalidExtension(String),
}

/// Failure to precache the install manifest.
///
/// Any of these leaves the affected bucket untouched and the worker
/// [`Redundant`](crate::WorkerState::Redundant).
#[derive(Debug, Error)]
pub enum InstallError {
    /// A manifest URL could not be fetched.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        /// The manifest URL.
        url: String,
        /// Transport failure.
        #[source]
        source: UpstreamError,
    },

    /// A manifest URL answered with a non-2xx status.
    #[error("fetching {url} returned {status}")]
    Status {
        /// The manifest URL.
        url: String,
        /// Status received.
        status: StatusCode,
    },

    /// A manifest URL is not a valid request target.
    #[error("manifest entry {url:?} is not a valid request")]
    Request {
        /// The manifest URL.
        url: String,
    },

    /// The fetched responses could not be written.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
