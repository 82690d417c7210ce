//! Error types for storage operations.

use offsync_core::BoxError;
use thiserror::Error;

/// Storage operation failure.
#[derive(Debug, Error)]
pub enum BackendError {
    /// State or computation error inside the backend.
    #[error(transparent)]
    InternalError(BoxError),

    /// Failure talking to the underlying store.
    #[error(transparent)]
    ConnectionError(BoxError),

    /// Stored data could not be encoded or decoded.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

impl BackendError {
    /// Wraps any error as [`BackendError::InternalError`].
    pub fn internal(error: impl Into<BoxError>) -> Self {
        BackendError::InternalError(error.into())
    }
}

/// Encoding failure.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Value could not be serialized.
    #[error("serialize: {0}")]
    Serialize(#[source] BoxError),

    /// Stored bytes could not be deserialized.
    #[error("deserialize: {0}")]
    Deserialize(#[source] BoxError),
}
