//! Bearer token used when replaying actions.

use bytes::Bytes;
use offsync_backend::{BackendResult, DeleteStatus, Storage};
use tracing::warn;

use crate::config::Config;

/// Reads and writes the auth token in durable storage.
///
/// The token is stored as a plain UTF-8 string. A missing or unreadable
/// token reads as `None`.
#[derive(Debug, Clone)]
pub struct TokenStore<S> {
    storage: S,
    key: String,
}

impl<S> TokenStore<S>
where
    S: Storage,
{
    /// Token store under `key`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Token store under the configured key.
    pub fn from_config(storage: S, config: &Config) -> Self {
        Self::new(storage, config.storage_keys.auth_token.clone())
    }

    /// The current token, if any.
    pub async fn get(&self) -> Option<String> {
        match self.storage.get(&self.key).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(token) if !token.is_empty() => Some(token),
                Ok(_) => None,
                Err(error) => {
                    warn!(key = %self.key, error = %error, "auth token is not valid UTF-8");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!(key = %self.key, error = %error, "failed to read auth token");
                None
            }
        }
    }

    /// Stores a token, replacing any previous one.
    pub async fn set(&self, token: &str) -> BackendResult<()> {
        self.storage
            .set(&self.key, Bytes::copy_from_slice(token.as_bytes()))
            .await
    }

    /// Forgets the token.
    pub async fn clear(&self) -> BackendResult<DeleteStatus> {
        self.storage.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_backend::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn token_lifecycle() {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::from_config(storage.clone(), &Config::default());
        assert_eq!(tokens.get().await, None);

        tokens.set("abc").await.unwrap();
        assert_eq!(tokens.get().await.as_deref(), Some("abc"));
        assert_eq!(
            storage.get("authToken").await.unwrap(),
            Some(Bytes::from_static(b"abc"))
        );

        tokens.clear().await.unwrap();
        assert_eq!(tokens.get().await, None);
    }
}
