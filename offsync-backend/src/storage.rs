use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use offsync_core::BackendLabel;
use serde::{Serialize, de::DeserializeOwned};

use crate::{BackendError, BackendResult, DeleteStatus, FormatError};

/// Durable key → bytes store, the home of the queue, the token and offline data.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> BackendResult<Option<Bytes>>;

    async fn set(&self, key: &str, value: Bytes) -> BackendResult<()>;

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus>;

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("storage")
    }
}

#[async_trait]
impl<S> Storage for Arc<S>
where
    S: Storage + ?Sized,
{
    async fn get(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

/// JSON values on top of [`Storage`].
pub trait StorageExt: Storage {
    /// Reads and decodes the JSON value under `key`.
    fn get_json<T>(&self, key: &str) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            match self.get(key).await? {
                Some(bytes) => serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|e| BackendError::from(FormatError::Deserialize(Box::new(e)))),
                None => Ok(None),
            }
        }
    }

    /// Encodes `value` as JSON and stores it under `key`.
    fn set_json<T>(&self, key: &str, value: &T) -> impl Future<Output = BackendResult<()>> + Send
    where
        T: Serialize + Sync + ?Sized,
    {
        async move {
            let bytes = serde_json::to_vec(value).map_err(|e| FormatError::Serialize(Box::new(e)))?;
            self.set(key, Bytes::from(bytes)).await
        }
    }
}

impl<S> StorageExt for S where S: Storage + ?Sized {}
