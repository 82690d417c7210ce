//! Durable queue of mutating requests made while offline.
//!
//! [`ActionQueue`] records `POST`/`PUT`/`DELETE` calls the application could
//! not send, persists the whole queue as JSON after every change, and replays
//! it in enqueue order on [`ActionQueue::sync`]. Successful replays leave the
//! queue; failures stay for the next pass, without a retry cap.
//!
//! Only one sync pass runs at a time. Actions enqueued while a pass is running
//! are kept: the pass removes the ids it replayed instead of overwriting the
//! queue with its own snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use http::{
    HeaderValue, Request,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use offsync_backend::{BackendResult, Storage, StorageExt};
use offsync_core::{ActionId, NewAction, OfflineAction, Upstream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::Config;
use crate::connectivity::Connectivity;
use crate::metrics;
use crate::token::TokenStore;

/// Why a sync pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Connectivity says offline.
    Offline,
    /// Nothing to replay.
    Empty,
    /// Another pass is running.
    InFlight,
}

/// Outcome of [`ActionQueue::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Every queued action was attempted.
    Completed,
    /// Nothing was attempted.
    Skipped(SkipReason),
}

/// Result of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Whether the pass ran.
    pub status: SyncStatus,
    /// Actions replayed with a 2xx answer and removed from the queue.
    pub replayed: Vec<ActionId>,
    /// Actions that failed and remain queued.
    pub failed: Vec<ActionId>,
}

impl SyncReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            status: SyncStatus::Skipped(reason),
            replayed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Whether the pass was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, SyncStatus::Skipped(_))
    }
}

struct Inner<S> {
    storage: S,
    key: String,
    tokens: TokenStore<S>,
    connectivity: Connectivity,
    actions: Mutex<Vec<OfflineAction>>,
    sync_lock: Mutex<()>,
}

/// The offline action queue.
///
/// Construct once with [`ActionQueue::load`] and share clones; every clone
/// operates on the same queue.
pub struct ActionQueue<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ActionQueue<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for ActionQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionQueue")
            .field("key", &self.inner.key)
            .field("connectivity", &self.inner.connectivity)
            .finish_non_exhaustive()
    }
}

impl<S> ActionQueue<S>
where
    S: Storage + Clone,
{
    /// Loads the persisted queue.
    ///
    /// Missing, unreadable or corrupt data yields an empty queue; the problem
    /// is logged, never returned.
    pub async fn load(storage: S, connectivity: Connectivity, config: &Config) -> Self {
        let key = config.storage_keys.actions.clone();
        let actions = match storage.get_json::<Vec<OfflineAction>>(&key).await {
            Ok(actions) => actions.unwrap_or_default(),
            Err(error) => {
                warn!(key = %key, error = %error, "failed to load offline actions, starting empty");
                Vec::new()
            }
        };
        if !actions.is_empty() {
            info!(pending = actions.len(), "offline actions loaded");
        }
        metrics::record_queue_length(actions.len());

        Self {
            inner: Arc::new(Inner {
                tokens: TokenStore::from_config(storage.clone(), config),
                storage,
                key,
                connectivity,
                actions: Mutex::new(actions),
                sync_lock: Mutex::new(()),
            }),
        }
    }

    /// Shared connectivity flag.
    pub fn connectivity(&self) -> &Connectivity {
        &self.inner.connectivity
    }

    /// Auth token used on replay.
    pub fn tokens(&self) -> &TokenStore<S> {
        &self.inner.tokens
    }

    async fn persist(&self, actions: &[OfflineAction]) -> BackendResult<()> {
        metrics::record_queue_length(actions.len());
        self.inner.storage.set_json(&self.inner.key, actions).await
    }

    /// Appends an action and persists the queue.
    ///
    /// The action is queued even when persisting fails; the error is returned
    /// so the caller can tell the queue will not survive a restart.
    pub async fn enqueue(&self, action: NewAction) -> BackendResult<OfflineAction> {
        let action = OfflineAction::new(action);
        let mut actions = self.inner.actions.lock().await;
        actions.push(action.clone());
        info!(id = %action.id, method = %action.method, url = %action.url, "offline action queued");
        self.persist(&actions).await?;
        Ok(action)
    }

    /// Drops every queued action and removes the persisted queue.
    pub async fn clear(&self) -> BackendResult<()> {
        let mut actions = self.inner.actions.lock().await;
        actions.clear();
        metrics::record_queue_length(0);
        self.inner.storage.remove(&self.inner.key).await?;
        info!("offline actions cleared");
        Ok(())
    }

    /// Snapshot of the queue in replay order.
    pub async fn pending(&self) -> Vec<OfflineAction> {
        self.inner.actions.lock().await.clone()
    }

    /// Number of queued actions.
    pub async fn len(&self) -> usize {
        self.inner.actions.lock().await.len()
    }

    /// Whether nothing is queued.
    pub async fn is_empty(&self) -> bool {
        self.inner.actions.lock().await.is_empty()
    }

    /// Replays the queue.
    ///
    /// Skipped when offline, when empty, or while another pass runs.
    /// Otherwise each action is sent in enqueue order with
    /// `Content-Type: application/json`, its JSON payload as body, and
    /// `Authorization: Bearer <token>` when a token is stored. A 2xx answer
    /// removes the action; anything else keeps it.
    pub async fn sync<U, Body>(&self, upstream: &mut U) -> SyncReport
    where
        U: Upstream<Request<Body>>,
        Body: From<Bytes>,
    {
        if !self.inner.connectivity.is_online() {
            return SyncReport::skipped(SkipReason::Offline);
        }
        let Ok(_in_flight) = self.inner.sync_lock.try_lock() else {
            debug!("sync already in progress");
            return SyncReport::skipped(SkipReason::InFlight);
        };

        let snapshot = self.pending().await;
        if snapshot.is_empty() {
            return SyncReport::skipped(SkipReason::Empty);
        }
        info!(pending = snapshot.len(), "syncing offline actions");

        let token = self.inner.tokens.get().await;
        let mut replayed = Vec::new();
        let mut failed = Vec::new();

        for action in snapshot {
            let request = match replay_request::<Body>(&action, token.as_deref()) {
                Ok(request) => request,
                Err(error) => {
                    warn!(id = %action.id, url = %action.url, error = %error, "action cannot be replayed");
                    failed.push(action.id);
                    continue;
                }
            };
            match upstream.call(request).await {
                Ok(response) if response.status().is_success() => {
                    debug!(id = %action.id, method = %action.method, url = %action.url, "action synced");
                    replayed.push(action.id);
                }
                Ok(response) => {
                    warn!(
                        id = %action.id,
                        method = %action.method,
                        url = %action.url,
                        status = %response.status(),
                        "action rejected, will retry"
                    );
                    failed.push(action.id);
                }
                Err(error) => {
                    warn!(
                        id = %action.id,
                        method = %action.method,
                        url = %action.url,
                        error = %error,
                        "action failed, will retry"
                    );
                    failed.push(action.id);
                }
            }
        }

        if !replayed.is_empty() {
            let done: HashSet<&ActionId> = replayed.iter().collect();
            let mut actions = self.inner.actions.lock().await;
            actions.retain(|action| !done.contains(&action.id));
            if let Err(error) = self.persist(&actions).await {
                warn!(error = %error, "failed to persist offline actions after sync");
            }
        }

        info!(
            replayed = replayed.len(),
            failed = failed.len(),
            "offline sync finished"
        );
        metrics::record_sync(replayed.len(), failed.len());
        SyncReport {
            status: SyncStatus::Completed,
            replayed,
            failed,
        }
    }
}

impl<S> ActionQueue<S>
where
    S: Storage + Clone + 'static,
{
    /// Replays the queue on every offline → online transition.
    ///
    /// The task runs until aborted through the returned handle. Going offline
    /// only flips the flag.
    pub fn spawn_auto_sync<U, Body>(&self, upstream: U) -> JoinHandle<()>
    where
        U: Upstream<Request<Body>> + Send + 'static,
        Body: From<Bytes> + Send + 'static,
    {
        let queue = self.clone();
        let mut reconnects = self.inner.connectivity.subscribe_reconnects();
        reconnects.mark_unchanged();
        let mut upstream = upstream;

        tokio::spawn(
            async move {
                // Restores signalled during a pass leave the receiver changed,
                // so the next iteration runs another pass.
                while reconnects.changed().await.is_ok() {
                    let count = *reconnects.borrow_and_update();
                    let report = queue.sync(&mut upstream).await;
                    debug!(reconnects = count, status = ?report.status, "reconnect sync done");
                }
            }
            .instrument(info_span!("offsync.auto_sync")),
        )
    }
}

fn replay_request<Body>(action: &OfflineAction, token: Option<&str>) -> Result<Request<Body>, ReplayError>
where
    Body: From<Bytes>,
{
    let body = match &action.payload {
        Some(payload) => Bytes::from(serde_json::to_vec(payload)?),
        None => Bytes::new(),
    };
    let mut builder = Request::builder()
        .method(action.method.as_method())
        .uri(action.url.as_str())
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body))?)
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("request: {0}")]
    Request(#[from] http::Error),
}
