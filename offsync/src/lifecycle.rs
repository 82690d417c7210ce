//! Install and activation.
//!
//! A dispatcher starts [`Parsed`](WorkerState::Parsed) and passes requests
//! through untouched. [`Dispatcher::install`] precaches the manifest, then
//! [`Dispatcher::activate`] deletes stale buckets and takes control.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated
//!               \
//!                -> Redundant
//! ```

use std::fmt;

use bytes::Bytes;
use http::{Method, Request};
use offsync_backend::{Backend, BackendError, CacheBackend};
use offsync_core::{Bucket, BucketName, CachedResponse, RequestKey, Upstream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::InstallError;

/// Lifecycle state of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Created, nothing cached yet.
    Parsed,
    /// Fetching the install manifest.
    Installing,
    /// Manifest cached, waiting for activation.
    Installed,
    /// Removing stale buckets.
    Activating,
    /// Serving intercepted requests.
    Activated,
    /// Install failed; this dispatcher never takes control.
    Redundant,
}

impl WorkerState {
    /// Whether requests are intercepted in this state.
    pub fn controls_requests(self) -> bool {
        self == WorkerState::Activated
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Entries written to the static-assets bucket.
    pub static_assets: usize,
    /// Entries written to the app-shell bucket.
    pub app_shell: usize,
    /// Activation outcome when `skip_waiting` is set.
    pub activation: Option<ActivateReport>,
}

/// Result of activation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivateReport {
    /// Stale buckets that were deleted.
    pub removed: Vec<BucketName>,
}

impl<B> Dispatcher<B>
where
    B: Backend,
{
    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.inner.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.inner.state.subscribe()
    }

    fn set_state(&self, state: WorkerState) {
        self.inner.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(from = %current, to = %state, "lifecycle transition");
            *current = state;
            true
        });
    }

    /// Precaches the install manifest.
    ///
    /// Each bucket is filled all-or-nothing: every URL of the bucket is
    /// fetched before anything is written, and a transport failure or non-2xx
    /// status aborts the install, leaves that bucket untouched and marks the
    /// dispatcher [`Redundant`](WorkerState::Redundant). With `skip_waiting`
    /// a successful install activates right away.
    pub async fn install<U, Body>(&self, upstream: &mut U) -> Result<InstallReport, InstallError>
    where
        U: Upstream<Request<Body>>,
        Body: From<Bytes>,
    {
        self.set_state(WorkerState::Installing);
        info!("installing");

        let manifest = self.config().manifest.clone();
        let result = async {
            let static_assets = self
                .precache(Bucket::StaticAssets, &manifest.static_assets, upstream)
                .await?;
            let app_shell = self
                .precache(Bucket::AppShell, &manifest.app_shell, upstream)
                .await?;
            Ok::<_, InstallError>((static_assets, app_shell))
        }
        .await;

        let (static_assets, app_shell) = match result {
            Ok(counts) => counts,
            Err(error) => {
                warn!(error = %error, "install failed");
                self.set_state(WorkerState::Redundant);
                return Err(error);
            }
        };
        self.set_state(WorkerState::Installed);
        info!(static_assets, app_shell, "installed");

        let activation = if self.config().skip_waiting {
            Some(self.activate().await?)
        } else {
            None
        };
        Ok(InstallReport {
            static_assets,
            app_shell,
            activation,
        })
    }

    async fn precache<U, Body>(
        &self,
        bucket: Bucket,
        urls: &[String],
        upstream: &mut U,
    ) -> Result<usize, InstallError>
    where
        U: Upstream<Request<Body>>,
        Body: From<Bytes>,
    {
        let mut entries = Vec::with_capacity(urls.len());
        for url in urls {
            let request = Request::builder()
                .method(Method::GET)
                .uri(url.as_str())
                .body(Body::from(Bytes::new()))
                .map_err(|_| InstallError::Request { url: url.clone() })?;
            let key = RequestKey::from_parts(request.method(), request.uri());

            let response = upstream
                .call(request)
                .await
                .map_err(|source| InstallError::Fetch {
                    url: url.clone(),
                    source,
                })?;
            if !response.status().is_success() {
                return Err(InstallError::Status {
                    url: url.clone(),
                    status: response.status(),
                });
            }
            entries.push((key, CachedResponse::from_response(&response)));
        }

        let name = self.buckets().name(bucket).clone();
        let written = self.backend().populate(&name, entries).await?;
        debug!(bucket = %name, entries = written, "bucket precached");
        Ok(written)
    }

    /// Deletes every bucket outside the known set and takes control.
    ///
    /// On a storage failure the dispatcher returns to
    /// [`Installed`](WorkerState::Installed) and keeps passing requests through.
    pub async fn activate(&self) -> Result<ActivateReport, BackendError> {
        self.set_state(WorkerState::Activating);
        match self.backend().retain_buckets(self.buckets().known()).await {
            Ok(removed) => {
                for bucket in &removed {
                    info!(bucket = %bucket, "stale bucket removed");
                }
                self.set_state(WorkerState::Activated);
                info!("activated");
                Ok(ActivateReport { removed })
            }
            Err(error) => {
                warn!(error = %error, "activation failed");
                self.set_state(WorkerState::Installed);
                Err(error)
            }
        }
    }
}
