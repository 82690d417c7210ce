//! Last known reachability.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Process-wide online/offline flag.
///
/// Not persisted. The host seeds it with the platform's reachability and
/// flips it from its own online/offline signals; the action queue watches it
/// to replay on reconnect. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
    reconnects: Arc<watch::Sender<u64>>,
}

impl Connectivity {
    /// Creates the flag with the current reachability.
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        let (reconnects, _) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            reconnects: Arc::new(reconnects),
        }
    }

    /// Whether the last signal said "online".
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a reachability signal. Returns whether the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            if online {
                self.reconnects.send_modify(|count| *count = count.wrapping_add(1));
                info!("connection restored");
            } else {
                info!("connection lost, switching to offline mode");
            }
        }
        changed
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Receiver of the offline→online transition count.
    ///
    /// Unlike [`subscribe`](Self::subscribe), a drop and restore that happen
    /// between two reads still move the count.
    pub fn subscribe_reconnects(&self) -> watch::Receiver<u64> {
        self.reconnects.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
