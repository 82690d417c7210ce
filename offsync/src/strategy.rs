//! Per-kind caching plans.

use offsync_core::Bucket;

use crate::route::RequestKind;

/// Whether the cache or the network is asked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Serve a stored entry without touching the network.
    CacheFirst,
    /// Ask the network; use the cache only when it fails.
    NetworkFirst,
}

/// Where to look when the network fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The request's own key in a bucket.
    Entry(Bucket),
    /// The configured shell root in the app-shell bucket.
    ShellRoot,
}

/// Response built when every lookup misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthetic {
    /// `404` text.
    NotFound,
    /// `503` JSON with `offline: true`.
    OfflineApi,
    /// `503` text carrying the offline message.
    OfflinePage,
}

/// How one [`RequestKind`] is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    /// Cache or network first.
    pub order: Order,
    /// Bucket successful network responses are written to.
    pub store: Bucket,
    /// Lookups tried in order after a network failure.
    pub fallbacks: &'static [Fallback],
    /// Last resort.
    pub synthetic: Synthetic,
}

impl Strategy {
    /// The plan for `kind`.
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::StaticAsset => Strategy {
                order: Order::CacheFirst,
                store: Bucket::StaticAssets,
                fallbacks: &[],
                synthetic: Synthetic::NotFound,
            },
            RequestKind::Api => Strategy {
                order: Order::NetworkFirst,
                store: Bucket::ApiResponses,
                fallbacks: &[Fallback::Entry(Bucket::ApiResponses)],
                synthetic: Synthetic::OfflineApi,
            },
            RequestKind::Html => Strategy {
                order: Order::NetworkFirst,
                store: Bucket::DynamicPages,
                fallbacks: &[
                    Fallback::Entry(Bucket::DynamicPages),
                    Fallback::Entry(Bucket::AppShell),
                    Fallback::ShellRoot,
                ],
                synthetic: Synthetic::OfflinePage,
            },
            RequestKind::Default => Strategy {
                order: Order::NetworkFirst,
                store: Bucket::DynamicPages,
                fallbacks: &[Fallback::Entry(Bucket::DynamicPages)],
                synthetic: Synthetic::NotFound,
            },
        }
    }
}
