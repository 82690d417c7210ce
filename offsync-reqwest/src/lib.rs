#![doc = include_str!("../README.md")]

mod client;
mod middleware;
mod upstream;

pub use client::ClientUpstream;
pub use middleware::OfflineMiddleware;
pub use upstream::NextUpstream;

pub use offsync_core::DEFAULT_SOURCE_HEADER;
/// Re-export of the URL type used by [`ClientUpstream`].
pub use reqwest::Url;
