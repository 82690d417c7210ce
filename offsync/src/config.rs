//! Dispatcher and queue configuration.
//!
//! [`Config`] deserializes from YAML with every field optional, or is built
//! fluently through [`ConfigBuilder`]. Defaults reproduce the storefront
//! client: `/api/` prefix, the usual static asset extensions, the storefront
//! install manifest and the `offline_actions` / `offline_data` / `authToken`
//! storage keys.
//!
//! ```
//! use offsync::Config;
//!
//! let config = Config::from_yaml(r#"
//! api_prefix: /v1/
//! bucket_version: v2
//! manifest:
//!   app_shell: ["/", "/products"]
//! "#).unwrap();
//!
//! assert_eq!(config.api_prefix, "/v1/");
//! assert_eq!(config.manifest.app_shell, vec!["/", "/products"]);
//! assert!(!config.manifest.static_assets.is_empty());
//! ```

use offsync_core::BucketSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::route::RouteTable;

const DEFAULT_EXTENSIONS: [&str; 12] = [
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot",
];

const DEFAULT_APP_SHELL: [&str; 9] = [
    "/",
    "/home",
    "/products",
    "/customers",
    "/orders",
    "/cart",
    "/login",
    "/admin",
    "/manifest.webmanifest",
];

const DEFAULT_STATIC_ASSETS: [&str; 5] = [
    "/static/js/bundle.js",
    "/static/css/main.css",
    "/favicon.png",
    "/assets/icon/favicon.png",
    "/assets/icon/icon.png",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// URLs precached at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Navigational routes stored in the app-shell bucket.
    pub app_shell: Vec<String>,
    /// Assets stored in the static-assets bucket.
    pub static_assets: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            app_shell: owned(&DEFAULT_APP_SHELL),
            static_assets: owned(&DEFAULT_STATIC_ASSETS),
        }
    }
}

/// Keys used in durable [`Storage`](offsync_backend::Storage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageKeys {
    /// Offline action queue.
    pub actions: String,
    /// Offline data store.
    pub data: String,
    /// Bearer token used for replay.
    pub auth_token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            actions: "offline_actions".to_owned(),
            data: "offline_data".to_owned(),
            auth_token: "authToken".to_owned(),
        }
    }
}

/// Complete offsync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Paths starting with this prefix are API calls.
    pub api_prefix: String,
    /// Path extensions (without the dot) served cache-first.
    pub static_extensions: Vec<String>,
    /// Suffix appended to every bucket name, e.g. `v2` gives `api-responses-v2`.
    pub bucket_version: Option<String>,
    /// Install-time precache list.
    pub manifest: Manifest,
    /// App-shell entry served when an HTML page is unavailable.
    pub shell_root: String,
    /// Message carried by synthetic offline responses.
    pub offline_message: String,
    /// Durable storage keys.
    pub storage_keys: StorageKeys,
    /// Activate right after a successful install.
    pub skip_waiting: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_owned(),
            static_extensions: owned(&DEFAULT_EXTENSIONS),
            bucket_version: None,
            manifest: Manifest::default(),
            shell_root: "/".to_owned(),
            offline_message: "network unavailable".to_owned(),
            storage_keys: StorageKeys::default(),
            skip_waiting: true,
        }
    }
}

impl Config {
    /// Starts a builder from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(self.api_prefix.clone()));
        }
        if !self.shell_root.starts_with('/') {
            return Err(ConfigError::InvalidShellRoot(self.shell_root.clone()));
        }
        if self.static_extensions.is_empty() {
            return Err(ConfigError::InvalidExtension(String::new()));
        }
        if let Some(bad) = self
            .static_extensions
            .iter()
            .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(ConfigError::InvalidExtension(bad.clone()));
        }
        Ok(())
    }

    /// Bucket names for the configured version.
    pub fn buckets(&self) -> BucketSet {
        BucketSet::with_version(self.bucket_version.as_deref())
    }

    /// Classification table for this configuration.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        RouteTable::from_config(self)
    }
}

/// Fluent [`Config`] construction.
///
/// ```
/// use offsync::Config;
///
/// let config = Config::builder()
///     .bucket_version("v3")
///     .app_shell(["/", "/products"])
///     .static_assets(Vec::<String>::new())
///     .skip_waiting(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.bucket_version.as_deref(), Some("v3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// API path prefix.
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// Static asset extensions, without the leading dot.
    pub fn static_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.static_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Bucket name suffix.
    pub fn bucket_version(mut self, version: impl Into<String>) -> Self {
        self.config.bucket_version = Some(version.into());
        self
    }

    /// App-shell routes precached at install.
    pub fn app_shell<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.manifest.app_shell = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Static assets precached at install.
    pub fn static_assets<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.manifest.static_assets = urls.into_iter().map(Into::into).collect();
        self
    }

    /// App-shell entry of last resort for HTML pages.
    pub fn shell_root(mut self, root: impl Into<String>) -> Self {
        self.config.shell_root = root.into();
        self
    }

    /// Message of synthetic offline responses.
    pub fn offline_message(mut self, message: impl Into<String>) -> Self {
        self.config.offline_message = message.into();
        self
    }

    /// Durable storage keys.
    pub fn storage_keys(mut self, keys: StorageKeys) -> Self {
        self.config.storage_keys = keys;
        self
    }

    /// Activate right after a successful install.
    pub fn skip_waiting(mut self, skip: bool) -> Self {
        self.config.skip_waiting = skip;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
