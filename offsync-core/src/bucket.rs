//! Cache bucket roles and their concrete names.
//!
//! A bucket is an independently enumerable, independently clearable store of
//! request → response entries. The dispatcher knows four roles ([`Bucket`]);
//! a [`BucketSet`] turns those roles into the concrete [`BucketName`]s used by
//! the storage backend, optionally suffixed with a version so that a version
//! upgrade can tell its own buckets apart from stale ones.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The role a bucket plays in the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Navigational routes precached at install time.
    AppShell,
    /// Scripts, stylesheets, images and fonts.
    StaticAssets,
    /// HTML and other non-API pages cached at runtime.
    DynamicPages,
    /// API responses cached at runtime.
    ApiResponses,
}

impl Bucket {
    /// All bucket roles, in a stable order.
    pub const ALL: [Bucket; 4] = [
        Bucket::AppShell,
        Bucket::StaticAssets,
        Bucket::DynamicPages,
        Bucket::ApiResponses,
    ];

    /// Unversioned name of the bucket.
    pub const fn base_name(self) -> &'static str {
        match self {
            Bucket::AppShell => "app-shell",
            Bucket::StaticAssets => "static-assets",
            Bucket::DynamicPages => "dynamic-pages",
            Bucket::ApiResponses => "api-responses",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Concrete name of a bucket in a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketName(SmolStr);

impl BucketName {
    /// Creates a bucket name.
    #[inline]
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Creates a bucket name from a static string (no allocation).
    #[inline]
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BucketName {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

impl From<String> for BucketName {
    fn from(name: String) -> Self {
        Self(SmolStr::from(name))
    }
}

/// Resolves bucket roles to names for one cache version.
///
/// ```
/// use offsync_core::{Bucket, BucketSet};
///
/// let unversioned = BucketSet::default();
/// assert_eq!(unversioned.name(Bucket::ApiResponses).as_str(), "api-responses");
///
/// let v2 = BucketSet::versioned("v2");
/// assert_eq!(v2.name(Bucket::AppShell).as_str(), "app-shell-v2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet {
    names: [BucketName; 4],
}

impl BucketSet {
    /// Bucket set using the bare role names.
    pub fn unversioned() -> Self {
        Self {
            names: Bucket::ALL.map(|bucket| BucketName::new_static(bucket.base_name())),
        }
    }

    /// Bucket set whose names carry a `-{version}` suffix.
    pub fn versioned(version: impl AsRef<str>) -> Self {
        let version = version.as_ref();
        Self {
            names: Bucket::ALL
                .map(|bucket| BucketName::from(format!("{}-{version}", bucket.base_name()))),
        }
    }

    /// Builds a set from an optional version.
    pub fn with_version(version: Option<&str>) -> Self {
        match version {
            Some(version) if !version.is_empty() => Self::versioned(version),
            _ => Self::unversioned(),
        }
    }

    /// Concrete name for a bucket role.
    pub fn name(&self, bucket: Bucket) -> &BucketName {
        let index = match bucket {
            Bucket::AppShell => 0,
            Bucket::StaticAssets => 1,
            Bucket::DynamicPages => 2,
            Bucket::ApiResponses => 3,
        };
        &self.names[index]
    }

    /// The known-bucket set. Any other bucket is stale.
    pub fn known(&self) -> &[BucketName] {
        &self.names
    }

    /// Whether `name` belongs to this set.
    pub fn contains(&self, name: &BucketName) -> bool {
        self.names.contains(name)
    }
}

impl Default for BucketSet {
    fn default() -> Self {
        Self::unversioned()
    }
}
