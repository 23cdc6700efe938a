//! Opaque storage locators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::percent::encode_component;

/// A backend-specific URI naming a node in the scoped storage backend.
///
/// Locators are produced by the path translator's scheme strategies and by
/// storage backends (for nodes they create). Everything else treats them as
/// opaque.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageLocator(String);

impl StorageLocator {
    /// Wrap an already-encoded URI.
    pub fn from_raw(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI scheme (`content`, `file`, ...), if any.
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Locator of a direct child named `name`.
    ///
    /// Every supported scheme carries the node's relative path at the end of
    /// the URI, so a child is addressed by appending one encoded segment.
    pub fn child(&self, name: &str) -> Self {
        let name = encode_component(name);
        if self.0.ends_with('/') || self.0.ends_with(':') {
            Self(format!("{}{name}", self.0))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    /// Locator of the node named `name` next to this one.
    ///
    /// Replaces the last `/`-separated segment. Meaningless for grant roots,
    /// whose last segment belongs to the scheme prefix.
    pub fn sibling(&self, name: &str) -> Option<Self> {
        let (parent, _) = self.0.rsplit_once('/')?;
        if parent.ends_with(':') || parent.ends_with("/tree") {
            return None;
        }
        Some(Self(format!("{parent}/{}", encode_component(name))))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
