//! The active root context.
//!
//! The storage backend's permission grants are hierarchical: a grant on
//! `/$HOME/project` covers its descendants but not `/$HOME`. When a
//! home-relative path is encoded, the locator must name the tree that was
//! actually granted, and the last detected working root is what tells the
//! two apart.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::posix::normalize;

/// The last-resolved working root, as a canonical path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveRootContext {
    root: Option<String>,
}

impl ActiveRootContext {
    /// A context with no known root.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context rooted at `root` (normalized).
    pub fn with_root(root: &str) -> Self {
        Self {
            root: Some(normalize(root)),
        }
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// `true` if `path` is the root itself or lies beneath it.
    pub fn contains(&self, path: &str) -> bool {
        match self.root.as_deref() {
            None => false,
            Some("/") => path.starts_with('/'),
            Some(root) => {
                path == root
                    || path
                        .strip_prefix(root)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Process-wide handle on the [`ActiveRootContext`].
///
/// Cloning shares the same underlying context. Readers take a
/// [`snapshot`](Self::snapshot) and pass it explicitly to
/// [`PathTranslator::path_to_uri`](crate::PathTranslator::path_to_uri).
#[derive(Clone, Debug, Default)]
pub struct SharedRootContext {
    inner: Arc<RwLock<ActiveRootContext>>,
}

impl SharedRootContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly detected working root.
    pub fn set_root(&self, root: &str) {
        let next = ActiveRootContext::with_root(root);
        debug!(root = ?next.root(), "active root updated");
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    /// Forget the working root (no folder selected).
    pub fn clear(&self) {
        debug!("active root cleared");
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = ActiveRootContext::new();
    }

    /// Copy of the current context.
    pub fn snapshot(&self) -> ActiveRootContext {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_respects_segment_boundaries() {
        let ctx = ActiveRootContext::with_root("/$HOME/repo");
        assert!(ctx.contains("/$HOME/repo"));
        assert!(ctx.contains("/$HOME/repo/src/a.rs"));
        assert!(!ctx.contains("/$HOME/repo2/a.rs"));
        assert!(!ctx.contains("/$HOME"));
    }

    #[test]
    fn empty_context_contains_nothing() {
        assert!(!ActiveRootContext::new().contains("/a"));
    }

    #[test]
    fn with_root_normalizes() {
        let ctx = ActiveRootContext::with_root("/$HOME/repo/./");
        assert_eq!(ctx.root(), Some("/$HOME/repo"));
    }

    #[test]
    fn shared_context_is_shared_between_clones() {
        let shared = SharedRootContext::new();
        let other = shared.clone();
        shared.set_root("/Documents/repo");
        assert_eq!(other.snapshot().root(), Some("/Documents/repo"));
        other.clear();
        assert_eq!(shared.snapshot(), ActiveRootContext::new());
    }
}
