//! Change-watch registration.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Invoked each time a watched node changes.
pub type WatchCallback = Arc<dyn Fn() + Send + Sync>;

/// The host's file-change notifier. There is no unsubscribe.
pub trait FileWatcher: Send + Sync {
    fn watch(&self, path: &str, on_change: WatchCallback);
}

/// Tracks which paths already have a watch so each gets at most one.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    paths: Mutex<HashSet<String>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `path` unless it is already watched. `make_callback` runs only
    /// when a watch is actually registered. Returns whether one was.
    pub fn register(
        &self,
        watcher: &dyn FileWatcher,
        path: &str,
        make_callback: impl FnOnce() -> WatchCallback,
    ) -> bool {
        let inserted = self
            .paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
        if inserted {
            watcher.watch(path, make_callback());
            debug!(path, "registered watch");
        }
        inserted
    }

    pub fn is_watched(&self, path: &str) -> bool {
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path)
    }

    /// Forget every registered path. Watches already handed to the watcher
    /// stay there; the next registration of a path adds another one.
    pub fn clear(&self) {
        self.paths.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.paths.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`FileWatcher`] that keeps callbacks so tests and tools can fire them.
#[derive(Default)]
pub struct RecordingWatcher {
    callbacks: Mutex<HashMap<String, Vec<WatchCallback>>>,
}

impl RecordingWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback registered for `path`. Returns how many ran.
    pub fn fire(&self, path: &str) -> usize {
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .unwrap_or_default();
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Number of callbacks registered for `path`.
    pub fn watch_count(&self, path: &str) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .map_or(0, Vec::len)
    }

    pub fn watched_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl FileWatcher for RecordingWatcher {
    fn watch(&self, path: &str, on_change: WatchCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.to_string())
            .or_default()
            .push(on_change);
    }
}

impl std::fmt::Debug for RecordingWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingWatcher")
            .field("paths", &self.watched_paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn registration_is_idempotent_per_path() {
        let watcher = RecordingWatcher::new();
        let registry = WatchRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            registry.register(&watcher, "/repo/a.txt", move || {
                Arc::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            });
        }
        assert_eq!(watcher.watch_count("/repo/a.txt"), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_watched("/repo/a.txt"));

        assert_eq!(watcher.fire("/repo/a.txt"), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.fire("/repo/other"), 0);
    }

    #[test]
    fn distinct_paths_each_get_a_watch() {
        let watcher = RecordingWatcher::new();
        let registry = WatchRegistry::new();
        assert!(registry.register(&watcher, "/a", || Arc::new(|| {})));
        assert!(registry.register(&watcher, "/b", || Arc::new(|| {})));
        assert!(!registry.register(&watcher, "/a", || Arc::new(|| {})));
        assert_eq!(watcher.watched_paths(), vec!["/a", "/b"]);
    }

    #[test]
    fn cleared_registry_registers_again() {
        let watcher = RecordingWatcher::new();
        let registry = WatchRegistry::new();
        registry.register(&watcher, "/a", || Arc::new(|| {}));
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.is_watched("/a"));
        assert!(registry.register(&watcher, "/a", || Arc::new(|| {})));
        assert_eq!(watcher.watch_count("/a"), 2);
    }
}
