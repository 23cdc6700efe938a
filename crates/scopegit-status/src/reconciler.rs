//! Full and incremental status reconciliation.

use std::sync::{Arc, Weak};

use scopegit_engine::{EngineResult, GitEngine, StatusRow};
use scopegit_path::normalize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::record::FileStatusRecord;
use crate::view::StatusView;
use crate::watch::{FileWatcher, WatchCallback, WatchRegistry};

#[derive(Debug, Default)]
struct ReconcilerState {
    view: StatusView,
    /// Patches produced while the view was inactive, in arrival order.
    pending: Vec<FileStatusRecord>,
    active: bool,
    /// Bumped by every reset. Watch callbacks carry the epoch they were
    /// registered in and their results are dropped once it moves on.
    epoch: u64,
}

/// Keeps a [`StatusView`] in step with the engine.
///
/// A full rebuild replaces the view. Incremental refreshes patch single
/// paths; while the view is inactive they are buffered and applied as one
/// batch by [`set_active(true)`](Self::set_active). Every path seen by a
/// rebuild gets one change-watch, whose callback refreshes that path.
/// [`reset`](Self::reset) starts a new epoch: callbacks from earlier epochs
/// still fire but no longer touch the view.
///
/// State is locked only between engine calls, so records may be stale the
/// moment they are returned.
pub struct StatusReconciler {
    engine: Arc<dyn GitEngine>,
    watcher: Arc<dyn FileWatcher>,
    registry: WatchRegistry,
    state: Mutex<ReconcilerState>,
}

impl StatusReconciler {
    pub fn new(engine: Arc<dyn GitEngine>, watcher: Arc<dyn FileWatcher>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            watcher,
            registry: WatchRegistry::new(),
            state: Mutex::new(ReconcilerState {
                active: true,
                ..ReconcilerState::default()
            }),
        })
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub async fn view(&self) -> StatusView {
        self.state.lock().await.view.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Forget the view, any buffered patches, and which paths are watched,
    /// and start a new epoch so callbacks registered before now are ignored.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.view = StatusView::new();
        state.pending.clear();
        state.epoch += 1;
        self.registry.clear();
        debug!(epoch = state.epoch, "status view reset");
    }

    /// Mark the view visible or hidden. Becoming visible applies every
    /// buffered patch; returns how many were applied.
    pub async fn set_active(&self, active: bool) -> usize {
        let mut state = self.state.lock().await;
        state.active = active;
        if !active {
            return 0;
        }
        let pending = std::mem::take(&mut state.pending);
        let flushed = pending.len();
        for record in pending {
            state.view.patch(record);
        }
        if flushed > 0 {
            debug!(flushed, "applied buffered status patches");
        }
        flushed
    }

    /// Classify every path of the repository at `dir` and replace the view.
    pub async fn full_rebuild(self: &Arc<Self>, dir: &str) -> EngineResult<StatusView> {
        let dir = normalize(dir);
        let epoch = self.state.lock().await.epoch;
        let rows = self.engine.status_matrix(&dir, None).await?;
        let records: Vec<_> = rows.iter().filter_map(FileStatusRecord::from_row).collect();

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!(dir = %dir, "status view reset during rebuild; result dropped");
            return Ok(state.view.clone());
        }
        for row in &rows {
            self.watch_row(&dir, row, epoch);
        }
        state.view.replace_all(records);
        state.pending.clear();
        debug!(
            dir = %dir,
            staged = state.view.staged().len(),
            unstaged = state.view.unstaged().len(),
            "rebuilt status view"
        );
        Ok(state.view.clone())
    }

    /// Reclassify `paths` and patch them into the view, or buffer the
    /// records while the view is inactive. Unmodified paths yield nothing.
    pub async fn refresh_paths(
        &self,
        dir: &str,
        paths: &[String],
    ) -> EngineResult<Vec<FileStatusRecord>> {
        self.refresh(dir, paths, None).await
    }

    /// With `epoch` set, the records are only applied if no reset happened
    /// since that epoch began.
    async fn refresh(
        &self,
        dir: &str,
        paths: &[String],
        epoch: Option<u64>,
    ) -> EngineResult<Vec<FileStatusRecord>> {
        let rows = self
            .engine
            .status_matrix(&normalize(dir), Some(paths))
            .await?;
        let records: Vec<_> = rows.iter().filter_map(FileStatusRecord::from_row).collect();
        self.apply(records.clone(), epoch).await;
        Ok(records)
    }

    async fn apply(&self, records: Vec<FileStatusRecord>, epoch: Option<u64>) {
        if records.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        if epoch.is_some_and(|epoch| epoch != state.epoch) {
            debug!(count = records.len(), "dropping status patches from an earlier folder");
            return;
        }
        if state.active {
            for record in records {
                state.view.patch(record);
            }
        } else {
            debug!(count = records.len(), "buffering status patches");
            state.pending.extend(records);
        }
    }

    fn watch_row(self: &Arc<Self>, dir: &str, row: &StatusRow, epoch: u64) {
        let path = normalize(&format!("{dir}/{}", row.path));
        let weak = Arc::downgrade(self);
        let dir = dir.to_string();
        let filepath = row.path.clone();
        self.registry
            .register(self.watcher.as_ref(), &path, move || {
                watch_callback(weak, dir, filepath, epoch)
            });
    }
}

fn watch_callback(
    weak: Weak<StatusReconciler>,
    dir: String,
    filepath: String,
    epoch: u64,
) -> WatchCallback {
    Arc::new(move || {
        let Some(reconciler) = weak.upgrade() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(path = %filepath, "change notification outside the runtime; ignored");
            return;
        };
        let dir = dir.clone();
        let filepath = filepath.clone();
        handle.spawn(async move {
            if let Err(e) = reconciler
                .refresh(&dir, std::slice::from_ref(&filepath), Some(epoch))
                .await
            {
                warn!(path = %filepath, error = %e, "status refresh after change failed");
            }
        });
    })
}

impl std::fmt::Debug for StatusReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReconciler")
            .field("watched", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::RecordingWatcher;
    use scopegit_engine::InMemoryEngine;
    use scopegit_fs::{FsClient, ScopedFs, WriteOptions};
    use scopegit_path::{PathTranslator, SharedRootContext};
    use scopegit_store::InMemoryStorage;
    use std::time::Duration;

    const REPO: &str = "/Documents/repo";

    struct Fixture {
        fs: Arc<ScopedFs>,
        engine: Arc<InMemoryEngine>,
        watcher: Arc<RecordingWatcher>,
        reconciler: Arc<StatusReconciler>,
    }

    async fn fixture() -> Fixture {
        let translator = Arc::new(PathTranslator::default());
        let storage = Arc::new(InMemoryStorage::new(translator.clone()));
        storage.seed_directory(REPO).await;
        let fs = Arc::new(ScopedFs::new(storage, translator, SharedRootContext::new()));
        let engine = Arc::new(InMemoryEngine::new(fs.clone()));
        engine.init(REPO, "main").await.unwrap();
        engine.set_config(REPO, "user.name", "Test").await.unwrap();
        let watcher = Arc::new(RecordingWatcher::new());
        let reconciler = StatusReconciler::new(engine.clone(), watcher.clone());
        Fixture {
            fs,
            engine,
            watcher,
            reconciler,
        }
    }

    async fn write(fs: &ScopedFs, rel: &str, text: &str) {
        fs.write_file(&format!("{REPO}/{rel}"), text.into(), WriteOptions::default())
            .await
            .unwrap();
    }

    fn paths(records: &[FileStatusRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // full rebuild
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn rebuild_partitions_and_skips_unmodified() {
        let fx = fixture().await;
        write(&fx.fs, "clean.txt", "c").await;
        fx.engine.add(REPO, "clean.txt").await.unwrap();
        fx.engine.commit(REPO, "init", None).await.unwrap();
        write(&fx.fs, "new.txt", "n").await;
        write(&fx.fs, "staged.txt", "s").await;
        fx.engine.add(REPO, "staged.txt").await.unwrap();

        let view = fx.reconciler.full_rebuild(REPO).await.unwrap();
        assert_eq!(paths(view.staged()), vec!["staged.txt"]);
        assert_eq!(paths(view.unstaged()), vec!["new.txt"]);
        assert!(view.get("clean.txt").is_none());
        assert_eq!(fx.reconciler.view().await, view);
    }

    #[tokio::test]
    async fn rebuild_watches_each_path_once() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        assert_eq!(fx.watcher.watch_count("/Documents/repo/a.txt"), 1);
        assert_eq!(fx.reconciler.registry().len(), 1);
    }

    // -----------------------------------------------------------------------
    // incremental refresh
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn refresh_patches_one_path() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        write(&fx.fs, "b.txt", "b").await;
        write(&fx.fs, "c.txt", "c").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();

        fx.engine.add(REPO, "b.txt").await.unwrap();
        let records = fx
            .reconciler
            .refresh_paths(REPO, &["b.txt".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "A");

        let view = fx.reconciler.view().await;
        assert_eq!(paths(view.staged()), vec!["b.txt"]);
        assert_eq!(paths(view.unstaged()), vec!["a.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn inactive_view_buffers_until_activated() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();

        fx.reconciler.set_active(false).await;
        fx.engine.add(REPO, "a.txt").await.unwrap();
        fx.reconciler
            .refresh_paths(REPO, &["a.txt".to_string()])
            .await
            .unwrap();
        assert_eq!(fx.reconciler.pending_len().await, 1);
        assert!(!fx.reconciler.view().await.has_staged_changes());

        assert_eq!(fx.reconciler.set_active(true).await, 1);
        assert_eq!(fx.reconciler.pending_len().await, 0);
        assert_eq!(paths(fx.reconciler.view().await.staged()), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn watch_callback_refreshes_changed_path() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.engine.add(REPO, "a.txt").await.unwrap();
        fx.engine.commit(REPO, "init", None).await.unwrap();
        write(&fx.fs, "a.txt", "changed").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        assert_eq!(fx.reconciler.view().await.get("a.txt").unwrap().key.to_string(), "1-2-1");

        fx.engine.add(REPO, "a.txt").await.unwrap();
        assert_eq!(fx.watcher.fire("/Documents/repo/a.txt"), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let view = fx.reconciler.view().await;
        assert_eq!(view.get("a.txt").unwrap().key.to_string(), "1-2-2");
        assert!(view.unstaged().is_empty());
    }

    #[tokio::test]
    async fn unmodified_result_leaves_view_alone() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.engine.add(REPO, "a.txt").await.unwrap();
        fx.engine.commit(REPO, "init", None).await.unwrap();
        write(&fx.fs, "a.txt", "changed").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();

        write(&fx.fs, "a.txt", "a").await;
        let records = fx
            .reconciler
            .refresh_paths(REPO, &["a.txt".to_string()])
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(fx.reconciler.view().await.get("a.txt").unwrap().symbol, "M");
    }

    #[tokio::test]
    async fn dropped_reconciler_ignores_callbacks() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        let watcher = fx.watcher.clone();
        drop(fx);
        assert_eq!(watcher.fire("/Documents/repo/a.txt"), 1);
    }

    #[tokio::test]
    async fn reset_clears_view_and_buffer() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        fx.reconciler.set_active(false).await;
        fx.reconciler
            .refresh_paths(REPO, &["a.txt".to_string()])
            .await
            .unwrap();
        fx.reconciler.reset().await;
        assert!(fx.reconciler.view().await.is_clean());
        assert_eq!(fx.reconciler.pending_len().await, 0);
        assert!(!fx.reconciler.is_active().await);
        assert!(fx.reconciler.registry().is_empty());
    }

    #[tokio::test]
    async fn callbacks_from_before_reset_leave_view_alone() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        fx.reconciler.reset().await;

        write(&fx.fs, "a.txt", "changed").await;
        assert_eq!(fx.watcher.fire("/Documents/repo/a.txt"), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fx.reconciler.view().await.is_clean());
    }

    #[tokio::test]
    async fn rebuild_after_reset_watches_again() {
        let fx = fixture().await;
        write(&fx.fs, "a.txt", "a").await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        fx.reconciler.reset().await;
        fx.reconciler.full_rebuild(REPO).await.unwrap();
        assert_eq!(fx.watcher.watch_count("/Documents/repo/a.txt"), 2);
        assert!(fx.reconciler.registry().is_watched("/Documents/repo/a.txt"));

        fx.engine.add(REPO, "a.txt").await.unwrap();
        assert_eq!(fx.watcher.fire("/Documents/repo/a.txt"), 2);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let view = fx.reconciler.view().await;
        assert_eq!(paths(view.staged()), vec!["a.txt"]);
        assert!(view.unstaged().is_empty());
    }
}
