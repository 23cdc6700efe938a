//! The version-control session behind the sidebar.
//!
//! [`VersionControl`] owns the folder selection, the active root, the status
//! view and the stored access token, and turns each user command into engine
//! calls followed by a status rebuild.

use std::sync::Arc;

use async_trait::async_trait;
use scopegit_engine::{
    validate_branch_name, validate_remote_name, CloneOptions, Credentials, EngineError,
    FetchOptions, FetchOutcome, GitEngine, InMemoryEngine, Oid, Progress, PullOptions,
    PushOptions, PushOutcome, RemoteInfo, TransferHooks, TreeEntryKind,
};
use scopegit_fs::{FsClient, MkdirOptions, ScopedFs};
use scopegit_path::{join, PathTranslator, SharedRootContext};
use scopegit_status::{FileWatcher, StatusReconciler, StatusView};
use scopegit_store::StorageBackend;
use scopegit_types::RepositoryError;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SidebarConfig;
use crate::credentials::{format_progress, CredentialProvider, TransferObserver};
use crate::error::{SdkError, SdkResult};
use crate::outcome::{CommitOutcome, CommitRequest, PullOutcome, RefreshOutcome};

/// Repository name a clone URL implies: the last path segment without a
/// trailing `.git`. `None` when the URL has no slash or ends in one.
pub fn repository_name(url: &str) -> Option<String> {
    let (_, last) = url.rsplit_once('/')?;
    if last.is_empty() {
        return None;
    }
    let name = match last.strip_suffix(".git") {
        Some(stem) if !stem.is_empty() => stem,
        _ => last,
    };
    Some(name.to_string())
}

/// A sidebar session over one storage backend.
pub struct VersionControl {
    config: SidebarConfig,
    translator: Arc<PathTranslator>,
    roots: SharedRootContext,
    fs: Arc<dyn FsClient>,
    engine: Arc<dyn GitEngine>,
    reconciler: Arc<StatusReconciler>,
    credentials: Arc<dyn CredentialProvider>,
    token: Mutex<Option<String>>,
    folders: RwLock<Vec<String>>,
    last_dir: Mutex<Option<String>>,
}

impl VersionControl {
    /// Session over `backend` with an in-memory engine.
    pub fn new(
        config: SidebarConfig,
        backend: Arc<dyn StorageBackend>,
        watcher: Arc<dyn FileWatcher>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let translator = Arc::new(PathTranslator::new(&config.translator));
        let fs = Arc::new(ScopedFs::new(backend, translator, SharedRootContext::new()));
        let engine = Arc::new(InMemoryEngine::new(fs.clone()));
        Self::with_engine(config, fs, engine, watcher, credentials)
    }

    /// Session over an existing filesystem client and engine. The translator
    /// and root context of `fs` are shared with the session.
    pub fn with_engine(
        config: SidebarConfig,
        fs: Arc<ScopedFs>,
        engine: Arc<dyn GitEngine>,
        watcher: Arc<dyn FileWatcher>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let translator = fs.translator().clone();
        let roots = fs.roots().clone();
        let reconciler = StatusReconciler::new(engine.clone(), watcher);
        let token = config.access_token.clone();
        Self {
            config,
            translator,
            roots,
            fs,
            engine,
            reconciler,
            credentials,
            token: Mutex::new(token),
            folders: RwLock::new(Vec::new()),
            last_dir: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SidebarConfig {
        &self.config
    }

    pub fn translator(&self) -> &Arc<PathTranslator> {
        &self.translator
    }

    pub fn roots(&self) -> &SharedRootContext {
        &self.roots
    }

    pub fn engine(&self) -> &Arc<dyn GitEngine> {
        &self.engine
    }

    pub fn reconciler(&self) -> &Arc<StatusReconciler> {
        &self.reconciler
    }

    // -----------------------------------------------------------------------
    // Folder selection
    // -----------------------------------------------------------------------

    /// Replace the selected folder locators.
    pub async fn select_folders(&self, locators: Vec<String>) {
        debug!(count = locators.len(), "folders selected");
        *self.folders.write().await = locators;
    }

    /// Path of the single selected folder.
    pub async fn current_dir(&self) -> SdkResult<String> {
        let folders = self.folders.read().await;
        match folders.as_slice() {
            [] => {
                self.roots.clear();
                Err(RepositoryError::NoFolderSelected.into())
            }
            [folder] => Ok(self.translator.uri_to_path(folder)?),
            _ => Err(RepositoryError::MultipleFoldersSelected.into()),
        }
    }

    /// Resolve the current folder and make it the active root. Switching to
    /// a different folder discards the previous status view.
    async fn detect_root(&self) -> SdkResult<String> {
        let dir = self.current_dir().await?;
        let changed = {
            let mut last = self.last_dir.lock().await;
            if last.as_deref() == Some(dir.as_str()) {
                false
            } else {
                *last = Some(dir.clone());
                true
            }
        };
        if changed {
            self.roots.set_root(&dir);
            self.reconciler.reset().await;
            info!(%dir, "working root changed");
        }
        Ok(dir)
    }

    /// Whether `dir/.git` exists as a directory.
    pub async fn is_repository(&self, dir: &str) -> bool {
        match self.fs.stat(&join(&[dir, ".git"])).await {
            Ok(stats) => stats.is_directory(),
            Err(_) => false,
        }
    }

    async fn repo_dir(&self) -> SdkResult<String> {
        let dir = self.detect_root().await?;
        if !self.is_repository(&dir).await {
            return Err(RepositoryError::NotInitialized.into());
        }
        Ok(dir)
    }

    async fn rebuild(&self, dir: &str) -> SdkResult<StatusView> {
        Ok(self.reconciler.full_rebuild(dir).await?)
    }

    /// Re-detect the root and rebuild the status view. Also marks the
    /// sidebar visible, flushing buffered file changes.
    pub async fn refresh(&self) -> SdkResult<RefreshOutcome> {
        self.reconciler.set_active(true).await;
        let dir = self.detect_root().await?;
        if !self.is_repository(&dir).await {
            debug!(%dir, "selected folder is not a repository");
            return Ok(RefreshOutcome::NotARepository { dir });
        }
        let branch = self.engine.current_branch(&dir).await?;
        let view = self.rebuild(&dir).await?;
        Ok(RefreshOutcome::Ready { dir, branch, view })
    }

    /// Sidebar visibility. Returns the number of buffered changes applied.
    pub async fn set_sidebar_active(&self, active: bool) -> usize {
        self.reconciler.set_active(active).await
    }

    // -----------------------------------------------------------------------
    // Repository and staging
    // -----------------------------------------------------------------------

    pub async fn init_repository(&self) -> SdkResult<RefreshOutcome> {
        let dir = self.detect_root().await?;
        if self.is_repository(&dir).await {
            return Err(RepositoryError::AlreadyInitialized.into());
        }
        self.engine.init(&dir, &self.config.default_branch).await?;
        info!(%dir, branch = %self.config.default_branch, "initialized repository");
        self.refresh().await
    }

    pub async fn stage(&self, filepath: &str) -> SdkResult<StatusView> {
        let dir = self.repo_dir().await?;
        self.engine.add(&dir, filepath).await?;
        self.rebuild(&dir).await
    }

    pub async fn unstage(&self, filepath: &str) -> SdkResult<StatusView> {
        let dir = self.repo_dir().await?;
        self.engine.reset_index(&dir, filepath).await?;
        self.rebuild(&dir).await
    }

    pub async fn stage_all(&self) -> SdkResult<StatusView> {
        let dir = self.repo_dir().await?;
        self.stage_all_in(&dir).await?;
        self.rebuild(&dir).await
    }

    /// Deleted files are removed from the index, everything else is added.
    async fn stage_all_in(&self, dir: &str) -> SdkResult<()> {
        for row in self.engine.status_matrix(dir, None).await? {
            if row.triple.is_unmodified() {
                continue;
            }
            if row.triple.workdir_present() {
                self.engine.add(dir, &row.path).await?;
            } else {
                self.engine.remove(dir, &row.path).await?;
            }
        }
        Ok(())
    }

    pub async fn commit(&self, request: CommitRequest) -> SdkResult<CommitOutcome> {
        if request.message.trim().is_empty() {
            return Err(SdkError::EmptyMessage);
        }
        let dir = self.repo_dir().await?;
        let view = self.rebuild(&dir).await?;
        if !view.has_staged_changes() {
            if view.is_clean() {
                info!(%dir, "no changes to commit");
                return Ok(CommitOutcome::NoChanges);
            }
            if !request.stage_all {
                return Err(SdkError::NothingStaged);
            }
            self.stage_all_in(&dir).await?;
        }
        let oid = self
            .engine
            .commit(&dir, &request.message, request.author)
            .await?;
        info!(%dir, oid = %oid.short(), "committed");
        self.rebuild(&dir).await?;
        Ok(CommitOutcome::Committed(oid))
    }

    // -----------------------------------------------------------------------
    // Historical content
    // -----------------------------------------------------------------------

    /// Text of `filepath` as committed on `branch`, or on `remote/branch`.
    pub async fn read_branch_file(
        &self,
        filepath: &str,
        branch: &str,
        remote: Option<&str>,
    ) -> SdkResult<String> {
        let dir = self.repo_dir().await?;
        let reference = match remote {
            Some(remote) => format!("refs/remotes/{remote}/{branch}"),
            None => format!("refs/heads/{branch}"),
        };
        let oid = self.engine.resolve_ref(&dir, &reference).await?;
        let commit = self.engine.read_commit(&dir, &oid).await?;

        let not_found = || SdkError::FileNotFound(filepath.to_string());
        let parts: Vec<&str> = filepath.split('/').filter(|p| !p.is_empty()).collect();
        let mut tree = commit.tree;
        for (i, part) in parts.iter().enumerate() {
            let last = i + 1 == parts.len();
            let entry = self
                .engine
                .read_tree(&dir, &tree)
                .await?
                .into_iter()
                .find(|e| e.path == *part)
                .ok_or_else(not_found)?;
            match entry.kind {
                TreeEntryKind::Blob if last => {
                    let blob = self.engine.read_blob(&dir, &entry.oid).await?;
                    return Ok(String::from_utf8_lossy(&blob).into_owned());
                }
                TreeEntryKind::Blob => return Err(SdkError::NotADirectory(filepath.to_string())),
                TreeEntryKind::Tree if last => return Err(not_found()),
                TreeEntryKind::Tree => tree = entry.oid,
                TreeEntryKind::Commit => return Err(SdkError::UnsupportedEntry(part.to_string())),
            }
        }
        Err(not_found())
    }

    /// Text of `filepath` at HEAD, for side-by-side comparison.
    pub async fn open_at_head(&self, filepath: &str) -> SdkResult<String> {
        let dir = self.repo_dir().await?;
        let branch = self
            .engine
            .current_branch(&dir)
            .await?
            .unwrap_or_else(|| self.config.default_branch.clone());
        self.read_branch_file(filepath, &branch, None).await
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    pub async fn current_branch(&self) -> SdkResult<Option<String>> {
        let dir = self.repo_dir().await?;
        Ok(self.engine.current_branch(&dir).await?)
    }

    pub async fn list_branches(&self, remote: Option<&str>) -> SdkResult<Vec<String>> {
        let dir = self.repo_dir().await?;
        Ok(self.engine.list_branches(&dir, remote).await?)
    }

    pub async fn create_branch(&self, name: &str) -> SdkResult<()> {
        validate_branch_name(name)?;
        let dir = self.repo_dir().await?;
        self.engine.branch(&dir, name, false).await?;
        info!(%dir, branch = %name, "created branch");
        Ok(())
    }

    pub async fn delete_branch(&self, name: &str) -> SdkResult<()> {
        let dir = self.repo_dir().await?;
        self.engine.delete_branch(&dir, name).await?;
        info!(%dir, branch = %name, "deleted branch");
        Ok(())
    }

    /// Switch to `name`. Returns `false` when it is already checked out.
    pub async fn checkout_branch(
        &self,
        name: &str,
        observer: &dyn TransferObserver,
    ) -> SdkResult<bool> {
        let dir = self.repo_dir().await?;
        if self.engine.current_branch(&dir).await?.as_deref() == Some(name) {
            debug!(branch = %name, "already on branch");
            return Ok(false);
        }
        self.engine
            .checkout(&dir, name, &self.hooks(observer))
            .await?;
        info!(%dir, branch = %name, "checked out");
        self.rebuild(&dir).await?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Remotes and config
    // -----------------------------------------------------------------------

    pub async fn list_remotes(&self) -> SdkResult<Vec<RemoteInfo>> {
        let dir = self.repo_dir().await?;
        Ok(self.engine.list_remotes(&dir).await?)
    }

    pub async fn add_remote(&self, name: &str, url: &str) -> SdkResult<()> {
        if url.trim().is_empty() {
            return Err(SdkError::InvalidInput("remote url is required".into()));
        }
        validate_remote_name(name)?;
        let dir = self.repo_dir().await?;
        self.engine.add_remote(&dir, name, url.trim()).await?;
        info!(%dir, remote = %name, "added remote");
        Ok(())
    }

    pub async fn delete_remote(&self, name: &str) -> SdkResult<()> {
        let dir = self.repo_dir().await?;
        self.engine.delete_remote(&dir, name).await?;
        info!(%dir, remote = %name, "deleted remote");
        Ok(())
    }

    pub async fn remote_url(&self, remote: &str) -> SdkResult<Option<String>> {
        self.get_config(&format!("remote.{remote}.url")).await
    }

    pub async fn get_config(&self, path: &str) -> SdkResult<Option<String>> {
        let dir = self.repo_dir().await?;
        Ok(self.engine.get_config(&dir, path).await?)
    }

    pub async fn get_config_all(&self, path: &str) -> SdkResult<Vec<String>> {
        let dir = self.repo_dir().await?;
        Ok(self.engine.get_config_all(&dir, path).await?)
    }

    pub async fn set_config(&self, path: &str, value: &str) -> SdkResult<()> {
        if !path.contains('.') {
            return Err(SdkError::InvalidInput(format!(
                "config key '{path}' must look like section.name"
            )));
        }
        let dir = self.repo_dir().await?;
        Ok(self.engine.set_config(&dir, path, value).await?)
    }

    // -----------------------------------------------------------------------
    // Credentials and transfers
    // -----------------------------------------------------------------------

    /// Token kept for later transfers, if any.
    pub async fn stored_token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Credentials for `url`: the stored token, else one from the provider.
    /// A prompted token is kept when the provider confirms saving it.
    pub async fn credentials_for(&self, url: &str) -> Option<Credentials> {
        if let Some(token) = self.stored_token().await {
            return Some(Credentials::token(token));
        }
        let token = self.credentials.prompt_token(url).await?;
        if self.credentials.confirm_save().await {
            *self.token.lock().await = Some(token.clone());
            debug!("access token saved");
        }
        Some(Credentials::token(token))
    }

    fn hooks<'a>(&'a self, observer: &'a dyn TransferObserver) -> SessionHooks<'a> {
        SessionHooks {
            session: self,
            observer,
        }
    }

    pub async fn pull(
        &self,
        remote: Option<&str>,
        branch: Option<&str>,
        observer: &dyn TransferObserver,
    ) -> SdkResult<PullOutcome> {
        let dir = self.repo_dir().await?;
        let before: Option<Oid> = self.engine.resolve_ref(&dir, "HEAD").await.ok();
        let options = PullOptions {
            remote: Some(remote.unwrap_or(&self.config.default_remote).to_string()),
            reference: branch.map(str::to_string),
            cors_proxy: self.config.cors_proxy.clone(),
            author: None,
        };
        self.engine
            .pull(&dir, &options, &self.hooks(observer))
            .await?;
        let after = self.engine.resolve_ref(&dir, "HEAD").await?;
        self.rebuild(&dir).await?;
        if before == Some(after) {
            info!(%dir, "already up-to-date");
            observer.on_status("Already up-to-date.");
            return Ok(PullOutcome::AlreadyUpToDate);
        }
        info!(%dir, head = %after.short(), "pulled");
        Ok(PullOutcome::Updated { before, after })
    }

    pub async fn push(
        &self,
        remote: Option<&str>,
        branch: Option<&str>,
        observer: &dyn TransferObserver,
    ) -> SdkResult<PushOutcome> {
        let dir = self.repo_dir().await?;
        let options = PushOptions {
            remote: Some(remote.unwrap_or(&self.config.default_remote).to_string()),
            reference: branch.map(str::to_string),
            cors_proxy: self.config.cors_proxy.clone(),
        };
        let outcome = self
            .engine
            .push(&dir, &options, &self.hooks(observer))
            .await?;
        if outcome.ok {
            info!(%dir, "pushed");
            observer.on_status("Done.");
        } else {
            warn!(%dir, error = ?outcome.error, "push rejected");
            observer.on_status("Failed to push");
        }
        Ok(outcome)
    }

    /// Fetch from `remote`, or from the only configured remote.
    pub async fn fetch(
        &self,
        remote: Option<&str>,
        observer: &dyn TransferObserver,
    ) -> SdkResult<FetchOutcome> {
        let dir = self.repo_dir().await?;
        let remotes = self.engine.list_remotes(&dir).await?;
        let chosen = match (remote, remotes.as_slice()) {
            (_, []) => return Err(SdkError::NoRemotes),
            (Some(name), _) => remotes
                .iter()
                .find(|r| r.remote == name)
                .cloned()
                .ok_or_else(|| EngineError::UnknownRemote(name.to_string()))?,
            (None, [only]) => only.clone(),
            (None, _) => {
                return Err(SdkError::RemoteSelectionRequired(
                    remotes.iter().map(|r| r.remote.clone()).collect(),
                ))
            }
        };
        let options = FetchOptions {
            remote: Some(chosen.remote.clone()),
            url: Some(chosen.url),
            cors_proxy: self.config.cors_proxy.clone(),
        };
        let outcome = self
            .engine
            .fetch(&dir, &options, &self.hooks(observer))
            .await?;
        info!(%dir, remote = %chosen.remote, "fetched");
        self.rebuild(&dir).await?;
        Ok(outcome)
    }

    /// Clone `url` into a folder named after it inside `destination`.
    /// Returns the path of the new repository.
    pub async fn clone_repository(
        &self,
        url: &str,
        destination: &str,
        observer: &dyn TransferObserver,
    ) -> SdkResult<String> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SdkError::InvalidInput("repository url is required".into()));
        }
        let parent = self.translator.uri_to_path(destination)?;
        let dir = match repository_name(url) {
            Some(name) => join(&[parent.as_str(), name.as_str()]),
            None => parent,
        };
        match self.fs.stat(&dir).await {
            Err(e) if e.is_not_found() => {
                self.fs.mkdir(&dir, MkdirOptions::default()).await?;
            }
            Err(e) => return Err(e.into()),
            Ok(stats) if stats.is_file() => return Err(SdkError::DestinationIsFile(dir)),
            Ok(_) => {
                if !self.fs.readdir(&dir).await?.is_empty() {
                    return Err(SdkError::DestinationNotEmpty(dir));
                }
            }
        }
        let options = CloneOptions {
            url: url.to_string(),
            cors_proxy: self.config.cors_proxy.clone(),
            reference: None,
        };
        self.engine
            .clone_repository(&dir, &options, &self.hooks(observer))
            .await?;
        info!(%dir, %url, "cloned");
        Ok(dir)
    }
}

impl std::fmt::Debug for VersionControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionControl")
            .field("config", &self.config)
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

/// Routes engine callbacks to an observer and the session's credentials.
struct SessionHooks<'a> {
    session: &'a VersionControl,
    observer: &'a dyn TransferObserver,
}

#[async_trait]
impl<'a> TransferHooks for SessionHooks<'a> {
    fn on_progress(&self, progress: &Progress) {
        self.observer.on_status(&format_progress(progress));
    }

    fn on_message(&self, message: &str) {
        self.observer.on_status(message);
    }

    async fn on_auth(&self, url: &str) -> Option<Credentials> {
        self.session.credentials_for(url).await
    }
}
