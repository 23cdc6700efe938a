//! In-memory Git engine.
//!
//! Repository state (objects, refs, index, config) lives in memory, keyed by
//! repository directory. The working copy is read and written through an
//! [`FsClient`], so the engine sees exactly what the scoped storage holds.
//! Remotes are served by a [`RemoteHub`].
//!
//! Each repository sits behind its own async mutex. Operations take it to
//! read or update repository state and release it before touching the
//! working copy or a remote.

mod objects;
mod remote;
mod repo;
mod worktree;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use scopegit_fs::{FsClient, MkdirOptions, ReadOptions, WriteOptions};
use scopegit_path::normalize;
use scopegit_types::VcsError;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

pub use remote::RemoteHub;

use crate::error::{EngineError, EngineResult};
use crate::hooks::TransferHooks;
use crate::names::{validate_branch_name, validate_remote_name};
use crate::oid::{ObjectHasher, Oid};
use crate::traits::GitEngine;
use crate::types::{
    CloneOptions, CommitInfo, FetchOptions, FetchOutcome, Progress, PullOptions, PushOptions,
    PushOutcome, RemoteInfo, Signature, StatusRow, TreeEntry,
};
use objects::{CommitData, FileMap};
use remote::Download;
use repo::{Head, Repo, HEADS, REMOTES};
use worktree::{absolute, scan, WorktreePlan, GIT_DIR};

const DEFAULT_REMOTE: &str = "origin";

/// [`GitEngine`] keeping repository state in memory.
pub struct InMemoryEngine {
    fs: Arc<dyn FsClient>,
    hub: Arc<RemoteHub>,
    repos: RwLock<HashMap<String, Arc<Mutex<Repo>>>>,
}

impl InMemoryEngine {
    /// Engine with a private, empty [`RemoteHub`].
    pub fn new(fs: Arc<dyn FsClient>) -> Self {
        Self::with_hub(fs, Arc::new(RemoteHub::new()))
    }

    /// Engine sharing `hub` with other engines.
    pub fn with_hub(fs: Arc<dyn FsClient>, hub: Arc<RemoteHub>) -> Self {
        Self {
            fs,
            hub,
            repos: RwLock::new(HashMap::new()),
        }
    }

    pub fn hub(&self) -> &Arc<RemoteHub> {
        &self.hub
    }

    async fn repo(&self, dir: &str) -> EngineResult<Arc<Mutex<Repo>>> {
        let key = normalize(dir);
        self.repos
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("git repository at {key}")))
    }

    /// Copy a download into `repo` and point `refs/remotes/<remote>/*` at it.
    async fn receive(
        &self,
        repo: &Mutex<Repo>,
        remote: &str,
        download: &Download,
        hooks: &dyn TransferHooks,
    ) -> FetchOutcome {
        hooks.on_message(&format!(
            "Enumerating objects: {}, done.",
            download.objects.len()
        ));
        let mut repo = repo.lock().await;
        let received = repo.objects.merge_from(&download.objects) as u64;
        hooks.on_progress(&Progress {
            phase: "Receiving objects".into(),
            loaded: received,
            total: received,
        });
        let prefix = format!("{REMOTES}{remote}/");
        for (branch, oid) in &download.branches {
            repo.refs.insert(format!("{prefix}{branch}"), *oid);
        }
        let fetch_head = download.branches.get(&download.head_branch).copied();
        if let Some(oid) = fetch_head {
            repo.refs.insert(format!("{prefix}HEAD"), oid);
        }
        debug!(remote, received, "fetched");
        FetchOutcome {
            default_branch: Some(download.head_branch.clone()),
            fetch_head,
        }
    }

    async fn fetch_from(
        &self,
        repo: &Mutex<Repo>,
        remote: &str,
        url: &str,
        cors_proxy: Option<&str>,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<FetchOutcome> {
        debug!(remote, url, cors_proxy = ?cors_proxy, "fetching");
        self.hub.authorize(url, hooks).await?;
        let download = self.hub.download(url).await?;
        Ok(self.receive(repo, remote, &download, hooks).await)
    }

    async fn workdir_files(&self, dir: &str, start: &str) -> EngineResult<Vec<(String, Bytes)>> {
        if start.is_empty() {
            return Ok(scan(self.fs.as_ref(), dir, "").await?.into_iter().collect());
        }
        match self.fs.stat(&absolute(dir, start)).await {
            Ok(stats) if stats.is_directory() => {
                Ok(scan(self.fs.as_ref(), dir, start).await?.into_iter().collect())
            }
            Ok(_) => {
                let data = self
                    .fs
                    .read_file(&absolute(dir, start), ReadOptions::default())
                    .await?;
                Ok(vec![(start.to_string(), data.into_bytes())])
            }
            Err(e) if e.is_not_found() => Err(EngineError::NotFound(start.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repos = self.repos.try_read().map(|r| r.len()).ok();
        f.debug_struct("InMemoryEngine")
            .field("repositories", &repos)
            .finish_non_exhaustive()
    }
}

/// Repository-relative form of a file argument: no `./`, no surrounding `/`.
fn relative(filepath: &str) -> String {
    let trimmed = filepath.trim_start_matches("./").trim_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn selected(path: &str, filter: Option<&[String]>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    filter.iter().any(|f| {
        let f = relative(f);
        f.is_empty()
            || path == f
            || path
                .strip_prefix(f.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl GitEngine for InMemoryEngine {
    async fn init(&self, dir: &str, default_branch: &str) -> EngineResult<()> {
        validate_branch_name(default_branch)?;
        let key = normalize(dir);
        let git_dir = absolute(&key, GIT_DIR);
        if !self.fs.exists(&git_dir).await? {
            self.fs.mkdir(&git_dir, MkdirOptions::default()).await?;
            self.fs
                .write_file(
                    &absolute(&git_dir, "HEAD"),
                    format!("ref: {HEADS}{default_branch}\n").into(),
                    WriteOptions::default(),
                )
                .await?;
        }
        self.repos
            .write()
            .await
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Repo::new(default_branch))));
        info!(dir = %key, default_branch, "initialized repository");
        Ok(())
    }

    async fn status_matrix(
        &self,
        dir: &str,
        filepaths: Option<&[String]>,
    ) -> EngineResult<Vec<StatusRow>> {
        let repo = self.repo(dir).await?;
        let (head, index) = {
            let repo = repo.lock().await;
            (repo.head_files()?, repo.index.clone())
        };
        let workdir: FileMap = scan(self.fs.as_ref(), &normalize(dir), "")
            .await?
            .into_iter()
            .map(|(path, data)| (path, ObjectHasher::BLOB.hash(&data)))
            .collect();

        let paths: BTreeSet<&String> = head
            .keys()
            .chain(index.keys())
            .chain(workdir.keys())
            .collect();
        let rows = paths
            .into_iter()
            .filter(|path| selected(path, filepaths))
            .map(|path| {
                let head_oid = head.get(path);
                let work_oid = workdir.get(path);
                let head_col = u8::from(head_oid.is_some());
                let work_col = match work_oid {
                    None => 0,
                    Some(oid) if Some(oid) == head_oid => 1,
                    Some(_) => 2,
                };
                let stage_col = match index.get(path) {
                    None => 0,
                    Some(oid) if Some(oid) == head_oid => 1,
                    Some(oid) if Some(oid) == work_oid => 2,
                    Some(_) => 3,
                };
                StatusRow::new(path.clone(), (head_col, work_col, stage_col))
            })
            .collect();
        Ok(rows)
    }

    async fn current_branch(&self, dir: &str) -> EngineResult<Option<String>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(repo.current_branch().map(str::to_string))
    }

    async fn resolve_ref(&self, dir: &str, reference: &str) -> EngineResult<Oid> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        repo.resolve(reference)
    }

    async fn read_commit(&self, dir: &str, oid: &Oid) -> EngineResult<CommitInfo> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        repo.objects.commit(oid)
    }

    async fn read_tree(&self, dir: &str, oid: &Oid) -> EngineResult<Vec<TreeEntry>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(repo.objects.tree(oid)?.to_vec())
    }

    async fn read_blob(&self, dir: &str, oid: &Oid) -> EngineResult<Bytes> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        repo.objects.blob(oid)
    }

    async fn add(&self, dir: &str, filepath: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let rel = relative(filepath);
        let files = self.workdir_files(&normalize(dir), &rel).await?;
        let mut repo = repo.lock().await;
        for (path, data) in files {
            let oid = repo.objects.put_blob(data);
            repo.index.insert(path, oid);
        }
        debug!(dir, path = %rel, "staged");
        Ok(())
    }

    async fn remove(&self, dir: &str, filepath: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let rel = relative(filepath);
        let nested = format!("{rel}/");
        let mut repo = repo.lock().await;
        repo.index
            .retain(|path, _| *path != rel && !path.starts_with(&nested));
        debug!(dir, path = %rel, "removed from index");
        Ok(())
    }

    async fn reset_index(&self, dir: &str, filepath: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let rel = relative(filepath);
        let mut repo = repo.lock().await;
        match repo.head_files()?.get(&rel) {
            Some(oid) => {
                repo.index.insert(rel, *oid);
            }
            None => {
                repo.index.remove(&rel);
            }
        }
        Ok(())
    }

    async fn commit(
        &self,
        dir: &str,
        message: &str,
        author: Option<Signature>,
    ) -> EngineResult<Oid> {
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        let author = match author {
            Some(author) => author,
            None => Signature {
                name: repo
                    .config_last("user.name")
                    .ok_or(EngineError::MissingAuthor)?,
                email: repo.config_last("user.email").unwrap_or_default(),
                timestamp: now_seconds(),
            },
        };
        let index = repo.index.clone();
        let tree = repo.objects.write_tree(&index)?;
        let parents = repo.head_commit().into_iter().collect();
        let oid = repo.objects.put_commit(CommitData {
            tree,
            parents,
            message: message.to_string(),
            author,
        })?;
        repo.advance_head(oid);
        info!(dir, oid = %oid.short(), "committed");
        Ok(oid)
    }

    async fn branch(&self, dir: &str, name: &str, checkout: bool) -> EngineResult<()> {
        validate_branch_name(name)?;
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        let refname = format!("{HEADS}{name}");
        if repo.refs.contains_key(&refname) {
            return Err(EngineError::AlreadyExists(format!("branch '{name}'")));
        }
        match repo.head_commit() {
            Some(tip) => {
                repo.refs.insert(refname, tip);
            }
            None if checkout => {}
            None => return Err(EngineError::NotFound("HEAD".into())),
        }
        if checkout {
            repo.head = Head::Branch(name.to_string());
        }
        debug!(dir, name, checkout, "created branch");
        Ok(())
    }

    async fn delete_branch(&self, dir: &str, name: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        if repo.current_branch() == Some(name) {
            return Err(EngineError::DeleteCurrentBranch(name.to_string()));
        }
        repo.refs
            .remove(&format!("{HEADS}{name}"))
            .ok_or_else(|| EngineError::NotFound(format!("branch '{name}'")))?;
        debug!(dir, name, "deleted branch");
        Ok(())
    }

    async fn checkout(
        &self,
        dir: &str,
        reference: &str,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()> {
        let repo_lock = self.repo(dir).await?;
        let (plan, head, files) = {
            let mut repo = repo_lock.lock().await;
            let local = format!("{HEADS}{reference}");
            let tracking = format!("{REMOTES}{DEFAULT_REMOTE}/{reference}");
            let (head, tip) = if let Some(oid) = repo.refs.get(&local).copied() {
                (Head::Branch(reference.to_string()), oid)
            } else if let Some(oid) = repo.refs.get(&tracking).copied() {
                repo.refs.insert(local, oid);
                (Head::Branch(reference.to_string()), oid)
            } else {
                let oid = repo.resolve(reference)?;
                (Head::Detached(oid), oid)
            };
            let from = repo.head_files()?;
            let to = repo.objects.commit_files(Some(tip))?;
            let plan = WorktreePlan::between(&repo.objects, &from, &to)?;
            (plan, head, to)
        };
        plan.apply(self.fs.as_ref(), &normalize(dir), hooks).await?;
        let mut repo = repo_lock.lock().await;
        repo.head = head;
        repo.index = files;
        info!(dir, reference, "checked out");
        Ok(())
    }

    async fn list_branches(&self, dir: &str, remote: Option<&str>) -> EngineResult<Vec<String>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(match remote {
            Some(remote) => repo.short_refs(&format!("{REMOTES}{remote}/")),
            None => repo.short_refs(HEADS),
        })
    }

    async fn list_remotes(&self, dir: &str) -> EngineResult<Vec<RemoteInfo>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(repo
            .config
            .iter()
            .filter_map(|(key, values)| {
                let remote = key.strip_prefix("remote.")?.strip_suffix(".url")?;
                Some(RemoteInfo {
                    remote: remote.to_string(),
                    url: values.last()?.clone(),
                })
            })
            .collect())
    }

    async fn add_remote(&self, dir: &str, name: &str, url: &str) -> EngineResult<()> {
        validate_remote_name(name)?;
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        let url_key = format!("remote.{name}.url");
        if repo.config.contains_key(&url_key) {
            return Err(EngineError::AlreadyExists(format!("remote '{name}'")));
        }
        repo.config.insert(url_key, vec![url.to_string()]);
        repo.config.insert(
            format!("remote.{name}.fetch"),
            vec![format!("+{HEADS}*:{REMOTES}{name}/*")],
        );
        debug!(dir, name, url, "added remote");
        Ok(())
    }

    async fn delete_remote(&self, dir: &str, name: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        let section = format!("remote.{name}.");
        let before = repo.config.len();
        repo.config.retain(|key, _| !key.starts_with(&section));
        if repo.config.len() == before {
            return Err(EngineError::UnknownRemote(name.to_string()));
        }
        let tracking = format!("{REMOTES}{name}/");
        repo.refs.retain(|refname, _| !refname.starts_with(&tracking));
        debug!(dir, name, "deleted remote");
        Ok(())
    }

    async fn get_config(&self, dir: &str, path: &str) -> EngineResult<Option<String>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(repo.config_last(path))
    }

    async fn get_config_all(&self, dir: &str, path: &str) -> EngineResult<Vec<String>> {
        let repo = self.repo(dir).await?;
        let repo = repo.lock().await;
        Ok(repo.config.get(path).cloned().unwrap_or_default())
    }

    async fn set_config(&self, dir: &str, path: &str, value: &str) -> EngineResult<()> {
        let repo = self.repo(dir).await?;
        let mut repo = repo.lock().await;
        repo.config.insert(path.to_string(), vec![value.to_string()]);
        Ok(())
    }

    async fn clone_repository(
        &self,
        dir: &str,
        options: &CloneOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()> {
        let key = normalize(dir);
        if self.repos.read().await.contains_key(&key) {
            return Err(EngineError::AlreadyExists(format!("git repository at {key}")));
        }
        if !self.fs.stat(&key).await?.is_directory() {
            return Err(VcsError::NotADirectory(key).into());
        }
        debug!(dir = %key, url = %options.url, cors_proxy = ?options.cors_proxy, "cloning");
        self.hub.authorize(&options.url, hooks).await?;
        let download = self.hub.download(&options.url).await?;
        let branch = options
            .reference
            .clone()
            .unwrap_or_else(|| download.head_branch.clone());
        if options.reference.is_some() && !download.branches.contains_key(&branch) {
            return Err(EngineError::NotFound(format!(
                "remote branch '{branch}'"
            )));
        }

        self.init(&key, &branch).await?;
        self.add_remote(&key, DEFAULT_REMOTE, &options.url).await?;
        let repo_lock = self.repo(&key).await?;
        self.receive(&repo_lock, DEFAULT_REMOTE, &download, hooks)
            .await;

        let plan = {
            let mut repo = repo_lock.lock().await;
            match download.branches.get(&branch) {
                Some(tip) => {
                    repo.refs.insert(format!("{HEADS}{branch}"), *tip);
                    let files = repo.objects.commit_files(Some(*tip))?;
                    let plan = WorktreePlan::between(&repo.objects, &FileMap::new(), &files)?;
                    repo.index = files;
                    plan
                }
                None => WorktreePlan::default(),
            }
        };
        plan.apply(self.fs.as_ref(), &key, hooks).await?;
        info!(dir = %key, url = %options.url, %branch, "cloned");
        Ok(())
    }

    async fn fetch(
        &self,
        dir: &str,
        options: &FetchOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<FetchOutcome> {
        let repo = self.repo(dir).await?;
        let remote = options.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        let url = match &options.url {
            Some(url) => url.clone(),
            None => repo
                .lock()
                .await
                .remote_url(remote)
                .ok_or_else(|| EngineError::UnknownRemote(remote.to_string()))?,
        };
        self.fetch_from(&repo, remote, &url, options.cors_proxy.as_deref(), hooks)
            .await
    }

    async fn pull(
        &self,
        dir: &str,
        options: &PullOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()> {
        let repo_lock = self.repo(dir).await?;
        let remote = options.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        let (url, branch) = {
            let repo = repo_lock.lock().await;
            let url = repo
                .remote_url(remote)
                .ok_or_else(|| EngineError::UnknownRemote(remote.to_string()))?;
            let branch = match &options.reference {
                Some(branch) => branch.clone(),
                None => repo
                    .current_branch()
                    .map(str::to_string)
                    .ok_or_else(|| EngineError::NotFound("HEAD".into()))?,
            };
            (url, branch)
        };
        self.fetch_from(&repo_lock, remote, &url, options.cors_proxy.as_deref(), hooks)
            .await?;

        let plan = {
            let mut repo = repo_lock.lock().await;
            let theirs = repo
                .refs
                .get(&format!("{REMOTES}{remote}/{branch}"))
                .copied()
                .ok_or_else(|| EngineError::NotFound(format!("{remote}/{branch}")))?;
            let local = format!("{HEADS}{branch}");
            let ours = repo.refs.get(&local).copied();
            if let Some(ours) = ours {
                if repo.objects.is_ancestor(&theirs, &ours) {
                    hooks.on_message("Already up to date.");
                    return Ok(());
                }
                if !repo.objects.is_ancestor(&ours, &theirs) {
                    return Err(EngineError::NotFastForward(branch));
                }
            }
            repo.refs.insert(local, theirs);
            if repo.current_branch() != Some(branch.as_str()) {
                return Ok(());
            }
            let from = repo.objects.commit_files(ours)?;
            let to = repo.objects.commit_files(Some(theirs))?;
            let plan = WorktreePlan::between(&repo.objects, &from, &to)?;
            repo.index = to;
            plan
        };
        plan.apply(self.fs.as_ref(), &normalize(dir), hooks).await?;
        info!(dir, remote, %branch, "fast-forwarded");
        Ok(())
    }

    async fn push(
        &self,
        dir: &str,
        options: &PushOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<PushOutcome> {
        let repo_lock = self.repo(dir).await?;
        let remote = options.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        let (url, branch, tip, objects) = {
            let repo = repo_lock.lock().await;
            let url = repo
                .remote_url(remote)
                .ok_or_else(|| EngineError::UnknownRemote(remote.to_string()))?;
            let branch = match &options.reference {
                Some(branch) => branch.clone(),
                None => repo
                    .current_branch()
                    .map(str::to_string)
                    .ok_or_else(|| EngineError::NotFound("HEAD".into()))?,
            };
            let tip = repo
                .refs
                .get(&format!("{HEADS}{branch}"))
                .copied()
                .ok_or_else(|| EngineError::NotFound(format!("branch '{branch}'")))?;
            (url, branch, tip, repo.objects.clone())
        };
        debug!(dir, remote, %url, %branch, cors_proxy = ?options.cors_proxy, "pushing");
        self.hub.authorize(&url, hooks).await?;
        let (outcome, sent) = self.hub.upload(&url, &objects, &branch, tip).await?;
        hooks.on_progress(&Progress {
            phase: "Writing objects".into(),
            loaded: sent as u64,
            total: sent as u64,
        });
        if outcome.ok {
            repo_lock
                .lock()
                .await
                .refs
                .insert(format!("{REMOTES}{remote}/{branch}"), tip);
        }
        Ok(outcome)
    }
}
