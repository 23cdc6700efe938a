use async_trait::async_trait;
use bytes::Bytes;

use crate::error::EngineResult;
use crate::hooks::TransferHooks;
use crate::oid::Oid;
use crate::types::{
    CloneOptions, CommitInfo, FetchOptions, FetchOutcome, PullOptions, PushOptions, PushOutcome,
    RemoteInfo, Signature, StatusRow, TreeEntry,
};

/// The Git engine as the sidebar consumes it.
///
/// `dir` is always the canonical path of the repository root. File paths
/// (`filepath`) are relative to it and `/`-separated.
#[async_trait]
pub trait GitEngine: Send + Sync {
    /// Create an empty repository in the existing directory `dir`.
    async fn init(&self, dir: &str, default_branch: &str) -> EngineResult<()>;

    /// Status rows for every path known to HEAD, the index, or the working
    /// copy, sorted by path. `filepaths` restricts the rows to those paths
    /// and anything beneath them.
    async fn status_matrix(
        &self,
        dir: &str,
        filepaths: Option<&[String]>,
    ) -> EngineResult<Vec<StatusRow>>;

    /// Short name of the checked-out branch; `None` when HEAD is detached.
    async fn current_branch(&self, dir: &str) -> EngineResult<Option<String>>;

    /// Resolve `HEAD`, a full ref, or a short branch name to a commit id.
    async fn resolve_ref(&self, dir: &str, reference: &str) -> EngineResult<Oid>;

    async fn read_commit(&self, dir: &str, oid: &Oid) -> EngineResult<CommitInfo>;

    async fn read_tree(&self, dir: &str, oid: &Oid) -> EngineResult<Vec<TreeEntry>>;

    async fn read_blob(&self, dir: &str, oid: &Oid) -> EngineResult<Bytes>;

    /// Stage the working-copy content of `filepath`.
    async fn add(&self, dir: &str, filepath: &str) -> EngineResult<()>;

    /// Drop `filepath` from the index.
    async fn remove(&self, dir: &str, filepath: &str) -> EngineResult<()>;

    /// Reset the index entry of `filepath` to HEAD.
    async fn reset_index(&self, dir: &str, filepath: &str) -> EngineResult<()>;

    /// Record the index as a new commit on the current branch.
    async fn commit(&self, dir: &str, message: &str, author: Option<Signature>)
        -> EngineResult<Oid>;

    /// Create a branch at HEAD, optionally checking it out.
    async fn branch(&self, dir: &str, name: &str, checkout: bool) -> EngineResult<()>;

    async fn delete_branch(&self, dir: &str, name: &str) -> EngineResult<()>;

    /// Switch to `reference` and rewrite the working copy to match it.
    async fn checkout(
        &self,
        dir: &str,
        reference: &str,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()>;

    /// Local branches, or the tracking branches of `remote`.
    async fn list_branches(&self, dir: &str, remote: Option<&str>) -> EngineResult<Vec<String>>;

    async fn list_remotes(&self, dir: &str) -> EngineResult<Vec<RemoteInfo>>;

    async fn add_remote(&self, dir: &str, name: &str, url: &str) -> EngineResult<()>;

    async fn delete_remote(&self, dir: &str, name: &str) -> EngineResult<()>;

    /// Last value of a config key.
    async fn get_config(&self, dir: &str, path: &str) -> EngineResult<Option<String>>;

    /// Every value of a multi-valued config key.
    async fn get_config_all(&self, dir: &str, path: &str) -> EngineResult<Vec<String>>;

    /// Replace all values of a config key with `value`.
    async fn set_config(&self, dir: &str, path: &str, value: &str) -> EngineResult<()>;

    /// Clone into the existing, empty directory `dir`.
    async fn clone_repository(
        &self,
        dir: &str,
        options: &CloneOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()>;

    async fn fetch(
        &self,
        dir: &str,
        options: &FetchOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<FetchOutcome>;

    /// Fetch, then fast-forward the branch and the working copy.
    async fn pull(
        &self,
        dir: &str,
        options: &PullOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()>;

    async fn push(
        &self,
        dir: &str,
        options: &PushOptions,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<PushOutcome>;
}
