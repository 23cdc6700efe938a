use async_trait::async_trait;
use scopegit_types::{StorageLocator, VcsResult};

use crate::data::{FileData, WriteData};
use crate::options::{MkdirOptions, ReadOptions, WriteOptions};
use crate::stats::Stats;

/// The awaitable POSIX-like filesystem contract.
///
/// Paths are canonical paths; implementations normalize them before use.
#[async_trait]
pub trait FsClient: Send + Sync {
    /// Read a file. Text when `options.encoding` is set, bytes otherwise.
    async fn read_file(&self, path: &str, options: ReadOptions) -> VcsResult<FileData>;

    /// Write a file, creating it first if nothing exists at `path`.
    async fn write_file(
        &self,
        path: &str,
        data: WriteData,
        options: WriteOptions,
    ) -> VcsResult<()>;

    /// Delete the node at `path` if it exists. Never fails.
    async fn unlink(&self, path: &str) -> VcsResult<()>;

    /// Names of the direct children of the directory at `path`.
    async fn readdir(&self, path: &str) -> VcsResult<Vec<String>>;

    /// Create one directory. The parent must exist.
    async fn mkdir(&self, path: &str, options: MkdirOptions) -> VcsResult<StorageLocator>;

    /// Same as [`unlink`](Self::unlink).
    async fn rmdir(&self, path: &str) -> VcsResult<()>;

    /// Rename in place to the basename of `new_path`.
    async fn rename(&self, old_path: &str, new_path: &str) -> VcsResult<()>;

    async fn stat(&self, path: &str) -> VcsResult<Stats>;

    /// Identical to [`stat`](Self::stat).
    async fn lstat(&self, path: &str) -> VcsResult<Stats>;

    async fn symlink(&self, target: &str, path: &str) -> VcsResult<()>;

    async fn readlink(&self, path: &str) -> VcsResult<String>;

    /// Create an empty file named by the basename of `path` in its parent.
    async fn create_file(&self, path: &str) -> VcsResult<StorageLocator>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &str) -> VcsResult<bool>;
}
