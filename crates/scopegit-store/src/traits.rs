use async_trait::async_trait;
use bytes::Bytes;
use scopegit_types::{StorageEntry, StorageLocator};

use crate::error::StorageResult;

/// A direct child reported by [`StorageBackend::list_children`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
}

/// Primitive operations of the permission-scoped storage backend.
///
/// Every call is keyed by a locator produced by the path translator or
/// returned from an earlier call. Implementations must not create missing
/// parents implicitly.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether a node exists at `locator`.
    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool>;

    /// Full contents of the file at `locator`.
    async fn read_file(&self, locator: &StorageLocator) -> StorageResult<Bytes>;

    /// Replace the contents of the existing file at `locator`.
    async fn write_file(&self, locator: &StorageLocator, data: Bytes) -> StorageResult<()>;

    /// Remove the node at `locator`, recursively for directories.
    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()>;

    /// Direct children of the directory at `locator`.
    async fn list_children(&self, locator: &StorageLocator) -> StorageResult<Vec<ChildEntry>>;

    /// Create a directory named `name` under `parent`.
    async fn create_directory(
        &self,
        parent: &StorageLocator,
        name: &str,
    ) -> StorageResult<StorageLocator>;

    /// Create a file named `name` under `parent` holding `initial`.
    async fn create_file(
        &self,
        parent: &StorageLocator,
        name: &str,
        initial: Bytes,
    ) -> StorageResult<StorageLocator>;

    /// Rename the node in place, keeping its parent.
    async fn rename_to(
        &self,
        locator: &StorageLocator,
        new_name: &str,
    ) -> StorageResult<StorageLocator>;

    /// Describe the node. Missing nodes yield `exists == false`.
    async fn stat(&self, locator: &StorageLocator) -> StorageResult<StorageEntry>;
}
