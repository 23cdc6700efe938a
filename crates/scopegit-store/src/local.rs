use std::io::ErrorKind as IoKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use bytes::Bytes;
use scopegit_path::{basename, dirname, PathTranslator};
use scopegit_types::{EntryKind, StorageEntry, StorageLocator};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::traits::{ChildEntry, StorageBackend};

/// Storage backend over a directory on the local disk.
///
/// Locators are decoded to canonical paths, which are then laid out under
/// `base` (`/Documents/a` becomes `<base>/Documents/a`). Useful for running
/// the sidebar against a real checkout outside the device sandbox.
#[derive(Debug)]
pub struct LocalStorage {
    base: PathBuf,
    translator: Arc<PathTranslator>,
}

impl LocalStorage {
    pub fn new(base: impl Into<PathBuf>, translator: Arc<PathTranslator>) -> Self {
        Self {
            base: base.into(),
            translator,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn canonical(&self, locator: &StorageLocator) -> StorageResult<String> {
        let path = self
            .translator
            .uri_to_path(locator.as_str())
            .map_err(|_| StorageError::InvalidLocator(locator.to_string()))?;
        if path.split('/').any(|seg| seg == "..") {
            return Err(StorageError::PermissionDenied(locator.to_string()));
        }
        Ok(path)
    }

    fn disk_path(&self, canonical: &str) -> PathBuf {
        self.base.join(canonical.trim_start_matches('/'))
    }

    fn resolve(&self, locator: &StorageLocator) -> StorageResult<PathBuf> {
        Ok(self.disk_path(&self.canonical(locator)?))
    }

    fn map_io(err: std::io::Error, locator: &StorageLocator) -> StorageError {
        match err.kind() {
            IoKind::NotFound => StorageError::NotFound(locator.to_string()),
            IoKind::AlreadyExists => StorageError::AlreadyExists(locator.to_string()),
            IoKind::PermissionDenied => StorageError::PermissionDenied(locator.to_string()),
            _ => StorageError::Io(err),
        }
    }

    async fn parent_dir(&self, parent: &StorageLocator, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(StorageError::InvalidLocator(format!("{parent}/{name}")));
        }
        let dir = self.resolve(parent)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StorageError::NotADirectory(parent.to_string())),
            Err(e) => Err(Self::map_io(e, parent)),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
        let path = self.resolve(locator)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn read_file(&self, locator: &StorageLocator) -> StorageResult<Bytes> {
        let path = self.resolve(locator)?;
        if path.is_dir() {
            return Err(StorageError::IsADirectory(locator.to_string()));
        }
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::map_io(e, locator))?;
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, locator: &StorageLocator, data: Bytes) -> StorageResult<()> {
        let path = self.resolve(locator)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Err(StorageError::IsADirectory(locator.to_string())),
            Ok(_) => tokio::fs::write(&path, &data)
                .await
                .map_err(|e| Self::map_io(e, locator)),
            Err(e) => Err(Self::map_io(e, locator)),
        }
    }

    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
        let path = self.resolve(locator)?;
        if path == self.base {
            return Err(StorageError::PermissionDenied(locator.to_string()));
        }
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Self::map_io(e, locator))?;
        let result = if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        debug!(path = %path.display(), "deleted node");
        result.map_err(|e| Self::map_io(e, locator))
    }

    async fn list_children(&self, locator: &StorageLocator) -> StorageResult<Vec<ChildEntry>> {
        let path = self.resolve(locator)?;
        if path.is_file() {
            return Err(StorageError::NotADirectory(locator.to_string()));
        }
        let mut dir = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| Self::map_io(e, locator))?;
        let mut children = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            children.push(ChildEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn create_directory(
        &self,
        parent: &StorageLocator,
        name: &str,
    ) -> StorageResult<StorageLocator> {
        let dir = self.parent_dir(parent, name).await?;
        let child = parent.child(name);
        tokio::fs::create_dir(dir.join(name))
            .await
            .map_err(|e| Self::map_io(e, &child))?;
        Ok(child)
    }

    async fn create_file(
        &self,
        parent: &StorageLocator,
        name: &str,
        initial: Bytes,
    ) -> StorageResult<StorageLocator> {
        let dir = self.parent_dir(parent, name).await?;
        let child = parent.child(name);
        let target = dir.join(name);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(child.to_string()));
        }
        tokio::fs::write(&target, &initial)
            .await
            .map_err(|e| Self::map_io(e, &child))?;
        Ok(child)
    }

    async fn rename_to(
        &self,
        locator: &StorageLocator,
        new_name: &str,
    ) -> StorageResult<StorageLocator> {
        let canonical = self.canonical(locator)?;
        let parent = dirname(&canonical).map_err(|_| StorageError::InvalidLocator(canonical.clone()))?;
        // Top-level nodes are grant roots and cannot be renamed.
        if parent == "/" {
            return Err(StorageError::PermissionDenied(locator.to_string()));
        }
        if new_name.is_empty() || new_name.contains('/') {
            return Err(StorageError::InvalidLocator(format!("{parent}/{new_name}")));
        }
        let renamed = locator
            .sibling(new_name)
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        let from = self.disk_path(&canonical);
        let to = self.disk_path(&parent).join(new_name);
        if from == to {
            return Ok(renamed);
        }
        if tokio::fs::try_exists(&to).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(renamed.to_string()));
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| Self::map_io(e, locator))?;
        Ok(renamed)
    }

    async fn stat(&self, locator: &StorageLocator) -> StorageResult<StorageEntry> {
        let canonical = self.canonical(locator)?;
        let name = basename(&canonical).unwrap_or_default();
        let meta = match tokio::fs::metadata(self.disk_path(&canonical)).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == IoKind::NotFound => {
                return Ok(StorageEntry::missing(name, locator.clone()))
            }
            Err(e) => return Err(Self::map_io(e, locator)),
        };
        let last_modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let readonly = meta.permissions().readonly();
        Ok(StorageEntry {
            name,
            locator: locator.clone(),
            kind: if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: if meta.is_dir() { 0 } else { meta.len() },
            last_modified_ms,
            exists: true,
            readable: true,
            writable: !readonly,
        })
    }
}
