use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use scopegit_path::{basename, dirname, normalize, PathTranslator, SharedRootContext};
use scopegit_store::{StorageBackend, StorageError};
use scopegit_types::{StorageEntry, StorageLocator, VcsError, VcsResult};
use tracing::{debug, warn};

use crate::data::{FileData, RawBytes, WriteData};
use crate::options::{MkdirOptions, ReadOptions, WriteOptions};
use crate::stats::Stats;
use crate::traits::FsClient;

/// [`FsClient`] over a locator-keyed [`StorageBackend`].
///
/// Holds the translator and the shared root context so that every call
/// encodes its path under the root detected most recently.
#[derive(Clone)]
pub struct ScopedFs {
    backend: Arc<dyn StorageBackend>,
    translator: Arc<PathTranslator>,
    roots: SharedRootContext,
}

impl ScopedFs {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        translator: Arc<PathTranslator>,
        roots: SharedRootContext,
    ) -> Self {
        Self {
            backend,
            translator,
            roots,
        }
    }

    pub fn translator(&self) -> &Arc<PathTranslator> {
        &self.translator
    }

    pub fn roots(&self) -> &SharedRootContext {
        &self.roots
    }

    /// Normalize `path` and encode it under the current root context.
    pub fn locate(&self, path: &str) -> VcsResult<(String, StorageLocator)> {
        let path = normalize(path);
        let locator = self.translator.path_to_uri(&path, &self.roots.snapshot())?;
        Ok((path, locator))
    }

    async fn entry(&self, path: &str) -> VcsResult<(String, StorageEntry)> {
        let (path, locator) = self.locate(path)?;
        let entry = self.backend.stat(&locator).await?;
        Ok((path, entry))
    }

    async fn delete_if_present(&self, path: &str) -> VcsResult<()> {
        let (_, entry) = self.entry(path).await?;
        if entry.exists {
            self.backend.delete(&entry.locator).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ScopedFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedFs")
            .field("translator", &self.translator)
            .field("root", &self.roots.snapshot().root())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FsClient for ScopedFs {
    async fn read_file(&self, path: &str, options: ReadOptions) -> VcsResult<FileData> {
        let (path, entry) = self.entry(path).await?;
        if !entry.exists {
            return Err(VcsError::NotFound(path));
        }
        let data = match self.backend.read_file(&entry.locator).await {
            Ok(data) => data,
            Err(StorageError::IsADirectory(_)) => return Err(VcsError::NotFound(path)),
            Err(e) => return Err(e.into()),
        };
        Ok(match options.encoding {
            Some(_) => FileData::Text(String::from_utf8_lossy(&data).into_owned()),
            None => FileData::Bytes(RawBytes::new(data)),
        })
    }

    async fn write_file(
        &self,
        path: &str,
        data: WriteData,
        _options: WriteOptions,
    ) -> VcsResult<()> {
        let (path, locator) = self.locate(path)?;
        if !self.backend.exists(&locator).await? {
            self.create_file(&path).await?;
        }
        self.backend.write_file(&locator, data.into_bytes()).await?;
        debug!(%path, "wrote file");
        Ok(())
    }

    async fn unlink(&self, path: &str) -> VcsResult<()> {
        if let Err(e) = self.delete_if_present(path).await {
            warn!(%path, error = %e, "unlink failed; ignoring");
        }
        Ok(())
    }

    async fn readdir(&self, path: &str) -> VcsResult<Vec<String>> {
        let (path, entry) = self.entry(path).await?;
        if !entry.exists {
            return Err(VcsError::NotFound(path));
        }
        if !entry.is_directory() {
            return Err(VcsError::NotADirectory(path));
        }
        let children = self.backend.list_children(&entry.locator).await?;
        Ok(children.into_iter().map(|c| c.name).collect())
    }

    async fn mkdir(&self, path: &str, _options: MkdirOptions) -> VcsResult<StorageLocator> {
        let (path, entry) = self.entry(path).await?;
        if entry.exists {
            return Err(VcsError::AlreadyExists(path));
        }
        let parent = dirname(&path)?;
        let name = basename(&path)?;
        let (_, parent_locator) = self.locate(&parent)?;
        match self.backend.create_directory(&parent_locator, &name).await {
            Ok(locator) => {
                debug!(%path, "created directory");
                Ok(locator)
            }
            Err(StorageError::NotFound(_)) => Err(VcsError::NotFound(parent)),
            Err(e) => Err(e.into()),
        }
    }

    async fn rmdir(&self, path: &str) -> VcsResult<()> {
        self.unlink(path).await
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> VcsResult<()> {
        let name = basename(&normalize(new_path))?;
        let (old_path, entry) = self.entry(old_path).await?;
        if !entry.exists {
            return Err(VcsError::NotFound(old_path));
        }
        self.backend.rename_to(&entry.locator, &name).await?;
        debug!(from = %old_path, %name, "renamed");
        Ok(())
    }

    async fn stat(&self, path: &str) -> VcsResult<Stats> {
        let (path, entry) = self.entry(path).await?;
        if !entry.exists {
            return Err(VcsError::NotFound(path));
        }
        Ok(Stats::from(&entry))
    }

    async fn lstat(&self, path: &str) -> VcsResult<Stats> {
        self.stat(path).await
    }

    async fn symlink(&self, _target: &str, _path: &str) -> VcsResult<()> {
        Err(VcsError::UnsupportedOperation("symlink".into()))
    }

    async fn readlink(&self, _path: &str) -> VcsResult<String> {
        Err(VcsError::UnsupportedOperation("readlink".into()))
    }

    async fn create_file(&self, path: &str) -> VcsResult<StorageLocator> {
        let path = normalize(path);
        let parent = dirname(&path)?;
        let name = basename(&path)?;
        let (_, parent_locator) = self.locate(&parent)?;
        let locator = self
            .backend
            .create_file(&parent_locator, &name, Bytes::new())
            .await?;
        Ok(locator)
    }

    async fn exists(&self, path: &str) -> VcsResult<bool> {
        let (_, locator) = self.locate(path)?;
        Ok(self.backend.exists(&locator).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegit_store::{ChildEntry, InMemoryStorage, StorageResult};

    async fn fs() -> (ScopedFs, Arc<InMemoryStorage>) {
        let translator = Arc::new(PathTranslator::default());
        let storage = Arc::new(InMemoryStorage::new(translator.clone()));
        storage.seed_directory("/Documents/repo").await;
        storage.seed_directory("/$HOME/proj").await;
        let fs = ScopedFs::new(storage.clone(), translator, SharedRootContext::new());
        (fs, storage)
    }

    // -----------------------------------------------------------------------
    // read / write
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn write_creates_then_read_returns_content() {
        let (fs, _) = fs().await;
        fs.write_file("/Documents/repo/new.txt", "hello".into(), WriteOptions::default())
            .await
            .unwrap();
        let data = fs
            .read_file("/Documents/repo/new.txt", ReadOptions::utf8())
            .await
            .unwrap();
        assert_eq!(data, FileData::Text("hello".into()));
    }

    #[tokio::test]
    async fn names_with_reserved_characters_round_trip() {
        let (fs, storage) = fs().await;
        for name in ["50%off.txt", "a%41.txt", "notes #1.md"] {
            let path = format!("/Documents/repo/{name}");
            fs.write_file(&path, name.into(), WriteOptions::default())
                .await
                .unwrap();
            let data = fs.read_file(&path, ReadOptions::utf8()).await.unwrap();
            assert_eq!(data, FileData::Text(name.into()));
        }
        assert_eq!(
            fs.readdir("/Documents/repo").await.unwrap(),
            vec!["50%off.txt", "a%41.txt", "notes #1.md"]
        );
        assert_eq!(
            storage.paths().await,
            vec![
                "/",
                "/$HOME",
                "/$HOME/proj",
                "/Documents",
                "/Documents/repo",
                "/Documents/repo/50%off.txt",
                "/Documents/repo/a%41.txt",
                "/Documents/repo/notes #1.md",
            ]
        );
    }

    #[tokio::test]
    async fn write_overwrites_existing_file() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "old").await;
        fs.write_file("/Documents/repo/a.txt", b"new".to_vec().into(), WriteOptions::default())
            .await
            .unwrap();
        let data = fs
            .read_file("/Documents/repo/a.txt", ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(data.as_bytes(), b"new");
    }

    #[tokio::test]
    async fn read_without_encoding_returns_bytes_with_text_view() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "text").await;
        match fs
            .read_file("/Documents/repo/a.txt", ReadOptions::default())
            .await
            .unwrap()
        {
            FileData::Bytes(raw) => assert_eq!(raw.text(), "text"),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_missing_or_directory_is_not_found() {
        let (fs, _) = fs().await;
        let err = fs
            .read_file("/Documents/repo/nope", ReadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = fs
            .read_file("/Documents/repo", ReadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn paths_are_normalized() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "x").await;
        let data = fs
            .read_file("/Documents//repo/./src/../a.txt", ReadOptions::utf8())
            .await
            .unwrap();
        assert_eq!(data.text(), "x");
    }

    #[tokio::test]
    async fn home_paths_follow_active_root() {
        let (fs, storage) = fs().await;
        fs.roots().set_root("/$HOME/proj");
        fs.write_file("/$HOME/proj/a.txt", "scoped".into(), WriteOptions::default())
            .await
            .unwrap();
        assert!(storage.paths().await.contains(&"/$HOME/proj/a.txt".to_string()));
        let (_, locator) = fs.locate("/$HOME/proj/a.txt").unwrap();
        assert!(locator.as_str().contains("%2Fproj::"));
    }

    // -----------------------------------------------------------------------
    // directories
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn mkdir_existing_fails() {
        let (fs, _) = fs().await;
        let err = fs
            .mkdir("/Documents/repo", MkdirOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn mkdir_missing_parent_fails() {
        let (fs, _) = fs().await;
        let err = fs
            .mkdir("/Documents/repo/a/b", MkdirOptions { recursive: true, mode: None })
            .await
            .unwrap_err();
        assert_eq!(err, VcsError::NotFound("/Documents/repo/a".into()));
    }

    #[tokio::test]
    async fn mkdir_then_readdir() {
        let (fs, _) = fs().await;
        fs.mkdir("/Documents/repo/.git", MkdirOptions::default())
            .await
            .unwrap();
        fs.write_file("/Documents/repo/a.txt", "a".into(), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(
            fs.readdir("/Documents/repo").await.unwrap(),
            vec![".git", "a.txt"]
        );
    }

    #[tokio::test]
    async fn readdir_on_file_is_not_a_directory() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "x").await;
        let err = fs.readdir("/Documents/repo/a.txt").await.unwrap_err();
        assert!(matches!(err, VcsError::NotADirectory(_)));
        let err = fs.readdir("/Documents/missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // unlink / rename / stat
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unlink_is_silent_for_missing_and_unencodable_paths() {
        let (fs, _) = fs().await;
        fs.unlink("/Documents/repo/missing").await.unwrap();
        fs.unlink("relative/path").await.unwrap();
        fs.rmdir("/Documents/repo/missing").await.unwrap();
    }

    /// Delegates to the in-memory store but refuses every delete.
    struct UndeletableStorage(Arc<InMemoryStorage>);

    #[async_trait]
    impl StorageBackend for UndeletableStorage {
        async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
            self.0.exists(locator).await
        }
        async fn read_file(&self, locator: &StorageLocator) -> StorageResult<Bytes> {
            self.0.read_file(locator).await
        }
        async fn write_file(&self, locator: &StorageLocator, data: Bytes) -> StorageResult<()> {
            self.0.write_file(locator, data).await
        }
        async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
            Err(StorageError::PermissionDenied(locator.to_string()))
        }
        async fn list_children(&self, locator: &StorageLocator) -> StorageResult<Vec<ChildEntry>> {
            self.0.list_children(locator).await
        }
        async fn create_directory(
            &self,
            parent: &StorageLocator,
            name: &str,
        ) -> StorageResult<StorageLocator> {
            self.0.create_directory(parent, name).await
        }
        async fn create_file(
            &self,
            parent: &StorageLocator,
            name: &str,
            initial: Bytes,
        ) -> StorageResult<StorageLocator> {
            self.0.create_file(parent, name, initial).await
        }
        async fn rename_to(
            &self,
            locator: &StorageLocator,
            new_name: &str,
        ) -> StorageResult<StorageLocator> {
            self.0.rename_to(locator, new_name).await
        }
        async fn stat(&self, locator: &StorageLocator) -> StorageResult<StorageEntry> {
            self.0.stat(locator).await
        }
    }

    #[tokio::test]
    async fn unlink_swallows_backend_delete_errors() {
        let (_, storage) = fs().await;
        storage.seed_file("/Documents/repo/locked.txt", "x").await;
        let translator = Arc::new(PathTranslator::default());
        let fs = ScopedFs::new(
            Arc::new(UndeletableStorage(storage)),
            translator,
            SharedRootContext::new(),
        );

        fs.unlink("/Documents/repo/locked.txt").await.unwrap();
        assert!(fs.exists("/Documents/repo/locked.txt").await.unwrap());

        fs.rmdir("/Documents/repo").await.unwrap();
        assert!(fs.exists("/Documents/repo/locked.txt").await.unwrap());
    }

    #[tokio::test]
    async fn rmdir_removes_tree() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/src/a.rs", "x").await;
        fs.rmdir("/Documents/repo/src").await.unwrap();
        assert!(!fs.exists("/Documents/repo/src/a.rs").await.unwrap());
    }

    #[tokio::test]
    async fn rename_uses_destination_basename() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "x").await;
        fs.rename("/Documents/repo/a.txt", "/Documents/repo/b.txt")
            .await
            .unwrap();
        assert!(fs.exists("/Documents/repo/b.txt").await.unwrap());
        assert!(!fs.exists("/Documents/repo/a.txt").await.unwrap());

        let err = fs
            .rename("/Documents/repo/ghost", "/Documents/repo/c")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn stat_maps_entry_and_lstat_matches() {
        let (fs, storage) = fs().await;
        storage.seed_file("/Documents/repo/a.txt", "12345").await;
        let stat = fs.stat("/Documents/repo/a.txt").await.unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.size, 5);
        assert_eq!(stat, fs.lstat("/Documents/repo/a.txt").await.unwrap());
        assert!(fs.stat("/Documents/repo").await.unwrap().is_directory());
        assert!(fs.stat("/Documents/none").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn links_are_unsupported() {
        let (fs, _) = fs().await;
        assert!(matches!(
            fs.symlink("/a", "/b").await,
            Err(VcsError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            fs.readlink("/a").await,
            Err(VcsError::UnsupportedOperation(_))
        ));
    }

    #[tokio::test]
    async fn create_file_is_empty() {
        let (fs, _) = fs().await;
        fs.create_file("/Documents/repo/empty").await.unwrap();
        let stat = fs.stat("/Documents/repo/empty").await.unwrap();
        assert_eq!(stat.size, 0);
    }
}
