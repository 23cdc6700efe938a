use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use scopegit_path::{basename, dirname, PathTranslator};
use scopegit_types::{EntryKind, StorageEntry, StorageLocator};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::traits::{ChildEntry, StorageBackend};

#[derive(Clone, Debug)]
enum Node {
    File { data: Bytes, modified_ms: u64 },
    Directory { modified_ms: u64 },
}

impl Node {
    fn modified_ms(&self) -> u64 {
        match self {
            Node::File { modified_ms, .. } | Node::Directory { modified_ms } => *modified_ms,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory storage backend.
///
/// Nodes are keyed by canonical path, so scoped and unscoped locators for the
/// same node address the same data. Locators are decoded with the
/// [`PathTranslator`] the backend was built with. The root `/` always exists.
pub struct InMemoryStorage {
    translator: Arc<PathTranslator>,
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl InMemoryStorage {
    pub fn new(translator: Arc<PathTranslator>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory { modified_ms: now_ms() });
        Self {
            translator,
            nodes: RwLock::new(nodes),
        }
    }

    /// Create a directory at canonical `path`, along with any missing parents.
    pub async fn seed_directory(&self, path: &str) {
        let mut nodes = self.nodes.write().await;
        Self::insert_parents(&mut nodes, path);
        nodes
            .entry(path.to_string())
            .or_insert(Node::Directory { modified_ms: now_ms() });
    }

    /// Create or replace a file at canonical `path`, along with any missing parents.
    pub async fn seed_file(&self, path: &str, data: impl Into<Bytes>) {
        let mut nodes = self.nodes.write().await;
        Self::insert_parents(&mut nodes, path);
        nodes.insert(
            path.to_string(),
            Node::File {
                data: data.into(),
                modified_ms: now_ms(),
            },
        );
    }

    /// All canonical paths currently stored, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.nodes.read().await.keys().cloned().collect()
    }

    fn insert_parents(nodes: &mut BTreeMap<String, Node>, path: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            current.push('/');
            current.push_str(segment);
            nodes
                .entry(current.clone())
                .or_insert(Node::Directory { modified_ms: now_ms() });
        }
    }

    fn resolve(&self, locator: &StorageLocator) -> StorageResult<String> {
        self.translator
            .uri_to_path(locator.as_str())
            .map_err(|_| StorageError::InvalidLocator(locator.to_string()))
    }

    fn child_path(parent: &str, name: &str) -> StorageResult<String> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(StorageError::InvalidLocator(format!("{parent}/{name}")));
        }
        Ok(if parent == "/" {
            format!("/{name}")
        } else {
            format!("{parent}/{name}")
        })
    }

    fn is_descendant(candidate: &str, ancestor: &str) -> bool {
        if ancestor == "/" {
            return candidate != "/";
        }
        candidate
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    fn require_directory(
        nodes: &BTreeMap<String, Node>,
        path: &str,
        locator: &StorageLocator,
    ) -> StorageResult<()> {
        match nodes.get(path) {
            Some(Node::Directory { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(StorageError::NotADirectory(locator.to_string())),
            None => Err(StorageError::NotFound(locator.to_string())),
        }
    }

    async fn create_node(
        &self,
        parent: &StorageLocator,
        name: &str,
        node: Node,
    ) -> StorageResult<StorageLocator> {
        let parent_path = self.resolve(parent)?;
        let path = Self::child_path(&parent_path, name)?;
        let mut nodes = self.nodes.write().await;
        Self::require_directory(&nodes, &parent_path, parent)?;
        if nodes.contains_key(&path) {
            return Err(StorageError::AlreadyExists(path));
        }
        debug!(%path, "creating node");
        nodes.insert(path, node);
        Ok(parent.child(name))
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage").finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn exists(&self, locator: &StorageLocator) -> StorageResult<bool> {
        let path = self.resolve(locator)?;
        Ok(self.nodes.read().await.contains_key(&path))
    }

    async fn read_file(&self, locator: &StorageLocator) -> StorageResult<Bytes> {
        let path = self.resolve(locator)?;
        match self.nodes.read().await.get(&path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(StorageError::IsADirectory(locator.to_string())),
            None => Err(StorageError::NotFound(locator.to_string())),
        }
    }

    async fn write_file(&self, locator: &StorageLocator, data: Bytes) -> StorageResult<()> {
        let path = self.resolve(locator)?;
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(&path) {
            Some(Node::File {
                data: existing,
                modified_ms,
            }) => {
                *existing = data;
                *modified_ms = now_ms();
                Ok(())
            }
            Some(Node::Directory { .. }) => Err(StorageError::IsADirectory(locator.to_string())),
            None => Err(StorageError::NotFound(locator.to_string())),
        }
    }

    async fn delete(&self, locator: &StorageLocator) -> StorageResult<()> {
        let path = self.resolve(locator)?;
        if path == "/" {
            return Err(StorageError::PermissionDenied(locator.to_string()));
        }
        let mut nodes = self.nodes.write().await;
        if nodes.remove(&path).is_none() {
            return Err(StorageError::NotFound(locator.to_string()));
        }
        nodes.retain(|key, _| !Self::is_descendant(key, &path));
        debug!(%path, "deleted node");
        Ok(())
    }

    async fn list_children(&self, locator: &StorageLocator) -> StorageResult<Vec<ChildEntry>> {
        let path = self.resolve(locator)?;
        let nodes = self.nodes.read().await;
        Self::require_directory(&nodes, &path, locator)?;
        Ok(nodes
            .keys()
            .filter(|key| Self::is_descendant(key, &path))
            .filter_map(|key| {
                let rest = if path == "/" {
                    &key[1..]
                } else {
                    &key[path.len() + 1..]
                };
                (!rest.contains('/')).then(|| ChildEntry {
                    name: rest.to_string(),
                })
            })
            .collect())
    }

    async fn create_directory(
        &self,
        parent: &StorageLocator,
        name: &str,
    ) -> StorageResult<StorageLocator> {
        self.create_node(parent, name, Node::Directory { modified_ms: now_ms() })
            .await
    }

    async fn create_file(
        &self,
        parent: &StorageLocator,
        name: &str,
        initial: Bytes,
    ) -> StorageResult<StorageLocator> {
        self.create_node(
            parent,
            name,
            Node::File {
                data: initial,
                modified_ms: now_ms(),
            },
        )
        .await
    }

    async fn rename_to(
        &self,
        locator: &StorageLocator,
        new_name: &str,
    ) -> StorageResult<StorageLocator> {
        let path = self.resolve(locator)?;
        let parent = dirname(&path).map_err(|_| StorageError::InvalidLocator(path.clone()))?;
        // Top-level nodes are grant roots and cannot be renamed.
        if parent == "/" {
            return Err(StorageError::PermissionDenied(locator.to_string()));
        }
        let target = Self::child_path(&parent, new_name)?;
        let renamed = locator
            .sibling(new_name)
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        if target == path {
            return Ok(renamed);
        }

        let mut nodes = self.nodes.write().await;
        if !nodes.contains_key(&path) {
            return Err(StorageError::NotFound(locator.to_string()));
        }
        if nodes.contains_key(&target) {
            return Err(StorageError::AlreadyExists(target));
        }
        let moved: Vec<String> = nodes
            .keys()
            .filter(|key| **key == path || Self::is_descendant(key, &path))
            .cloned()
            .collect();
        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                let new_key = format!("{target}{}", &key[path.len()..]);
                nodes.insert(new_key, node);
            }
        }
        debug!(from = %path, to = %target, "renamed node");
        Ok(renamed)
    }

    async fn stat(&self, locator: &StorageLocator) -> StorageResult<StorageEntry> {
        let path = self.resolve(locator)?;
        let name = basename(&path).unwrap_or_default();
        let nodes = self.nodes.read().await;
        Ok(match nodes.get(&path) {
            None => StorageEntry::missing(name, locator.clone()),
            Some(node) => {
                let (kind, size) = match node {
                    Node::File { data, .. } => (EntryKind::File, data.len() as u64),
                    Node::Directory { .. } => (EntryKind::Directory, 0),
                };
                StorageEntry {
                    name,
                    locator: locator.clone(),
                    kind,
                    size,
                    last_modified_ms: node.modified_ms(),
                    exists: true,
                    readable: true,
                    writable: true,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegit_path::ActiveRootContext;

    fn storage() -> (InMemoryStorage, Arc<PathTranslator>) {
        let translator = Arc::new(PathTranslator::default());
        (InMemoryStorage::new(translator.clone()), translator)
    }

    fn loc(t: &PathTranslator, path: &str) -> StorageLocator {
        t.path_to_uri(path, &ActiveRootContext::new()).unwrap()
    }

    #[tokio::test]
    async fn create_write_read() {
        let (s, t) = storage();
        s.seed_directory("/Documents/repo").await;
        let file = s
            .create_file(&loc(&t, "/Documents/repo"), "a.txt", Bytes::new())
            .await
            .unwrap();
        s.write_file(&file, Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(s.read_file(&loc(&t, "/Documents/repo/a.txt")).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_to_missing_node_fails() {
        let (s, t) = storage();
        let err = s
            .write_file(&loc(&t, "/Documents/nope"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_directory_is_a_directory() {
        let (s, t) = storage();
        s.seed_directory("/Documents").await;
        let err = s.read_file(&loc(&t, "/Documents")).await.unwrap_err();
        assert!(matches!(err, StorageError::IsADirectory(_)));
    }

    #[tokio::test]
    async fn create_under_missing_parent_fails() {
        let (s, t) = storage();
        let err = s
            .create_directory(&loc(&t, "/Documents/missing"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_under_file_fails() {
        let (s, t) = storage();
        s.seed_file("/Documents/a.txt", "x").await;
        let err = s
            .create_file(&loc(&t, "/Documents/a.txt"), "b", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn list_children_reports_direct_children_only() {
        let (s, t) = storage();
        s.seed_file("/Documents/repo/a.txt", "a").await;
        s.seed_file("/Documents/repo/src/b.rs", "b").await;
        let names: Vec<String> = s
            .list_children(&loc(&t, "/Documents/repo"))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "src"]);
    }

    #[tokio::test]
    async fn delete_is_recursive() {
        let (s, t) = storage();
        s.seed_file("/Documents/repo/src/b.rs", "b").await;
        s.delete(&loc(&t, "/Documents/repo")).await.unwrap();
        assert_eq!(s.paths().await, vec!["/", "/Documents"]);
    }

    #[tokio::test]
    async fn rename_moves_descendants() {
        let (s, t) = storage();
        s.seed_file("/Documents/repo/src/b.rs", "b").await;
        let renamed = s
            .rename_to(&loc(&t, "/Documents/repo/src"), "lib")
            .await
            .unwrap();
        assert_eq!(t.uri_to_path(renamed.as_str()).unwrap(), "/Documents/repo/lib");
        assert_eq!(
            s.read_file(&loc(&t, "/Documents/repo/lib/b.rs")).await.unwrap(),
            "b"
        );
        assert!(!s.exists(&loc(&t, "/Documents/repo/src")).await.unwrap());
    }

    #[tokio::test]
    async fn grant_roots_cannot_be_renamed() {
        let (s, t) = storage();
        s.seed_directory("/Documents").await;
        let err = s.rename_to(&loc(&t, "/Documents"), "Docs").await.unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn stat_missing_node() {
        let (s, t) = storage();
        let entry = s.stat(&loc(&t, "/Documents/ghost")).await.unwrap();
        assert!(!entry.exists);
        assert_eq!(entry.name, "ghost");
    }

    #[tokio::test]
    async fn scoped_and_unscoped_home_locators_share_nodes() {
        let (s, t) = storage();
        s.seed_file("/$HOME/repo/a.txt", "x").await;
        let scoped = t
            .path_to_uri("/$HOME/repo/a.txt", &ActiveRootContext::with_root("/$HOME/repo"))
            .unwrap();
        let unscoped = loc(&t, "/$HOME/repo/a.txt");
        assert_ne!(scoped, unscoped);
        assert_eq!(s.read_file(&scoped).await.unwrap(), s.read_file(&unscoped).await.unwrap());
    }

    #[tokio::test]
    async fn foreign_locator_is_invalid() {
        let (s, _) = storage();
        let err = s
            .exists(&StorageLocator::from_raw("https://example.com/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidLocator(_)));
    }
}
