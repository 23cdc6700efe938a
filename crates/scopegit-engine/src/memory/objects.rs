//! Object database: blobs, trees, and commits keyed by [`Oid`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::oid::{ObjectHasher, Oid};
use crate::types::{CommitInfo, Signature, TreeEntry, TreeEntryKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CommitData {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub message: String,
    pub author: Signature,
}

#[derive(Clone, Debug)]
pub(crate) enum Object {
    Blob(Bytes),
    Tree(Vec<TreeEntry>),
    Commit(CommitData),
}

/// Flat map of repository-relative file path to blob id.
pub(crate) type FileMap = BTreeMap<String, Oid>;

#[derive(Clone, Debug, Default)]
pub(crate) struct ObjectDb {
    objects: HashMap<Oid, Object>,
}

impl ObjectDb {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn put_blob(&mut self, data: Bytes) -> Oid {
        let oid = ObjectHasher::BLOB.hash(&data);
        self.objects.entry(oid).or_insert(Object::Blob(data));
        oid
    }

    pub fn put_tree(&mut self, mut entries: Vec<TreeEntry>) -> EngineResult<Oid> {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let encoded = serde_json::to_vec(&entries).map_err(|e| EngineError::CorruptObject {
            oid: "<new tree>".into(),
            reason: e.to_string(),
        })?;
        let oid = ObjectHasher::TREE.hash(&encoded);
        self.objects.entry(oid).or_insert(Object::Tree(entries));
        Ok(oid)
    }

    pub fn put_commit(&mut self, data: CommitData) -> EngineResult<Oid> {
        let encoded = serde_json::to_vec(&data).map_err(|e| EngineError::CorruptObject {
            oid: "<new commit>".into(),
            reason: e.to_string(),
        })?;
        let oid = ObjectHasher::COMMIT.hash(&encoded);
        self.objects.entry(oid).or_insert(Object::Commit(data));
        Ok(oid)
    }

    fn get(&self, oid: &Oid) -> EngineResult<&Object> {
        self.objects
            .get(oid)
            .ok_or_else(|| EngineError::NotFound(format!("object {oid}")))
    }

    fn wrong_kind(oid: &Oid, expected: &str) -> EngineError {
        EngineError::CorruptObject {
            oid: oid.to_hex(),
            reason: format!("expected a {expected}"),
        }
    }

    pub fn blob(&self, oid: &Oid) -> EngineResult<Bytes> {
        match self.get(oid)? {
            Object::Blob(data) => Ok(data.clone()),
            _ => Err(Self::wrong_kind(oid, "blob")),
        }
    }

    pub fn tree(&self, oid: &Oid) -> EngineResult<&[TreeEntry]> {
        match self.get(oid)? {
            Object::Tree(entries) => Ok(entries),
            _ => Err(Self::wrong_kind(oid, "tree")),
        }
    }

    pub fn commit(&self, oid: &Oid) -> EngineResult<CommitInfo> {
        match self.get(oid)? {
            Object::Commit(data) => Ok(CommitInfo {
                oid: *oid,
                tree: data.tree,
                parents: data.parents.clone(),
                message: data.message.clone(),
                author: data.author.clone(),
            }),
            _ => Err(Self::wrong_kind(oid, "commit")),
        }
    }

    /// Store nested trees for a flat file map and return the root tree id.
    pub fn write_tree(&mut self, files: &FileMap) -> EngineResult<Oid> {
        let mut entries = Vec::new();
        let mut dirs: BTreeMap<&str, FileMap> = BTreeMap::new();
        for (path, oid) in files {
            match path.split_once('/') {
                Some((dir, rest)) => {
                    dirs.entry(dir).or_default().insert(rest.to_string(), *oid);
                }
                None => entries.push(TreeEntry {
                    path: path.clone(),
                    oid: *oid,
                    kind: TreeEntryKind::Blob,
                }),
            }
        }
        for (name, children) in dirs {
            let oid = self.write_tree(&children)?;
            entries.push(TreeEntry {
                path: name.to_string(),
                oid,
                kind: TreeEntryKind::Tree,
            });
        }
        self.put_tree(entries)
    }

    /// Flatten a tree into path -> blob id. Submodule entries are skipped.
    pub fn flatten(&self, tree: &Oid) -> EngineResult<FileMap> {
        let mut files = FileMap::new();
        let mut pending = vec![(String::new(), *tree)];
        while let Some((prefix, oid)) = pending.pop() {
            for entry in self.tree(&oid)? {
                let path = if prefix.is_empty() {
                    entry.path.clone()
                } else {
                    format!("{prefix}/{}", entry.path)
                };
                match entry.kind {
                    TreeEntryKind::Blob => {
                        files.insert(path, entry.oid);
                    }
                    TreeEntryKind::Tree => pending.push((path, entry.oid)),
                    TreeEntryKind::Commit => {}
                }
            }
        }
        Ok(files)
    }

    /// Files of a commit's tree; empty for `None` (unborn branch).
    pub fn commit_files(&self, commit: Option<Oid>) -> EngineResult<FileMap> {
        match commit {
            None => Ok(FileMap::new()),
            Some(oid) => {
                let info = self.commit(&oid)?;
                self.flatten(&info.tree)
            }
        }
    }

    /// Whether `ancestor` is reachable from `descendant` (inclusive).
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([*descendant]);
        while let Some(oid) = queue.pop_front() {
            if oid == *ancestor {
                return true;
            }
            if !seen.insert(oid) {
                continue;
            }
            if let Some(Object::Commit(data)) = self.objects.get(&oid) {
                queue.extend(data.parents.iter().copied());
            }
        }
        false
    }

    /// Copy every object of `other` missing here. Returns how many were new.
    pub fn merge_from(&mut self, other: &ObjectDb) -> usize {
        let mut copied = 0;
        for (oid, object) in &other.objects {
            if !self.objects.contains_key(oid) {
                self.objects.insert(*oid, object.clone());
                copied += 1;
            }
        }
        copied
    }
}
