//! Stat records yielded by the storage backend.

use serde::{Deserialize, Serialize};

use crate::locator::StorageLocator;

/// Node kind as reported by the storage backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// The minimal stat shape the storage backend provides.
///
/// A stat of a missing node still yields an entry, with `exists == false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Node name (last path segment).
    pub name: String,
    /// Locator the backend resolved this entry at.
    pub locator: StorageLocator,
    pub kind: EntryKind,
    /// Content length in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub last_modified_ms: u64,
    pub exists: bool,
    pub readable: bool,
    pub writable: bool,
}

impl StorageEntry {
    /// Entry describing a node that does not exist.
    pub fn missing(name: impl Into<String>, locator: StorageLocator) -> Self {
        Self {
            name: name.into(),
            locator,
            kind: EntryKind::File,
            size: 0,
            last_modified_ms: 0,
            exists: false,
            readable: false,
            writable: false,
        }
    }

    pub fn is_file(&self) -> bool {
        self.exists && self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.exists && self.kind == EntryKind::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_is_neither_file_nor_directory() {
        let entry = StorageEntry::missing("gone", StorageLocator::from_raw("file:///gone"));
        assert!(!entry.exists);
        assert!(!entry.is_file());
        assert!(!entry.is_directory());
    }
}
