use scopegit_types::{EntryKind, StorageEntry};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    File,
    Dir,
}

/// POSIX-like stat record.
///
/// The backend reports no identity or permission data, so `mode` is always
/// `0o777`, `ino` is 0, and `uid`/`gid`/`dev` are 1. `ctime_ms` repeats the
/// modification time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub kind: StatKind,
    pub mode: u32,
    pub size: u64,
    pub ino: u64,
    pub mtime_ms: u64,
    pub ctime_ms: u64,
    pub uid: u32,
    pub gid: u32,
    pub dev: u64,
}

impl Stats {
    pub fn is_file(&self) -> bool {
        self.kind == StatKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == StatKind::Dir
    }

    pub fn is_symbolic_link(&self) -> bool {
        false
    }
}

impl From<&StorageEntry> for Stats {
    fn from(entry: &StorageEntry) -> Self {
        Self {
            kind: match entry.kind {
                EntryKind::File => StatKind::File,
                EntryKind::Directory => StatKind::Dir,
            },
            mode: 0o777,
            size: entry.size,
            ino: 0,
            mtime_ms: entry.last_modified_ms,
            ctime_ms: entry.last_modified_ms,
            uid: 1,
            gid: 1,
            dev: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegit_types::StorageLocator;

    #[test]
    fn placeholders_fill_identity_fields() {
        let mut entry = StorageEntry::missing("a", StorageLocator::from_raw("file:///a"));
        entry.exists = true;
        entry.size = 12;
        entry.last_modified_ms = 1_700_000_000_000;
        let stats = Stats::from(&entry);
        assert!(stats.is_file());
        assert!(!stats.is_symbolic_link());
        assert_eq!(stats.mode, 0o777);
        assert_eq!(stats.ctime_ms, stats.mtime_ms);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["size"], 12);
    }
}
