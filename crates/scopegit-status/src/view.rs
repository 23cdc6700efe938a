//! Staged and unstaged record lists.

use serde::Serialize;

use crate::record::FileStatusRecord;

/// What [`StatusView::patch`] did with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Replaced the existing record in place.
    Replaced,
    /// Removed from one list and appended to the other.
    Moved,
    /// Appended; the path was not shown before.
    Inserted,
}

/// The rendered status: two ordered lists, each in engine order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusView {
    staged: Vec<FileStatusRecord>,
    unstaged: Vec<FileStatusRecord>,
}

impl StatusView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = FileStatusRecord>) -> Self {
        let mut view = Self::new();
        view.replace_all(records);
        view
    }

    pub fn staged(&self) -> &[FileStatusRecord] {
        &self.staged
    }

    pub fn unstaged(&self) -> &[FileStatusRecord] {
        &self.unstaged
    }

    /// Returns `true` if nothing is shown.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }

    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len() + self.unstaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }

    pub fn get(&self, path: &str) -> Option<&FileStatusRecord> {
        self.staged
            .iter()
            .chain(&self.unstaged)
            .find(|record| record.path == path)
    }

    /// Drop everything and partition `records` by staged flag, keeping their
    /// order.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = FileStatusRecord>) {
        let (staged, unstaged): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|record| record.is_staged);
        self.staged = staged;
        self.unstaged = unstaged;
    }

    /// Update the record for one path. Other records keep their positions.
    pub fn patch(&mut self, record: FileStatusRecord) -> PatchOutcome {
        let (target, other) = if record.is_staged {
            (&mut self.staged, &mut self.unstaged)
        } else {
            (&mut self.unstaged, &mut self.staged)
        };
        if let Some(slot) = target.iter_mut().find(|r| r.path == record.path) {
            *slot = record;
            return PatchOutcome::Replaced;
        }
        let moved = match other.iter().position(|r| r.path == record.path) {
            Some(idx) => {
                other.remove(idx);
                true
            }
            None => false,
        };
        target.push(record);
        if moved {
            PatchOutcome::Moved
        } else {
            PatchOutcome::Inserted
        }
    }
}
