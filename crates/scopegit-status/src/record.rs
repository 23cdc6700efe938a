use scopegit_engine::StatusRow;
use scopegit_types::StatusTriple;
use serde::Serialize;

use crate::classify::classify;

/// A classified path. Derived state: recomputed on every reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileStatusRecord {
    /// Repository-relative path.
    pub path: String,
    pub key: StatusTriple,
    pub symbol: &'static str,
    pub is_staged: bool,
    pub description: &'static str,
}

impl FileStatusRecord {
    /// Classify `triple` for `path`; `None` when it is not shown.
    pub fn classify(path: impl Into<String>, triple: StatusTriple) -> Option<Self> {
        let classification = classify(triple)?;
        Some(Self {
            path: path.into(),
            key: triple,
            symbol: classification.symbol,
            is_staged: classification.is_staged,
            description: classification.description,
        })
    }

    pub fn from_row(row: &StatusRow) -> Option<Self> {
        Self::classify(row.path.clone(), row.triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_records() {
        let record = FileStatusRecord::from_row(&StatusRow::new("a.txt", (1, 0, 0))).unwrap();
        assert_eq!(record.path, "a.txt");
        assert_eq!(record.key.to_string(), "1-0-0");
        assert_eq!(record.symbol, "D");
        assert!(record.is_staged);
        assert_eq!(record.description, "Deleted, staged");

        assert!(FileStatusRecord::from_row(&StatusRow::new("b", (1, 1, 1))).is_none());
    }

    #[test]
    fn serializes_for_display() {
        let record = FileStatusRecord::classify("x", (0, 2, 0).into()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["symbol"], "U");
        assert_eq!(json["is_staged"], false);
        assert_eq!(json["key"]["workdir"], 2);
    }
}
