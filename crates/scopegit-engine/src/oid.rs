use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Object identifier: 20 bytes, shown as 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Oid([u8; 20]);

impl Oid {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First seven hex digits.
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short())
    }
}

impl FromStr for Oid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| format!("invalid oid {s:?}: {e}"))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| format!("invalid oid {s:?}: expected 20 bytes"))?;
        Ok(Self(bytes))
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_hex()
    }
}

impl TryFrom<String> for Oid {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Domain-separated BLAKE3 hasher for engine objects.
///
/// The domain tag is hashed ahead of the content, so a blob and a tree with
/// identical bytes get different ids.
pub struct ObjectHasher {
    domain: &'static str,
}

impl ObjectHasher {
    pub const BLOB: Self = Self {
        domain: "scopegit-blob-v1",
    };
    pub const TREE: Self = Self {
        domain: "scopegit-tree-v1",
    };
    pub const COMMIT: Self = Self {
        domain: "scopegit-commit-v1",
    };

    pub fn hash(&self, data: &[u8]) -> Oid {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Oid(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let oid = ObjectHasher::BLOB.hash(b"hello");
        let parsed: Oid = oid.to_hex().parse().unwrap();
        assert_eq!(parsed, oid);
        assert_eq!(oid.to_hex().len(), 40);
        assert_eq!(oid.short().len(), 7);
    }

    #[test]
    fn domains_separate() {
        assert_ne!(ObjectHasher::BLOB.hash(b"x"), ObjectHasher::TREE.hash(b"x"));
        assert_eq!(ObjectHasher::BLOB.hash(b"x"), ObjectHasher::BLOB.hash(b"x"));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!("zz".parse::<Oid>().is_err());
        assert!("abcd".parse::<Oid>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let oid = ObjectHasher::COMMIT.hash(b"c");
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, format!("\"{}\"", oid.to_hex()));
        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, oid);
    }
}
