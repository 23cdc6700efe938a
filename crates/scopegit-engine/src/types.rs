use std::fmt;

use scopegit_types::StatusTriple;
use serde::{Deserialize, Serialize};

use crate::oid::Oid;

/// One row of the status matrix: a repository-relative path and its triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub path: String,
    pub triple: StatusTriple,
}

impl StatusRow {
    pub fn new(path: impl Into<String>, triple: impl Into<StatusTriple>) -> Self {
        Self {
            path: path.into(),
            triple: triple.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// Submodule pointer.
    Commit,
}

/// One entry of a tree object. `path` is a single name, not a full path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub oid: Oid,
    pub kind: TreeEntryKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub oid: Oid,
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub message: String,
    pub author: Signature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInfo {
    pub remote: String,
    pub url: String,
}

/// Credentials handed to a remote. Token-based hosts take the token as the
/// username.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            username: token.into(),
            password: None,
        }
    }

    /// Whether these credentials carry `secret` as username or password.
    pub fn carries(&self, secret: &str) -> bool {
        self.username == secret || self.password.as_deref() == Some(secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Progress of a long-running operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub phase: String,
    pub loaded: u64,
    pub total: u64,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} / {}", self.phase, self.loaded, self.total)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloneOptions {
    pub url: String,
    pub cors_proxy: Option<String>,
    /// Branch to check out; the remote's default branch when `None`.
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Remote name; `origin` when `None`.
    pub remote: Option<String>,
    /// Overrides the configured remote URL.
    pub url: Option<String>,
    pub cors_proxy: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub remote: Option<String>,
    /// Branch to pull; the current branch when `None`.
    pub reference: Option<String>,
    pub cors_proxy: Option<String>,
    pub author: Option<Signature>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub remote: Option<String>,
    pub reference: Option<String>,
    pub cors_proxy: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The remote's default branch.
    pub default_branch: Option<String>,
    /// Tip of the remote's default branch after the fetch.
    pub fetch_head: Option<Oid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushOutcome {
    pub ok: bool,
    /// Rejection reason when `ok` is false.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_renders_phase_and_counts() {
        let p = Progress {
            phase: "Receiving objects".into(),
            loaded: 3,
            total: 10,
        };
        assert_eq!(p.to_string(), "Receiving objects 3 / 10");
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let c = Credentials::token("ghp_secret");
        assert!(!format!("{c:?}").contains("ghp_secret"));
        assert!(c.carries("ghp_secret"));
    }
}
