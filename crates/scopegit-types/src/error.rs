//! The closed error taxonomy.
//!
//! Every failure surfaced by the path translator and the filesystem adapter
//! is one of the [`VcsError`] variants. Callers discriminate by matching on
//! the variant (or on [`VcsError::kind`]), never by inspecting message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors shared by the path translator and the filesystem adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VcsError {
    /// No node exists at the given path.
    #[error("ENOENT: no such file or directory: {0}")]
    NotFound(String),

    /// A node already exists at the given path.
    #[error("EEXIST: file already exists: {0}")]
    AlreadyExists(String),

    /// The path names a file where a directory was required.
    #[error("ENOTDIR: not a directory: {0}")]
    NotADirectory(String),

    /// The directory still has children.
    #[error("ENOTEMPTY: directory not empty: {0}")]
    NotEmpty(String),

    /// The operation did not complete in time.
    #[error("ETIMEDOUT: operation timed out: {0}")]
    Timeout(String),

    /// The storage grant does not cover the node.
    #[error("EACCES: permission denied: {0}")]
    PermissionDenied(String),

    /// The path names a directory where a file was required.
    #[error("EISDIR: is a directory: {0}")]
    IsADirectory(String),

    /// The backend has no equivalent of the requested operation.
    #[error("operation not supported: {0}")]
    UnsupportedOperation(String),

    /// No locator scheme recognises the given URI.
    #[error("unsupported storage locator: {0}")]
    UnsupportedLocator(String),

    /// The path cannot be interpreted for the requested operation.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Repository-level failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Repository-level failure kinds.
///
/// The display strings are the user-facing messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("No folder is currently selected.")]
    NoFolderSelected,

    #[error("Multiple folders are selected.")]
    MultipleFoldersSelected,

    #[error("Git repository not found.")]
    NotFound,

    #[error("Git repository not initialized.")]
    NotInitialized,

    #[error("The selected folder is already a Git repository. Please refresh.")]
    AlreadyInitialized,
}

/// Fieldless tag for a [`VcsError`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    NotADirectory,
    NotEmpty,
    Timeout,
    PermissionDenied,
    IsADirectory,
    UnsupportedOperation,
    UnsupportedLocator,
    InvalidPath,
    Repository,
}

impl VcsError {
    /// The variant tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::NotEmpty(_) => ErrorKind::NotEmpty,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::IsADirectory(_) => ErrorKind::IsADirectory,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::UnsupportedLocator(_) => ErrorKind::UnsupportedLocator,
            Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::Repository(_) => ErrorKind::Repository,
        }
    }

    /// Short POSIX-style code for this error.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "ENOENT",
            ErrorKind::AlreadyExists => "EEXIST",
            ErrorKind::NotADirectory => "ENOTDIR",
            ErrorKind::NotEmpty => "ENOTEMPTY",
            ErrorKind::Timeout => "ETIMEDOUT",
            ErrorKind::PermissionDenied => "EACCES",
            ErrorKind::IsADirectory => "EISDIR",
            ErrorKind::UnsupportedOperation => "ENOTSUP",
            ErrorKind::UnsupportedLocator => "EBADURI",
            ErrorKind::InvalidPath => "EINVAL",
            ErrorKind::Repository => "REPOERROR",
        }
    }

    /// Returns `true` if this is a [`VcsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience alias for results carrying a [`VcsError`].
pub type VcsResult<T> = Result<T, VcsError>;
