use scopegit_types::VcsError;

/// Errors from storage backend primitives.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No node exists at the locator.
    #[error("no node at {0}")]
    NotFound(String),

    /// A file operation was applied to a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// A directory operation was applied to a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A node with that name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The storage grant does not cover the node.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backend cannot interpret the locator.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// I/O error from the underlying medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for VcsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(loc) => VcsError::NotFound(loc),
            StorageError::IsADirectory(loc) => VcsError::IsADirectory(loc),
            StorageError::NotADirectory(loc) => VcsError::NotADirectory(loc),
            StorageError::AlreadyExists(loc) => VcsError::AlreadyExists(loc),
            StorageError::PermissionDenied(loc) => VcsError::PermissionDenied(loc),
            StorageError::InvalidLocator(loc) => VcsError::UnsupportedLocator(loc),
            StorageError::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => VcsError::NotFound(e.to_string()),
                std::io::ErrorKind::AlreadyExists => VcsError::AlreadyExists(e.to_string()),
                std::io::ErrorKind::PermissionDenied => VcsError::PermissionDenied(e.to_string()),
                std::io::ErrorKind::TimedOut => VcsError::Timeout(e.to_string()),
                _ => VcsError::UnsupportedOperation(e.to_string()),
            },
        }
    }
}
