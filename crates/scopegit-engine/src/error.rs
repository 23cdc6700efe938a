use scopegit_types::VcsError;

/// Errors from Git engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A ref, object, or repository could not be found.
    #[error("Could not find {0}.")]
    NotFound(String),

    /// A branch, remote, or repository already exists.
    #[error("{0} already exists.")]
    AlreadyExists(String),

    /// The ref name violates git naming rules.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// The branch to delete is checked out.
    #[error("cannot delete the checked-out branch {0:?}")]
    DeleteCurrentBranch(String),

    /// `user.name` is not configured and no author was given.
    #[error("Author name is required. Set user.name in the repository config.")]
    MissingAuthor,

    /// The named remote is not configured.
    #[error("no remote named {0:?} is configured")]
    UnknownRemote(String),

    /// Local and remote histories diverged.
    #[error("Cannot fast-forward {0}: histories have diverged")]
    NotFastForward(String),

    /// The remote answered with an HTTP error.
    #[error("HTTP Error: {status_code} {response}")]
    Transport { response: String, status_code: u16 },

    /// A stored object failed to decode.
    #[error("corrupt object {oid}: {reason}")]
    CorruptObject { oid: String, reason: String },

    /// Working-copy access failed.
    #[error(transparent)]
    Fs(#[from] VcsError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Text shown to the user: `"{response}: {status_code}"` for transport
    /// failures, the display string otherwise.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Transport {
                response,
                status_code,
            } => format!("{response}: {status_code}"),
            other => other.to_string(),
        }
    }

    /// Whether this is an HTTP 401/403.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            EngineError::Transport {
                status_code: 401 | 403,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_render_response_and_code() {
        let err = EngineError::Transport {
            response: "Unauthorized".into(),
            status_code: 401,
        };
        assert_eq!(err.user_message(), "Unauthorized: 401");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn other_errors_render_verbatim() {
        let err = EngineError::NotFound("refs/heads/dev".into());
        assert_eq!(err.user_message(), "Could not find refs/heads/dev.");

        let err: EngineError = VcsError::NotFound("/a".into()).into();
        assert_eq!(err.user_message(), "ENOENT: no such file or directory: /a");
    }
}
