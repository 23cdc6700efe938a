use scopegit_engine::EngineError;
use scopegit_types::{RepositoryError, VcsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Message cannot be empty!")]
    EmptyMessage,

    #[error("No changes added to commit. Stage changes first or commit with stage-all.")]
    NothingStaged,

    #[error("This repository has no remotes configured to fetch from.")]
    NoRemotes,

    #[error("several remotes are configured, choose one of: {}", .0.join(", "))]
    RemoteSelectionRequired(Vec<String>),

    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Path {0} is a file, not a directory")]
    NotADirectory(String),

    #[error("Unsupported entry type for {0}")]
    UnsupportedEntry(String),

    #[error("\"{0}\" is a file")]
    DestinationIsFile(String),

    #[error("\"{0}\" exists and is not empty")]
    DestinationNotEmpty(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SdkResult<T> = Result<T, SdkError>;

impl From<RepositoryError> for SdkError {
    fn from(e: RepositoryError) -> Self {
        SdkError::Vcs(e.into())
    }
}

impl SdkError {
    /// Text shown to the user. Transport failures read `"{response}: {status_code}"`.
    pub fn user_message(&self) -> String {
        match self {
            SdkError::Engine(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_keep_their_messages() {
        let err: SdkError = RepositoryError::NoFolderSelected.into();
        assert_eq!(err.user_message(), "No folder is currently selected.");
    }

    #[test]
    fn transport_errors_use_short_form() {
        let err: SdkError = EngineError::Transport {
            response: "Forbidden".into(),
            status_code: 403,
        }
        .into();
        assert_eq!(err.user_message(), "Forbidden: 403");
    }

    #[test]
    fn remote_choice_lists_names() {
        let err = SdkError::RemoteSelectionRequired(vec!["origin".into(), "fork".into()]);
        assert_eq!(
            err.to_string(),
            "several remotes are configured, choose one of: origin, fork"
        );
    }
}
