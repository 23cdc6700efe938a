use scopegit_engine::{Oid, Signature};
use scopegit_status::StatusView;

/// A commit as the user asked for it.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub message: String,
    /// Stage every change first when nothing is staged.
    pub stage_all: bool,
    /// Overrides `user.name` / `user.email` from the repository config.
    pub author: Option<Signature>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage_all: false,
            author: None,
        }
    }

    pub fn with_stage_all(mut self) -> Self {
        self.stage_all = true;
        self
    }

    pub fn with_author(mut self, author: Signature) -> Self {
        self.author = Some(author);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Oid),
    /// The working copy matches HEAD.
    NoChanges,
}

/// Result of a status refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The selected folder has no `.git` directory.
    NotARepository { dir: String },
    Ready {
        dir: String,
        /// `None` when HEAD is detached.
        branch: Option<String>,
        view: StatusView,
    },
}

impl RefreshOutcome {
    pub fn is_repository(&self) -> bool {
        matches!(self, RefreshOutcome::Ready { .. })
    }

    /// Whether there is anything to commit.
    pub fn can_commit(&self) -> bool {
        match self {
            RefreshOutcome::Ready { view, .. } => !view.is_clean(),
            RefreshOutcome::NotARepository { .. } => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PullOutcome {
    AlreadyUpToDate,
    Updated { before: Option<Oid>, after: Oid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let author = Signature {
            name: "A".into(),
            email: "a@example.com".into(),
            timestamp: 1,
        };
        let r = CommitRequest::new("msg").with_stage_all().with_author(author.clone());
        assert_eq!(r.message, "msg");
        assert!(r.stage_all);
        assert_eq!(r.author, Some(author));
    }

    #[test]
    fn request_defaults() {
        let r = CommitRequest::new("x");
        assert!(!r.stage_all);
        assert!(r.author.is_none());
    }

    #[test]
    fn refresh_outcome_flags() {
        let missing = RefreshOutcome::NotARepository { dir: "/a".into() };
        assert!(!missing.is_repository());
        assert!(!missing.can_commit());

        let clean = RefreshOutcome::Ready {
            dir: "/a".into(),
            branch: Some("main".into()),
            view: StatusView::new(),
        };
        assert!(clean.is_repository());
        assert!(!clean.can_commit());
    }
}
