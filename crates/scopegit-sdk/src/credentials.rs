//! Credentials and progress reporting for transfers.

use async_trait::async_trait;
use scopegit_engine::Progress;

/// Source of access tokens when none is stored.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Ask the user for a token for `url`; `None` when they decline.
    async fn prompt_token(&self, url: &str) -> Option<String>;

    /// Whether a freshly entered token should be kept for later transfers.
    async fn confirm_save(&self) -> bool {
        false
    }
}

/// Never supplies a token.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn prompt_token(&self, _url: &str) -> Option<String> {
        None
    }
}

/// Always answers with the same token and asks for it to be saved.
#[derive(Clone)]
pub struct StaticToken(pub String);

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn prompt_token(&self, _url: &str) -> Option<String> {
        Some(self.0.clone())
    }

    async fn confirm_save(&self) -> bool {
        true
    }
}

/// Receives the status lines of a long-running operation.
pub trait TransferObserver: Send + Sync {
    fn on_status(&self, _line: &str) {}
}

/// Discards status lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl TransferObserver for Silent {}

/// Text of a progress update: `"{phase} {loaded} / {total}"`.
pub fn format_progress(progress: &Progress) -> String {
    progress.to_string()
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
        assert_eq!(format_progress(&p), "Receiving objects 3 / 10");
    }

    #[tokio::test]
    async fn providers() {
        assert_eq!(NoCredentials.prompt_token("u").await, None);
        assert!(!NoCredentials.confirm_save().await);
        let token = StaticToken("t".into());
        assert_eq!(token.prompt_token("u").await.as_deref(), Some("t"));
        assert!(token.confirm_save().await);
        assert_eq!(format!("{token:?}"), "StaticToken(<redacted>)");
    }
}
