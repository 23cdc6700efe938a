use async_trait::async_trait;

use crate::types::{Credentials, Progress};

/// Callbacks a long-running engine operation reports through.
///
/// All methods default to doing nothing, so implementors override only what
/// they display.
#[async_trait]
pub trait TransferHooks: Send + Sync {
    fn on_progress(&self, _progress: &Progress) {}

    fn on_message(&self, _message: &str) {}

    /// Credentials for `url`, asked for when the remote demands them.
    async fn on_auth(&self, _url: &str) -> Option<Credentials> {
        None
    }
}

/// Hooks that ignore everything and never supply credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

#[async_trait]
impl TransferHooks for NoHooks {}
