//! In-process stand-in for Git HTTP remotes.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::hooks::TransferHooks;
use crate::memory::objects::ObjectDb;
use crate::memory::repo::HEADS;
use crate::oid::Oid;
use crate::types::PushOutcome;

#[derive(Debug)]
struct HostedRepo {
    objects: ObjectDb,
    refs: BTreeMap<String, Oid>,
    head_branch: String,
    token: Option<String>,
}

/// Snapshot of a hosted repository handed to a fetching client.
#[derive(Debug)]
pub(crate) struct Download {
    pub objects: ObjectDb,
    /// Branch short name to tip.
    pub branches: BTreeMap<String, Oid>,
    pub head_branch: String,
}

/// Repositories reachable by URL.
///
/// A hosted repository may require a token. Clients obtain credentials
/// through [`TransferHooks::on_auth`]; a missing or wrong token answers
/// `401 Unauthorized`, an unknown URL `404 Not Found`.
#[derive(Debug, Default)]
pub struct RemoteHub {
    repos: RwLock<HashMap<String, HostedRepo>>,
}

impl RemoteHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host an empty repository at `url`. Replaces anything already there.
    pub async fn host(&self, url: &str, default_branch: &str, token: Option<&str>) {
        debug!(url, default_branch, "hosting repository");
        self.repos.write().await.insert(
            url.to_string(),
            HostedRepo {
                objects: ObjectDb::default(),
                refs: BTreeMap::new(),
                head_branch: default_branch.to_string(),
                token: token.map(str::to_string),
            },
        );
    }

    pub async fn is_hosted(&self, url: &str) -> bool {
        self.repos.read().await.contains_key(url)
    }

    /// Tip of `branch` at `url`.
    pub async fn branch_tip(&self, url: &str, branch: &str) -> Option<Oid> {
        self.repos
            .read()
            .await
            .get(url)
            .and_then(|repo| repo.refs.get(&format!("{HEADS}{branch}")).copied())
    }

    fn not_found() -> EngineError {
        EngineError::Transport {
            response: "Not Found".into(),
            status_code: 404,
        }
    }

    /// Check access to `url`, asking `hooks` for credentials when a token is
    /// required.
    pub(crate) async fn authorize(&self, url: &str, hooks: &dyn TransferHooks) -> EngineResult<()> {
        let token = {
            let repos = self.repos.read().await;
            let repo = repos.get(url).ok_or_else(Self::not_found)?;
            repo.token.clone()
        };
        let Some(token) = token else {
            return Ok(());
        };
        match hooks.on_auth(url).await {
            Some(credentials) if credentials.carries(&token) => Ok(()),
            _ => Err(EngineError::Transport {
                response: "Unauthorized".into(),
                status_code: 401,
            }),
        }
    }

    pub(crate) async fn download(&self, url: &str) -> EngineResult<Download> {
        let repos = self.repos.read().await;
        let repo = repos.get(url).ok_or_else(Self::not_found)?;
        let branches = repo
            .refs
            .iter()
            .filter_map(|(name, oid)| name.strip_prefix(HEADS).map(|b| (b.to_string(), *oid)))
            .collect();
        Ok(Download {
            objects: repo.objects.clone(),
            branches,
            head_branch: repo.head_branch.clone(),
        })
    }

    /// Move `branch` at `url` to `tip`, taking the objects it needs from
    /// `objects`. Rejected when the remote tip is not an ancestor of `tip`.
    pub(crate) async fn upload(
        &self,
        url: &str,
        objects: &ObjectDb,
        branch: &str,
        tip: Oid,
    ) -> EngineResult<(PushOutcome, usize)> {
        let mut repos = self.repos.write().await;
        let repo = repos.get_mut(url).ok_or_else(Self::not_found)?;
        let name = format!("{HEADS}{branch}");
        let sent = repo.objects.merge_from(objects);
        if let Some(current) = repo.refs.get(&name) {
            if *current != tip && !repo.objects.is_ancestor(current, &tip) {
                debug!(url, branch, "push rejected");
                return Ok((
                    PushOutcome {
                        ok: false,
                        error: Some(format!(
                            "failed to update ref {name}: tip of the remote branch is not an ancestor"
                        )),
                    },
                    sent,
                ));
            }
        }
        repo.refs.insert(name, tip);
        Ok((
            PushOutcome {
                ok: true,
                error: None,
            },
            sent,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoHooks;
    use crate::types::Credentials;
    use async_trait::async_trait;

    struct TokenHooks(&'static str);

    #[async_trait]
    impl TransferHooks for TokenHooks {
        async fn on_auth(&self, _url: &str) -> Option<Credentials> {
            Some(Credentials::token(self.0))
        }
    }

    #[tokio::test]
    async fn unknown_url_is_404() {
        let hub = RemoteHub::new();
        let err = hub.authorize("https://x/y.git", &NoHooks).await.unwrap_err();
        assert_eq!(err.user_message(), "Not Found: 404");
    }

    #[tokio::test]
    async fn token_is_checked() {
        let hub = RemoteHub::new();
        hub.host("https://h/r.git", "main", Some("secret")).await;

        let err = hub.authorize("https://h/r.git", &NoHooks).await.unwrap_err();
        assert!(err.is_auth_failure());
        let err = hub
            .authorize("https://h/r.git", &TokenHooks("wrong"))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        hub.authorize("https://h/r.git", &TokenHooks("secret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_hosted_repo_downloads_nothing() {
        let hub = RemoteHub::new();
        hub.host("https://h/r.git", "trunk", None).await;
        assert!(hub.is_hosted("https://h/r.git").await);
        let download = hub.download("https://h/r.git").await.unwrap();
        assert!(download.branches.is_empty());
        assert_eq!(download.head_branch, "trunk");
        assert_eq!(hub.branch_tip("https://h/r.git", "trunk").await, None);
    }
}
