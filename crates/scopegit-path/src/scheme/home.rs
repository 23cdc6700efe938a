use scopegit_types::{StorageLocator, VcsError, VcsResult};
use tracing::debug;

use super::LocatorScheme;
use crate::config::TranslatorConfig;
use crate::context::ActiveRootContext;
use crate::percent;

/// Tree URIs of the home-directory documents provider:
/// `content://<authority>/tree/<enc(tree)>::<document>`.
///
/// `<tree>` is the absolute device path of the granted directory,
/// percent-encoded; `<document>` is the absolute device path of the node.
/// Canonically these nodes live under `/$HOME`.
#[derive(Clone, Debug)]
pub struct HomeTreeScheme {
    authority_prefix: String,
    home_dir: String,
    home_root: String,
}

impl HomeTreeScheme {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            authority_prefix: format!("content://{}/", config.home_authority),
            home_dir: config.home_dir.trim_end_matches('/').to_string(),
            home_root: config.home_root(),
        }
    }

    /// Map an absolute device path under the home directory to `/$HOME/...`.
    fn device_to_canonical(&self, device: &str, locator: &str) -> VcsResult<String> {
        match device.strip_prefix(self.home_dir.as_str()) {
            Some("") => Ok(self.home_root.clone()),
            Some(rest) if rest.starts_with('/') => Ok(format!("{}{rest}", self.home_root)),
            _ => Err(VcsError::UnsupportedLocator(locator.to_string())),
        }
    }

    /// Map `/$HOME/...` to an absolute device path.
    fn canonical_to_device(&self, path: &str) -> Option<String> {
        match path.strip_prefix(self.home_root.as_str()) {
            Some("") => Some(self.home_dir.clone()),
            Some(rest) if rest.starts_with('/') => Some(format!("{}{rest}", self.home_dir)),
            _ => None,
        }
    }

    /// The granted tree a locator for `path` must name.
    ///
    /// A grant on a subdirectory does not cover its parent, so when the
    /// active root is a home subdirectory that contains `path`, the locator
    /// is scoped to that root. Otherwise it is scoped to the whole home.
    fn tree_for(&self, path: &str, ctx: &ActiveRootContext) -> String {
        match ctx.root() {
            Some(root) if ctx.contains(path) => self
                .canonical_to_device(root)
                .unwrap_or_else(|| self.home_dir.clone()),
            _ => self.home_dir.clone(),
        }
    }
}

impl LocatorScheme for HomeTreeScheme {
    fn name(&self) -> &'static str {
        "home-tree"
    }

    fn matches_locator(&self, locator: &str) -> bool {
        locator.starts_with(self.authority_prefix.as_str())
    }

    fn matches_path(&self, path: &str) -> bool {
        self.canonical_to_device(path).is_some()
    }

    fn decode(&self, locator: &str) -> VcsResult<String> {
        let rest = locator
            .strip_prefix(self.authority_prefix.as_str())
            .ok_or_else(|| VcsError::UnsupportedLocator(locator.to_string()))?;
        let device = if let Some((_, document)) = rest.split_once("::") {
            percent::decode(document)
        } else if let Some(tree) = rest.strip_prefix("tree/") {
            percent::decode(tree)
        } else if let Some(document) = rest.strip_prefix("document/") {
            percent::decode(document)
        } else {
            None
        };
        let device = device.ok_or_else(|| VcsError::UnsupportedLocator(locator.to_string()))?;
        self.device_to_canonical(&device, locator)
    }

    fn encode(&self, path: &str, ctx: &ActiveRootContext) -> VcsResult<StorageLocator> {
        let document = self
            .canonical_to_device(path)
            .ok_or_else(|| VcsError::InvalidPath(path.to_string()))?;
        let tree = self.tree_for(path, ctx);
        debug!(%path, %tree, "encoding home-relative path");
        Ok(StorageLocator::from_raw(format!(
            "{}tree/{}::{}",
            self.authority_prefix,
            percent::encode_component(&tree),
            percent::encode_segments(&document)
        )))
    }
}
