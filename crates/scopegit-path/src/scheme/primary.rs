use scopegit_types::{StorageLocator, VcsError, VcsResult};

use super::LocatorScheme;
use crate::config::TranslatorConfig;
use crate::context::ActiveRootContext;
use crate::percent;

const DOCUMENT_SEGMENT: &str = "/document/";
const VOLUME: &str = "primary:";

/// Tree URIs of the primary external-storage volume:
/// `content://<authority>/tree/primary:<rootId>::primary:<relative>`.
///
/// `<rootId>` is the first segment of the canonical path (the directory the
/// user granted) and `<relative>` is every segment after the leading `/`,
/// root id included.
#[derive(Clone, Debug)]
pub struct PrimaryTreeScheme {
    authority_prefix: String,
    tree_prefix: String,
    storage_prefix: String,
}

impl PrimaryTreeScheme {
    pub fn new(config: &TranslatorConfig) -> Self {
        let authority_prefix = format!("content://{}/", config.primary_authority);
        Self {
            tree_prefix: format!("{authority_prefix}tree/"),
            authority_prefix,
            storage_prefix: config.external_storage_prefix.clone(),
        }
    }

    /// Drop the shared-volume prefix so `/storage/emulated/0/X` and `/X`
    /// encode identically.
    fn strip_storage_prefix<'a>(&self, path: &'a str) -> &'a str {
        match path.strip_prefix(self.storage_prefix.as_str()) {
            Some(rest) if rest.starts_with('/') => rest,
            Some("") => "/",
            _ => path,
        }
    }
}

impl LocatorScheme for PrimaryTreeScheme {
    fn name(&self) -> &'static str {
        "primary-tree"
    }

    fn matches_locator(&self, locator: &str) -> bool {
        locator.starts_with(self.authority_prefix.as_str())
    }

    fn matches_path(&self, path: &str) -> bool {
        path.starts_with('/')
    }

    fn decode(&self, locator: &str) -> VcsResult<String> {
        let unsupported = || VcsError::UnsupportedLocator(locator.to_string());

        // Single-document form: the document id follows the volume marker.
        let head = locator.split_once("::").map_or(locator, |(head, _)| head);
        if let Some(at) = head.find(DOCUMENT_SEGMENT) {
            let document = &locator[at + DOCUMENT_SEGMENT.len()..];
            let document = percent::decode(document).ok_or_else(unsupported)?;
            let tail = match document.strip_prefix(VOLUME) {
                Some(tail) => tail,
                None => document.rsplit(':').next().unwrap_or_default(),
            };
            return Ok(if tail.starts_with('/') {
                tail.to_string()
            } else {
                format!("/{tail}")
            });
        }

        if let Some((_, document)) = locator.split_once("::") {
            let document = percent::decode(document).ok_or_else(unsupported)?;
            return Ok(document.replacen(VOLUME, "/", 1));
        }

        // Tree without a document part names the granted root itself.
        let decoded = percent::decode(locator).ok_or_else(unsupported)?;
        let tree = decoded
            .strip_prefix(self.tree_prefix.as_str())
            .ok_or_else(unsupported)?;
        match tree.strip_prefix(VOLUME) {
            Some(root) => Ok(format!("/{root}")),
            None => Err(unsupported()),
        }
    }

    fn encode(&self, path: &str, _ctx: &ActiveRootContext) -> VcsResult<StorageLocator> {
        if !path.starts_with('/') {
            return Err(VcsError::InvalidPath(path.to_string()));
        }
        let path = self.strip_storage_prefix(path);
        let relative = &path[1..];
        let root_id = relative.split('/').next().unwrap_or_default();
        if root_id.is_empty() {
            return Err(VcsError::InvalidPath(path.to_string()));
        }
        Ok(StorageLocator::from_raw(format!(
            "{}{VOLUME}{}::{VOLUME}{}",
            self.tree_prefix,
            percent::encode_component(root_id),
            percent::encode_segments(relative)
        )))
    }
}
