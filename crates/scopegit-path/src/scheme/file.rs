use scopegit_types::{StorageLocator, VcsError, VcsResult};

use super::LocatorScheme;
use crate::config::TranslatorConfig;
use crate::context::ActiveRootContext;
use crate::percent;

const PREFIX: &str = "file://";

/// Plain `file://` URIs on the shared volume:
/// `file:///storage/emulated/0/<relative>` maps to `/<relative>`.
#[derive(Clone, Debug)]
pub struct FileScheme {
    storage_prefix: String,
}

impl FileScheme {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            storage_prefix: config.external_storage_prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl LocatorScheme for FileScheme {
    fn name(&self) -> &'static str {
        "file"
    }

    fn matches_locator(&self, locator: &str) -> bool {
        locator.starts_with(PREFIX)
    }

    fn matches_path(&self, path: &str) -> bool {
        path.starts_with('/')
    }

    fn decode(&self, locator: &str) -> VcsResult<String> {
        let raw = locator
            .strip_prefix(PREFIX)
            .ok_or_else(|| VcsError::UnsupportedLocator(locator.to_string()))?;
        let device =
            percent::decode(raw).ok_or_else(|| VcsError::UnsupportedLocator(locator.to_string()))?;
        Ok(match device.strip_prefix(self.storage_prefix.as_str()) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => device,
        })
    }

    fn encode(&self, path: &str, _ctx: &ActiveRootContext) -> VcsResult<StorageLocator> {
        if !path.starts_with('/') {
            return Err(VcsError::InvalidPath(path.to_string()));
        }
        let tail = if path == "/" {
            String::new()
        } else {
            percent::encode_segments(path)
        };
        Ok(StorageLocator::from_raw(format!(
            "{PREFIX}{}{tail}",
            self.storage_prefix
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> FileScheme {
        FileScheme::new(&TranslatorConfig::default())
    }

    #[test]
    fn maps_relative_suffix_directly() {
        let s = scheme();
        assert_eq!(
            s.decode("file:///storage/emulated/0/Documents/a.txt").unwrap(),
            "/Documents/a.txt"
        );
        assert_eq!(
            s.encode("/Documents/a.txt", &ActiveRootContext::new())
                .unwrap()
                .as_str(),
            "file:///storage/emulated/0/Documents/a.txt"
        );
    }

    #[test]
    fn escapes_reserved_characters_in_segments() {
        let loc = scheme()
            .encode("/Documents/my notes#1.md", &ActiveRootContext::new())
            .unwrap();
        assert_eq!(
            loc.as_str(),
            "file:///storage/emulated/0/Documents/my%20notes%231.md"
        );
        assert_eq!(scheme().decode(loc.as_str()).unwrap(), "/Documents/my notes#1.md");
    }

    #[test]
    fn volume_root_decodes_to_slash() {
        assert_eq!(scheme().decode("file:///storage/emulated/0").unwrap(), "/");
    }
}
