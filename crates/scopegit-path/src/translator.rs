//! Scheme dispatch between canonical paths and storage locators.

use scopegit_types::{StorageLocator, VcsError, VcsResult};
use tracing::debug;

use crate::config::{MainRootScheme, TranslatorConfig};
use crate::context::ActiveRootContext;
use crate::posix::normalize;
use crate::scheme::{FileScheme, HomeTreeScheme, LocatorScheme, PrimaryTreeScheme};

/// Bidirectional mapping between canonical paths and [`StorageLocator`]s.
///
/// Holds an ordered table of [`LocatorScheme`] strategies. Decoding picks
/// the first scheme claiming the locator; encoding picks the first scheme
/// claiming the normalized path. The home scheme comes first so sentinel
/// paths never fall through to a main-root encoding.
#[derive(Debug)]
pub struct PathTranslator {
    schemes: Vec<Box<dyn LocatorScheme>>,
}

impl PathTranslator {
    /// Build the standard table: home tree, then the configured main-root
    /// scheme, then the other main-root scheme (decode only in practice).
    pub fn new(config: &TranslatorConfig) -> Self {
        let primary: Box<dyn LocatorScheme> = Box::new(PrimaryTreeScheme::new(config));
        let file: Box<dyn LocatorScheme> = Box::new(FileScheme::new(config));
        let (main, other) = match config.main_scheme {
            MainRootScheme::ContentTree => (primary, file),
            MainRootScheme::File => (file, primary),
        };
        Self {
            schemes: vec![Box::new(HomeTreeScheme::new(config)), main, other],
        }
    }

    /// A translator with no schemes; every call fails until one is added.
    pub fn empty() -> Self {
        Self {
            schemes: Vec::new(),
        }
    }

    /// Append a scheme at the lowest priority.
    pub fn with_scheme(mut self, scheme: impl LocatorScheme + 'static) -> Self {
        self.schemes.push(Box::new(scheme));
        self
    }

    /// Names of the registered schemes, in dispatch order.
    pub fn scheme_names(&self) -> Vec<&'static str> {
        self.schemes.iter().map(|s| s.name()).collect()
    }

    /// Decode a locator into a normalized canonical path.
    pub fn uri_to_path(&self, locator: &str) -> VcsResult<String> {
        let scheme = self
            .schemes
            .iter()
            .find(|s| s.matches_locator(locator))
            .ok_or_else(|| VcsError::UnsupportedLocator(locator.to_string()))?;
        let path = normalize(&scheme.decode(locator)?);
        debug!(scheme = scheme.name(), %locator, %path, "decoded locator");
        Ok(path)
    }

    /// Encode a canonical path under `ctx`.
    pub fn path_to_uri(&self, path: &str, ctx: &ActiveRootContext) -> VcsResult<StorageLocator> {
        let path = normalize(path);
        let scheme = self
            .schemes
            .iter()
            .find(|s| s.matches_path(&path))
            .ok_or_else(|| VcsError::InvalidPath(path.clone()))?;
        let locator = scheme.encode(&path, ctx)?;
        debug!(scheme = scheme.name(), %path, %locator, "encoded path");
        Ok(locator)
    }
}

impl Default for PathTranslator {
    fn default() -> Self {
        Self::new(&TranslatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn translator() -> PathTranslator {
        PathTranslator::default()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn default_dispatch_order() {
        assert_eq!(
            translator().scheme_names(),
            vec!["home-tree", "primary-tree", "file"]
        );
    }

    #[test]
    fn file_main_scheme_swaps_order() {
        let config = TranslatorConfig {
            main_scheme: MainRootScheme::File,
            ..TranslatorConfig::default()
        };
        let t = PathTranslator::new(&config);
        assert_eq!(t.scheme_names(), vec!["home-tree", "file", "primary-tree"]);
        let loc = t
            .path_to_uri("/Documents/a", &ActiveRootContext::new())
            .unwrap();
        assert_eq!(loc.as_str(), "file:///storage/emulated/0/Documents/a");
    }

    #[test]
    fn unknown_locator_is_unsupported() {
        let err = translator().uri_to_path("https://example.com/a").unwrap_err();
        assert!(matches!(err, VcsError::UnsupportedLocator(_)));
    }

    #[test]
    fn relative_path_cannot_be_encoded() {
        let err = translator()
            .path_to_uri("repo/a", &ActiveRootContext::new())
            .unwrap_err();
        assert!(matches!(err, VcsError::InvalidPath(_)));
    }

    #[test]
    fn empty_translator_rejects_everything() {
        let t = PathTranslator::empty();
        assert!(t.uri_to_path("file:///a").is_err());
        assert!(t.path_to_uri("/a", &ActiveRootContext::new()).is_err());
    }

    #[test]
    fn extra_scheme_is_consulted_last() {
        let t = PathTranslator::empty().with_scheme(FileScheme::new(&TranslatorConfig::default()));
        assert_eq!(
            t.uri_to_path("file:///storage/emulated/0/x/../y").unwrap(),
            "/y"
        );
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn paths_are_normalized_before_encoding() {
        let t = translator();
        let ctx = ActiveRootContext::new();
        assert_eq!(
            t.path_to_uri("/Documents//repo/./a/../b", &ctx).unwrap(),
            t.path_to_uri("/Documents/repo/b", &ctx).unwrap()
        );
    }

    #[test]
    fn home_paths_round_trip_under_both_contexts() {
        let t = translator();
        for ctx in [
            ActiveRootContext::new(),
            ActiveRootContext::with_root("/$HOME/repo"),
        ] {
            let loc = t.path_to_uri("/$HOME/repo/src/main.rs", &ctx).unwrap();
            assert_eq!(t.uri_to_path(loc.as_str()).unwrap(), "/$HOME/repo/src/main.rs");
        }
    }

    #[test]
    fn child_locators_decode_to_child_paths() {
        let t = translator();
        let ctx = ActiveRootContext::with_root("/$HOME/repo");
        for dir in ["/Documents/repo", "/$HOME/repo"] {
            let loc = t.path_to_uri(dir, &ctx).unwrap().child("file.txt");
            assert_eq!(t.uri_to_path(loc.as_str()).unwrap(), format!("{dir}/file.txt"));
        }
    }

    proptest! {
        #[test]
        fn main_root_paths_round_trip(
            segs in prop::collection::vec("[A-Za-z0-9_.%# :-]{1,8}", 1..5),
            name in "[A-Za-z0-9_.%# :-]{1,8}",
            file_scheme in any::<bool>(),
        ) {
            prop_assume!(segs.iter().chain([&name]).all(|s| s != "." && s != ".."));
            let path = format!("/{}", segs.join("/"));
            let config = TranslatorConfig {
                main_scheme: if file_scheme { MainRootScheme::File } else { MainRootScheme::ContentTree },
                ..TranslatorConfig::default()
            };
            let t = PathTranslator::new(&config);
            let loc = t.path_to_uri(&path, &ActiveRootContext::new()).unwrap();
            prop_assert_eq!(t.uri_to_path(loc.as_str()).unwrap(), path.clone());
            let child = loc.child(&name);
            prop_assert_eq!(t.uri_to_path(child.as_str()).unwrap(), format!("{path}/{name}"));
        }
    }
}
