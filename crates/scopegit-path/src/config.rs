use serde::{Deserialize, Serialize};

/// Which URI family encodes paths under the main external-storage root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MainRootScheme {
    /// `content://<authority>/tree/primary:<root>::primary:<relative>`
    #[default]
    ContentTree,
    /// `file:///storage/emulated/0/<relative>`
    File,
}

/// Authorities, roots, and markers the translator works with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Absolute prefix of the shared external-storage volume.
    pub external_storage_prefix: String,
    /// Documents-provider authority of the primary external-storage volume.
    pub primary_authority: String,
    /// Documents-provider authority exposing the home directory.
    pub home_authority: String,
    /// Absolute path of the home directory on the device.
    pub home_dir: String,
    /// Leading canonical segment that marks a home-relative path.
    pub home_sentinel: String,
    /// Encoding used for main-root paths.
    pub main_scheme: MainRootScheme,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            external_storage_prefix: "/storage/emulated/0".into(),
            primary_authority: "com.android.externalstorage.documents".into(),
            home_authority: "com.termux.documents".into(),
            home_dir: "/data/data/com.termux/files/home".into(),
            home_sentinel: "$HOME".into(),
            main_scheme: MainRootScheme::ContentTree,
        }
    }
}

impl TranslatorConfig {
    /// Canonical path of the home root, e.g. `/$HOME`.
    pub fn home_root(&self) -> String {
        format!("/{}", self.home_sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = TranslatorConfig::default();
        assert_eq!(c.external_storage_prefix, "/storage/emulated/0");
        assert_eq!(c.home_root(), "/$HOME");
        assert_eq!(c.main_scheme, MainRootScheme::ContentTree);
    }

    #[test]
    fn partial_toml_takes_defaults() {
        let c: TranslatorConfig = toml::from_str("main_scheme = \"file\"").unwrap();
        assert_eq!(c.main_scheme, MainRootScheme::File);
        assert_eq!(c.home_authority, "com.termux.documents");
    }
}
