use std::path::Path;

use scopegit_path::TranslatorConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings of a [`VersionControl`](crate::VersionControl) session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Authorities and roots used to translate folder locators.
    pub translator: TranslatorConfig,
    /// Proxy prepended to remote URLs by the transport; `None` disables it.
    pub cors_proxy: Option<String>,
    /// Branch for new repositories, and for HEAD content when HEAD is detached.
    pub default_branch: String,
    /// Remote used by pull and push when none is named.
    pub default_remote: String,
    /// Stored access token, offered to remotes that ask for credentials.
    pub access_token: Option<String>,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            translator: TranslatorConfig::default(),
            cors_proxy: Some("https://cors.isomorphic-git.org".into()),
            default_branch: "master".into(),
            default_remote: "origin".into(),
            access_token: None,
        }
    }
}

impl SidebarConfig {
    /// Parse TOML; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopegit_path::MainRootScheme;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = SidebarConfig::default();
        assert_eq!(c.cors_proxy.as_deref(), Some("https://cors.isomorphic-git.org"));
        assert_eq!(c.default_branch, "master");
        assert_eq!(c.default_remote, "origin");
        assert!(c.access_token.is_none());
    }

    #[test]
    fn partial_toml_takes_defaults() {
        let c = SidebarConfig::from_toml_str(
            "default_branch = \"main\"\n[translator]\nmain_scheme = \"file\"\n",
        )
        .unwrap();
        assert_eq!(c.default_branch, "main");
        assert_eq!(c.translator.main_scheme, MainRootScheme::File);
        assert_eq!(c.default_remote, "origin");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = SidebarConfig::from_toml_str("default_branch = [").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "access_token = \"abc\"").unwrap();
        let c = SidebarConfig::load(file.path()).unwrap();
        assert_eq!(c.access_token.as_deref(), Some("abc"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SidebarConfig::load(dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, SdkError::Io(_)));
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = SidebarConfig::default().to_toml_string().unwrap();
        assert_eq!(SidebarConfig::from_toml_str(&text).unwrap(), SidebarConfig::default());
    }
}
