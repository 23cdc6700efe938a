use std::str::FromStr;

use scopegit_types::VcsError;

/// Text encodings the adapter can decode. Only UTF-8 is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
}

impl FromStr for Encoding {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            other => Err(VcsError::UnsupportedOperation(format!(
                "only \"utf8\" encoding is supported, got {other:?}"
            ))),
        }
    }
}

/// Options for [`FsClient::read_file`](crate::FsClient::read_file).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Decode the content to text when set; return raw bytes otherwise.
    pub encoding: Option<Encoding>,
}

impl ReadOptions {
    pub fn utf8() -> Self {
        Self {
            encoding: Some(Encoding::Utf8),
        }
    }

    /// Options given as a bare encoding name, e.g. `"utf8"`.
    pub fn parse(encoding: &str) -> Result<Self, VcsError> {
        Ok(Self {
            encoding: Some(encoding.parse()?),
        })
    }
}

/// Options for [`FsClient::write_file`](crate::FsClient::write_file).
///
/// `mode` is accepted for compatibility and ignored: the backend has no
/// permission bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub encoding: Option<Encoding>,
    pub mode: Option<u32>,
}

impl WriteOptions {
    pub fn parse(encoding: &str) -> Result<Self, VcsError> {
        Ok(Self {
            encoding: Some(encoding.parse()?),
            mode: None,
        })
    }
}

/// Options for [`FsClient::mkdir`](crate::FsClient::mkdir).
///
/// Both fields are ignored. Directories are always created one level at a
/// time; a missing parent fails the call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MkdirOptions {
    pub mode: Option<u32>,
    pub recursive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utf8_names() {
        assert_eq!(ReadOptions::parse("utf8").unwrap(), ReadOptions::utf8());
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
    }

    #[test]
    fn rejects_other_encodings() {
        let err = ReadOptions::parse("latin1").unwrap_err();
        assert!(matches!(err, VcsError::UnsupportedOperation(_)));
        assert!(WriteOptions::parse("base64").is_err());
    }
}
