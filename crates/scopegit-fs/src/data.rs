use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;

/// Raw file content with a lazily decoded text view.
#[derive(Debug, Default)]
pub struct RawBytes {
    data: Bytes,
    text: OnceLock<String>,
}

impl RawBytes {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            text: OnceLock::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// UTF-8 view of the content, decoded on first use. Invalid sequences
    /// are replaced.
    pub fn text(&self) -> &str {
        self.text
            .get_or_init(|| String::from_utf8_lossy(&self.data).into_owned())
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Clone for RawBytes {
    fn clone(&self) -> Self {
        Self::new(self.data.clone())
    }
}

impl PartialEq for RawBytes {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for RawBytes {}

impl fmt::Display for RawBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Result of a read: text when an encoding was requested, bytes otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileData {
    Text(String),
    Bytes(RawBytes),
}

impl FileData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileData::Text(text) => text.as_bytes(),
            FileData::Bytes(raw) => raw.as_bytes(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            FileData::Text(text) => text,
            FileData::Bytes(raw) => raw.text(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            FileData::Text(text) => Bytes::from(text),
            FileData::Bytes(raw) => raw.into_bytes(),
        }
    }
}

/// Content handed to a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteData {
    Text(String),
    Bytes(Bytes),
}

impl WriteData {
    /// UTF-8 encode text; pass bytes through.
    pub fn into_bytes(self) -> Bytes {
        match self {
            WriteData::Text(text) => Bytes::from(text),
            WriteData::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for WriteData {
    fn from(text: &str) -> Self {
        WriteData::Text(text.to_string())
    }
}

impl From<String> for WriteData {
    fn from(text: String) -> Self {
        WriteData::Text(text)
    }
}

impl From<Bytes> for WriteData {
    fn from(bytes: Bytes) -> Self {
        WriteData::Bytes(bytes)
    }
}

impl From<Vec<u8>> for WriteData {
    fn from(bytes: Vec<u8>) -> Self {
        WriteData::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for WriteData {
    fn from(bytes: &[u8]) -> Self {
        WriteData::Bytes(Bytes::copy_from_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_text_is_lossy_and_cached() {
        let raw = RawBytes::new(Bytes::from_static(b"ok \xff"));
        assert_eq!(raw.text(), "ok \u{fffd}");
        assert!(std::ptr::eq(raw.text(), raw.text()));
        assert_eq!(raw.to_string(), "ok \u{fffd}");
    }

    #[test]
    fn write_data_encodes_text_as_utf8() {
        assert_eq!(WriteData::from("é").into_bytes(), Bytes::from_static(b"\xc3\xa9"));
    }
}
