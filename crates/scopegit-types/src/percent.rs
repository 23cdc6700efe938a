//! URI component percent-encoding.
//!
//! Component encoding with the unreserved set `A-Z a-z 0-9 - _ . ! ~ * ' ( )`,
//! and strict decoding of `%XX` escapes into UTF-8.
//!
//! Every locator form escapes the path it carries so that decoding gives the
//! path back unchanged, `%` and `:` included:
//!
//! - primary tree: root id and each document segment are component-encoded;
//!   `/` between segments stays literal, `::` separates tree from document
//! - home tree: the tree path is encoded whole (its `/` become `%2F`); the
//!   document path is encoded per segment
//! - `file://`: the device path is encoded per segment
//! - [`StorageLocator::child`](crate::StorageLocator::child) and
//!   [`sibling`](crate::StorageLocator::sibling) encode the name they append

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Percent-encode every byte outside the unreserved set.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
    }
    out
}

/// Encode each `/`-separated segment of `path`, keeping the separators.
pub fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode `%XX` escapes.
///
/// Returns `None` for a truncated or non-hex escape, or when the decoded
/// bytes are not valid UTF-8.
pub fn decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_separators_and_colons() {
        assert_eq!(
            encode_component("/data/data/com.termux/files/home"),
            "%2Fdata%2Fdata%2Fcom.termux%2Ffiles%2Fhome"
        );
        assert_eq!(encode_component("primary:A b"), "primary%3AA%20b");
    }

    #[test]
    fn segment_encoding_keeps_separators() {
        assert_eq!(encode_segments("/a b/50%off:x"), "/a%20b/50%25off%3Ax");
        assert_eq!(encode_segments("plain/path.txt"), "plain/path.txt");
    }

    #[test]
    fn decodes_mixed_case_escapes() {
        assert_eq!(decode("primary%3aA%2Fb").as_deref(), Some("primary:A/b"));
        assert_eq!(decode("plain").as_deref(), Some("plain"));
        assert_eq!(decode("caf%C3%A9").as_deref(), Some("café"));
    }

    #[test]
    fn rejects_malformed_escapes() {
        assert_eq!(decode("%2"), None);
        assert_eq!(decode("%zz"), None);
        assert_eq!(decode("%FF"), None);
    }

    #[test]
    fn encode_then_decode_is_identity_for_unicode() {
        let input = "/home/ünïcode dir/a+b";
        assert_eq!(decode(&encode_component(input)).as_deref(), Some(input));
    }
}
