//! Charset capability backed by `encoding_rs`.
//!
//! Labels are resolved with the WHATWG label table, so `us-ascii` and
//! `iso-8859-1` both map to `windows-1252`. The replacement encoding is never
//! returned: a label that only resolves to it is treated as unsupported.

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Labels naming 7-bit ASCII. `encoding_rs` resolves the WHATWG ones to
/// `windows-1252`, which would accept characters ASCII cannot carry.
const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "ansi_x3.4-1968",
    "ansi_x3.4-1986",
    "iso-ir-6",
    "iso_646.irv:1991",
    "iso646-us",
    "us",
    "ibm367",
    "cp367",
    "csascii",
];

/// Returns `true` if the label names 7-bit ASCII.
#[must_use]
pub fn is_ascii_label(label: &str) -> bool {
    let label = label.trim().trim_matches('"');
    ASCII_LABELS.iter().any(|ascii| ascii.eq_ignore_ascii_case(label))
}

/// Looks up the encoding for a charset label.
#[must_use]
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().trim_matches('"');
    if label.is_empty() {
        return None;
    }
    Encoding::for_label_no_replacement(label.as_bytes())
}

/// Returns `true` if the label names a charset that can be decoded.
#[must_use]
pub fn is_supported(label: &str) -> bool {
    lookup(label).is_some()
}

/// Looks up the encoding for a charset label, failing on unknown labels.
///
/// # Errors
///
/// Returns [`Error::EncodingUnsupported`] if the label is not recognized.
pub fn require(label: &str) -> Result<&'static Encoding> {
    lookup(label).ok_or_else(|| Error::EncodingUnsupported(label.to_string()))
}

/// Decodes bytes labeled with `label` into text.
///
/// Malformed sequences are replaced with U+FFFD. Returns `None` when the
/// label is not supported.
#[must_use]
pub fn decode(label: &str, bytes: &[u8]) -> Option<String> {
    let encoding = lookup(label)?;
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Some(text.into_owned())
}

/// Encodes text into the charset named by `label`.
///
/// Returns `None` when the label is not supported, when the charset cannot be
/// used as an output encoding (UTF-16 variants), or when `text` contains
/// characters the charset cannot represent. ASCII labels only accept ASCII
/// text.
#[must_use]
pub fn encode(label: &str, text: &str) -> Option<Vec<u8>> {
    if is_ascii_label(label) {
        return text.is_ascii().then(|| text.as_bytes().to_vec());
    }
    let encoding = lookup(label)?;
    if encoding.output_encoding() != encoding {
        return None;
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return None;
    }
    Some(bytes.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_labels() {
        assert!(is_supported("UTF-8"));
        assert!(is_supported("utf8"));
        assert!(is_supported("us-ascii"));
        assert!(is_supported(" \"ISO-8859-1\" "));
        assert!(!is_supported("x-unknown-charset"));
        assert!(!is_supported(""));
    }

    #[test]
    fn test_require() {
        assert!(require("utf-8").is_ok());
        assert_eq!(
            require("bogus").unwrap_err(),
            Error::EncodingUnsupported("bogus".to_string())
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("utf-8", &[0xC3, 0xA9]).unwrap(), "é");
        assert_eq!(decode("iso-8859-1", &[0xE9]).unwrap(), "é");
        assert!(decode("bogus", b"abc").is_none());
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("utf-8", "é").unwrap(), vec![0xC3, 0xA9]);
        assert_eq!(encode("iso-8859-1", "é").unwrap(), vec![0xE9]);
        assert!(encode("iso-8859-1", "日本").is_none());
        assert!(encode("utf-16le", "abc").is_none());
    }

    #[test]
    fn test_encode_ascii_labels() {
        assert!(encode("us-ascii", "é").is_none());
        assert!(encode("ASCII", "é").is_none());
        assert!(encode("ANSI_X3.4-1968", "é").is_none());
        assert_eq!(encode("US-ASCII", "abc").unwrap(), b"abc".to_vec());
        assert!(is_ascii_label(" \"us-ascii\" "));
        assert!(!is_ascii_label("iso-8859-1"));
    }
}
