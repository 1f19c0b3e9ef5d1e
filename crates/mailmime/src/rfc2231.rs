//! RFC 2231 parameter value codec.
//!
//! Encoded parameter values have the form `charset'language'data`, where
//! `data` is percent-encoded bytes in `charset`. Continuation fragments after
//! the first carry only `data`.

use std::fmt::Write as _;

use crate::charset;
use crate::encoding::hex_value;

/// Percent-decodes `raw` into bytes.
///
/// `%XX` yields one byte. A `%` followed by a single hex digit at the very end
/// of the input yields the value of that digit. Any other `%` is kept as a
/// literal `%`.
#[must_use]
pub fn percent_decode(raw: &str) -> Vec<u8> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'%' {
            out.push(byte);
            i += 1;
            continue;
        }
        match bytes.len() - i {
            // `%X` at end of input
            2 => {
                if let Some(nibble) = hex_value(bytes[i + 1]) {
                    out.push(nibble);
                    i += 2;
                    continue;
                }
            }
            remaining if remaining > 2 => {
                if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            _ => {}
        }
        out.push(b'%');
        i += 1;
    }
    out
}

/// Returns `true` if `raw` contains at least one well-formed `%XX` escape.
#[must_use]
pub fn has_percent_escape(raw: &str) -> bool {
    raw.as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && hex_value(w[1]).is_some() && hex_value(w[2]).is_some())
}

/// Decodes a percent-encoded value under `charset_label`.
///
/// An absent or unsupported charset returns `raw` unchanged.
#[must_use]
pub fn decode(raw: &str, charset_label: Option<&str>) -> String {
    let Some(label) = charset_label else {
        return raw.to_string();
    };
    if !charset::is_supported(label) {
        tracing::debug!(charset = label, "Unsupported charset, value left encoded");
        return raw.to_string();
    }
    charset::decode(label, &percent_decode(raw)).unwrap_or_else(|| raw.to_string())
}

/// Splits an encoded value into `(charset, language, data)`.
///
/// Returns `None` unless `raw` contains two `'` delimiters.
#[must_use]
pub fn split_prefix(raw: &str) -> Option<(&str, &str, &str)> {
    let (charset, rest) = raw.split_once('\'')?;
    let (language, data) = rest.split_once('\'')?;
    Some((charset, language, data))
}

/// Percent-encodes `text` for use as an RFC 2231 value.
///
/// Text that is empty, or pure ASCII when `force` is not set, is returned
/// unchanged. Otherwise every character outside the attribute-char set
/// (space, controls, non-ASCII, `%`, `*`, `'` and tspecials) is written as
/// `%XX` escapes of its bytes in `charset_label`. With `prepend`, the result
/// starts with `charset'language'`.
///
/// Printable ASCII is escaped too when it is not an attribute-char, so
/// `(1)` becomes `%281%29` rather than passing through literally. Every
/// encoded value therefore decodes back to `text`.
///
/// If the charset is unsupported or cannot represent `text`, the failure is
/// logged and `text` is returned unencoded.
#[must_use]
pub fn encode(
    text: &str,
    charset_label: &str,
    language: Option<&str>,
    prepend: bool,
    force: bool,
) -> String {
    if text.is_empty() || (!force && text.is_ascii()) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() * 3);
    if prepend {
        out.push_str(&charset_label.to_ascii_lowercase());
        out.push('\'');
        out.push_str(language.unwrap_or_default());
        out.push('\'');
    }

    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if is_attribute_char(ch) {
            out.push(ch);
            continue;
        }
        let Some(bytes) = charset::encode(charset_label, ch.encode_utf8(&mut buf)) else {
            tracing::warn!(
                charset = charset_label,
                "Cannot encode parameter value, leaving it unencoded"
            );
            return text.to_string();
        };
        for byte in bytes {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// RFC 2231 `attribute-char`: printable ASCII except space, `*`, `'`, `%`
/// and tspecials.
#[must_use]
pub const fn is_attribute_char(ch: char) -> bool {
    ch.is_ascii_graphic()
        && !matches!(
            ch,
            '*' | '\''
                | '%'
                | '('
                | ')'
                | '<'
                | '>'
                | '@'
                | ','
                | ';'
                | ':'
                | '\\'
                | '"'
                | '/'
                | '['
                | ']'
                | '?'
                | '='
        )
}
