//! RFC 2047 encoded-word decoding and encoding.
//!
//! Format: `=?charset?encoding?encoded-text?=`, where encoding is `B`
//! (Base64) or `Q` (a quoted-printable variant using `_` for space).

use std::fmt::Write as _;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use regex::Regex;

use crate::charset;

/// Base64 engine accepting both padded and unpadded input.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Maximum length of one generated encoded word.
const MAX_WORD_LENGTH: usize = 75;

#[allow(clippy::expect_used)]
static ENCODED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").expect("encoded-word pattern")
});

/// Returns `true` if `text` contains something that looks like the start of
/// an encoded word.
#[must_use]
pub fn has_encoded_word(text: &str) -> bool {
    text.contains("=?")
}

/// Decodes a single encoded word spanning all of `word`.
///
/// Returns `None` if `word` is not an encoded word or names a charset that
/// cannot be decoded.
#[must_use]
pub fn decode_encoded_word(word: &str) -> Option<String> {
    let captures = ENCODED_WORD.captures(word)?;
    let whole = captures.get(0)?;
    if whole.start() != 0 || whole.end() != word.len() {
        return None;
    }
    decode_parts(
        captures.get(1)?.as_str(),
        captures.get(2)?.as_str(),
        captures.get(3)?.as_str(),
    )
}

fn decode_parts(charset_label: &str, transfer: &str, text: &str) -> Option<String> {
    // RFC 2231 section 5 allows `charset*language`
    let label = charset_label
        .split_once('*')
        .map_or(charset_label, |(label, _)| label);
    let bytes = match transfer {
        "b" | "B" => decode_b(text)?,
        _ => decode_q(text),
    };
    charset::decode(label, &bytes)
}

/// Decodes every encoded word found in `text`.
///
/// Whitespace between two adjacent encoded words is dropped. Words that
/// cannot be decoded are left as they are.
#[must_use]
pub fn decode_encoded_words(text: &str) -> String {
    if !has_encoded_word(text) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut previous_decoded = false;

    for captures in ENCODED_WORD.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let gap = &text[last_end..whole.start()];
        let decoded = match (captures.get(1), captures.get(2), captures.get(3)) {
            (Some(cs), Some(te), Some(body)) => decode_parts(cs.as_str(), te.as_str(), body.as_str()),
            _ => None,
        };

        match decoded {
            Some(decoded) => {
                if !(previous_decoded && gap.chars().all(char::is_whitespace)) {
                    out.push_str(gap);
                }
                out.push_str(&decoded);
                previous_decoded = true;
            }
            None => {
                out.push_str(gap);
                out.push_str(whole.as_str());
                previous_decoded = false;
            }
        }
        last_end = whole.end();
    }

    out.push_str(&text[last_end..]);
    out
}

/// Encodes `text` as one or more `Q` encoded words if it contains non-ASCII
/// characters; ASCII text is returned unchanged.
///
/// Falls back to UTF-8 when `charset_label` cannot represent the text.
#[must_use]
pub fn encode_word(text: &str, charset_label: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let label = if charset::encode(charset_label, text).is_some() {
        charset_label
    } else {
        tracing::warn!(
            charset = charset_label,
            "Cannot encode header text in charset, using UTF-8"
        );
        "UTF-8"
    };

    let prefix = format!("=?{label}?Q?");
    let budget = MAX_WORD_LENGTH.saturating_sub(prefix.len() + 2).max(12);

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let bytes = charset::encode(label, ch.encode_utf8(&mut buf)).unwrap_or_default();
        let mut piece = String::new();
        for byte in bytes {
            match byte {
                b' ' => piece.push('_'),
                b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'!' | b'*' | b'+' | b'-' | b'.' | b'/' => {
                    piece.push(byte as char);
                }
                _ => {
                    let _ = write!(piece, "={byte:02X}");
                }
            }
        }
        // Characters are never split across words
        if !current.is_empty() && current.len() + piece.len() > budget {
            words.push(std::mem::take(&mut current));
        }
        current.push_str(&piece);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| format!("{prefix}{word}?="))
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_b(text: &str) -> Option<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT_BASE64.decode(cleaned).ok()
}

/// Decodes `Q` text. Malformed escapes are kept literally.
fn decode_q(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'='),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    out
}

/// Value of one ASCII hex digit.
pub(crate) const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
