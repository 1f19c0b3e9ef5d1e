//! Tokenizing of `; name=value` parameter strings.
//!
//! The regex tokenizer handles well-formed input. Input it cannot account
//! for completely, and very long input, goes through a manual linear scan
//! that splits on `;` and the first `=` while honoring quoted strings.

use std::sync::LazyLock;

use regex::Regex;

/// Inputs longer than this skip the regex tokenizer.
pub(crate) const REGEX_INPUT_LIMIT: usize = 8 * 1024;

#[allow(clippy::expect_used)]
static PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[;\s]\s*([^\s=;"]+)(?:\s*=\s*("(?:[^"\\]|\\.)*"|[^\s;"]*))?"#)
        .expect("parameter pattern")
});

/// A `name[=value]` pair as it appears on the wire. `value` keeps its quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawParameter {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

impl RawParameter {
    fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }
}

/// Splits a parameter string into raw pairs.
pub(crate) fn tokenize(input: &str) -> Vec<RawParameter> {
    let corrected = correct(input);
    if corrected.is_empty() {
        return Vec::new();
    }
    if corrected.len() > REGEX_INPUT_LIMIT {
        tracing::debug!(len = corrected.len(), "Long parameter list, using manual scan");
        return manual_scan(&corrected);
    }
    regex_scan(&corrected).unwrap_or_else(|| {
        tracing::debug!(input = %corrected, "Parameter list not tokenizable, using manual scan");
        manual_scan(&corrected)
    })
}

/// Normalizes malformed input before tokenizing: ensures a leading `;` and
/// quotes unquoted values containing whitespace.
pub(crate) fn correct(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    let prefixed = if input.starts_with(';') {
        input.to_string()
    } else {
        format!("; {input}")
    };

    let mut out = String::with_capacity(prefixed.len() + 8);
    for segment in split_segments(&prefixed) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        out.push_str("; ");
        match segment.split_once('=') {
            Some((name, value)) => {
                let value = strip_trailing_comment(value.trim());
                out.push_str(name.trim_end());
                out.push('=');
                if !value.starts_with('"') && value.contains(char::is_whitespace) {
                    out.push('"');
                    for c in value.chars() {
                        if c == '"' || c == '\\' {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push('"');
                } else {
                    out.push_str(value);
                }
            }
            None => out.push_str(segment),
        }
    }

    if !out.is_empty() && !out.starts_with(';') {
        out.insert_str(0, "; ");
    }
    out
}

/// Drops a trailing `(comment)` from an unquoted value.
fn strip_trailing_comment(value: &str) -> &str {
    if value.starts_with('"') || !value.ends_with(')') {
        return value;
    }
    match value.find('(') {
        Some(open) if open > 0 => value[..open].trim_end(),
        _ => value,
    }
}

/// Splits on `;` outside of quoted strings.
fn split_segments(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quotes => i += 1,
            b'"' => in_quotes = !in_quotes,
            b';' if !in_quotes => {
                segments.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&input[start.min(input.len())..]);
    segments
}

/// Tokenizes with the parameter grammar. Returns `None` if anything other
/// than separators is left between matches.
fn regex_scan(input: &str) -> Option<Vec<RawParameter>> {
    let mut parameters = Vec::new();
    let mut last_end = 0;
    for captures in PARAMETER.captures_iter(input) {
        let whole = captures.get(0)?;
        if !is_separator_gap(&input[last_end..whole.start()]) {
            return None;
        }
        let name = captures.get(1)?.as_str();
        let value = captures.get(2).map(|m| m.as_str());
        parameters.push(RawParameter::new(name, value));
        last_end = whole.end();
    }
    if !is_separator_gap(&input[last_end..]) {
        return None;
    }
    Some(parameters)
}

fn is_separator_gap(gap: &str) -> bool {
    gap.chars().all(|c| c == ';' || c.is_whitespace())
}

/// Linear scan splitting on `;` and the first `=`. Never recurses.
pub(crate) fn manual_scan(input: &str) -> Vec<RawParameter> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut parameters = Vec::new();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let name_start = pos;
        while pos < len && bytes[pos] != b'=' && bytes[pos] != b';' {
            pos += 1;
        }
        let name = input[name_start..pos].trim();

        let value = if pos < len && bytes[pos] == b'=' {
            pos += 1;
            let value_start = pos;
            let mut in_quotes = false;
            while pos < len {
                match bytes[pos] {
                    b'\\' if in_quotes => pos += 1,
                    b'"' => in_quotes = !in_quotes,
                    b';' if !in_quotes => break,
                    _ => {}
                }
                pos += 1;
            }
            let end = pos.min(len);
            Some(input[value_start..end].trim())
        } else {
            None
        };

        if !name.is_empty() {
            parameters.push(RawParameter::new(name, value));
        }
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, value: Option<&str>) -> RawParameter {
        RawParameter::new(name, value)
    }

    #[test]
    fn test_correct_prefix() {
        assert_eq!(correct(""), "");
        assert_eq!(correct("   "), "");
        assert_eq!(correct("charset=utf-8"), "; charset=utf-8");
        assert_eq!(correct(";charset=utf-8"), "; charset=utf-8");
    }

    #[test]
    fn test_correct_quotes_whitespace_values() {
        assert_eq!(correct("; name=my file.txt"), "; name=\"my file.txt\"");
        assert_eq!(correct("; name=\"my file.txt\""), "; name=\"my file.txt\"");
        assert_eq!(
            correct("; charset=us-ascii (Plain text)"),
            "; charset=us-ascii"
        );
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            tokenize("; charset=utf-8; format=flowed"),
            vec![pair("charset", Some("utf-8")), pair("format", Some("flowed"))]
        );
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(
            tokenize("; boundary=\"----=_Part_1; x\"; name=\"a \\\"b\\\"\""),
            vec![
                pair("boundary", Some("\"----=_Part_1; x\"")),
                pair("name", Some("\"a \\\"b\\\"\"")),
            ]
        );
    }

    #[test]
    fn test_tokenize_valueless() {
        assert_eq!(
            tokenize("; flag; charset=utf-8"),
            vec![pair("flag", None), pair("charset", Some("utf-8"))]
        );
    }

    #[test]
    fn test_unterminated_quote_falls_back() {
        assert_eq!(
            tokenize("; name=\"abc; charset=utf-8"),
            vec![pair("name", Some("\"abc; charset=utf-8"))]
        );
        assert!(regex_scan("; name=\"abc").is_none());
    }

    #[test]
    fn test_manual_scan() {
        assert_eq!(
            manual_scan("; a=1;; b = \"x;y\" ; c"),
            vec![
                pair("a", Some("1")),
                pair("b", Some("\"x;y\"")),
                pair("c", None),
            ]
        );
        assert!(manual_scan(";;; ").is_empty());
    }

    #[test]
    fn test_long_input_uses_manual_scan() {
        let value = "x".repeat(REGEX_INPUT_LIMIT + 10);
        let input = format!("; name={value}; charset=utf-8");
        let parameters = tokenize(&input);
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[1], pair("charset", Some("utf-8")));
    }

    #[test]
    fn test_pathological_parentheses() {
        let input = format!("; name={}; charset=utf-8", "(".repeat(20_000));
        let parameters = tokenize(&input);
        assert!(parameters.iter().any(|p| p.name == "charset"));
    }
}
