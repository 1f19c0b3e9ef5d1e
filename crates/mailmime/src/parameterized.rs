//! Behavior shared by headers carrying a primary value plus parameters.

use crate::encoding::{decode_encoded_words, has_encoded_word};
use crate::error::Result;
use crate::parameter::{ParameterList, ParameterValue};

/// Normalizes a raw header value before its primary value is parsed.
///
/// Unfolds continuation lines, decodes encoded words in the primary value,
/// strips one trailing `;`, strips one level of enclosing parentheses, and
/// strips parentheses or quotes around the primary value when parameters
/// follow it.
#[must_use]
pub fn prepare_parameterized_header(raw: &str) -> String {
    let unfolded = unfold(raw);
    let mut value = unfolded.trim();

    let decoded;
    if has_encoded_word(value) {
        let (primary, rest) = value.find(';').map_or((value, ""), |i| value.split_at(i));
        if has_encoded_word(primary) {
            decoded = format!("{}{rest}", decode_encoded_words(primary).trim());
            value = decoded.trim();
        }
    }

    if let Some(stripped) = value.strip_suffix(';') {
        value = stripped.trim_end();
    }
    if let Some(inner) = value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        value = inner.trim();
    }

    match value.find(';') {
        Some(i) => {
            let (primary, rest) = value.split_at(i);
            format!("{}{rest}", strip_enclosing(primary.trim()))
        }
        None => value.to_string(),
    }
}

/// Replaces each line break and the whitespace following it with a single
/// space. Line breaks not followed by whitespace are dropped.
fn unfold(raw: &str) -> String {
    if !raw.contains(['\r', '\n']) {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\r' && c != '\n' {
            out.push(c);
            continue;
        }
        while chars.next_if(|&c| c == '\r' || c == '\n').is_some() {}
        let mut folded = false;
        while chars.next_if(|&c| c == ' ' || c == '\t').is_some() {
            folded = true;
        }
        if folded {
            out.push(' ');
        }
    }
    out
}

/// Strips one level of `(...)`, `"..."` or `'...'` around `value`.
fn strip_enclosing(value: &str) -> &str {
    for (open, close) in [('(', ')'), ('"', '"'), ('\'', '\'')] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    value
}

/// A header value consisting of a primary value and a [`ParameterList`].
pub trait ParameterizedHeader {
    /// Returns the parameter list.
    fn parameters(&self) -> &ParameterList;

    /// Returns the parameter list for modification.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadOnly`] if the header is read-only.
    fn parameters_mut(&mut self) -> Result<&mut ParameterList>;

    /// Returns the decoded value of a parameter (case-insensitive name).
    fn get_parameter(&self, name: &str) -> Option<&str> {
        self.parameters().get(name)
    }

    /// Checks whether a parameter is present (case-insensitive name).
    fn contains_parameter(&self, name: &str) -> bool {
        self.parameters().contains(name)
    }

    /// Sets a parameter, ignoring invalid names with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadOnly`] if the header is read-only.
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.parameters_mut()?.set(name, value)
    }

    /// Sets a parameter, failing on invalid names.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidParameter`] for invalid names and
    /// [`crate::Error::ReadOnly`] if the header is read-only.
    fn try_set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.parameters_mut()?.try_set(name, value)
    }

    /// Adds a parameter value, continuing an existing parameter.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidParameter`] for invalid names and
    /// [`crate::Error::ReadOnly`] if the header is read-only.
    fn add_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.parameters_mut()?.add(name, value)
    }

    /// Removes a parameter (case-insensitive name).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadOnly`] if the header is read-only.
    fn remove_parameter(&mut self, name: &str) -> Result<Option<ParameterValue>> {
        self.parameters_mut()?.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfold() {
        assert_eq!(unfold("text/plain;\r\n charset=utf-8"), "text/plain; charset=utf-8");
        assert_eq!(unfold("a;\r\n\t\tb"), "a; b");
        assert_eq!(unfold("a;\nb"), "a;b");
        assert_eq!(unfold("plain"), "plain");
    }

    #[test]
    fn test_prepare_strips_trailing_semicolon() {
        assert_eq!(prepare_parameterized_header("text/plain;"), "text/plain");
        assert_eq!(
            prepare_parameterized_header(" text/plain; charset=utf-8; "),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_prepare_strips_comment() {
        assert_eq!(prepare_parameterized_header("(text/plain)"), "text/plain");
        assert_eq!(
            prepare_parameterized_header("\"text/html\"; charset=utf-8"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            prepare_parameterized_header("(attachment); filename=a.txt"),
            "attachment; filename=a.txt"
        );
    }

    #[test]
    fn test_prepare_decodes_primary_encoded_word() {
        assert_eq!(
            prepare_parameterized_header(" =?us-ascii?Q?text/plain?= ; charset=utf-8"),
            "text/plain; charset=utf-8"
        );
        // Encoded words in parameters are left to the parameter parser
        assert_eq!(
            prepare_parameterized_header("text/plain; name==?utf-8?Q?a?="),
            "text/plain; name==?utf-8?Q?a?="
        );
    }

    #[test]
    fn test_strip_enclosing() {
        assert_eq!(strip_enclosing("'text/plain'"), "text/plain");
        assert_eq!(strip_enclosing("\""), "\"");
        assert_eq!(strip_enclosing("text/plain"), "text/plain");
    }
}
