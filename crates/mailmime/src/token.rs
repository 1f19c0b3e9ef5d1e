//! RFC 2045 token grammar helpers.

/// Characters that may not appear unquoted in a header token.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// Characters that make a parameter name unusable.
const NAME_SPECIALS: &str = "\"()/:;<=>?@[]\\";

/// Checks if a character is valid in an RFC 2045 token.
#[inline]
#[must_use]
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !TSPECIALS.contains(c)
}

/// Checks if the string is a valid RFC 2045 token (1+ token chars).
#[must_use]
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Checks a primary media type: letters, digits, `_` and `-`.
#[must_use]
pub fn is_primary_type(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validates a parameter name, returning the reason it is rejected.
///
/// # Errors
///
/// Returns a static description when the name is empty or contains
/// whitespace, controls, non-ASCII or header special characters.
pub fn check_parameter_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty name");
    }
    for c in name.chars() {
        if !c.is_ascii() {
            return Err("non-ASCII character");
        }
        if c.is_ascii_whitespace() {
            return Err("whitespace");
        }
        if c.is_ascii_control() {
            return Err("control character");
        }
        if NAME_SPECIALS.contains(c) {
            return Err("header special character");
        }
    }
    Ok(())
}

/// Returns `true` if `value` must be quoted to appear as a parameter value.
#[must_use]
pub fn needs_quoting(value: &str) -> bool {
    value.is_empty() || !value.chars().all(is_token_char)
}

/// Appends `value` to `out`, quoting and escaping it when needed.
pub fn push_value(out: &mut String, value: &str) {
    if !needs_quoting(value) {
        out.push_str(value);
        return;
    }
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Strips one level of surrounding double quotes and resolves `\"` and
/// `\\` escapes inside them. Unquoted input is returned trimmed.
#[must_use]
pub fn unquote(value: &str) -> String {
    let value = value.trim();
    let Some(inner) = value
        .strip_prefix('"')
        .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_token() {
        assert!(is_token("octet-stream"));
        assert!(is_token("vnd.ms-excel"));
        assert!(is_token("svg+xml"));
        assert!(!is_token(""));
        assert!(!is_token("a b"));
        assert!(!is_token("a;b"));
        assert!(!is_token("é"));
    }

    #[test]
    fn test_is_primary_type() {
        assert!(is_primary_type("text"));
        assert!(is_primary_type("x-custom_type"));
        assert!(!is_primary_type("te.xt"));
        assert!(!is_primary_type(""));
    }

    #[test]
    fn test_check_parameter_name() {
        assert!(check_parameter_name("charset").is_ok());
        assert!(check_parameter_name("name*0*").is_ok());
        assert_eq!(check_parameter_name(""), Err("empty name"));
        assert_eq!(check_parameter_name("a b"), Err("whitespace"));
        assert_eq!(check_parameter_name("a=b"), Err("header special character"));
        assert_eq!(check_parameter_name("ä"), Err("non-ASCII character"));
    }

    #[test]
    fn test_push_value() {
        let mut out = String::new();
        push_value(&mut out, "utf-8");
        assert_eq!(out, "utf-8");

        out.clear();
        push_value(&mut out, "my file.txt");
        assert_eq!(out, "\"my file.txt\"");

        out.clear();
        push_value(&mut out, "say \"hi\"");
        assert_eq!(out, "\"say \\\"hi\\\"\"");

        out.clear();
        push_value(&mut out, "");
        assert_eq!(out, "\"\"");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"hello\""), "hello");
        assert_eq!(unquote("  hello "), "hello");
        assert_eq!(unquote("\"a \\\"b\\\" \\\\ c\""), "a \"b\" \\ c");
        assert_eq!(unquote("\"unterminated"), "unterminated");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("\"C:\\temp\""), "C:\\temp");
    }
}
