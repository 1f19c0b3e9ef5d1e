//! MIME content type handling.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParserConfig;
use crate::encoding::decode_encoded_words;
use crate::error::{Error, Result};
use crate::memo::Memo;
use crate::mime_types::guess_from_file_name;
use crate::parameter::ParameterList;
use crate::parameterized::{ParameterizedHeader, prepare_parameterized_header};
use crate::{rfc2231, token};

const DEFAULT_PRIMARY_TYPE: &str = "application";
const CONTENT_TYPE_PREFIX: &str = "content-type:";

static DEFAULT_TEXT_PLAIN: LazyLock<ContentType> = LazyLock::new(|| {
    ContentType::from_parts("text", "plain", ParameterList::parse("charset=us-ascii")).read_only()
});

#[allow(clippy::expect_used)]
static LENIENT_BASE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]*)(/([A-Za-z0-9_.+-]*))?").expect("base type pattern")
});

/// Parsed Content-Type before parameters are decoded.
struct BaseType {
    primary: String,
    sub: String,
    /// Byte offset in the prepared value where parameters start.
    parameter_start: usize,
    /// No `/` appeared in the decoded primary value.
    missing_slash: bool,
}

/// MIME content type with parameters.
///
/// Type names keep the case they were given; comparisons and matching are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct ContentType {
    primary_type: String,
    sub_type: String,
    parameters: ParameterList,
    lower_base_type: Memo<String>,
    read_only: bool,
}

impl ContentType {
    /// Creates a new content type without parameters.
    ///
    /// A blank primary type becomes `application` and a blank subtype the
    /// default for the primary type.
    #[must_use]
    pub fn new(primary_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self::from_parts(primary_type, sub_type, ParameterList::new())
    }

    fn from_parts(
        primary_type: impl Into<String>,
        sub_type: impl Into<String>,
        parameters: ParameterList,
    ) -> Self {
        let mut primary_type = primary_type.into().trim().to_string();
        if primary_type.is_empty() {
            primary_type = DEFAULT_PRIMARY_TYPE.to_string();
        }
        let mut sub_type = sub_type.into().trim().to_string();
        if sub_type.is_empty() {
            sub_type = default_subtype(&primary_type).to_string();
        }
        Self {
            primary_type,
            sub_type,
            parameters,
            lower_base_type: Memo::new(),
            read_only: false,
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/alternative content type with boundary.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "alternative").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/related content type with boundary.
    #[must_use]
    pub fn multipart_related(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "related").with_parameter("boundary", boundary)
    }

    /// The shared read-only `text/plain; charset=us-ascii` default.
    #[must_use]
    pub fn default_text_plain() -> &'static Self {
        &DEFAULT_TEXT_PLAIN
    }

    /// Adds a parameter. Invalid names are ignored.
    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Err(err) = self.parameters.set(key, value) {
            tracing::warn!(%err, key, "Parameter not added");
        }
        self
    }

    /// Parses a content type string with the default configuration.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid and cannot be recovered.
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_with(s, &ParserConfig::default())
    }

    /// Parses a content type string.
    ///
    /// Empty input yields `text/plain; charset=us-ascii`. Malformed primary
    /// values are recovered when `config.regex_fallback` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the primary value is invalid
    /// and recovery is disabled.
    pub fn parse_with(s: &str, config: &ParserConfig) -> Result<Self> {
        let prepared = prepare_parameterized_header(s);
        if prepared.is_empty() {
            return Ok(Self::default());
        }

        let base = match parse_base_type(&prepared) {
            Ok(base) => base,
            Err(err) if config.regex_fallback => {
                tracing::debug!(%err, "Recovering malformed content type");
                parse_base_type_lenient(&prepared)
            }
            Err(err) => return Err(err),
        };

        let parameters = parse_parameters(&prepared, base.parameter_start)
            .with_mime_charset(config.default_mime_charset.clone());
        let mut content_type = Self::from_parts(base.primary, base.sub, parameters);

        if base.missing_slash
            && config.guess_from_name
            && let Some((primary, sub)) = content_type
                .name_parameter()
                .and_then(guess_from_file_name)
        {
            tracing::debug!(primary, sub, "Content type derived from name parameter");
            content_type.primary_type = primary.to_string();
            content_type.sub_type = sub.to_string();
        }

        Ok(content_type)
    }

    /// Returns the primary type (e.g., "text", "image", "multipart").
    #[must_use]
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// Returns the subtype (e.g., "plain", "html", "jpeg").
    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Returns `primary/sub` as given.
    #[must_use]
    pub fn base_type(&self) -> String {
        format!("{}/{}", self.primary_type, self.sub_type)
    }

    /// Returns the lower-cased base type, computed once per change.
    #[must_use]
    pub fn lower_base_type(&self) -> &str {
        self.lower_base_type
            .get_or_compute(|| self.base_type().to_ascii_lowercase())
    }

    /// Sets the primary type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if `primary_type` is not a valid
    /// type name and [`Error::ReadOnly`] if this value is read-only.
    pub fn set_primary_type(&mut self, primary_type: &str) -> Result<()> {
        self.check_writable()?;
        let primary_type = primary_type.trim();
        if !token::is_primary_type(primary_type) {
            return Err(Error::InvalidContentType(primary_type.to_string()));
        }
        self.primary_type = primary_type.to_string();
        self.lower_base_type.invalidate();
        Ok(())
    }

    /// Sets the subtype.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if `sub_type` is not a token and
    /// [`Error::ReadOnly`] if this value is read-only.
    pub fn set_sub_type(&mut self, sub_type: &str) -> Result<()> {
        self.check_writable()?;
        let sub_type = sub_type.trim();
        if !token::is_token(sub_type) {
            return Err(Error::InvalidContentType(sub_type.to_string()));
        }
        self.sub_type = sub_type.to_string();
        self.lower_base_type.invalidate();
        Ok(())
    }

    /// Replaces primary and subtype from a `primary/sub` string, keeping the
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if `base_type` cannot be parsed
    /// and [`Error::ReadOnly`] if this value is read-only.
    pub fn set_base_type(&mut self, base_type: &str) -> Result<()> {
        self.check_writable()?;
        let base_type = base_type.trim();
        let head = base_type.find(';').map_or(base_type, |i| &base_type[..i]);
        let base = parse_base_type(head)?;
        self.primary_type = base.primary;
        self.sub_type = base.sub;
        self.lower_base_type.invalidate();
        Ok(())
    }

    /// Checks the base type against a pattern, case-insensitively.
    ///
    /// `*` matches any run of characters and `?` any single character, so
    /// `text/*` matches every text type.
    #[must_use]
    pub fn is_mime_type(&self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if !pattern.contains(['*', '?']) {
            return self.lower_base_type().eq_ignore_ascii_case(pattern);
        }
        wildcard_regex(pattern).is_some_and(|re| re.is_match(self.lower_base_type()))
    }

    /// Checks the lower-cased base type against a compiled pattern.
    #[must_use]
    pub fn matches_base_type(&self, pattern: &Regex) -> bool {
        pattern.is_match(self.lower_base_type())
    }

    /// Checks whether the base type starts with `prefix`, case-insensitively.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.lower_base_type()
            .starts_with(&prefix.to_ascii_lowercase())
    }

    /// Checks whether the base type contains `needle`, case-insensitively.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lower_base_type().contains(&needle.to_ascii_lowercase())
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.primary_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.primary_type.eq_ignore_ascii_case("text")
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset_parameter(&self) -> Option<&str> {
        self.parameters.get("charset")
    }

    /// Checks whether a charset parameter is present.
    #[must_use]
    pub fn contains_charset_parameter(&self) -> bool {
        self.parameters.contains("charset")
    }

    /// Sets the charset parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if this value is read-only.
    pub fn set_charset_parameter(&mut self, charset: &str) -> Result<()> {
        self.set_parameter("charset", charset)
    }

    /// Returns the decoded name parameter if present.
    #[must_use]
    pub fn name_parameter(&self) -> Option<&str> {
        self.parameters.get("name")
    }

    /// Checks whether a name parameter is present.
    #[must_use]
    pub fn contains_name_parameter(&self) -> bool {
        self.parameters.contains("name")
    }

    /// Sets the name parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if this value is read-only.
    pub fn set_name_parameter(&mut self, name: &str) -> Result<()> {
        self.set_parameter("name", name)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary_parameter(&self) -> Option<&str> {
        self.parameters.get("boundary")
    }

    /// Sets the boundary parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if this value is read-only.
    pub fn set_boundary_parameter(&mut self, boundary: &str) -> Result<()> {
        self.set_parameter("boundary", boundary)
    }

    /// Makes this value read-only; every later mutation fails.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.parameters = self.parameters.read_only();
        self
    }

    /// Returns `true` if this value rejects mutation.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    const fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly("content type"));
        }
        Ok(())
    }

    /// Serializes as an RFC 2045 header value, optionally dropping empty
    /// parameters.
    #[must_use]
    pub fn to_header_value(&self, skip_empty_params: bool) -> String {
        let mut out = self.base_type();
        self.parameters.append_rfc2045(&mut out, skip_empty_params);
        out
    }
}

impl ParameterizedHeader for ContentType {
    fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> Result<&mut ParameterList> {
        self.check_writable()?;
        Ok(&mut self.parameters)
    }
}

/// Subtype used when none is given.
fn default_subtype(primary: &str) -> &'static str {
    if primary.eq_ignore_ascii_case("multipart") {
        "mixed"
    } else if primary.eq_ignore_ascii_case("text") {
        "plain"
    } else {
        "octet-stream"
    }
}

/// Structured parse of `type/subtype` up to the first `;`.
fn parse_base_type(value: &str) -> Result<BaseType> {
    let semi = value.find(';').unwrap_or(value.len());
    let head = &value[..semi];
    let slash = head
        .find('/')
        .ok_or_else(|| Error::InvalidContentType(value.to_string()))?;

    let primary = if slash == 0 {
        DEFAULT_PRIMARY_TYPE.to_string()
    } else {
        clean_primary(&head[..slash])
    };
    if !token::is_primary_type(&primary) {
        return Err(Error::InvalidContentType(value.to_string()));
    }

    // A comma here means a second value was appended to the header
    let sub_region = &head[slash + 1..];
    let (sub_raw, parameter_start) = match sub_region.find(',') {
        Some(comma) => (&sub_region[..comma], slash + 1 + comma),
        None => (sub_region, semi),
    };
    let sub = clean_sub(sub_raw);
    let sub = if token::is_token(&sub) {
        sub
    } else {
        if !sub.is_empty() {
            tracing::debug!(%sub, "Invalid subtype replaced by default");
        }
        default_subtype(&primary).to_string()
    };

    Ok(BaseType {
        primary,
        sub,
        parameter_start,
        missing_slash: false,
    })
}

fn clean_primary(raw: &str) -> String {
    let mut primary = percent_decoded(raw.trim());
    if let Some(rest) = primary.strip_prefix(['"', '\'']) {
        primary = rest.to_string();
    }
    if primary.len() >= CONTENT_TYPE_PREFIX.len()
        && primary.is_char_boundary(CONTENT_TYPE_PREFIX.len())
        && primary[..CONTENT_TYPE_PREFIX.len()].eq_ignore_ascii_case(CONTENT_TYPE_PREFIX)
    {
        primary = primary[CONTENT_TYPE_PREFIX.len()..].to_string();
    }
    primary.trim().to_string()
}

fn clean_sub(raw: &str) -> String {
    let sub = percent_decoded(raw.trim());
    sub.strip_suffix(['"', '\''])
        .unwrap_or(&sub)
        .trim()
        .to_string()
}

fn percent_decoded(value: &str) -> String {
    if value.contains('%') {
        String::from_utf8_lossy(&rfc2231::percent_decode(value)).into_owned()
    } else {
        value.to_string()
    }
}

/// Regex recovery of a malformed base type. Always yields a usable type.
fn parse_base_type_lenient(value: &str) -> BaseType {
    let semi = value.find(';').unwrap_or(value.len());
    let head = &value[..semi];

    let cleared: String = percent_decoded(&decode_encoded_words(head))
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '(' | ')'))
        .collect();
    let cleared = if cleared.len() >= CONTENT_TYPE_PREFIX.len()
        && cleared.is_char_boundary(CONTENT_TYPE_PREFIX.len())
        && cleared[..CONTENT_TYPE_PREFIX.len()].eq_ignore_ascii_case(CONTENT_TYPE_PREFIX)
    {
        &cleared[CONTENT_TYPE_PREFIX.len()..]
    } else {
        cleared.as_str()
    };
    let missing_slash = !cleared.contains('/');

    let (primary, sub) = LENIENT_BASE_TYPE.captures(cleared).map_or((None, None), |c| {
        (
            c.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty()),
            c.get(3).map(|m| m.as_str()).filter(|s| !s.is_empty()),
        )
    });

    let (primary, sub) = match (primary, sub) {
        (None, Some(sub)) => (DEFAULT_PRIMARY_TYPE.to_string(), sub.to_string()),
        (Some(primary), Some(sub)) => (primary.to_string(), sub.to_string()),
        (Some(primary), None) => (primary.to_string(), default_subtype(primary).to_string()),
        (None, None) => ("text".to_string(), "plain".to_string()),
    };
    tracing::debug!(%primary, %sub, "Recovered content type");

    BaseType {
        primary,
        sub,
        parameter_start: semi,
        missing_slash,
    }
}

/// Parses the parameters starting at `start`, which is a `;`, a `,` or the
/// end of the value.
fn parse_parameters(value: &str, start: usize) -> ParameterList {
    let rest = &value[start.min(value.len())..];
    match rest.strip_prefix(',') {
        Some(after_comma) => ParameterList::parse(&format!(";{after_comma}")),
        None => ParameterList::parse(rest),
    }
}

/// Translates a `*`/`?` wildcard pattern into an anchored, case-insensitive
/// regex.
fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?i)^");
    let mut literal = String::new();
    for c in pattern.chars() {
        if c == '*' || c == '?' {
            re.push_str(&regex::escape(&literal));
            literal.clear();
            re.push_str(if c == '*' { ".*" } else { "." });
        } else {
            literal.push(c);
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    Regex::new(&re).ok()
}

impl Default for ContentType {
    /// `text/plain; charset=us-ascii`, writable.
    fn default() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value(false))
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.lower_base_type() == other.lower_base_type() && self.parameters == other.parameters
    }
}

impl Eq for ContentType {}

impl Hash for ContentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower_base_type().hash(state);
        self.parameters.hash(state);
    }
}

impl PartialOrd for ContentType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary_type
            .to_ascii_lowercase()
            .cmp(&other.primary_type.to_ascii_lowercase())
            .then_with(|| {
                self.sub_type
                    .to_ascii_lowercase()
                    .cmp(&other.sub_type.to_ascii_lowercase())
            })
            .then_with(|| self.parameters.cmp(&other.parameters))
    }
}
