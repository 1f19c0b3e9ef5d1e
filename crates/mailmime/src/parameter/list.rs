//! Parameter lists of parameterized headers.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use super::scan::{self, RawParameter};
use super::value::{Fragment, MAX_CONTINUATION_INDEX, ParameterValue};
use crate::encoding::{decode_encoded_words, encode_word};
use crate::error::{Error, Result};
use crate::{charset, rfc2231, token};

/// Charset used for RFC 2047 encoding of direct values unless overridden.
pub const DEFAULT_MIME_CHARSET: &str = "UTF-8";

/// Ordered mapping of parameter names to values.
///
/// Names are stored lower-cased, so lookups are case-insensitive and
/// serialization emits parameters in case-insensitive lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    entries: BTreeMap<String, ParameterValue>,
    mime_charset: Option<String>,
    read_only: bool,
}

impl ParameterList {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a parameter string such as `; charset=utf-8; name="a b.txt"`.
    ///
    /// Malformed input never fails: unusable parameters are skipped.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut list = Self::new();
        for raw in scan::tokenize(input) {
            list.apply(raw);
        }
        list
    }

    fn apply(&mut self, raw: RawParameter) {
        let name = raw.name.to_ascii_lowercase();
        let Some((base, suffix)) = name.split_once('*') else {
            if let Err(reason) = token::check_parameter_name(&name) {
                tracing::debug!(%name, reason, "Skipping parameter");
                return;
            }
            let value = raw
                .value
                .map(|v| decode_encoded_words(&token::unquote(&v)));
            self.apply_direct(name, value);
            return;
        };

        if let Err(reason) = token::check_parameter_name(base) {
            tracing::debug!(%name, reason, "Skipping parameter");
            return;
        }
        let value = raw.value.map(|v| token::unquote(&v)).unwrap_or_default();

        if suffix.is_empty() {
            // name*=charset'lang'data
            let entry = self.continuation_entry(base);
            match rfc2231::split_prefix(&value) {
                Some((cs, lang, data)) => {
                    entry.set_charset(cs, Some(lang));
                    entry.set_fragment(0, Fragment::new(data, true));
                }
                None => entry.set_fragment(0, Fragment::new(value, true)),
            }
            return;
        }

        let (digits, encoded) = suffix
            .strip_suffix('*')
            .map_or((suffix, false), |digits| (digits, true));
        let Some(slot) = continuation_slot(digits) else {
            tracing::debug!(%name, "Skipping continuation with index out of range");
            return;
        };
        let entry = self.continuation_entry(base);
        match slot {
            Slot::Index(0) if encoded => match rfc2231::split_prefix(&value) {
                Some((cs, lang, data)) => {
                    entry.set_charset(cs, Some(lang));
                    entry.set_fragment(0, Fragment::new(data, true));
                }
                None => entry.set_fragment(0, Fragment::new(value, true)),
            },
            Slot::Index(index) => entry.set_fragment(index, Fragment::new(value, encoded)),
            Slot::Append => entry.push_fragment(Fragment::new(value, encoded)),
        }
    }

    fn apply_direct(&mut self, name: String, value: Option<String>) {
        if self.entries.get(&name).is_some_and(ParameterValue::is_rfc2231) {
            tracing::debug!(%name, "Ignoring plain value for RFC 2231 parameter");
            return;
        }
        let value = value.map_or_else(ParameterValue::valueless, ParameterValue::direct);
        self.entries.insert(name, value);
    }

    fn continuation_entry(&mut self, base: &str) -> &mut ParameterValue {
        let entry = self
            .entries
            .entry(base.to_string())
            .or_insert_with(|| ParameterValue::continuation(None, None));
        if !entry.is_rfc2231() {
            *entry = ParameterValue::continuation(None, None);
        }
        entry
    }

    /// Returns the decoded value of a parameter.
    ///
    /// A parameter present without `=` yields `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_value(name).and_then(ParameterValue::value)
    }

    /// Returns the full value of a parameter.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&ParameterValue> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// Checks whether a parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the lower-cased parameter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets a parameter, discarding any previous value including RFC 2231
    /// fragment state.
    ///
    /// Invalid names are logged and ignored; use [`Self::try_set`] to get
    /// an error instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the list is read-only.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        match self.try_set(name, value) {
            Err(Error::InvalidParameter { name, reason }) => {
                tracing::warn!(%name, reason, "Ignoring invalid parameter");
                Ok(())
            }
            other => other,
        }
    }

    /// Sets a parameter, failing on invalid names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for names containing whitespace,
    /// controls, non-ASCII or header special characters, and
    /// [`Error::ReadOnly`] if the list is read-only.
    pub fn try_set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.check_writable()?;
        let key = checked_name(name)?;
        self.entries.insert(key, ParameterValue::direct(value));
        Ok(())
    }

    /// Adds a parameter value. Adding to an existing parameter appends an
    /// RFC 2231 continuation fragment instead of overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for invalid names and
    /// [`Error::ReadOnly`] if the list is read-only.
    pub fn add(&mut self, name: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        let key = checked_name(name)?;
        match self.entries.get_mut(&key) {
            Some(existing) => existing.append_text(value),
            None => {
                self.entries.insert(key, ParameterValue::direct(value));
            }
        }
        Ok(())
    }

    /// Sets the RFC 2231 fragment `num` of a parameter from its wire form,
    /// padding skipped indices with empty fragments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for invalid names or a `num` above
    /// [`MAX_CONTINUATION_INDEX`], and [`Error::ReadOnly`] if the list is
    /// read-only.
    pub fn set_contiguous_value(&mut self, name: &str, num: usize, raw: &str) -> Result<()> {
        self.check_writable()?;
        let key = checked_name(name)?;
        if num > MAX_CONTINUATION_INDEX {
            return Err(Error::InvalidParameter {
                name: name.to_string(),
                reason: "continuation index out of range",
            });
        }
        self.continuation_entry(&key).set_contiguous_value(num, raw);
        Ok(())
    }

    /// Appends an RFC 2231 fragment in wire form to a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for invalid names and
    /// [`Error::ReadOnly`] if the list is read-only.
    pub fn add_contiguous_value(&mut self, name: &str, raw: &str) -> Result<()> {
        self.check_writable()?;
        let key = checked_name(name)?;
        self.continuation_entry(&key).add_contiguous_value(raw);
        Ok(())
    }

    /// Removes a parameter, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the list is read-only.
    pub fn remove(&mut self, name: &str) -> Result<Option<ParameterValue>> {
        self.check_writable()?;
        Ok(self.entries.remove(&name.to_ascii_lowercase()))
    }

    /// Removes all parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the list is read-only.
    pub fn clear(&mut self) -> Result<()> {
        self.check_writable()?;
        self.entries.clear();
        Ok(())
    }

    /// Sets the charset used to RFC 2047 encode non-ASCII direct values.
    #[must_use]
    pub fn with_mime_charset(mut self, charset: impl Into<String>) -> Self {
        self.mime_charset = Some(charset.into());
        self
    }

    /// Makes the list read-only; every later mutation fails.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns `true` if the list rejects mutation.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) const fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly("parameter list"));
        }
        Ok(())
    }

    /// Serializes the list as `; name=value` segments onto `out`.
    ///
    /// With `skip_empty`, parameters without a value or with an empty value
    /// are omitted.
    pub fn append_rfc2045(&self, out: &mut String, skip_empty: bool) {
        let mime_charset = self.mime_charset.as_deref().unwrap_or(DEFAULT_MIME_CHARSET);
        for (name, value) in &self.entries {
            if skip_empty && value.is_empty() {
                continue;
            }
            if value.is_rfc2231() {
                append_continuation(out, name, value);
                continue;
            }
            match value.value() {
                Some(text) => {
                    out.push_str("; ");
                    out.push_str(name);
                    out.push('=');
                    token::push_value(out, &encode_word(text, mime_charset));
                }
                None => {
                    out.push_str("; ");
                    out.push_str(name);
                }
            }
        }
    }

    /// Serializes the list, optionally dropping empty parameters.
    #[must_use]
    pub fn to_header_string(&self, skip_empty: bool) -> String {
        let mut out = String::new();
        self.append_rfc2045(&mut out, skip_empty);
        out
    }

    fn comparable(&self) -> impl Iterator<Item = (&str, Option<String>)> {
        self.iter()
            .map(|(name, value)| (name, value.value().map(str::to_lowercase)))
    }
}

/// Where a `name*N` fragment goes.
enum Slot {
    Index(usize),
    Append,
}

/// Maps a continuation suffix to its slot. Numeric suffixes above
/// [`MAX_CONTINUATION_INDEX`] (or too large for `usize`) yield `None`;
/// non-numeric ones append in arrival order.
fn continuation_slot(digits: &str) -> Option<Slot> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Some(Slot::Append);
    }
    digits
        .parse::<usize>()
        .ok()
        .filter(|&index| index <= MAX_CONTINUATION_INDEX)
        .map(Slot::Index)
}

fn checked_name(name: &str) -> Result<String> {
    token::check_parameter_name(name).map_err(|reason| Error::InvalidParameter {
        name: name.to_string(),
        reason,
    })?;
    Ok(name.to_ascii_lowercase())
}

/// Serializes an RFC 2231 value, falling back to a single UTF-8 `name*=`
/// segment whenever the declared charset would leave non-ASCII text.
fn append_continuation(out: &mut String, name: &str, value: &ParameterValue) {
    let start = out.len();
    write_continuation(out, name, value);
    if out[start..].is_ascii() {
        return;
    }

    tracing::debug!(%name, "Re-encoding continuation value in UTF-8");
    out.truncate(start);
    let language = value.language().filter(|lang| token::is_token(lang));
    out.push_str("; ");
    out.push_str(name);
    out.push_str("*=");
    out.push_str(&rfc2231::encode(
        value.value().unwrap_or_default(),
        DEFAULT_MIME_CHARSET,
        language,
        true,
        true,
    ));
}

fn write_continuation(out: &mut String, name: &str, value: &ParameterValue) {
    let charset_label = value.charset().unwrap_or(DEFAULT_MIME_CHARSET);
    let language = value.language().unwrap_or_default();
    let fragments: Vec<&Fragment> = value.fragments().iter().filter(|f| !f.is_empty()).collect();

    match fragments.as_slice() {
        [] => {
            out.push_str("; ");
            out.push_str(name);
            out.push_str("=\"\"");
        }
        [single] => {
            let decodable = charset::is_supported(charset_label);
            let decoded = value.value().unwrap_or_default();
            out.push_str("; ");
            out.push_str(name);
            if decoded.is_ascii() && (decodable || !single.is_encoded()) {
                out.push('=');
                token::push_value(out, decoded);
            } else if decodable {
                out.push_str("*=");
                out.push_str(&encode_with_fallback(decoded, charset_label, language));
            } else {
                // Cannot decode, so pass the wire form through untouched
                let _ = write!(out, "*={charset_label}'{language}'{}", single.raw());
            }
        }
        _ => {
            let segments: Vec<(String, bool)> = fragments
                .iter()
                .map(|f| {
                    if f.is_encoded() {
                        (f.raw().to_string(), true)
                    } else if f.raw().is_ascii() {
                        (f.raw().to_string(), false)
                    } else {
                        (rfc2231::encode(f.raw(), charset_label, None, false, true), true)
                    }
                })
                .collect();
            let any_encoded = segments.iter().any(|(_, encoded)| *encoded);

            for (index, (segment, encoded)) in segments.into_iter().enumerate() {
                out.push_str("; ");
                out.push_str(name);
                out.push('*');
                out.push_str(&index.to_string());
                if index == 0 && any_encoded {
                    let segment = if encoded {
                        segment
                    } else {
                        rfc2231::encode(&segment, charset_label, None, false, true)
                    };
                    out.push_str("*=");
                    out.push_str(&charset_label.to_ascii_lowercase());
                    out.push('\'');
                    out.push_str(language);
                    out.push('\'');
                    out.push_str(&segment);
                } else if encoded {
                    out.push_str("*=");
                    out.push_str(&segment);
                } else {
                    out.push('=');
                    token::push_value(out, &segment);
                }
            }
        }
    }
}

/// RFC 2231 encodes `text`, retrying in UTF-8 if the declared charset
/// cannot represent it.
fn encode_with_fallback(text: &str, charset_label: &str, language: &str) -> String {
    let language = (!language.is_empty()).then_some(language);
    let encoded = rfc2231::encode(text, charset_label, language, true, true);
    if encoded.is_ascii() {
        return encoded;
    }
    rfc2231::encode(text, DEFAULT_MIME_CHARSET, language, true, true)
}

impl fmt::Display for ParameterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_string(false))
    }
}

impl PartialEq for ParameterList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.comparable().eq(other.comparable())
    }
}

impl Eq for ParameterList {}

impl Hash for ParameterList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for entry in self.comparable() {
            entry.hash(state);
        }
    }
}

impl PartialOrd for ParameterList {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParameterList {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparable().cmp(other.comparable())
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = (&'a str, &'a ParameterValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
