//! A single parameter value, plain or RFC 2231 continuation.

use crate::charset;
use crate::memo::Memo;
use crate::rfc2231;

/// Highest accepted continuation index (`name*999`).
pub const MAX_CONTINUATION_INDEX: usize = 999;

/// Charset assumed for continuations that never declared one.
pub(crate) const DEFAULT_CONTINUATION_CHARSET: &str = "UTF-8";

/// One RFC 2231 value fragment (`name*N` or `name*N*`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    raw: String,
    encoded: bool,
}

impl Fragment {
    /// Creates a fragment from its wire form.
    #[must_use]
    pub fn new(raw: impl Into<String>, encoded: bool) -> Self {
        Self {
            raw: raw.into(),
            encoded,
        }
    }

    /// Wire form of the fragment.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the fragment is percent-encoded (`name*N*`).
    #[must_use]
    pub const fn is_encoded(&self) -> bool {
        self.encoded
    }

    /// Returns `true` if the fragment carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Builds a fragment holding decoded `text`, percent-encoding it in
    /// `charset_label` when it is not safe to keep literally.
    fn from_text(text: &str, charset_label: &str) -> Self {
        if text.is_ascii() && !text.contains('%') {
            return Self::new(text, false);
        }
        let raw = rfc2231::encode(text, charset_label, None, false, true);
        if raw == text {
            Self::new(raw, false)
        } else {
            Self::new(raw, true)
        }
    }
}

#[derive(Debug, Clone)]
struct Continuation {
    charset: Option<String>,
    language: String,
    fragments: Vec<Fragment>,
    decoded: Memo<String>,
}

impl Continuation {
    fn new(charset: Option<String>, language: String) -> Self {
        Self {
            charset,
            language,
            fragments: Vec::new(),
            decoded: Memo::new(),
        }
    }

    fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CONTINUATION_CHARSET)
    }

    fn set(&mut self, index: usize, fragment: Fragment) {
        if index > MAX_CONTINUATION_INDEX {
            tracing::warn!(index, "Ignoring continuation fragment with index out of range");
            return;
        }
        if index >= self.fragments.len() {
            self.fragments.resize_with(index + 1, Fragment::default);
        }
        self.fragments[index] = fragment;
        self.decoded.invalidate();
    }

    fn push(&mut self, fragment: Fragment) {
        if self.fragments.len() > MAX_CONTINUATION_INDEX {
            tracing::warn!("Ignoring continuation fragment beyond the last index");
            return;
        }
        self.fragments.push(fragment);
        self.decoded.invalidate();
    }

    fn decoded(&self) -> &str {
        self.decoded.get_or_compute(|| self.decode())
    }

    fn decode(&self) -> String {
        let label = self.charset();
        if !charset::is_supported(label) {
            return self.fragments.iter().map(Fragment::raw).collect();
        }

        let mut out = String::new();
        let mut pending: Vec<u8> = Vec::new();
        let flush = |pending: &mut Vec<u8>, out: &mut String| {
            if !pending.is_empty() {
                out.push_str(&charset::decode(label, pending).unwrap_or_default());
                pending.clear();
            }
        };
        // Encoded runs are joined before charset decoding since a multi-byte
        // sequence may span fragments.
        for fragment in &self.fragments {
            if fragment.encoded {
                pending.extend(rfc2231::percent_decode(&fragment.raw));
            } else {
                flush(&mut pending, &mut out);
                out.push_str(&fragment.raw);
            }
        }
        flush(&mut pending, &mut out);
        out
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Direct(Option<String>),
    Continuation(Continuation),
}

/// Value of one named parameter.
///
/// A value is either *direct* (a single already-decoded string, or no value
/// at all for a bare `name`) or an RFC 2231 *continuation* made of indexed
/// fragments with a declared charset and language. Continuation values are
/// decoded lazily and cached until a fragment changes.
#[derive(Debug, Clone)]
pub struct ParameterValue {
    kind: Kind,
}

impl ParameterValue {
    /// Creates a direct value.
    #[must_use]
    pub fn direct(value: impl Into<String>) -> Self {
        Self {
            kind: Kind::Direct(Some(value.into())),
        }
    }

    /// Creates a value for a parameter present without `=`.
    #[must_use]
    pub const fn valueless() -> Self {
        Self {
            kind: Kind::Direct(None),
        }
    }

    /// Creates an empty RFC 2231 continuation value.
    #[must_use]
    pub fn continuation(charset: Option<&str>, language: Option<&str>) -> Self {
        Self {
            kind: Kind::Continuation(Continuation::new(
                charset.map(str::to_string),
                language.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Returns `true` if the value uses RFC 2231 continuation mode.
    #[must_use]
    pub const fn is_rfc2231(&self) -> bool {
        matches!(self.kind, Kind::Continuation(_))
    }

    /// Decoded value; `None` for a bare parameter without `=`.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            Kind::Direct(value) => value.as_deref(),
            Kind::Continuation(c) => Some(c.decoded()),
        }
    }

    /// Returns `true` if the value is absent or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value().is_none_or(str::is_empty)
    }

    /// Charset of a continuation value.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        match &self.kind {
            Kind::Direct(_) => None,
            Kind::Continuation(c) => Some(c.charset()),
        }
    }

    /// Language tag of a continuation value, if one was declared.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            Kind::Continuation(c) if !c.language.is_empty() => Some(&c.language),
            _ => None,
        }
    }

    /// Fragments of a continuation value; empty for direct values.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        match &self.kind {
            Kind::Direct(_) => &[],
            Kind::Continuation(c) => &c.fragments,
        }
    }

    /// Declares the charset and language of a continuation value.
    pub fn set_charset(&mut self, charset: &str, language: Option<&str>) {
        let c = self.as_continuation();
        c.charset = Some(charset.to_string());
        c.language = language.unwrap_or_default().to_string();
        c.decoded.invalidate();
    }

    /// Sets the fragment at `num` from its wire form.
    ///
    /// Skipped indices are filled with empty fragments. Indices above
    /// [`MAX_CONTINUATION_INDEX`] are ignored. Fragment 0 may carry
    /// a `charset'language'` prefix, which is then recorded as the value's
    /// charset. A fragment containing `%XX` escapes is treated as encoded.
    pub fn set_contiguous_value(&mut self, num: usize, raw: &str) {
        if num == 0
            && let Some((cs, lang, data)) = rfc2231::split_prefix(raw)
            && (cs.is_empty() || charset::is_supported(cs))
        {
            self.set_charset(cs, Some(lang));
            self.set_fragment(0, Fragment::new(data, true));
            return;
        }
        self.set_fragment(num, Fragment::new(raw, rfc2231::has_percent_escape(raw)));
    }

    /// Appends a fragment in wire form after the existing ones.
    pub fn add_contiguous_value(&mut self, raw: &str) {
        if self.fragments().is_empty() {
            self.set_contiguous_value(0, raw);
        } else {
            self.push_fragment(Fragment::new(raw, rfc2231::has_percent_escape(raw)));
        }
    }

    /// Appends decoded `text` as a new fragment, switching a direct value to
    /// continuation mode first.
    pub fn append_text(&mut self, text: &str) {
        let c = self.as_continuation();
        let fragment = Fragment::from_text(text, c.charset());
        c.push(fragment);
    }

    pub(crate) fn set_fragment(&mut self, num: usize, fragment: Fragment) {
        self.as_continuation().set(num, fragment);
    }

    pub(crate) fn push_fragment(&mut self, fragment: Fragment) {
        self.as_continuation().push(fragment);
    }

    /// Switches to continuation mode, carrying over a direct value as the
    /// first fragment.
    fn as_continuation(&mut self) -> &mut Continuation {
        if let Kind::Direct(value) = &mut self.kind {
            let mut c = Continuation::new(None, String::new());
            if let Some(text) = value.take().filter(|v| !v.is_empty()) {
                c.push(Fragment::from_text(&text, c.charset()));
            }
            self.kind = Kind::Continuation(c);
        }
        match &mut self.kind {
            Kind::Continuation(c) => c,
            Kind::Direct(_) => unreachable!("converted above"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::direct(value)
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::direct(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_direct() {
        let value = ParameterValue::direct("utf-8");
        assert!(!value.is_rfc2231());
        assert_eq!(value.value(), Some("utf-8"));
        assert_eq!(value.charset(), None);
        assert!(value.fragments().is_empty());

        let bare = ParameterValue::valueless();
        assert_eq!(bare.value(), None);
        assert!(bare.is_empty());
    }

    #[test]
    fn test_continuation_api_decodes() {
        let mut value = ParameterValue::continuation(None, None);
        value.set_contiguous_value(0, "utf-8'en'");
        value.set_contiguous_value(1, "%C3%A9");
        assert_eq!(value.charset(), Some("utf-8"));
        assert_eq!(value.language(), Some("en"));
        assert_eq!(value.value(), Some("é"));
    }

    #[test]
    fn test_multibyte_across_fragments() {
        let mut value = ParameterValue::continuation(Some("utf-8"), None);
        value.set_fragment(0, Fragment::new("caf%C3", true));
        value.set_fragment(1, Fragment::new("%A9", true));
        assert_eq!(value.value(), Some("café"));
    }

    #[test]
    fn test_gaps_are_padded() {
        let mut value = ParameterValue::continuation(None, None);
        value.set_contiguous_value(2, "c");
        assert_eq!(value.fragments().len(), 3);
        assert!(value.fragments()[0].is_empty());
        assert!(value.fragments()[1].is_empty());
        assert_eq!(value.value(), Some("c"));

        value.set_contiguous_value(0, "a");
        assert_eq!(value.value(), Some("ac"));
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut value = ParameterValue::continuation(Some("utf-8"), None);
        value.add_contiguous_value("one");
        assert_eq!(value.value(), Some("one"));
        value.add_contiguous_value("two");
        assert_eq!(value.value(), Some("onetwo"));
        value.set_contiguous_value(0, "zero");
        assert_eq!(value.value(), Some("zerotwo"));
    }

    #[test]
    fn test_unsupported_charset_keeps_raw() {
        let mut value = ParameterValue::continuation(Some("x-bogus"), None);
        value.set_fragment(0, Fragment::new("%E9", true));
        assert_eq!(value.value(), Some("%E9"));
    }

    #[test]
    fn test_non_prefix_apostrophes() {
        let mut value = ParameterValue::continuation(None, None);
        value.set_contiguous_value(0, "it's Bob's");
        assert_eq!(value.charset(), Some(DEFAULT_CONTINUATION_CHARSET));
        assert_eq!(value.value(), Some("it's Bob's"));
    }

    #[test]
    fn test_append_text_switches_mode() {
        let mut value = ParameterValue::direct("first ");
        value.append_text("séconde");
        assert!(value.is_rfc2231());
        assert_eq!(value.fragments().len(), 2);
        assert!(!value.fragments()[0].is_encoded());
        assert!(value.fragments()[1].is_encoded());
        assert_eq!(value.value(), Some("first séconde"));
    }

    #[test]
    fn test_index_above_limit_is_ignored() {
        let mut value = ParameterValue::continuation(None, None);
        value.set_contiguous_value(usize::MAX, "x");
        value.set_contiguous_value(MAX_CONTINUATION_INDEX + 1, "x");
        assert!(value.fragments().is_empty());

        value.set_contiguous_value(MAX_CONTINUATION_INDEX, "z");
        assert_eq!(value.fragments().len(), MAX_CONTINUATION_INDEX + 1);
        value.add_contiguous_value("overflow");
        assert_eq!(value.fragments().len(), MAX_CONTINUATION_INDEX + 1);
        assert_eq!(value.value(), Some("z"));
    }

    #[test]
    fn test_append_text_keeps_percent_literal() {
        let mut value = ParameterValue::valueless();
        value.append_text("100%41");
        assert_eq!(value.value(), Some("100%41"));
    }
}
