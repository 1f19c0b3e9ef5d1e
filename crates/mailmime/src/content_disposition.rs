//! MIME content disposition handling.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::parameter::ParameterList;
use crate::parameterized::{ParameterizedHeader, prepare_parameterized_header};
use crate::{rfc2231, token};

/// Inline disposition.
pub const INLINE: &str = "inline";
/// Attachment disposition.
pub const ATTACHMENT: &str = "attachment";

/// Content disposition with parameters.
///
/// The disposition word is stored lower-cased.
#[derive(Debug, Clone)]
pub struct ContentDisposition {
    disposition: String,
    parameters: ParameterList,
    read_only: bool,
}

impl ContentDisposition {
    /// Creates a disposition without parameters. A blank word becomes
    /// `inline`.
    #[must_use]
    pub fn new(disposition: &str) -> Self {
        let disposition = disposition.trim().to_ascii_lowercase();
        Self {
            disposition: if disposition.is_empty() {
                INLINE.to_string()
            } else {
                disposition
            },
            parameters: ParameterList::new(),
            read_only: false,
        }
    }

    /// Creates an `inline` disposition.
    #[must_use]
    pub fn inline() -> Self {
        Self::new(INLINE)
    }

    /// Creates an `attachment` disposition with a file name.
    #[must_use]
    pub fn attachment(filename: &str) -> Self {
        let mut disposition = Self::new(ATTACHMENT);
        if let Err(err) = disposition.parameters.set("filename", filename) {
            tracing::warn!(%err, "Filename not added");
        }
        disposition
    }

    /// Parses a content disposition with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the disposition word is invalid and cannot be
    /// recovered.
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_with(s, &ParserConfig::default())
    }

    /// Parses a content disposition.
    ///
    /// Empty input yields `inline`. An invalid disposition word becomes
    /// `inline` when `config.regex_fallback` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentDisposition`] if the disposition word
    /// is invalid and recovery is disabled.
    pub fn parse_with(s: &str, config: &ParserConfig) -> Result<Self> {
        let prepared = prepare_parameterized_header(s);
        let semi = prepared.find(';').unwrap_or(prepared.len());
        let word = clean_disposition(&prepared[..semi]);

        let disposition = if word.is_empty() {
            INLINE.to_string()
        } else if token::is_token(&word) {
            word
        } else if config.regex_fallback {
            tracing::warn!(disposition = %word, "Invalid disposition, using inline");
            INLINE.to_string()
        } else {
            return Err(Error::InvalidContentDisposition(prepared));
        };

        let parameters = ParameterList::parse(&prepared[semi..])
            .with_mime_charset(config.default_mime_charset.clone());
        Ok(Self {
            disposition,
            parameters,
            read_only: false,
        })
    }

    /// Returns the lower-cased disposition word.
    #[must_use]
    pub fn disposition(&self) -> &str {
        &self.disposition
    }

    /// Sets the disposition word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentDisposition`] if `disposition` is not a
    /// token and [`Error::ReadOnly`] if this value is read-only.
    pub fn set_disposition(&mut self, disposition: &str) -> Result<()> {
        self.check_writable()?;
        let disposition = disposition.trim();
        if !token::is_token(disposition) {
            return Err(Error::InvalidContentDisposition(disposition.to_string()));
        }
        self.disposition = disposition.to_ascii_lowercase();
        Ok(())
    }

    /// Checks for `inline`.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.disposition.eq_ignore_ascii_case(INLINE)
    }

    /// Checks for `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition.eq_ignore_ascii_case(ATTACHMENT)
    }

    /// Returns the decoded filename parameter if present.
    #[must_use]
    pub fn filename_parameter(&self) -> Option<&str> {
        self.parameters.get("filename")
    }

    /// Checks whether a filename parameter is present.
    #[must_use]
    pub fn contains_filename_parameter(&self) -> bool {
        self.parameters.contains("filename")
    }

    /// Sets the filename parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if this value is read-only.
    pub fn set_filename_parameter(&mut self, filename: &str) -> Result<()> {
        self.set_parameter("filename", filename)
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
            return Err(Error::ReadOnly("content disposition"));
        }
        Ok(())
    }

    /// Serializes as an RFC 2045 header value, optionally dropping empty
    /// parameters.
    #[must_use]
    pub fn to_header_value(&self, skip_empty_params: bool) -> String {
        let mut out = self.disposition.clone();
        self.parameters.append_rfc2045(&mut out, skip_empty_params);
        out
    }
}

fn clean_disposition(raw: &str) -> String {
    let word = raw.trim();
    let word = if word.contains('%') {
        String::from_utf8_lossy(&rfc2231::percent_decode(word)).into_owned()
    } else {
        word.to_string()
    };
    word.trim_matches(['"', '\''])
        .trim()
        .to_ascii_lowercase()
}

impl ParameterizedHeader for ContentDisposition {
    fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> Result<&mut ParameterList> {
        self.check_writable()?;
        Ok(&mut self.parameters)
    }
}

impl Default for ContentDisposition {
    fn default() -> Self {
        Self::inline()
    }
}

impl FromStr for ContentDisposition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value(false))
    }
}

impl PartialEq for ContentDisposition {
    fn eq(&self, other: &Self) -> bool {
        self.disposition == other.disposition && self.parameters == other.parameters
    }
}

impl Eq for ContentDisposition {}

impl Hash for ContentDisposition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.disposition.hash(state);
        self.parameters.hash(state);
    }
}

impl PartialOrd for ContentDisposition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentDisposition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.disposition
            .cmp(&other.disposition)
            .then_with(|| self.parameters.cmp(&other.parameters))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attachment() {
        let cd = ContentDisposition::parse("Attachment; filename=\"report.pdf\"").unwrap();
        assert_eq!(cd.disposition(), "attachment");
        assert!(cd.is_attachment());
        assert!(!cd.is_inline());
        assert_eq!(cd.filename_parameter(), Some("report.pdf"));
    }

    #[test]
    fn test_parse_empty_is_inline() {
        for input in ["", " ", "; filename=a.txt"] {
            let cd = ContentDisposition::parse(input).unwrap();
            assert!(cd.is_inline());
        }
        let cd = ContentDisposition::parse("; filename=a.txt").unwrap();
        assert_eq!(cd.filename_parameter(), Some("a.txt"));
    }

    #[test]
    fn test_parse_percent_and_quotes() {
        let cd = ContentDisposition::parse("\"attachment\"; filename=a").unwrap();
        assert!(cd.is_attachment());
        let cd = ContentDisposition::parse("attach%6Dent").unwrap();
        assert!(cd.is_attachment());
    }

    #[test]
    fn test_parse_invalid() {
        let cd = ContentDisposition::parse("attach ment; filename=a.txt").unwrap();
        assert!(cd.is_inline());
        assert_eq!(cd.filename_parameter(), Some("a.txt"));

        let err = ContentDisposition::parse_with("attach ment", &ParserConfig::strict()).unwrap_err();
        assert_eq!(err, Error::InvalidContentDisposition("attach ment".to_string()));
    }

    #[test]
    fn test_parse_rfc2231_filename() {
        let cd = ContentDisposition::parse(
            "attachment; filename*0*=UTF-8''r%C3%A9sum; filename*1*=%C3%A9.doc",
        )
        .unwrap();
        assert_eq!(cd.filename_parameter(), Some("résumé.doc"));
    }

    #[test]
    fn test_set_filename_non_ascii() {
        let mut cd = ContentDisposition::parse("attachment").unwrap();
        cd.set_filename_parameter("résumé.doc").unwrap();
        assert_eq!(
            cd.to_string(),
            "attachment; filename=\"=?UTF-8?Q?r=C3=A9sum=C3=A9.doc?=\""
        );
        let reparsed = ContentDisposition::parse(&cd.to_string()).unwrap();
        assert_eq!(reparsed.filename_parameter(), Some("résumé.doc"));
        assert_eq!(reparsed, cd);
    }

    #[test]
    fn test_set_disposition() {
        let mut cd = ContentDisposition::inline();
        cd.set_disposition("ATTACHMENT").unwrap();
        assert!(cd.is_attachment());
        assert!(cd.set_disposition("a b").is_err());
    }

    #[test]
    fn test_read_only() {
        let mut cd = ContentDisposition::attachment("a.txt").read_only();
        assert_eq!(cd.set_disposition("inline"), Err(Error::ReadOnly("content disposition")));
        assert!(cd.set_filename_parameter("b.txt").is_err());
        assert_eq!(cd.filename_parameter(), Some("a.txt"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ContentDisposition::default().to_string(), "inline");
        assert_eq!(
            ContentDisposition::attachment("my file.txt").to_string(),
            "attachment; filename=\"my file.txt\""
        );
        let cd: ContentDisposition = "attachment; size=\"\"; filename=a".parse().unwrap();
        assert_eq!(cd.to_header_value(true), "attachment; filename=a");
    }
}
