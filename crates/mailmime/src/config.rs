//! Parser configuration.
//!
//! Configuration is injected rather than read from global state. A
//! [`Parser`] resolves its [`ParserConfig`] once from a [`ConfigSource`] and
//! only picks up changes when [`Parser::reload`] is called.

use std::fmt;

use crate::content_disposition::ContentDisposition;
use crate::content_type::ContentType;
use crate::error::Result;

/// Options controlling lenient header parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ParserConfig {
    /// Recover malformed primary values with the regex-based parser instead
    /// of returning an error.
    pub regex_fallback: bool,
    /// When a Content-Type has no `/` at all, derive the type from the
    /// extension of its `name` parameter.
    pub guess_from_name: bool,
    /// Charset used when encoding non-ASCII parameter values.
    pub default_mime_charset: String,
}

impl ParserConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that rejects malformed input instead of recovering.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            regex_fallback: false,
            guess_from_name: false,
            ..Self::default()
        }
    }

    /// Sets whether regex recovery is enabled.
    #[must_use]
    pub const fn with_regex_fallback(mut self, enabled: bool) -> Self {
        self.regex_fallback = enabled;
        self
    }

    /// Sets whether file-name sniffing is enabled.
    #[must_use]
    pub const fn with_guess_from_name(mut self, enabled: bool) -> Self {
        self.guess_from_name = enabled;
        self
    }

    /// Sets the charset used for encoding parameter values.
    #[must_use]
    pub fn with_default_mime_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_mime_charset = charset.into();
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            regex_fallback: true,
            guess_from_name: true,
            default_mime_charset: "UTF-8".to_string(),
        }
    }
}

/// Supplies parser configuration, e.g. from an application settings layer.
pub trait ConfigSource: Send + Sync {
    /// Loads the current configuration.
    fn load(&self) -> ParserConfig;
}

impl ConfigSource for ParserConfig {
    fn load(&self) -> ParserConfig {
        self.clone()
    }
}

impl<F> ConfigSource for F
where
    F: Fn() -> ParserConfig + Send + Sync,
{
    fn load(&self) -> ParserConfig {
        self()
    }
}

/// Header parser bound to a configuration source.
pub struct Parser {
    source: Box<dyn ConfigSource>,
    config: ParserConfig,
}

impl Parser {
    /// Creates a parser, resolving the configuration immediately.
    #[must_use]
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        let config = source.load();
        Self {
            source: Box::new(source),
            config,
        }
    }

    /// Returns the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Re-reads the configuration from the source.
    pub fn reload(&mut self) {
        let config = self.source.load();
        if config != self.config {
            tracing::debug!(?config, "Parser configuration reloaded");
        }
        self.config = config;
    }

    /// Parses a Content-Type header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed under this
    /// configuration.
    pub fn content_type(&self, value: &str) -> Result<ContentType> {
        ContentType::parse_with(value, &self.config)
    }

    /// Parses a Content-Disposition header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed under this
    /// configuration.
    pub fn content_disposition(&self, value: &str) -> Result<ContentDisposition> {
        ContentDisposition::parse_with(value, &self.config)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(config.regex_fallback);
        assert!(config.guess_from_name);
        assert_eq!(config.default_mime_charset, "UTF-8");

        let strict = ParserConfig::strict();
        assert!(!strict.regex_fallback);
        assert!(!strict.guess_from_name);
    }

    #[test]
    fn test_parser_uses_config() {
        let lenient = Parser::default();
        assert!(lenient.content_type("te xt/plain").is_ok());

        let strict = Parser::new(ParserConfig::strict());
        assert!(strict.content_type("te xt/plain").is_err());
    }

    #[test]
    fn test_reload() {
        let flag = Arc::new(AtomicBool::new(true));
        let source_flag = Arc::clone(&flag);
        let mut parser = Parser::new(move || {
            ParserConfig::default().with_regex_fallback(source_flag.load(Ordering::SeqCst))
        });
        assert!(parser.config().regex_fallback);

        flag.store(false, Ordering::SeqCst);
        assert!(parser.config().regex_fallback);

        parser.reload();
        assert!(!parser.config().regex_fallback);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"regexFallback": false, "defaultMimeCharset": "ISO-8859-1"}"#)
                .unwrap();
        assert!(!config.regex_fallback);
        assert!(config.guess_from_name);
        assert_eq!(config.default_mime_charset, "ISO-8859-1");
    }
}
