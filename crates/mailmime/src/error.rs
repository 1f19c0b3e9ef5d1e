//! Error types for MIME header operations.

/// Result type alias for MIME header operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME header error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The primary value of a Content-Type header could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// The primary value of a Content-Disposition header could not be parsed.
    #[error("Invalid content disposition: {0}")]
    InvalidContentDisposition(String),

    /// A parameter name contains characters not allowed in a header token.
    #[error("Invalid parameter {name:?}: {reason}")]
    InvalidParameter {
        /// Offending parameter name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// The named charset is not known to the charset capability.
    #[error("Unsupported charset: {0}")]
    EncodingUnsupported(String),

    /// Attempt to mutate a read-only header value.
    #[error("Read-only {0} cannot be modified")]
    ReadOnly(&'static str),
}

impl Error {
    /// Returns `true` for failures of the primary header value.
    #[must_use]
    pub const fn is_invalid_primary_value(&self) -> bool {
        matches!(
            self,
            Self::InvalidContentType(_) | Self::InvalidContentDisposition(_)
        )
    }
}
