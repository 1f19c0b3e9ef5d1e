//! # mailmime
//!
//! Parsing and serialization of MIME parameterized header values.
//!
//! ## Features
//!
//! - **Content types**: `type/subtype; params` with lenient recovery of
//!   malformed values
//! - **Content dispositions**: `inline`/`attachment` plus parameters
//! - **Parameter lists**: RFC 2231 continuations, charsets and languages
//! - **Encoded words**: RFC 2047 decoding and encoding of parameter values
//! - **Header collections**: ordered, case-insensitive header blocks
//!
//! ## Quick Start
//!
//! ### Parsing a Content-Type
//!
//! ```
//! use mailmime::ContentType;
//!
//! let ct = ContentType::parse("text/html; charset=ISO-8859-1")?;
//! assert!(ct.is_mime_type("text/*"));
//! assert_eq!(ct.charset_parameter(), Some("ISO-8859-1"));
//! # Ok::<(), mailmime::Error>(())
//! ```
//!
//! ### Mutating and serializing
//!
//! ```
//! use mailmime::ContentType;
//!
//! let mut ct = ContentType::parse("text/html; charset=ISO-8859-1")?;
//! ct.set_charset_parameter("UTF-8")?;
//! assert_eq!(ct.to_string(), "text/html; charset=UTF-8");
//! # Ok::<(), mailmime::Error>(())
//! ```
//!
//! ### RFC 2231 file names
//!
//! ```
//! use mailmime::ContentDisposition;
//!
//! let cd = ContentDisposition::parse("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.doc")?;
//! assert_eq!(cd.filename_parameter(), Some("résumé.doc"));
//! # Ok::<(), mailmime::Error>(())
//! ```
//!
//! ### Strict parsing
//!
//! ```
//! use mailmime::{ContentType, ParserConfig};
//!
//! assert!(ContentType::parse("te xt/plain").is_ok());
//! assert!(ContentType::parse_with("te xt/plain", &ParserConfig::strict()).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod content_disposition;
mod content_type;
mod error;
mod header;
mod memo;
mod parameterized;

pub mod charset;
pub mod encoding;
pub mod mime_types;
pub mod parameter;
pub mod rfc2231;
pub mod token;

pub use config::{ConfigSource, Parser, ParserConfig};
pub use content_disposition::{ATTACHMENT, ContentDisposition, INLINE};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::HeaderCollection;
pub use parameter::{Fragment, ParameterList, ParameterValue};
pub use parameterized::{ParameterizedHeader, prepare_parameterized_header};
