//! Header parameters (`; name=value`) with RFC 2231 continuation support.

mod list;
mod scan;
mod value;

pub use list::{DEFAULT_MIME_CHARSET, ParameterList};
pub use value::{Fragment, MAX_CONTINUATION_INDEX, ParameterValue};
