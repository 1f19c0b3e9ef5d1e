//! MIME header handling.

use std::fmt;

use crate::content_disposition::ContentDisposition;
use crate::content_type::ContentType;
use crate::encoding::decode_encoded_words;
use crate::error::Result;

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Ordered collection of header fields.
///
/// Names keep their original case but are matched case-insensitively.
/// A name may occur more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    fields: Vec<(String, String)>,
}

impl HeaderCollection {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The new value takes the position of the first existing one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                self.fields[index] = (name.clone(), value);
                let mut i = index + 1;
                while i < self.fields.len() {
                    if self.fields[i].0.eq_ignore_ascii_case(&name) {
                        self.fields.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            None => self.fields.push((name, value)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.fields[i].1.as_str())
    }

    /// Gets all values for a header in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Gets the first value for a header with encoded words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_encoded_words)
    }

    /// Checks whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes all values for a header, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.fields.len()
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no header fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over all header fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses the Content-Type header.
    ///
    /// A missing header yields the default `text/plain; charset=us-ascii`.
    ///
    /// # Errors
    ///
    /// Returns an error if the header value cannot be parsed.
    pub fn content_type(&self) -> Result<ContentType> {
        self.get(CONTENT_TYPE)
            .map_or_else(|| Ok(ContentType::default()), ContentType::parse)
    }

    /// Replaces the Content-Type header.
    pub fn set_content_type(&mut self, content_type: &ContentType) {
        self.set(CONTENT_TYPE, content_type.to_string());
    }

    /// Parses the Content-Disposition header if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the header value cannot be parsed.
    pub fn content_disposition(&self) -> Result<Option<ContentDisposition>> {
        self.get(CONTENT_DISPOSITION)
            .map(ContentDisposition::parse)
            .transpose()
    }

    /// Replaces the Content-Disposition header.
    pub fn set_content_disposition(&mut self, disposition: &ContentDisposition) {
        self.set(CONTENT_DISPOSITION, disposition.to_string());
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///  continuation
    /// ```
    ///
    /// Parsing stops at the first empty line. Continuation lines are joined
    /// with a single space and lines without a colon are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    current = Some((name.trim().to_string(), value.trim().to_string()));
                }
                None => tracing::debug!(line, "Skipping malformed header line"),
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }
        headers
    }
}

impl fmt::Display for HeaderCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a HeaderCollection {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
