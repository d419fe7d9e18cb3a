//! Ordered, multi-valued header storage with normalized names.
//!
//! Header names are stored in a canonical form: the first letter and every
//! letter following `-` or `_` is upper-cased, all other letters are
//! lower-cased (`content-type` becomes `Content-Type`). Lookups normalize the
//! key the same way, so `get("HOST")` and `get("host")` find the same entry.
//!
//! Names must consist of token characters and values of printable ASCII plus
//! space and horizontal tab. Invalid input is rejected, never dropped: a
//! request that smuggles a bare CR into a value fails the whole parse.

use std::borrow::Cow;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::ensure;
use crate::protocol::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    entries: Vec<HeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Canonical form of a header name. Borrows when `name` is already normalized.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if is_normalized(name) {
        return Cow::Borrowed(name);
    }

    let mut normalized = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if upper_next {
            normalized.push(c.to_ascii_uppercase());
        } else {
            normalized.push(c.to_ascii_lowercase());
        }
        upper_next = c == '-' || c == '_';
    }
    Cow::Owned(normalized)
}

fn is_normalized(name: &str) -> bool {
    let mut upper_next = true;
    for b in name.bytes() {
        let expected_ok = if upper_next { !b.is_ascii_lowercase() } else { !b.is_ascii_uppercase() };
        if !expected_ok {
            return false;
        }
        upper_next = b == b'-' || b == b'_';
    }
    true
}

/// `tchar` from RFC 9110 section 5.6.2.
#[inline]
pub fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}

/// Visible ASCII, space and horizontal tab.
#[inline]
pub fn is_value_char(b: u8) -> bool {
    matches!(b, b'\t' | b' '..=b'~')
}

impl HeaderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends one header. Existing values for the same name are kept.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        self.append_bytes(name.as_bytes(), value.as_bytes())
    }

    pub(crate) fn append_bytes(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        ensure!(!name.is_empty() && name.iter().copied().all(is_token_char), ParseError::invalid_header_name(name));
        ensure!(value.iter().copied().all(is_value_char), ParseError::invalid_header_value(name));

        // both slices are ASCII at this point
        let name = std::str::from_utf8(name).map_err(|_| ParseError::invalid_header_name(name))?;
        let value = std::str::from_utf8(value).map_err(|_| ParseError::invalid_header_value(name.as_bytes()))?;

        let name = normalize_name(name);
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.values.push(value.to_owned()),
            None => self.entries.push(HeaderEntry { name: name.into_owned(), values: vec![value.to_owned()] }),
        }
        Ok(())
    }

    fn entry(&self, name: &str) -> Option<&HeaderEntry> {
        let name = normalize_name(name);
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|entry| entry.values.first()).map(String::as_str)
    }

    /// Every value stored under `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> impl Iterator<Item = &str> {
        self.entry(name).into_iter().flat_map(|entry| entry.values.iter().map(String::as_str))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored values across all names.
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.values.len()).sum()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// `(name, value)` pairs grouped by name in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|entry| entry.values.iter().map(move |value| (entry.name.as_str(), value.as_str())))
    }

    pub fn to_header_map(&self) -> Result<HeaderMap, http::Error> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (name, value) in self.iter() {
            map.append(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
        }
        Ok(map)
    }
}
