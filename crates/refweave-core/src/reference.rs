//! JSON Reference parsing and formatting
//!
//! A reference has the shape `[url]#[/pointer]`. The text before the first
//! `#` names the document (empty means "this document"), the text after it
//! is a JSON pointer whose segments are escaped with `~0` (`~`) and `~1`
//! (`/`).
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed `$ref` value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonReference {
    url: Option<String>,
    pointer: Vec<String>,
}

impl JsonReference {
    /// Create a reference from its parts
    pub fn new(url: Option<String>, pointer: Vec<String>) -> Self {
        Self {
            url: url.filter(|u| !u.is_empty()),
            pointer,
        }
    }

    /// Create a same-document reference
    pub fn internal<I, S>(pointer: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: None,
            pointer: pointer.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a reference string
    ///
    /// Fails when there is no `#`, when a non-empty pointer does not start
    /// with `/`, or when a `~` is not followed by `0` or `1`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (url, pointer) = raw
            .split_once('#')
            .ok_or_else(|| Error::invalid_reference(raw, "missing '#' separator"))?;

        let pointer = parse_pointer(pointer).map_err(|reason| Error::invalid_reference(raw, reason))?;

        Ok(Self {
            url: (!url.is_empty()).then(|| url.to_string()),
            pointer,
        })
    }

    /// Document part of the reference, `None` for same-document references
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Unescaped pointer segments
    pub fn pointer(&self) -> &[String] {
        &self.pointer
    }

    /// Whether this reference points into the current document
    pub fn is_internal(&self) -> bool {
        self.url.is_none()
    }

    /// Whether the pointer begins with the given segments
    pub fn pointer_starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        self.pointer.len() >= prefix.len()
            && self
                .pointer
                .iter()
                .zip(prefix)
                .all(|(segment, expected)| segment == expected.as_ref())
    }

    /// Same reference with a different pointer
    pub fn with_pointer(&self, pointer: Vec<String>) -> Self {
        Self {
            url: self.url.clone(),
            pointer,
        }
    }
}

impl fmt::Display for JsonReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}",
            self.url.as_deref().unwrap_or(""),
            format_pointer(&self.pointer)
        )
    }
}

impl FromStr for JsonReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse the pointer part of a reference (after `#`) into segments
pub fn parse_pointer(pointer: &str) -> std::result::Result<Vec<String>, String> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }

    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| "JSON pointer must start with '/' or be empty".to_string())?;

    rest.split('/').map(unescape_segment).collect()
}

/// Join segments into an escaped pointer
pub fn format_pointer<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| format!("/{}", escape_segment(segment.as_ref())))
        .collect()
}

/// Escape one pointer segment
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape one pointer segment
pub fn unescape_segment(segment: &str) -> std::result::Result<String, String> {
    let mut result = String::with_capacity(segment.len());
    let mut chars = segment.chars();

    while let Some(ch) = chars.next() {
        if ch != '~' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => result.push('~'),
            Some('1') => result.push('/'),
            _ => {
                return Err(format!(
                    "invalid escape sequence in pointer segment '{}'",
                    segment
                ))
            }
        }
    }

    Ok(result)
}

/// Walk a document along unescaped pointer segments
pub fn resolve_pointer<'a, S: AsRef<str>>(document: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment.as_ref()),
            Value::Array(items) => segment
                .as_ref()
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        })
}
