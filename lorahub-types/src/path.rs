//! Typed field paths.
//!
//! A `FieldPath` is an ordered list of string segments addressing one node
//! of a device record tree, written in dotted form (`mac_settings.adr_margin`).
//! Keeping paths typed instead of passing dotted strings around makes prefix
//! relationships (ancestor/descendant) explicit wherever routing decisions
//! depend on them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An ordered, non-empty list of path segments into a device record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parses a dotted path. Empty paths and empty segments are errors.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidPath(s.to_string(), "must not be empty"));
        }
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidPath(s.to_string(), "empty segment"));
        }
        Ok(Self(segments))
    }

    /// Builds a path from owned segments. Panics in debug builds if any
    /// segment is empty; use `parse` for untrusted input.
    pub fn from_segments(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty() && segments.iter().all(|s| !s.is_empty()));
        Self(segments)
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; paths have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First segment of the path.
    pub fn head(&self) -> &str {
        &self.0[0]
    }

    /// The parent path, or `None` for a top-level path.
    pub fn parent(&self) -> Option<FieldPath> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Extends the path by one segment.
    pub fn child(&self, segment: &str) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Concatenates another path onto this one.
    pub fn join(&self, other: &FieldPath) -> FieldPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether `ancestor` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, ancestor: &FieldPath) -> bool {
        self.0.len() >= ancestor.0.len() && self.0[..ancestor.0.len()] == ancestor.0[..]
    }

    /// Whether this path is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &FieldPath) -> bool {
        other.0.len() > self.0.len() && other.starts_with(self)
    }

    /// The prefix of the first `n` segments. `n` must be in `1..=len()`.
    pub fn prefix(&self, n: usize) -> FieldPath {
        Self(self.0[..n].to_vec())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a list of dotted paths, panicking on malformed input.
///
/// Intended for static path lists known at compile time (selectors,
/// ownership tables, tests); use `FieldPath::parse` for untrusted input.
pub fn field_paths(paths: &[&str]) -> Vec<FieldPath> {
    paths
        .iter()
        .map(|p| FieldPath::parse(p).unwrap_or_else(|e| panic!("static path: {e}")))
        .collect()
}
