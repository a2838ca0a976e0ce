//! Path types addressing documents and fields.
//!
//! A [`ResourcePath`] names a position in the collection/document tree, a
//! [`DocumentKey`] is a resource path with document shape (an even number of
//! segments), and a [`FieldPath`] addresses a field inside document data.
//! All three are immutable value types with a total order.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved field name referring to the document key rather than a data field.
pub const KEY_FIELD_NAME: &str = "__name__";

/// A slash-separated path of non-empty segments, ordered segment-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// The empty (root) path.
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a path from owned segments. Empty segments are rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidResourcePath(segments.join("/")));
        }
        Ok(Self { segments })
    }

    /// Parse a slash-separated path. The empty string is rejected; use
    /// [`ResourcePath::empty`] for the root.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidResourcePath(path.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// A new path with one more segment.
    ///
    /// # Panics
    ///
    /// Panics if the segment is empty.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        assert!(!segment.is_empty(), "path segments must be non-empty");
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// A new path with all of `other`'s segments appended.
    pub fn append(&self, other: &ResourcePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The path without its last segment.
    ///
    /// # Panics
    ///
    /// Panics on the empty path.
    pub fn parent(&self) -> Self {
        assert!(!self.is_empty(), "the empty path has no parent");
        Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// True when every segment of `self` prefixes `other`. Every path is a
    /// prefix of itself.
    pub fn is_prefix_of(&self, other: &ResourcePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// True when `other` is exactly one segment below `self`. Documents in
    /// nested sub-collections do not qualify.
    pub fn is_immediate_parent_of(&self, other: &ResourcePath) -> bool {
        other.segments.len() == self.segments.len() + 1 && self.is_prefix_of(other)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// A resource path with document shape: alternating collection and document
/// segments, so an even, non-zero segment count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey {
    path: ResourcePath,
}

impl DocumentKey {
    /// Wrap a resource path, rejecting paths without document shape.
    pub fn from_path(path: ResourcePath) -> Result<Self> {
        if path.is_empty() || path.len() % 2 != 0 {
            return Err(Error::InvalidDocumentKey(path.to_string()));
        }
        Ok(Self { path })
    }

    /// Parse a slash-separated document path such as `"rooms/eros"`.
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_path(ResourcePath::parse(path)?)
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The path of the collection containing this document.
    pub fn collection_path(&self) -> ResourcePath {
        self.path.parent()
    }

    /// The id of the collection directly containing this document.
    pub fn collection_id(&self) -> &str {
        &self.path.segments()[self.path.len() - 2]
    }

    /// The final segment naming the document within its collection.
    pub fn document_id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    /// True when the innermost collection of this key has the given id.
    pub fn has_collection_id(&self, collection_id: &str) -> bool {
        self.collection_id() == collection_id
    }

    /// True when `path` has document shape.
    pub fn is_document_path(path: &ResourcePath) -> bool {
        !path.is_empty() && path.len() % 2 == 0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// A dot-separated path into document data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a field path from owned segments. Empty segments are rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(Error::InvalidFieldPath(segments.join(".")));
        }
        Ok(Self { segments })
    }

    /// Parse a dot-separated field path such as `"address.city"`.
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_segments(path.split('.'))
            .map_err(|_| Error::InvalidFieldPath(path.to_string()))
    }

    /// The sentinel path referring to the document key.
    pub fn key_path() -> Self {
        Self {
            segments: vec![KEY_FIELD_NAME.to_string()],
        }
    }

    /// True when this path is the document-key sentinel.
    pub fn is_key_field(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == KEY_FIELD_NAME
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
