//! Ordered, key-unique containers for documents and keys.
//!
//! `insert` and `erase` take `&self` and return a new value, so a handle to
//! a map is a stable snapshot: later inserts through other handles are never
//! visible through it. The implementation is a copy-on-write snapshot over
//! ordered std maps; structural sharing is not part of the contract.

use crate::document::Document;
use crate::path::DocumentKey;
use std::collections::{BTreeMap, BTreeSet};

/// An ordered map from document keys to documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMap {
    entries: BTreeMap<DocumentKey, Document>,
}

impl DocumentMap {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A new map with the entry added or replaced.
    #[must_use]
    pub fn insert(&self, key: DocumentKey, document: Document) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key, document);
        Self { entries }
    }

    /// A new map without the entry; unchanged when the key is absent.
    #[must_use]
    pub fn erase(&self, key: &DocumentKey) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(key);
        Self { entries }
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&Document> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &DocumentKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocumentKey, &Document)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.entries.keys()
    }
}

impl FromIterator<(DocumentKey, Document)> for DocumentMap {
    fn from_iter<I: IntoIterator<Item = (DocumentKey, Document)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DocumentMap {
    type Item = (DocumentKey, Document);
    type IntoIter = std::collections::btree_map::IntoIter<DocumentKey, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// An ordered set of document keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentKeySet {
    keys: BTreeSet<DocumentKey>,
}

impl DocumentKeySet {
    pub fn new() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }

    /// A new set with the key added.
    #[must_use]
    pub fn insert(&self, key: DocumentKey) -> Self {
        let mut keys = self.keys.clone();
        keys.insert(key);
        Self { keys }
    }

    /// A new set without the key; unchanged when absent.
    #[must_use]
    pub fn erase(&self, key: &DocumentKey) -> Self {
        let mut keys = self.keys.clone();
        keys.remove(key);
        Self { keys }
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentKey> {
        self.keys.iter()
    }
}

impl FromIterator<DocumentKey> for DocumentKeySet {
    fn from_iter<I: IntoIterator<Item = DocumentKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DocumentKeySet {
    type Item = DocumentKey;
    type IntoIter = std::collections::btree_set::IntoIter<DocumentKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}
