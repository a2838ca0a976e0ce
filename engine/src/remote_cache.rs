//! Cache of the last-known server state per document.
//!
//! Each entry stores the server-confirmed document together with the read
//! time at which this client observed it. Removal leaves a tombstone so a
//! removed key reads back as unknown, distinct from a never-cached key.
//! Every read hands out an independent copy; callers can never mutate
//! cache-internal state through a returned document.

use crate::document::Document;
use crate::document_map::{DocumentKeySet, DocumentMap};
use crate::path::DocumentKey;
use crate::query::Query;
use crate::version::SnapshotVersion;
use std::collections::BTreeMap;

/// Storage contract for last-known server document state.
pub trait RemoteDocumentCache {
    /// Upserts the latest server-confirmed state, recording when it was
    /// read. Overwrites any prior entry for the same key.
    fn add(&mut self, document: Document, read_time: SnapshotVersion);

    /// Marks the key as having no cached server state. Removing an absent
    /// key is a no-op.
    fn remove(&mut self, key: &DocumentKey);

    /// The stored state, or an invalid document when never cached.
    fn get(&self, key: &DocumentKey) -> Document;

    /// One entry per requested key, with invalid documents as fillers; the
    /// result cardinality always equals the input cardinality.
    fn get_all(&self, keys: &DocumentKeySet) -> DocumentMap;

    /// Path-only scan: found documents immediately under the query path
    /// whose read time strictly exceeds `since_read_time`. Field filters
    /// are not evaluated here.
    fn get_matching(&self, query: &Query, since_read_time: SnapshotVersion) -> DocumentMap;
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Present {
        document: Document,
        read_time: SnapshotVersion,
    },
    Removed,
}

/// In-memory cache over an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteDocumentCache {
    entries: BTreeMap<DocumentKey, CacheEntry>,
}

impl MemoryRemoteDocumentCache {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RemoteDocumentCache for MemoryRemoteDocumentCache {
    fn add(&mut self, document: Document, read_time: SnapshotVersion) {
        assert!(
            document.is_valid_document(),
            "cannot cache an invalid document"
        );
        self.entries.insert(
            document.key().clone(),
            CacheEntry::Present {
                document,
                read_time,
            },
        );
    }

    fn remove(&mut self, key: &DocumentKey) {
        self.entries.insert(key.clone(), CacheEntry::Removed);
    }

    fn get(&self, key: &DocumentKey) -> Document {
        match self.entries.get(key) {
            None => Document::invalid(key.clone()),
            Some(CacheEntry::Present { document, .. }) => document.clone(),
            Some(CacheEntry::Removed) => Document::unknown(key.clone(), SnapshotVersion::NONE),
        }
    }

    fn get_all(&self, keys: &DocumentKeySet) -> DocumentMap {
        keys.iter()
            .map(|key| (key.clone(), self.get(key)))
            .collect()
    }

    fn get_matching(&self, query: &Query, since_read_time: SnapshotVersion) -> DocumentMap {
        self.entries
            .iter()
            .filter(|(key, _)| query.path.is_immediate_parent_of(key.path()))
            .filter_map(|(key, entry)| match entry {
                CacheEntry::Present {
                    document,
                    read_time,
                } if *read_time > since_read_time && document.is_found_document() => {
                    Some((key.clone(), document.clone()))
                }
                _ => None,
            })
            .collect()
    }
}
