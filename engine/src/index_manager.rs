//! Collection-parent index.
//!
//! Collection-group queries need every parent path that contains a
//! collection with a given id. Only that query surface is specified here;
//! how a full index manager selects or maintains field indexes is an
//! external concern.

use crate::path::ResourcePath;
use std::collections::{BTreeMap, BTreeSet};

/// Index surface consumed by the local documents view.
pub trait IndexManager {
    /// Records that a collection exists at `collection_path`, so its parent
    /// is findable by collection id.
    ///
    /// # Panics
    ///
    /// Panics when the path does not have collection shape (an odd number
    /// of segments).
    fn add_to_collection_parent_index(&mut self, collection_path: &ResourcePath);

    /// All known parent paths containing a collection with the given id.
    /// Duplicate-free; order is not significant.
    fn get_collection_parents(&self, collection_id: &str) -> Vec<ResourcePath>;
}

/// In-memory collection-parent index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexManager {
    collection_parents: BTreeMap<String, BTreeSet<ResourcePath>>,
}

impl MemoryIndexManager {
    pub fn new() -> Self {
        Self {
            collection_parents: BTreeMap::new(),
        }
    }
}

impl IndexManager for MemoryIndexManager {
    fn add_to_collection_parent_index(&mut self, collection_path: &ResourcePath) {
        assert!(
            collection_path.len() % 2 == 1,
            "expected a collection path, got {collection_path}"
        );
        let collection_id = collection_path
            .last_segment()
            .unwrap_or_default()
            .to_string();
        self.collection_parents
            .entry(collection_id)
            .or_default()
            .insert(collection_path.parent());
    }

    fn get_collection_parents(&self, collection_id: &str) -> Vec<ResourcePath> {
        self.collection_parents
            .get(collection_id)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }
}
