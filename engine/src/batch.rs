//! Mutation batches: atomically committed groups of pending writes.
//!
//! The batch id defines commit order. For any document key, batches must be
//! applied in strictly increasing batch-id order; that order is the sole
//! source of determinism for overlapping edits.

use crate::document::Document;
use crate::document_map::DocumentKeySet;
use crate::mutation::Mutation;
use crate::{BatchId, Timestamp};
use serde::{Deserialize, Serialize};

/// An ordered, immutable group of mutations committed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationBatch {
    batch_id: BatchId,
    local_write_time: Timestamp,
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    /// # Panics
    ///
    /// Panics on an empty mutation list.
    pub fn new(batch_id: BatchId, local_write_time: Timestamp, mutations: Vec<Mutation>) -> Self {
        assert!(!mutations.is_empty(), "cannot create an empty mutation batch");
        Self {
            batch_id,
            local_write_time,
            mutations,
        }
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// When the batch was committed locally; stands in for the server time
    /// until the write is acknowledged.
    pub fn local_write_time(&self) -> Timestamp {
        self.local_write_time
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// The set of document keys this batch writes.
    pub fn keys(&self) -> DocumentKeySet {
        self.mutations.iter().map(|m| m.key().clone()).collect()
    }

    /// Folds every mutation targeting the document's key onto it, in batch
    /// order.
    pub fn apply_to_local_document(&self, document: Document) -> Document {
        let mut document = document;
        for mutation in &self.mutations {
            if mutation.key() == document.key() {
                document = mutation.apply_to_local_view(document, self.local_write_time);
            }
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::FieldMask;
    use crate::path::{DocumentKey, FieldPath};
    use crate::value::ObjectValue;
    use crate::version::SnapshotVersion;
    use serde_json::json;

    fn key(path: &str) -> DocumentKey {
        DocumentKey::parse(path).unwrap()
    }

    fn data(value: serde_json::Value) -> ObjectValue {
        ObjectValue::from_json(value)
    }

    #[test]
    #[should_panic(expected = "empty mutation batch")]
    fn empty_batch_is_fatal() {
        MutationBatch::new(1, 0, Vec::new());
    }

    #[test]
    fn keys_collects_all_targets() {
        let batch = MutationBatch::new(
            1,
            100,
            vec![
                Mutation::set(key("rooms/a"), data(json!({}))),
                Mutation::delete(key("rooms/b")),
                Mutation::delete(key("rooms/a")),
            ],
        );
        let keys = batch.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&key("rooms/a")));
        assert!(keys.contains(&key("rooms/b")));
    }

    #[test]
    fn apply_skips_other_keys() {
        let batch = MutationBatch::new(
            1,
            100,
            vec![Mutation::set(key("rooms/other"), data(json!({"x": 1})))],
        );
        let base = Document::invalid(key("rooms/eros"));
        assert_eq!(batch.apply_to_local_document(base.clone()), base);
    }

    #[test]
    fn apply_folds_in_order() {
        let batch = MutationBatch::new(
            1,
            100,
            vec![
                Mutation::set(key("rooms/eros"), data(json!({"a": 1}))),
                Mutation::patch(
                    key("rooms/eros"),
                    data(json!({"b": 2})),
                    FieldMask::new(vec![FieldPath::parse("b").unwrap()]),
                ),
            ],
        );
        let result = batch.apply_to_local_document(Document::invalid(key("rooms/eros")));

        assert!(result.is_found_document());
        assert_eq!(
            result.data().unwrap().clone().into_json(),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn later_mutation_wins_within_batch() {
        let batch = MutationBatch::new(
            1,
            100,
            vec![
                Mutation::set(key("rooms/eros"), data(json!({"a": 1}))),
                Mutation::delete(key("rooms/eros")),
            ],
        );
        let base = Document::found(
            key("rooms/eros"),
            SnapshotVersion::new(1),
            data(json!({"old": true})),
        );
        let result = batch.apply_to_local_document(base);
        assert!(result.is_missing_document());
    }

    #[test]
    fn serialization_roundtrip() {
        let batch = MutationBatch::new(
            7,
            123,
            vec![Mutation::set(key("rooms/eros"), data(json!({"a": 1})))],
        );
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("\"batchId\":7"));
        let parsed: MutationBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(batch, parsed);
    }
}
