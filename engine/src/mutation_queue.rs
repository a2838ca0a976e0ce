//! The pending-write log.
//!
//! The queue durably stores mutation batches in commit order. The read
//! contract consumed by the local view returns batches in strictly
//! increasing batch-id order with no duplicates; that ordering is
//! load-bearing for merge determinism and must be preserved by any
//! implementation.

use crate::batch::MutationBatch;
use crate::document_map::DocumentKeySet;
use crate::mutation::Mutation;
use crate::path::DocumentKey;
use crate::query::Query;
use crate::{BatchId, Timestamp};

/// Batch-lookup contract consumed by the local documents view.
pub trait MutationQueue {
    /// Every batch containing a mutation for the key, in batch-id order.
    fn all_mutation_batches_affecting_document_key(&self, key: &DocumentKey)
        -> Vec<MutationBatch>;

    /// Union across the key set, still globally ordered by batch id, with
    /// no duplicates.
    fn all_mutation_batches_affecting_document_keys(
        &self,
        keys: &DocumentKeySet,
    ) -> Vec<MutationBatch>;

    /// Every batch containing at least one mutation whose key is an
    /// immediate child of the query path, in batch-id order.
    fn all_mutation_batches_affecting_query(&self, query: &Query) -> Vec<MutationBatch>;
}

/// In-memory FIFO queue of pending batches.
#[derive(Debug, Clone)]
pub struct MemoryMutationQueue {
    next_batch_id: BatchId,
    batches: Vec<MutationBatch>,
}

impl MemoryMutationQueue {
    pub fn new() -> Self {
        Self {
            next_batch_id: 1,
            batches: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// The id the next enqueued batch will receive.
    pub fn next_batch_id(&self) -> BatchId {
        self.next_batch_id
    }

    /// Commits a new batch of mutations with the next batch id.
    ///
    /// # Panics
    ///
    /// Panics on an empty mutation list.
    pub fn add_mutation_batch(
        &mut self,
        local_write_time: Timestamp,
        mutations: Vec<Mutation>,
    ) -> &MutationBatch {
        let batch = MutationBatch::new(self.next_batch_id, local_write_time, mutations);
        self.next_batch_id += 1;
        self.batches.push(batch);
        self.batches.last().unwrap_or_else(|| unreachable!())
    }

    pub fn lookup_mutation_batch(&self, batch_id: BatchId) -> Option<&MutationBatch> {
        self.batches.iter().find(|b| b.batch_id() == batch_id)
    }

    /// Removes an acknowledged batch. Acknowledgement is FIFO: only the
    /// oldest pending batch may be removed.
    ///
    /// # Panics
    ///
    /// Panics when the batch is not the oldest pending batch.
    pub fn remove_mutation_batch(&mut self, batch_id: BatchId) {
        assert!(
            self.batches.first().map(MutationBatch::batch_id) == Some(batch_id),
            "can only remove the oldest mutation batch"
        );
        self.batches.remove(0);
    }

    pub fn all_mutation_batches(&self) -> &[MutationBatch] {
        &self.batches
    }

    fn batches_matching(
        &self,
        mut predicate: impl FnMut(&MutationBatch) -> bool,
    ) -> Vec<MutationBatch> {
        // `batches` is kept in insertion order and ids are assigned
        // monotonically, so a filtered scan preserves batch-id order.
        self.batches
            .iter()
            .filter(|b| predicate(b))
            .cloned()
            .collect()
    }
}

impl Default for MemoryMutationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationQueue for MemoryMutationQueue {
    fn all_mutation_batches_affecting_document_key(
        &self,
        key: &DocumentKey,
    ) -> Vec<MutationBatch> {
        self.batches_matching(|batch| batch.mutations().iter().any(|m| m.key() == key))
    }

    fn all_mutation_batches_affecting_document_keys(
        &self,
        keys: &DocumentKeySet,
    ) -> Vec<MutationBatch> {
        self.batches_matching(|batch| batch.mutations().iter().any(|m| keys.contains(m.key())))
    }

    fn all_mutation_batches_affecting_query(&self, query: &Query) -> Vec<MutationBatch> {
        self.batches_matching(|batch| {
            batch
                .mutations()
                .iter()
                .any(|m| query.path.is_immediate_parent_of(m.key().path()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ResourcePath;
    use crate::value::ObjectValue;
    use serde_json::json;

    fn key(path: &str) -> DocumentKey {
        DocumentKey::parse(path).unwrap()
    }

    fn set(path: &str) -> Mutation {
        Mutation::set(key(path), ObjectValue::from_json(json!({})))
    }

    #[test]
    fn batch_ids_are_monotonic_from_one() {
        let mut queue = MemoryMutationQueue::new();
        assert_eq!(queue.next_batch_id(), 1);

        let first = queue.add_mutation_batch(10, vec![set("rooms/a")]).batch_id();
        let second = queue.add_mutation_batch(20, vec![set("rooms/b")]).batch_id();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(queue.next_batch_id(), 3);
    }

    #[test]
    fn lookup_by_id() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a")]);
        assert!(queue.lookup_mutation_batch(1).is_some());
        assert!(queue.lookup_mutation_batch(9).is_none());
    }

    #[test]
    fn remove_is_fifo() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a")]);
        queue.add_mutation_batch(20, vec![set("rooms/b")]);

        queue.remove_mutation_batch(1);
        assert_eq!(queue.len(), 1);
        assert!(queue.lookup_mutation_batch(1).is_none());
        assert!(queue.lookup_mutation_batch(2).is_some());
    }

    #[test]
    #[should_panic(expected = "oldest mutation batch")]
    fn out_of_order_remove_is_fatal() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a")]);
        queue.add_mutation_batch(20, vec![set("rooms/b")]);
        queue.remove_mutation_batch(2);
    }

    #[test]
    fn batches_affecting_key_are_ordered_without_duplicates() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a"), set("rooms/b")]);
        queue.add_mutation_batch(20, vec![set("rooms/b")]);
        queue.add_mutation_batch(30, vec![set("rooms/a"), Mutation::delete(key("rooms/a"))]);

        let batches = queue.all_mutation_batches_affecting_document_key(&key("rooms/a"));
        let ids: Vec<BatchId> = batches.iter().map(MutationBatch::batch_id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn batches_affecting_keys_union_in_global_order() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a")]);
        queue.add_mutation_batch(20, vec![set("rooms/b")]);
        queue.add_mutation_batch(30, vec![set("rooms/c")]);

        let keys: DocumentKeySet = [key("rooms/a"), key("rooms/c")].into_iter().collect();
        let batches = queue.all_mutation_batches_affecting_document_keys(&keys);
        let ids: Vec<BatchId> = batches.iter().map(MutationBatch::batch_id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn batches_affecting_query_match_immediate_children_only() {
        let mut queue = MemoryMutationQueue::new();
        queue.add_mutation_batch(10, vec![set("rooms/a")]);
        queue.add_mutation_batch(20, vec![set("rooms/a/messages/1")]);
        queue.add_mutation_batch(30, vec![set("users/alice")]);
        queue.add_mutation_batch(40, vec![set("users/bob"), set("rooms/b")]);

        let query = Query::collection(ResourcePath::parse("rooms").unwrap());
        let batches = queue.all_mutation_batches_affecting_query(&query);
        let ids: Vec<BatchId> = batches.iter().map(MutationBatch::batch_id).collect();
        assert_eq!(ids, [1, 4]);
    }

    #[test]
    fn empty_queue_yields_empty_results() {
        let queue = MemoryMutationQueue::new();
        assert!(queue
            .all_mutation_batches_affecting_document_key(&key("rooms/a"))
            .is_empty());
        assert!(queue
            .all_mutation_batches_affecting_query(&Query::collection(
                ResourcePath::parse("rooms").unwrap()
            ))
            .is_empty());
    }
}
