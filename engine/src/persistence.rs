//! In-memory persistence: ownership and transaction scoping.
//!
//! The persistence layer exclusively owns the remote document cache, the
//! mutation queue, and the index manager. Callers bracket each logical
//! operation in [`MemoryPersistence::run`] so the components are observed
//! at a consistent instant; the in-memory implementation's begin and commit
//! are trivial, the bracketing is the contract.

use crate::batch::MutationBatch;
use crate::document::Document;
use crate::index_manager::{IndexManager, MemoryIndexManager};
use crate::local_view::LocalDocumentsView;
use crate::mutation::Mutation;
use crate::mutation_queue::MemoryMutationQueue;
use crate::remote_cache::{MemoryRemoteDocumentCache, RemoteDocumentCache};
use crate::version::SnapshotVersion;
use crate::{BatchId, Timestamp};

/// Owns the storage components and scopes access to them.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    remote_documents: MemoryRemoteDocumentCache,
    mutation_queue: MemoryMutationQueue,
    index_manager: MemoryIndexManager,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self {
            remote_documents: MemoryRemoteDocumentCache::new(),
            mutation_queue: MemoryMutationQueue::new(),
            index_manager: MemoryIndexManager::new(),
        }
    }

    /// Executes `body` inside one transaction scope. Everything the body
    /// reads is observed at a consistent instant; the scope commits on
    /// every exit path.
    pub fn run<T>(&mut self, label: &str, body: impl FnOnce(&mut Self) -> T) -> T {
        tracing::debug!(label, "begin transaction");
        let result = body(self);
        tracing::debug!(label, "commit transaction");
        result
    }

    pub fn remote_documents(&self) -> &MemoryRemoteDocumentCache {
        &self.remote_documents
    }

    pub fn remote_documents_mut(&mut self) -> &mut MemoryRemoteDocumentCache {
        &mut self.remote_documents
    }

    pub fn mutation_queue(&self) -> &MemoryMutationQueue {
        &self.mutation_queue
    }

    pub fn mutation_queue_mut(&mut self) -> &mut MemoryMutationQueue {
        &mut self.mutation_queue
    }

    pub fn index_manager(&self) -> &MemoryIndexManager {
        &self.index_manager
    }

    pub fn index_manager_mut(&mut self) -> &mut MemoryIndexManager {
        &mut self.index_manager
    }

    /// A merge view over the owned components.
    pub fn local_documents(&self) -> LocalDocumentsView<'_> {
        LocalDocumentsView::new(
            &self.remote_documents,
            &self.mutation_queue,
            &self.index_manager,
        )
    }

    /// Records a server-confirmed document state, keeping the
    /// collection-parent index current.
    pub fn apply_remote_document(&mut self, document: Document, read_time: SnapshotVersion) {
        self.index_manager
            .add_to_collection_parent_index(&document.key().collection_path());
        self.remote_documents.add(document, read_time);
    }

    /// Commits a batch of local writes, keeping the collection-parent index
    /// current. Returns the assigned batch id.
    pub fn write_locally(
        &mut self,
        local_write_time: Timestamp,
        mutations: Vec<Mutation>,
    ) -> BatchId {
        for mutation in &mutations {
            self.index_manager
                .add_to_collection_parent_index(&mutation.key().collection_path());
        }
        self.mutation_queue
            .add_mutation_batch(local_write_time, mutations)
            .batch_id()
    }

    /// Drops an acknowledged batch from the pending log.
    pub fn acknowledge_batch(&mut self, batch: &MutationBatch) {
        self.mutation_queue.remove_mutation_batch(batch.batch_id());
    }
}
