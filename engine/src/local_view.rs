//! The local documents view: server-cached state merged with pending writes.
//!
//! This is the read path the application sees. Every read starts from the
//! remote document cache and folds the affecting mutation batches on top,
//! in batch-id order, so the result reflects locally-applied edits even
//! while disconnected. The view is stateless: it owns no data and holds
//! only non-owning references to its collaborators for the duration of a
//! call, which the persistence layer is expected to bracket in a single
//! transaction scope.

use crate::document::Document;
use crate::document_map::{DocumentKeySet, DocumentMap};
use crate::index_manager::IndexManager;
use crate::mutation_queue::MutationQueue;
use crate::path::DocumentKey;
use crate::query::Query;
use crate::remote_cache::RemoteDocumentCache;
use crate::version::SnapshotVersion;

/// Computes the authoritative local view for point lookups and queries.
pub struct LocalDocumentsView<'a> {
    remote_documents: &'a dyn RemoteDocumentCache,
    mutation_queue: &'a dyn MutationQueue,
    index_manager: &'a dyn IndexManager,
}

impl<'a> LocalDocumentsView<'a> {
    pub fn new(
        remote_documents: &'a dyn RemoteDocumentCache,
        mutation_queue: &'a dyn MutationQueue,
        index_manager: &'a dyn IndexManager,
    ) -> Self {
        Self {
            remote_documents,
            mutation_queue,
            index_manager,
        }
    }

    /// The local view of a single document: the cached base with every
    /// affecting batch applied in commit order.
    pub fn get_document(&self, key: &DocumentKey) -> Document {
        let batches = self
            .mutation_queue
            .all_mutation_batches_affecting_document_key(key);
        let mut document = self.remote_documents.get(key);
        for batch in &batches {
            document = batch.apply_to_local_document(document);
        }
        document
    }

    /// The local view of several documents, with one entry per requested
    /// key. The cache and queue are each consulted once.
    pub fn get_documents(&self, keys: &DocumentKeySet) -> DocumentMap {
        let docs = self.remote_documents.get_all(keys);
        self.local_view_of_documents(docs)
    }

    /// Applies affecting batches to already-fetched base documents.
    fn local_view_of_documents(&self, docs: DocumentMap) -> DocumentMap {
        let all_keys: DocumentKeySet = docs.keys().cloned().collect();
        let batches = self
            .mutation_queue
            .all_mutation_batches_affecting_document_keys(&all_keys);

        let mut results = DocumentMap::new();
        for (key, document) in docs.iter() {
            let mut local_view = document.clone();
            for batch in &batches {
                local_view = batch.apply_to_local_document(local_view);
            }
            results = results.insert(key.clone(), local_view);
        }
        results
    }

    /// Answers a query against the local view, dispatching on query shape.
    pub fn get_documents_matching_query(
        &self,
        query: &Query,
        since_read_time: SnapshotVersion,
    ) -> DocumentMap {
        if query.is_document_query() {
            self.get_documents_matching_document_query(query)
        } else if query.is_collection_group_query() {
            self.get_documents_matching_collection_group_query(query, since_read_time)
        } else {
            self.get_documents_matching_collection_query(query, since_read_time)
        }
    }

    fn get_documents_matching_document_query(&self, query: &Query) -> DocumentMap {
        // Just a single document lookup.
        let key = DocumentKey::from_path(query.path.clone())
            .expect("document queries carry a document path");
        let document = self.get_document(&key);
        let mut results = DocumentMap::new();
        if document.is_found_document() {
            results = results.insert(key, document);
        }
        results
    }

    fn get_documents_matching_collection_group_query(
        &self,
        query: &Query,
        since_read_time: SnapshotVersion,
    ) -> DocumentMap {
        assert!(
            query.path.is_empty(),
            "collection group queries are only supported at the root"
        );
        let collection_id = query
            .collection_group
            .as_deref()
            .expect("collection group queries carry a collection id");

        // Run a collection query against each parent containing the
        // collection id and aggregate the results.
        let mut results = DocumentMap::new();
        for parent in self.index_manager.get_collection_parents(collection_id) {
            let collection_query =
                query.as_collection_query_at_path(parent.child(collection_id));
            let collection_results =
                self.get_documents_matching_collection_query(&collection_query, since_read_time);
            for (key, document) in collection_results.iter() {
                results = results.insert(key.clone(), document.clone());
            }
        }
        results
    }

    fn get_documents_matching_collection_query(
        &self,
        query: &Query,
        since_read_time: SnapshotVersion,
    ) -> DocumentMap {
        let mut results = self.remote_documents.get_matching(query, since_read_time);
        let matching_batches = self.mutation_queue.all_mutation_batches_affecting_query(query);

        results = self.add_missing_base_documents(&matching_batches, results);

        for batch in &matching_batches {
            for mutation in batch.mutations() {
                // Only process documents belonging to this collection.
                if !query.path.is_immediate_parent_of(mutation.key().path()) {
                    continue;
                }
                let key = mutation.key().clone();
                // The base may be unset for documents not yet written to
                // the backend.
                let base = results
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| Document::invalid(key.clone()));
                let mutated = mutation.apply_to_local_view(base, batch.local_write_time());
                if mutated.is_found_document() {
                    results = results.insert(key, mutated);
                } else {
                    results = results.erase(&key);
                }
            }
        }

        // The mutation fold can both remove documents the cache scan
        // matched and surface documents the path-only scan never saw as
        // matching, so every survivor is re-checked against the full
        // predicate.
        let unfiltered = results.clone();
        for (key, document) in unfiltered.iter() {
            if !query.matches(document) {
                results = results.erase(key);
            }
        }

        tracing::debug!(
            path = %query.path,
            batches = matching_batches.len(),
            results = results.len(),
            "evaluated collection query against local view"
        );
        results
    }

    /// Inserts base documents for patched keys the remote scan missed: a
    /// patch's precondition and merge must be evaluated against the true
    /// base state, or the patch would appear to create a document.
    fn add_missing_base_documents(
        &self,
        matching_batches: &[crate::batch::MutationBatch],
        existing_docs: DocumentMap,
    ) -> DocumentMap {
        let mut missing_keys = DocumentKeySet::new();
        for batch in matching_batches {
            for mutation in batch.mutations() {
                if mutation.is_patch() && !existing_docs.contains_key(mutation.key()) {
                    missing_keys = missing_keys.insert(mutation.key().clone());
                }
            }
        }
        if missing_keys.is_empty() {
            return existing_docs;
        }

        let mut results = existing_docs;
        let missing_docs = self.remote_documents.get_all(&missing_keys);
        for (key, document) in missing_docs.iter() {
            if document.is_found_document() {
                results = results.insert(key.clone(), document.clone());
            }
        }
        results
    }
}
