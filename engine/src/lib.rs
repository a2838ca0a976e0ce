//! # Inlet Engine
//!
//! The local persistence and view layer of an offline-first document
//! database client.
//!
//! This crate answers reads (single documents, sets of documents, and
//! structured queries) by reconciling two sources of truth: a cache of the
//! last-known server state per document, and an ordered log of pending
//! local writes that the backend has not acknowledged yet. The merged
//! result is the "local view": what the application should see right now,
//! even while disconnected.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Deterministic**: pending writes fold in commit order, so the same
//!   inputs always produce the same local view
//! - **Value semantics**: every read returns an independent copy; nothing
//!   hands out references into storage
//! - **Testable**: pure logic over already-materialized data, no mocks
//!   needed
//!
//! ## Core Concepts
//!
//! ### Documents
//!
//! A [`Document`] is always in exactly one of four states: never observed,
//! found with data, known to be missing, or unknown pending
//! reconciliation. Document contents are a structured key→value mapping
//! ([`ObjectValue`]) addressed by [`FieldPath`]s.
//!
//! ### Mutations
//!
//! Pending writes are expressed as [`Mutation`]s (set, patch, delete, or
//! verify) grouped into atomically-committed [`MutationBatch`]es. Each
//! mutation carries a [`Precondition`]; a failed precondition leaves the
//! base document unchanged. Batch ids define commit order, which is the
//! sole source of determinism for overlapping edits.
//!
//! ### Storage
//!
//! The [`RemoteDocumentCache`] stores the last server-confirmed state per
//! document together with the *read time* it was observed at; the
//! [`MutationQueue`] stores pending batches. Both are owned by the
//! persistence layer ([`MemoryPersistence`]) and observed through one
//! transaction scope per logical operation.
//!
//! ### The local view
//!
//! [`LocalDocumentsView`] merges the two: point reads fold the affecting
//! batches onto the cached base, and queries additionally re-check the
//! full predicate after the fold, because local edits can both remove
//! remotely-matched documents and surface documents the cache scan never
//! saw as matching.
//!
//! ## Quick Start
//!
//! ```rust
//! use inlet_engine::{
//!     Document, DocumentKey, FieldMask, FieldPath, MemoryPersistence, Mutation, ObjectValue,
//!     Query, ResourcePath, SnapshotVersion,
//! };
//! use serde_json::json;
//!
//! let mut persistence = MemoryPersistence::new();
//!
//! // 1. Record server-confirmed state.
//! let key = DocumentKey::parse("rooms/eros").unwrap();
//! persistence.apply_remote_document(
//!     Document::found(
//!         key.clone(),
//!         SnapshotVersion::new(1),
//!         ObjectValue::from_json(json!({"name": "eros", "open": false})),
//!     ),
//!     SnapshotVersion::new(10),
//! );
//!
//! // 2. Commit a local write the backend has not seen yet.
//! persistence.write_locally(
//!     1_706_745_600_000,
//!     vec![Mutation::patch(
//!         key.clone(),
//!         ObjectValue::from_json(json!({"open": true})),
//!         FieldMask::new(vec![FieldPath::parse("open").unwrap()]),
//!     )],
//! );
//!
//! // 3. Reads reflect the merged local view.
//! let doc = persistence.run("ReadDocument", |p| p.local_documents().get_document(&key));
//! assert!(doc.has_local_mutations());
//! assert_eq!(doc.field(&FieldPath::parse("open").unwrap()), Some(&json!(true)));
//!
//! // 4. Queries see locally-applied edits too.
//! let query = Query::collection(ResourcePath::parse("rooms").unwrap());
//! let results = persistence.run("ExecuteQuery", |p| {
//!     p.local_documents()
//!         .get_documents_matching_query(&query, SnapshotVersion::NONE)
//! });
//! assert_eq!(results.len(), 1);
//! ```

pub mod batch;
pub mod document;
pub mod document_map;
pub mod error;
pub mod index_manager;
pub mod local_view;
pub mod mutation;
pub mod mutation_queue;
pub mod path;
pub mod persistence;
pub mod query;
pub mod remote_cache;
pub mod value;
pub mod version;

// Re-export main types at crate root
pub use batch::MutationBatch;
pub use document::{Document, DocumentKind, DocumentState};
pub use document_map::{DocumentKeySet, DocumentMap};
pub use error::{Error, Result};
pub use index_manager::{IndexManager, MemoryIndexManager};
pub use local_view::LocalDocumentsView;
pub use mutation::{FieldMask, FieldTransform, Mutation, Precondition, TransformOperation};
pub use mutation_queue::{MemoryMutationQueue, MutationQueue};
pub use path::{DocumentKey, FieldPath, ResourcePath, KEY_FIELD_NAME};
pub use persistence::MemoryPersistence;
pub use query::{Filter, FilterOperator, OrderBy, Query};
pub use remote_cache::{MemoryRemoteDocumentCache, RemoteDocumentCache};
pub use value::ObjectValue;
pub use version::SnapshotVersion;

/// Type aliases for clarity
pub type Timestamp = u64;
pub type BatchId = u64;
pub type CollectionId = String;
