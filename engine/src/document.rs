//! Document states across the local lifecycle.
//!
//! A document is always in exactly one of four states: never observed,
//! found with data, known to be missing, or unknown pending reconciliation.
//! Documents are plain owned values; every transformation produces a new
//! value and retrievals from storage always hand out independent copies.

use crate::path::{DocumentKey, FieldPath};
use crate::value::ObjectValue;
use crate::version::SnapshotVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a found document's data reflects pending local writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentState {
    /// Data matches the last server-confirmed state.
    Synced,
    /// Data includes writes not yet sent or not yet acknowledged.
    LocalMutations,
    /// Data includes writes acknowledged by the server but not yet caught up
    /// by a listen snapshot.
    CommittedMutations,
}

/// The four-state lifecycle of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DocumentKind {
    /// Never observed; the absence of data.
    Invalid,
    /// The document exists with the given contents.
    Found {
        version: SnapshotVersion,
        data: ObjectValue,
        state: DocumentState,
    },
    /// The document is known to not exist.
    Missing {
        version: SnapshotVersion,
        has_committed_mutations: bool,
    },
    /// Existence is indeterminate, e.g. after an acknowledged delete that a
    /// listen snapshot has not yet confirmed.
    Unknown { version: SnapshotVersion },
}

/// One document's state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    key: DocumentKey,
    kind: DocumentKind,
}

impl Document {
    /// A document that was never observed.
    pub fn invalid(key: DocumentKey) -> Self {
        Self {
            key,
            kind: DocumentKind::Invalid,
        }
    }

    /// A document that exists with the given contents, in synced state.
    pub fn found(key: DocumentKey, version: SnapshotVersion, data: ObjectValue) -> Self {
        Self {
            key,
            kind: DocumentKind::Found {
                version,
                data,
                state: DocumentState::Synced,
            },
        }
    }

    /// A document known to not exist.
    pub fn missing(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self {
            key,
            kind: DocumentKind::Missing {
                version,
                has_committed_mutations: false,
            },
        }
    }

    /// A document whose existence is indeterminate.
    pub fn unknown(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self {
            key,
            kind: DocumentKind::Unknown { version },
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    /// The document's update time; `NONE` when never observed.
    pub fn version(&self) -> SnapshotVersion {
        match &self.kind {
            DocumentKind::Invalid => SnapshotVersion::NONE,
            DocumentKind::Found { version, .. }
            | DocumentKind::Missing { version, .. }
            | DocumentKind::Unknown { version } => *version,
        }
    }

    /// The document contents when found.
    pub fn data(&self) -> Option<&ObjectValue> {
        match &self.kind {
            DocumentKind::Found { data, .. } => Some(data),
            _ => None,
        }
    }

    /// The value at `path` in the document contents, when found.
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        self.data().and_then(|data| data.get(path))
    }

    pub fn is_found_document(&self) -> bool {
        matches!(self.kind, DocumentKind::Found { .. })
    }

    pub fn is_missing_document(&self) -> bool {
        matches!(self.kind, DocumentKind::Missing { .. })
    }

    pub fn is_unknown_document(&self) -> bool {
        matches!(self.kind, DocumentKind::Unknown { .. })
    }

    /// True for any observed state; false only for the never-observed state.
    pub fn is_valid_document(&self) -> bool {
        !matches!(self.kind, DocumentKind::Invalid)
    }

    pub fn has_local_mutations(&self) -> bool {
        matches!(
            self.kind,
            DocumentKind::Found {
                state: DocumentState::LocalMutations,
                ..
            }
        )
    }

    pub fn has_committed_mutations(&self) -> bool {
        match &self.kind {
            DocumentKind::Found { state, .. } => *state == DocumentState::CommittedMutations,
            DocumentKind::Missing {
                has_committed_mutations,
                ..
            } => *has_committed_mutations,
            DocumentKind::Unknown { .. } => true,
            DocumentKind::Invalid => false,
        }
    }

    pub fn has_pending_writes(&self) -> bool {
        self.has_local_mutations() || self.has_committed_mutations()
    }

    /// Transition to the found state with new contents.
    pub fn into_found(self, version: SnapshotVersion, data: ObjectValue) -> Self {
        Self {
            key: self.key,
            kind: DocumentKind::Found {
                version,
                data,
                state: DocumentState::Synced,
            },
        }
    }

    /// Transition to the missing state.
    pub fn into_missing(self, version: SnapshotVersion) -> Self {
        Self {
            key: self.key,
            kind: DocumentKind::Missing {
                version,
                has_committed_mutations: false,
            },
        }
    }

    /// Transition to the unknown state.
    pub fn into_unknown(self, version: SnapshotVersion) -> Self {
        Self {
            key: self.key,
            kind: DocumentKind::Unknown { version },
        }
    }

    /// Marks the document as reflecting pending local writes.
    pub fn with_local_mutations(mut self) -> Self {
        match &mut self.kind {
            DocumentKind::Found { state, .. } => *state = DocumentState::LocalMutations,
            DocumentKind::Missing {
                has_committed_mutations,
                ..
            } => *has_committed_mutations = false,
            DocumentKind::Unknown { .. } | DocumentKind::Invalid => {}
        }
        self
    }

    /// Marks the document as reflecting acknowledged-but-unsynced writes.
    pub fn with_committed_mutations(mut self) -> Self {
        match &mut self.kind {
            DocumentKind::Found { state, .. } => *state = DocumentState::CommittedMutations,
            DocumentKind::Missing {
                has_committed_mutations,
                ..
            } => *has_committed_mutations = true,
            DocumentKind::Unknown { .. } | DocumentKind::Invalid => {}
        }
        self
    }
}
