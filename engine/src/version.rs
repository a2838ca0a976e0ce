//! Snapshot versions: logical timestamps for document state.
//!
//! Two kinds of time are tracked with this type and must not be conflated:
//! *update time* (when a document's content last changed on the server) and
//! *read time* (when this client last observed that state). The remote
//! document cache records both per entry; incremental query scans filter on
//! read time only.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical timestamp, monotonic per document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SnapshotVersion(Timestamp);

impl SnapshotVersion {
    /// The zero version: "no version" for ordering, "epoch" for read-time
    /// filters (matches everything).
    pub const NONE: SnapshotVersion = SnapshotVersion(0);

    pub fn new(millis: Timestamp) -> Self {
        Self(millis)
    }

    pub fn millis(&self) -> Timestamp {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<Timestamp> for SnapshotVersion {
    fn from(millis: Timestamp) -> Self {
        Self(millis)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_zero_and_minimal() {
        assert!(SnapshotVersion::NONE.is_none());
        assert_eq!(SnapshotVersion::default(), SnapshotVersion::NONE);
        assert!(SnapshotVersion::NONE < SnapshotVersion::new(1));
    }

    #[test]
    fn ordering_by_millis() {
        assert!(SnapshotVersion::new(1) < SnapshotVersion::new(2));
        assert_eq!(SnapshotVersion::new(5), SnapshotVersion::from(5));
    }

    #[test]
    fn serialization_is_transparent() {
        let version = SnapshotVersion::new(42);
        assert_eq!(serde_json::to_string(&version).unwrap(), "42");
        let parsed: SnapshotVersion = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, version);
    }
}
