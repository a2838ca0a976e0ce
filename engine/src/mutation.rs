//! Pending local writes and their local apply semantics.
//!
//! A mutation is one of a closed set of write shapes. Applying a mutation to
//! the local view first checks its precondition against the base document; a
//! failed precondition returns the base unchanged rather than surfacing an
//! error. Field transforms are estimated locally and replaced by the
//! server's authoritative results on acknowledgement.

use crate::document::Document;
use crate::path::{DocumentKey, FieldPath};
use crate::value::{self, ObjectValue};
use crate::version::SnapshotVersion;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A guard that must hold for a mutation to take effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Precondition {
    /// Always holds.
    None,
    /// The document must exist (or must not, for `exists: false`).
    Exists { exists: bool },
    /// The document must exist with exactly this update time.
    UpdateTime { update_time: SnapshotVersion },
}

impl Precondition {
    pub fn none() -> Self {
        Precondition::None
    }

    pub fn exists(exists: bool) -> Self {
        Precondition::Exists { exists }
    }

    pub fn update_time(update_time: SnapshotVersion) -> Self {
        Precondition::UpdateTime { update_time }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Precondition::None)
    }

    /// Whether the guard holds for the given base document.
    pub fn is_validated_by(&self, document: &Document) -> bool {
        match self {
            Precondition::None => true,
            Precondition::Exists { exists } => document.is_found_document() == *exists,
            Precondition::UpdateTime { update_time } => {
                document.is_found_document() && document.version() == *update_time
            }
        }
    }
}

/// The set of field paths a patch mutation touches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMask {
    paths: Vec<FieldPath>,
}

impl FieldMask {
    pub fn new(paths: Vec<FieldPath>) -> Self {
        Self { paths }
    }

    pub fn covers(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<FieldPath> for FieldMask {
    fn from_iter<I: IntoIterator<Item = FieldPath>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// A server-computed transform, estimated locally until acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransformOperation {
    /// The server's commit time; estimated as the local write time.
    ServerTimestamp,
    /// Numeric addition onto the previous value.
    Increment { operand: serde_json::Number },
    /// Append each element not already present.
    ArrayUnion { elements: Vec<Value> },
    /// Remove every element comparing equal.
    ArrayRemove { elements: Vec<Value> },
}

impl TransformOperation {
    /// The locally-estimated result given the previous field value.
    pub fn apply_to_local_view(
        &self,
        previous: Option<&Value>,
        local_write_time: Timestamp,
    ) -> Value {
        match self {
            TransformOperation::ServerTimestamp => Value::from(local_write_time),
            TransformOperation::Increment { operand } => increment(previous, operand),
            TransformOperation::ArrayUnion { elements } => {
                let mut result = previous
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for element in elements {
                    if !value::contains(&result, element) {
                        result.push(element.clone());
                    }
                }
                Value::Array(result)
            }
            TransformOperation::ArrayRemove { elements } => {
                let mut result = previous
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                result.retain(|v| !value::contains(elements, v));
                Value::Array(result)
            }
        }
    }
}

/// Numeric add; a missing or non-numeric previous value counts as zero, and
/// integer arithmetic saturates.
fn increment(previous: Option<&Value>, operand: &serde_json::Number) -> Value {
    let base = previous.and_then(Value::as_number);
    let base_integer = match base {
        Some(n) => n.as_i64(),
        None => Some(0),
    };
    match (base_integer, operand.as_i64()) {
        (Some(base), Some(operand)) => Value::from(base.saturating_add(operand)),
        _ => {
            let base = base.and_then(|n| n.as_f64()).unwrap_or(0.0);
            let operand = operand.as_f64().unwrap_or(0.0);
            Value::from(base + operand)
        }
    }
}

/// A transform bound to the field it rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: FieldPath,
    pub transform: TransformOperation,
}

impl FieldTransform {
    pub fn new(field_path: FieldPath, transform: TransformOperation) -> Self {
        Self {
            field_path,
            transform,
        }
    }
}

/// A single pending write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Replace the full document contents.
    Set {
        key: DocumentKey,
        value: ObjectValue,
        precondition: Precondition,
        field_transforms: Vec<FieldTransform>,
    },
    /// Merge the masked fields; mask paths absent from the value are deletes.
    Patch {
        key: DocumentKey,
        value: ObjectValue,
        mask: FieldMask,
        precondition: Precondition,
        field_transforms: Vec<FieldTransform>,
    },
    /// Delete the document.
    Delete {
        key: DocumentKey,
        precondition: Precondition,
    },
    /// Assert the precondition; no data effect.
    Verify {
        key: DocumentKey,
        precondition: Precondition,
    },
}

impl Mutation {
    /// A full replace with no precondition.
    pub fn set(key: DocumentKey, value: ObjectValue) -> Self {
        Mutation::Set {
            key,
            value,
            precondition: Precondition::none(),
            field_transforms: Vec::new(),
        }
    }

    /// A field merge guarded by an exists precondition, the update surface's
    /// default.
    pub fn patch(key: DocumentKey, value: ObjectValue, mask: FieldMask) -> Self {
        Mutation::Patch {
            key,
            value,
            mask,
            precondition: Precondition::exists(true),
            field_transforms: Vec::new(),
        }
    }

    /// A delete with no precondition.
    pub fn delete(key: DocumentKey) -> Self {
        Mutation::Delete {
            key,
            precondition: Precondition::none(),
        }
    }

    /// A precondition assertion with no data effect.
    pub fn verify(key: DocumentKey, precondition: Precondition) -> Self {
        Mutation::Verify { key, precondition }
    }

    /// Replaces the precondition.
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        match &mut self {
            Mutation::Set {
                precondition: p, ..
            }
            | Mutation::Patch {
                precondition: p, ..
            }
            | Mutation::Delete {
                precondition: p, ..
            }
            | Mutation::Verify {
                precondition: p, ..
            } => *p = precondition,
        }
        self
    }

    /// Attaches field transforms.
    ///
    /// # Panics
    ///
    /// Panics for delete and verify mutations, which carry no data.
    pub fn with_field_transforms(mut self, transforms: Vec<FieldTransform>) -> Self {
        match &mut self {
            Mutation::Set {
                field_transforms, ..
            }
            | Mutation::Patch {
                field_transforms, ..
            } => *field_transforms = transforms,
            Mutation::Delete { .. } | Mutation::Verify { .. } => {
                panic!("field transforms require a set or patch mutation")
            }
        }
        self
    }

    pub fn key(&self) -> &DocumentKey {
        match self {
            Mutation::Set { key, .. }
            | Mutation::Patch { key, .. }
            | Mutation::Delete { key, .. }
            | Mutation::Verify { key, .. } => key,
        }
    }

    pub fn precondition(&self) -> &Precondition {
        match self {
            Mutation::Set { precondition, .. }
            | Mutation::Patch { precondition, .. }
            | Mutation::Delete { precondition, .. }
            | Mutation::Verify { precondition, .. } => precondition,
        }
    }

    pub fn is_patch(&self) -> bool {
        matches!(self, Mutation::Patch { .. })
    }

    /// Applies this mutation to a base document, producing the document the
    /// local view should show. A failed precondition returns the base
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics when the base document's key differs from the mutation's key.
    pub fn apply_to_local_view(&self, base: Document, local_write_time: Timestamp) -> Document {
        assert_eq!(
            base.key(),
            self.key(),
            "can only apply a mutation to a document with the same key"
        );
        if !self.precondition().is_validated_by(&base) {
            return base;
        }
        match self {
            Mutation::Set {
                value,
                field_transforms,
                ..
            } => {
                let mut new_value = value.clone();
                apply_local_transforms(&mut new_value, field_transforms, &base, local_write_time);
                let version = post_mutation_version(&base);
                base.into_found(version, new_value).with_local_mutations()
            }
            Mutation::Patch {
                value,
                mask,
                field_transforms,
                ..
            } => {
                let mut new_value = base.data().cloned().unwrap_or_default();
                new_value.set_all(
                    mask.iter()
                        .map(|path| (path.clone(), value.get(path).cloned())),
                );
                apply_local_transforms(&mut new_value, field_transforms, &base, local_write_time);
                let version = post_mutation_version(&base);
                base.into_found(version, new_value).with_local_mutations()
            }
            Mutation::Delete { .. } => base
                .into_missing(SnapshotVersion::NONE)
                .with_local_mutations(),
            Mutation::Verify { .. } => base,
        }
    }
}

/// Transform estimates read the previous value from the pre-mutation
/// document, not from the partially built contents.
fn apply_local_transforms(
    new_value: &mut ObjectValue,
    transforms: &[FieldTransform],
    base: &Document,
    local_write_time: Timestamp,
) {
    for transform in transforms {
        let previous = base.field(&transform.field_path);
        let transformed = transform
            .transform
            .apply_to_local_view(previous, local_write_time);
        new_value.set(&transform.field_path, transformed);
    }
}

/// The update time carried forward through a local write: the base version
/// when the base was found, otherwise no version.
fn post_mutation_version(base: &Document) -> SnapshotVersion {
    if base.is_found_document() {
        base.version()
    } else {
        SnapshotVersion::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(path: &str) -> DocumentKey {
        DocumentKey::parse(path).unwrap()
    }

    fn data(value: serde_json::Value) -> ObjectValue {
        ObjectValue::from_json(value)
    }

    fn field(path: &str) -> FieldPath {
        FieldPath::parse(path).unwrap()
    }

    fn base_doc(value: serde_json::Value) -> Document {
        Document::found(key("rooms/eros"), SnapshotVersion::new(5), data(value))
    }

    #[test]
    fn precondition_none_always_holds() {
        let p = Precondition::none();
        assert!(p.is_validated_by(&Document::invalid(key("rooms/eros"))));
        assert!(p.is_validated_by(&base_doc(json!({}))));
    }

    #[test]
    fn precondition_exists() {
        let must_exist = Precondition::exists(true);
        assert!(must_exist.is_validated_by(&base_doc(json!({}))));
        assert!(!must_exist.is_validated_by(&Document::invalid(key("rooms/eros"))));
        assert!(!must_exist
            .is_validated_by(&Document::missing(key("rooms/eros"), SnapshotVersion::new(1))));

        let must_not_exist = Precondition::exists(false);
        assert!(!must_not_exist.is_validated_by(&base_doc(json!({}))));
        assert!(must_not_exist.is_validated_by(&Document::invalid(key("rooms/eros"))));
    }

    #[test]
    fn precondition_update_time() {
        let p = Precondition::update_time(SnapshotVersion::new(5));
        assert!(p.is_validated_by(&base_doc(json!({}))));

        let stale = Document::found(key("rooms/eros"), SnapshotVersion::new(4), data(json!({})));
        assert!(!p.is_validated_by(&stale));
        assert!(!p.is_validated_by(&Document::missing(key("rooms/eros"), SnapshotVersion::new(5))));
    }

    #[test]
    fn set_replaces_contents() {
        let mutation = Mutation::set(key("rooms/eros"), data(json!({"name": "new"})));
        let result = mutation.apply_to_local_view(base_doc(json!({"name": "old", "x": 1})), 100);

        assert!(result.is_found_document());
        assert!(result.has_local_mutations());
        assert_eq!(result.version(), SnapshotVersion::new(5));
        assert_eq!(result.data().unwrap().clone().into_json(), json!({"name": "new"}));
    }

    #[test]
    fn set_creates_document_from_nothing() {
        let mutation = Mutation::set(key("rooms/eros"), data(json!({"name": "new"})));
        let result = mutation.apply_to_local_view(Document::invalid(key("rooms/eros")), 100);

        assert!(result.is_found_document());
        assert_eq!(result.version(), SnapshotVersion::NONE);
    }

    #[test]
    fn patch_merges_masked_fields() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({"name": "patched"})),
            FieldMask::new(vec![field("name")]),
        );
        let result = mutation.apply_to_local_view(base_doc(json!({"name": "old", "x": 1})), 100);

        assert_eq!(
            result.data().unwrap().clone().into_json(),
            json!({"name": "patched", "x": 1})
        );
        assert!(result.has_local_mutations());
    }

    #[test]
    fn patch_mask_without_value_deletes_field() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({})),
            FieldMask::new(vec![field("x")]),
        );
        let result = mutation.apply_to_local_view(base_doc(json!({"name": "old", "x": 1})), 100);

        assert_eq!(
            result.data().unwrap().clone().into_json(),
            json!({"name": "old"})
        );
    }

    #[test]
    fn patch_against_missing_base_is_noop() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({"name": "patched"})),
            FieldMask::new(vec![field("name")]),
        );
        let base = Document::invalid(key("rooms/eros"));
        let result = mutation.apply_to_local_view(base.clone(), 100);
        assert_eq!(result, base);
    }

    #[test]
    fn patch_without_precondition_creates_document() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({"name": "merged"})),
            FieldMask::new(vec![field("name")]),
        )
        .with_precondition(Precondition::none());

        let result = mutation.apply_to_local_view(Document::invalid(key("rooms/eros")), 100);
        assert!(result.is_found_document());
        assert_eq!(
            result.data().unwrap().clone().into_json(),
            json!({"name": "merged"})
        );
    }

    #[test]
    fn delete_produces_missing_document() {
        let mutation = Mutation::delete(key("rooms/eros"));
        let result = mutation.apply_to_local_view(base_doc(json!({"name": "old"})), 100);

        assert!(result.is_missing_document());
        assert_eq!(result.version(), SnapshotVersion::NONE);
        assert!(!result.has_committed_mutations());
    }

    #[test]
    fn failed_update_time_precondition_is_silent() {
        let mutation = Mutation::delete(key("rooms/eros"))
            .with_precondition(Precondition::update_time(SnapshotVersion::new(99)));
        let base = base_doc(json!({"name": "old"}));
        let result = mutation.apply_to_local_view(base.clone(), 100);
        assert_eq!(result, base);
    }

    #[test]
    fn verify_has_no_data_effect() {
        let mutation = Mutation::verify(key("rooms/eros"), Precondition::exists(true));
        let base = base_doc(json!({"name": "old"}));
        let result = mutation.apply_to_local_view(base.clone(), 100);
        assert_eq!(result, base);
    }

    #[test]
    #[should_panic(expected = "same key")]
    fn key_mismatch_is_fatal() {
        let mutation = Mutation::set(key("rooms/eros"), data(json!({})));
        mutation.apply_to_local_view(Document::invalid(key("rooms/other")), 100);
    }

    #[test]
    fn server_timestamp_estimates_local_write_time() {
        let mutation = Mutation::set(key("rooms/eros"), data(json!({})))
            .with_field_transforms(vec![FieldTransform::new(
                field("updatedAt"),
                TransformOperation::ServerTimestamp,
            )]);
        let result = mutation.apply_to_local_view(Document::invalid(key("rooms/eros")), 1234);
        assert_eq!(result.field(&field("updatedAt")), Some(&json!(1234)));
    }

    #[test]
    fn increment_reads_previous_document_value() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({})),
            FieldMask::default(),
        )
        .with_field_transforms(vec![FieldTransform::new(
            field("count"),
            TransformOperation::Increment {
                operand: serde_json::Number::from(5),
            },
        )]);
        let result = mutation.apply_to_local_view(base_doc(json!({"count": 2})), 100);
        assert_eq!(result.field(&field("count")), Some(&json!(7)));
    }

    #[test]
    fn increment_treats_missing_as_zero() {
        let op = TransformOperation::Increment {
            operand: serde_json::Number::from(3),
        };
        assert_eq!(op.apply_to_local_view(None, 0), json!(3));
        assert_eq!(op.apply_to_local_view(Some(&json!("nan")), 0), json!(3));
    }

    #[test]
    fn increment_saturates_integers() {
        let op = TransformOperation::Increment {
            operand: serde_json::Number::from(1),
        };
        assert_eq!(
            op.apply_to_local_view(Some(&json!(i64::MAX)), 0),
            json!(i64::MAX)
        );
    }

    #[test]
    fn array_union_appends_missing_elements() {
        let op = TransformOperation::ArrayUnion {
            elements: vec![json!(2), json!(3)],
        };
        assert_eq!(
            op.apply_to_local_view(Some(&json!([1, 2])), 0),
            json!([1, 2, 3])
        );
        assert_eq!(op.apply_to_local_view(None, 0), json!([2, 3]));
        assert_eq!(op.apply_to_local_view(Some(&json!("x")), 0), json!([2, 3]));
    }

    #[test]
    fn array_remove_drops_equal_elements() {
        let op = TransformOperation::ArrayRemove {
            elements: vec![json!(2)],
        };
        assert_eq!(
            op.apply_to_local_view(Some(&json!([1, 2, 2, 3])), 0),
            json!([1, 3])
        );
        assert_eq!(op.apply_to_local_view(None, 0), json!([]));
    }

    #[test]
    fn serialization_roundtrip() {
        let mutation = Mutation::patch(
            key("rooms/eros"),
            data(json!({"name": "x"})),
            FieldMask::new(vec![field("name")]),
        )
        .with_field_transforms(vec![FieldTransform::new(
            field("count"),
            TransformOperation::Increment {
                operand: serde_json::Number::from(1),
            },
        )]);

        let json = serde_json::to_string(&mutation).unwrap();
        assert!(json.contains("\"type\":\"patch\""));
        let parsed: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, parsed);
    }
}
