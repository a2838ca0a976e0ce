//! Structured document data and the value comparator.
//!
//! Document contents are a key→value mapping over JSON values. Field paths
//! address nested maps; patches apply a field mask where present entries set
//! and absent entries delete. The comparator gives all values a total order
//! (null < bool < number < string < array < map) so filters can compare
//! across documents deterministically.

use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Structured key→value document contents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectValue {
    fields: Map<String, Value>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Build from a JSON object.
    ///
    /// # Panics
    ///
    /// Panics when the value is not a JSON object.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => panic!("document data must be a JSON object, got {other}"),
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The value at `path`, if every intermediate step is a map that
    /// contains the next segment.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = &self.fields;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }

    /// Sets the value at `path`, creating intermediate maps and overwriting
    /// non-map intermediates.
    pub fn set(&mut self, path: &FieldPath, value: Value) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };
        let mut current = &mut self.fields;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = entry.as_object_mut().unwrap_or_else(|| unreachable!());
        }
        current.insert(last.clone(), value);
    }

    /// Deletes the value at `path`. Missing intermediates are a no-op.
    pub fn delete(&mut self, path: &FieldPath) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };
        let mut current = &mut self.fields;
        for segment in parents {
            match current.get_mut(segment).and_then(Value::as_object_mut) {
                Some(next) => current = next,
                None => return,
            }
        }
        current.remove(last);
    }

    /// Applies a patch: `Some` entries set, `None` entries delete.
    pub fn set_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (FieldPath, Option<Value>)>,
    {
        for (path, value) in entries {
            match value {
                Some(value) => self.set(&path, value),
                None => self.delete(&path),
            }
        }
    }
}

/// Rank of a value's type in the total order.
fn type_order(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// True when both values rank the same in the type order, so inequality
/// filters may compare them.
pub fn same_type_order(left: &Value, right: &Value) -> bool {
    type_order(left) == type_order(right)
}

/// Totally orders two JSON values: first by type order, then within the
/// type. Numbers compare numerically across integer/double representations.
pub fn compare(left: &Value, right: &Value) -> Ordering {
    match type_order(left).cmp(&type_order(right)) {
        Ordering::Equal => {}
        unequal => return unequal,
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => compare_arrays(a, b),
        (Value::Object(a), Value::Object(b)) => compare_maps(a, b),
        _ => unreachable!("type orders were equal"),
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(0.0);
    let b = b.as_f64().unwrap_or(0.0);
    // JSON numbers are never NaN.
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_arrays(a: &[Value], b: &[Value]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        match compare(left, right) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    a.len().cmp(&b.len())
}

/// Maps compare by their sorted key/value pairs; `BTreeMap`-like order over
/// an insertion-ordered representation.
fn compare_maps(a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    let mut a_keys: Vec<&String> = a.keys().collect();
    let mut b_keys: Vec<&String> = b.keys().collect();
    a_keys.sort();
    b_keys.sort();
    for (ka, kb) in a_keys.iter().zip(b_keys.iter()) {
        match ka.cmp(kb) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        match compare(&a[ka.as_str()], &b[kb.as_str()]) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    a_keys.len().cmp(&b_keys.len())
}

/// True when `haystack` contains an element comparing equal to `needle`.
pub fn contains(haystack: &[Value], needle: &Value) -> bool {
    haystack
        .iter()
        .any(|v| compare(v, needle) == Ordering::Equal)
}
