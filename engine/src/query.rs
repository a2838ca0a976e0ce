//! Structured queries over documents.
//!
//! A query targets either a single document path, one collection under a
//! fixed parent, or a collection id across all parents (collection group).
//! Matching combines the path shape, field filters, and order-by
//! feasibility; a document matches only when it is found with data.

use crate::document::Document;
use crate::path::{DocumentKey, FieldPath, ResourcePath};
use crate::value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Relational operators for field filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
    ArrayContainsAny,
    NotIn,
}

/// A single field predicate.
///
/// Filters on the reserved key field compare the document key against
/// reference paths instead of data values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field: FieldPath,
    pub op: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: FieldPath, op: FilterOperator, value: Value) -> Self {
        Self { field, op, value }
    }

    /// Whether the document satisfies this predicate.
    pub fn matches(&self, document: &Document) -> bool {
        if self.field.is_key_field() {
            return self.matches_key(document.key());
        }
        let field_value = document.field(&self.field);
        match self.op {
            FilterOperator::ArrayContains => field_value
                .and_then(Value::as_array)
                .is_some_and(|array| value::contains(array, &self.value)),
            FilterOperator::In => self
                .value
                .as_array()
                .zip(field_value)
                .is_some_and(|(operands, v)| value::contains(operands, v)),
            FilterOperator::ArrayContainsAny => field_value
                .and_then(Value::as_array)
                .zip(self.value.as_array())
                .is_some_and(|(array, operands)| {
                    operands.iter().any(|operand| value::contains(array, operand))
                }),
            FilterOperator::NotIn => self
                .value
                .as_array()
                .zip(field_value)
                .is_some_and(|(operands, v)| !v.is_null() && !value::contains(operands, v)),
            FilterOperator::NotEqual => field_value.is_some_and(|v| {
                !v.is_null() && value::compare(v, &self.value) != Ordering::Equal
            }),
            _ => field_value.is_some_and(|v| {
                // Inequalities never match across value types.
                value::same_type_order(v, &self.value)
                    && self.matches_comparison(value::compare(v, &self.value))
            }),
        }
    }

    fn matches_key(&self, key: &DocumentKey) -> bool {
        match self.op {
            FilterOperator::In => self.value.as_array().is_some_and(|operands| {
                operands
                    .iter()
                    .filter_map(reference_key)
                    .any(|operand| operand == *key)
            }),
            FilterOperator::NotIn => self.value.as_array().is_some_and(|operands| {
                !operands
                    .iter()
                    .filter_map(reference_key)
                    .any(|operand| operand == *key)
            }),
            FilterOperator::ArrayContains | FilterOperator::ArrayContainsAny => false,
            op => reference_key(&self.value).is_some_and(|operand| {
                let comparison = key.cmp(&operand);
                Self::comparison_matches(op, comparison)
            }),
        }
    }

    fn matches_comparison(&self, comparison: Ordering) -> bool {
        Self::comparison_matches(self.op, comparison)
    }

    fn comparison_matches(op: FilterOperator, comparison: Ordering) -> bool {
        match op {
            FilterOperator::LessThan => comparison == Ordering::Less,
            FilterOperator::LessThanOrEqual => comparison != Ordering::Greater,
            FilterOperator::Equal => comparison == Ordering::Equal,
            FilterOperator::NotEqual => comparison != Ordering::Equal,
            FilterOperator::GreaterThan => comparison == Ordering::Greater,
            FilterOperator::GreaterThanOrEqual => comparison != Ordering::Less,
            FilterOperator::ArrayContains
            | FilterOperator::In
            | FilterOperator::ArrayContainsAny
            | FilterOperator::NotIn => false,
        }
    }
}

/// Parses a reference value (a slash-separated document path) used by
/// key-field filters.
fn reference_key(value: &Value) -> Option<DocumentKey> {
    value.as_str().and_then(|s| DocumentKey::parse(s).ok())
}

/// An ordering constraint; used locally only for feasibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field: FieldPath,
    pub ascending: bool,
}

impl OrderBy {
    pub fn ascending(field: FieldPath) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn descending(field: FieldPath) -> Self {
        Self {
            field,
            ascending: false,
        }
    }
}

/// A structured query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub path: ResourcePath,
    pub collection_group: Option<String>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    /// A query over one collection under a fixed parent path.
    pub fn collection(path: ResourcePath) -> Self {
        Self {
            path,
            collection_group: None,
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// A query for exactly one document.
    pub fn document(key: DocumentKey) -> Self {
        Self::collection(key.path().clone())
    }

    /// A query over every collection with the given id, regardless of
    /// parent. Only supported at the root.
    pub fn collection_group(collection_id: impl Into<String>) -> Self {
        Self {
            path: ResourcePath::empty(),
            collection_group: Some(collection_id.into()),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    /// Rebinds a collection-group query to one concrete collection path,
    /// keeping its filters and ordering.
    pub fn as_collection_query_at_path(&self, path: ResourcePath) -> Self {
        Self {
            path,
            collection_group: None,
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
        }
    }

    /// True when the query targets exactly one document.
    pub fn is_document_query(&self) -> bool {
        self.collection_group.is_none() && DocumentKey::is_document_path(&self.path)
    }

    pub fn is_collection_group_query(&self) -> bool {
        self.collection_group.is_some()
    }

    /// Whether the document belongs to this query's result set: found, on a
    /// matching path, passing every filter, and order-by feasible.
    pub fn matches(&self, document: &Document) -> bool {
        document.is_found_document()
            && self.matches_path(document.key())
            && self.filters.iter().all(|f| f.matches(document))
            && self.matches_order_by(document)
    }

    fn matches_path(&self, key: &DocumentKey) -> bool {
        let doc_path = key.path();
        if let Some(collection_id) = &self.collection_group {
            key.has_collection_id(collection_id) && self.path.is_prefix_of(doc_path)
        } else if DocumentKey::is_document_path(&self.path) {
            self.path == *doc_path
        } else {
            self.path.is_immediate_parent_of(doc_path)
        }
    }

    /// Documents missing an ordered field cannot be ordered and are
    /// excluded; the key field is always present.
    fn matches_order_by(&self, document: &Document) -> bool {
        self.order_by
            .iter()
            .all(|o| o.field.is_key_field() || document.field(&o.field).is_some())
    }
}
