//! The recursive comparison engine.
//!
//! [`Comparator::compare`] checks that both operands have the same kind,
//! looks the kind up in the session's [`DispatchTable`] and runs the rule it
//! finds. Composite rules call back into the comparator for every member,
//! stopping at the first member that fails.

use std::collections::HashSet;

use deepeq_types::{Mapping, Record, Sequence, Value};
use tracing::{debug, trace};

use crate::dispatch::DispatchTable;
use crate::error::{CompareError, Taxonomy};
use crate::node::ComparisonNode;

/// Stands in for a missing map entry or record field.
static ABSENT: Value = Value::Invalid;

/// Comparison context handed to every rule.
#[derive(Clone, Copy, Debug)]
pub struct Comparator<'s> {
    table: &'s DispatchTable,
    excluded: &'s HashSet<String>,
}

impl<'s> Comparator<'s> {
    pub fn new(table: &'s DispatchTable, excluded: &'s HashSet<String>) -> Self {
        Self { table, excluded }
    }

    /// Compare two values, building the full comparison tree.
    pub fn compare<'a>(&self, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
        let kind = a.kind();
        if kind != b.kind() {
            return ComparisonNode::fail(a, b, CompareError::differing_kinds(a, b));
        }
        let Some(rule) = self.table.get(kind) else {
            return ComparisonNode::fail(a, b, CompareError::unsupported(a));
        };
        trace!(%kind, "dispatch");
        rule(self, a, b)
    }

    /// Whether `Type::field` was excluded from comparison.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.contains(path)
    }
}

// ---------------------------------------------------------------------------
// Composite rules
// ---------------------------------------------------------------------------

/// Field-by-field comparison of two records of the same type.
pub fn record_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    let (Value::Struct(left), Value::Struct(right)) = (a, b) else {
        return ComparisonNode::fail(a, b, CompareError::unsupported(a));
    };
    if left.type_name.base_name() != right.type_name.base_name() {
        return ComparisonNode::fail(a, b, CompareError::differing_types(a, b));
    }

    let mut node = ComparisonNode::composite(a, b, record_label(left));
    for (name, value) in &left.fields {
        let path = left.field_path(name);
        if cx.is_excluded(&path) {
            debug!(field = %path, "skipping excluded field");
            continue;
        }
        let child = match right.field(name) {
            Some(other) => cx.compare(value, other),
            None => ComparisonNode::check(false, value, &ABSENT),
        };
        if !node.push_child(name.as_str(), child) {
            return node;
        }
    }

    for (name, value) in &right.fields {
        if left.field(name).is_some() || cx.is_excluded(&right.field_path(name)) {
            continue;
        }
        if !node.push_child(name.as_str(), ComparisonNode::check(false, &ABSENT, value)) {
            return node;
        }
    }
    node
}

fn record_label(record: &Record) -> String {
    format!("({})", record.type_name.qualified())
}

/// Key-by-key comparison. Keys missing on either side fail as `NotEqual`
/// against the absent marker.
pub fn map_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    let (Value::Map(left), Value::Map(right)) = (a, b) else {
        return ComparisonNode::fail(a, b, CompareError::unsupported(a));
    };

    let mut node = ComparisonNode::composite(a, b, container_label(&left.label));
    for (key, value) in &left.entries {
        let child = match right.get(key) {
            Some(other) => cx.compare(value, other),
            None => ComparisonNode::check(false, value, &ABSENT),
        };
        if !node.push_child(key.as_str(), child) {
            return node;
        }
    }
    for (key, value) in only_in(right, left) {
        if !node.push_child(key.as_str(), ComparisonNode::check(false, &ABSENT, value)) {
            return node;
        }
    }
    node
}

fn only_in<'m>(map: &'m Mapping, other: &'m Mapping) -> impl Iterator<Item = (&'m String, &'m Value)> {
    map.entries
        .iter()
        .filter(move |(key, _)| other.get(key).is_none())
}

/// Positional comparison of slices and arrays.
pub fn sequence_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    let (Value::Seq(left), Value::Seq(right)) = (a, b) else {
        return ComparisonNode::fail(a, b, CompareError::unsupported(a));
    };
    if left.len() != right.len() {
        return ComparisonNode::fail(a, b, length_mismatch(left, right));
    }

    let mut node = ComparisonNode::composite(a, b, container_label(&left.label));
    for (idx, (x, y)) in left.items.iter().zip(&right.items).enumerate() {
        if !node.push_child(idx.to_string(), cx.compare(x, y)) {
            break;
        }
    }
    node
}

fn length_mismatch(left: &Sequence, right: &Sequence) -> CompareError {
    CompareError::new(
        Taxonomy::NotEqual,
        format!("length {} != {}", left.len(), right.len()),
    )
}

fn container_label(label: &str) -> String {
    format!("({label})")
}

/// Compares what the references point to, not where they point.
pub fn reference_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    cx.compare(a.deref_all(), b.deref_all())
}

/// Enum values: the tags must match, then the payloads are compared.
pub fn variant_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    match (a, b) {
        (Value::Variant(x), Value::Variant(y)) if x.tag == y.tag => {
            cx.compare(&x.payload, &y.payload)
        }
        (Value::Variant(_), Value::Variant(_)) => ComparisonNode::check(false, a, b),
        _ => ComparisonNode::fail(a, b, CompareError::unsupported(a)),
    }
}

/// Unwraps type-erased values and re-dispatches on what they hold.
pub fn dynamic_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    match (a, b) {
        (Value::Dyn(x), Value::Dyn(y)) => cx.compare(x, y),
        _ => ComparisonNode::fail(a, b, CompareError::unsupported(a)),
    }
}
