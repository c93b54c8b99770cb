//! The kind dispatch table.
//!
//! Maps every [`Kind`] to the [`Rule`] that compares two values of that
//! kind. A table is built per session; rules receive the session's
//! [`Comparator`] explicitly instead of capturing it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use deepeq_types::{Kind, Value};

use crate::engine::{self, Comparator};
use crate::error::CompareError;
use crate::node::ComparisonNode;

/// A comparison rule for one kind.
pub type Rule =
    Arc<dyn for<'a> Fn(&Comparator<'_>, &'a Value, &'a Value) -> ComparisonNode<'a> + Send + Sync>;

/// Wrap a function or closure as a [`Rule`].
pub fn rule<F>(f: F) -> Rule
where
    F: for<'a> Fn(&Comparator<'_>, &'a Value, &'a Value) -> ComparisonNode<'a>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Kind -> rule mapping.
#[derive(Clone, Default)]
pub struct DispatchTable {
    rules: HashMap<Kind, Rule>,
}

impl DispatchTable {
    /// An empty table: every kind is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rules, covering every [`Kind`].
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for kind in Kind::ALL {
            table.insert(kind, builtin_rule(kind));
        }
        table
    }

    /// Register a rule, returning the one it replaces.
    pub fn insert(&mut self, kind: Kind, rule: Rule) -> Option<Rule> {
        self.rules.insert(kind, rule)
    }

    /// Unregister the rule for `kind`, leaving that kind unsupported.
    pub fn remove(&mut self, kind: Kind) -> Option<Rule> {
        self.rules.remove(&kind)
    }

    /// The rule registered for `kind`.
    pub fn get(&self, kind: Kind) -> Option<&Rule> {
        self.rules.get(&kind)
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Number of kinds with a rule.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<Kind> = self.rules.keys().copied().collect();
        kinds.sort();
        f.debug_struct("DispatchTable").field("kinds", &kinds).finish()
    }
}

fn builtin_rule(kind: Kind) -> Rule {
    match kind {
        Kind::Struct => rule(engine::record_rule),
        Kind::Map => rule(engine::map_rule),
        Kind::Slice | Kind::Array => rule(engine::sequence_rule),
        Kind::Ref => rule(engine::reference_rule),
        Kind::Variant => rule(engine::variant_rule),
        Kind::Dyn => rule(engine::dynamic_rule),
        Kind::Fn | Kind::RawPtr | Kind::Sync | Kind::Addr => rule(identity_rule),
        Kind::Opaque | Kind::Invalid => rule(unsupported_rule),
        _ => rule(scalar_rule),
    }
}

// ---------------------------------------------------------------------------
// Leaf rules
// ---------------------------------------------------------------------------

/// Exact value equality for scalar kinds. Floats use `==` with no tolerance.
pub fn scalar_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    let equal = match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::I8(x), Value::I8(y)) => x == y,
        (Value::I16(x), Value::I16(y)) => x == y,
        (Value::I32(x), Value::I32(y)) => x == y,
        (Value::I64(x), Value::I64(y)) => x == y,
        (Value::I128(x), Value::I128(y)) => x == y,
        (Value::Isize(x), Value::Isize(y)) => x == y,
        (Value::U8(x), Value::U8(y)) => x == y,
        (Value::U16(x), Value::U16(y)) => x == y,
        (Value::U32(x), Value::U32(y)) => x == y,
        (Value::U64(x), Value::U64(y)) => x == y,
        (Value::U128(x), Value::U128(y)) => x == y,
        (Value::Usize(x), Value::Usize(y)) => x == y,
        (Value::F32(x), Value::F32(y)) => x == y,
        (Value::F64(x), Value::F64(y)) => x == y,
        (Value::Complex64(x), Value::Complex64(y)) => x == y,
        (Value::Complex128(x), Value::Complex128(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Unit, Value::Unit) => true,
        _ => return unsupported_rule(cx, a, b),
    };
    ComparisonNode::check(equal, a, b)
}

/// Address equality for handles. Distinct instances never compare equal.
pub fn identity_rule<'a>(cx: &Comparator<'_>, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
    match (a, b) {
        (Value::Handle(x), Value::Handle(y)) => ComparisonNode::check(x.addr == y.addr, a, b),
        _ => unsupported_rule(cx, a, b),
    }
}

/// Fails every comparison with `UnsupportedKind`.
pub fn unsupported_rule<'a>(
    _cx: &Comparator<'_>,
    a: &'a Value,
    b: &'a Value,
) -> ComparisonNode<'a> {
    ComparisonNode::fail(a, b, CompareError::unsupported(a))
}
