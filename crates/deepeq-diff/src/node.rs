//! The comparison result tree.
//!
//! A [`ComparisonNode`] borrows the two operands it compared. Leaves carry a
//! direct verdict; composites carry named children and adopt the failure of
//! the first child that failed.

use deepeq_types::{Kind, Value};

use crate::error::CompareError;

/// Outcome of comparing one pair of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The operands are deeply equal.
    Pass,
    /// The first failure found below this point.
    Fail(CompareError),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` for [`Verdict::Fail`].
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&CompareError> {
        match self {
            Self::Pass => None,
            Self::Fail(err) => Some(err),
        }
    }
}

/// One node of the comparison tree.
///
/// # Invariants
///
/// - A node is a leaf iff it has no children.
/// - A composite fails iff its last child failed; that child's failure is
///   the composite's verdict. Children after the first failure are never
///   built.
#[derive(Clone, Debug)]
pub struct ComparisonNode<'a> {
    verdict: Verdict,
    left: &'a Value,
    right: &'a Value,
    type_label: Option<String>,
    children: Vec<(String, ComparisonNode<'a>)>,
}

impl<'a> ComparisonNode<'a> {
    /// A leaf with an explicit verdict.
    pub fn leaf(left: &'a Value, right: &'a Value, verdict: Verdict) -> Self {
        Self {
            verdict,
            left,
            right,
            type_label: None,
            children: Vec::new(),
        }
    }

    /// A passing leaf.
    pub fn pass(left: &'a Value, right: &'a Value) -> Self {
        Self::leaf(left, right, Verdict::Pass)
    }

    /// A failing leaf carrying `err`.
    pub fn fail(left: &'a Value, right: &'a Value, err: CompareError) -> Self {
        Self::leaf(left, right, Verdict::Fail(err))
    }

    /// Pass when `equal` holds, otherwise a `NotEqual` leaf.
    pub fn check(equal: bool, left: &'a Value, right: &'a Value) -> Self {
        if equal {
            Self::pass(left, right)
        } else {
            Self::fail(left, right, CompareError::not_equal(left, right))
        }
    }

    /// An empty composite. Children are appended with [`push_child`].
    ///
    /// [`push_child`]: ComparisonNode::push_child
    pub fn composite(left: &'a Value, right: &'a Value, type_label: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Pass,
            left,
            right,
            type_label: Some(type_label.into()),
            children: Vec::new(),
        }
    }

    /// Append a named child. When the child failed, this node adopts its
    /// failure and `false` is returned so the caller stops iterating.
    pub fn push_child(&mut self, name: impl Into<String>, child: ComparisonNode<'a>) -> bool {
        let passed = child.verdict.is_pass();
        if let Verdict::Fail(err) = &child.verdict {
            self.verdict = Verdict::Fail(err.clone());
        }
        self.children.push((name.into(), child));
        passed
    }

    /// This node's verdict. For a composite it is the verdict of the
    /// failing child, or `Pass`.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn failure(&self) -> Option<&CompareError> {
        self.verdict.failure()
    }

    /// The left operand, [`Value::Invalid`] when absent.
    pub fn left(&self) -> &'a Value {
        self.left
    }

    pub fn right(&self) -> &'a Value {
        self.right
    }

    /// The parenthesised type label of a composite; `None` on leaves.
    pub fn type_label(&self) -> Option<&str> {
        self.type_label.as_deref()
    }

    /// Named children in comparison order.
    pub fn children(&self) -> &[(String, ComparisonNode<'a>)] {
        &self.children
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&ComparisonNode<'a>> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The kind shown on a leaf line. An absent left operand shows the
    /// right operand's kind.
    pub fn kind(&self) -> Kind {
        if self.left.is_invalid() {
            self.right.kind()
        } else {
            self.left.kind()
        }
    }

    /// Child names from this node down to the failing leaf.
    pub fn failure_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Some((name, child)) = current.children.iter().find(|(_, c)| c.verdict.is_fail()) {
            path.push(name.as_str());
            current = child;
        }
        path
    }

    /// Total number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|(_, child)| child.len())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Taxonomy;

    #[test]
    fn check_builds_leaves() {
        let (a, b) = (Value::I32(1), Value::I32(2));
        let pass = ComparisonNode::check(true, &a, &a);
        assert!(pass.passed());
        assert!(pass.is_leaf());

        let fail = ComparisonNode::check(false, &a, &b);
        assert!(fail.failure().unwrap().is(Taxonomy::NotEqual));
    }

    #[test]
    fn composite_adopts_child_failure() {
        let (a, b) = (Value::I32(1), Value::I32(2));
        let mut node = ComparisonNode::composite(&a, &b, "(Pair)");
        assert!(node.push_child("0", ComparisonNode::pass(&a, &a)));
        assert!(node.passed());
        assert!(!node.push_child("1", ComparisonNode::check(false, &a, &b)));
        assert_eq!(node.failure().unwrap().detail(), "1 != 2");
        assert_eq!(node.failure_path(), ["1"]);
        assert_eq!(node.len(), 3);
    }

    #[test]
    fn kind_prefers_present_operand() {
        let (absent, present) = (Value::Invalid, Value::U8(1));
        let node = ComparisonNode::check(false, &absent, &present);
        assert_eq!(node.kind(), Kind::U8);
    }
}
