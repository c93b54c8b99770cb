//! Renders a comparison tree as an indented, path-annotated report.
//!
//! Layout, with the plain palette:
//!
//! ```text
//! (app::BigStruct)[FAIL]
//! Inner: (app::InnerStruct)[FAIL]
//! 	Values: (Vec<i32>)[FAIL]
//! 		7: (i32) 7 != 8
//! ```
//!
//! Children of the root carry no indent; each further level adds a tab.

use std::io::{self, Write};

use crate::error::CompareError;
use crate::node::ComparisonNode;
use crate::style::Palette;

/// Writes comparison trees to a sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter {
    verbose: bool,
    palette: Palette,
}

impl Reporter {
    pub fn new(verbose: bool, palette: Palette) -> Self {
        Self { verbose, palette }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Render `node` and return the first failure in depth-first,
    /// left-to-right order. Passing nodes are written only when verbose.
    pub fn render<W>(&self, node: &ComparisonNode<'_>, out: &mut W) -> io::Result<Option<CompareError>>
    where
        W: Write + ?Sized,
    {
        self.render_node(node, out, "")
    }

    /// Render into a string. Used by the CLI and by tests.
    pub fn render_to_string(&self, node: &ComparisonNode<'_>) -> (String, Option<CompareError>) {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let failure = self.render(node, &mut buf).unwrap_or_else(|_| node.failure().cloned());
        (String::from_utf8_lossy(&buf).into_owned(), failure)
    }

    fn render_node<W>(
        &self,
        node: &ComparisonNode<'_>,
        out: &mut W,
        indent: &str,
    ) -> io::Result<Option<CompareError>>
    where
        W: Write + ?Sized,
    {
        if !self.verbose && node.passed() {
            return Ok(None);
        }
        if node.is_leaf() {
            self.write_leaf(node, out)?;
            return Ok(node.failure().cloned());
        }

        let p = &self.palette;
        let marker = if node.passed() { "OK" } else { "FAIL" };
        writeln!(
            out,
            "{}{}{}[{marker}]",
            p.label,
            node.type_label().unwrap_or_default(),
            p.muted
        )?;

        let nested = format!("{indent}\t");
        for (name, child) in node.children() {
            if !self.verbose && child.passed() {
                continue;
            }
            write!(out, "{indent}{}{name}: ", p.field)?;
            if let Some(err) = self.render_node(child, out, &nested)? {
                return Ok(Some(err));
            }
        }
        Ok(None)
    }

    fn write_leaf<W>(&self, node: &ComparisonNode<'_>, out: &mut W) -> io::Result<()>
    where
        W: Write + ?Sized,
    {
        let p = &self.palette;
        let (color, op) = if node.passed() {
            (p.reset, "==")
        } else {
            (p.fail, "!=")
        };
        writeln!(
            out,
            "{}({}){color} {} {op} {}",
            p.muted,
            node.kind(),
            node.left(),
            node.right()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use deepeq_types::{Record, Sequence, TypeName, Value};

    use super::*;
    use crate::dispatch::DispatchTable;
    use crate::engine::Comparator;
    use crate::error::Taxonomy;

    fn big(values: &[i32]) -> Value {
        let items = values.iter().copied().map(Value::I32).collect();
        let inner = Record::new(TypeName::new("app", "InnerStruct"))
            .with_field("Values", Sequence::growable("Vec<i32>", items).into());
        Record::new(TypeName::new("app", "BigStruct"))
            .with_field("Name", Value::String("Big Struct".into()))
            .with_field("Inner", inner.into())
            .into()
    }

    fn compare<'a>(a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
        let (table, excluded) = (DispatchTable::standard(), HashSet::new());
        Comparator::new(&table, &excluded).compare(a, b)
    }

    #[test]
    fn failing_path_only() {
        let a = big(&[1, 2, 3, 4, 5, 6, 7, 7, 9, 10]);
        let b = big(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let node = compare(&a, &b);

        let (text, failure) = Reporter::default().render_to_string(&node);
        assert_eq!(
            text,
            "(app::BigStruct)[FAIL]\n\
             Inner: (app::InnerStruct)[FAIL]\n\
             \tValues: (Vec<i32>)[FAIL]\n\
             \t\t7: (i32) 7 != 8\n"
        );
        let failure = failure.unwrap();
        assert!(failure.is(Taxonomy::NotEqual));
        assert_eq!(failure.detail(), "7 != 8");
    }

    #[test]
    fn ansi_palette_interleaves_escapes() {
        let a = big(&[7, 7]);
        let b = big(&[7, 8]);
        let node = compare(&a, &b);

        let (text, _) = Reporter::new(false, Palette::ansi()).render_to_string(&node);
        assert_eq!(
            text,
            "\x1b[33m(app::BigStruct)\x1b[90m[FAIL]\n\
             \x1b[36mInner: \x1b[33m(app::InnerStruct)\x1b[90m[FAIL]\n\
             \t\x1b[36mValues: \x1b[33m(Vec<i32>)\x1b[90m[FAIL]\n\
             \t\t\x1b[36m1: \x1b[90m(i32)\x1b[31m 7 != 8\n"
        );
    }

    #[test]
    fn verbose_renders_passing_nodes() {
        let a = big(&[1, 2]);
        let b = big(&[1, 2]);
        let node = compare(&a, &b);

        let (text, failure) = Reporter::new(true, Palette::plain()).render_to_string(&node);
        assert!(failure.is_none());
        assert_eq!(
            text,
            "(app::BigStruct)[OK]\n\
             Name: (string) Big Struct == Big Struct\n\
             Inner: (app::InnerStruct)[OK]\n\
             \tValues: (Vec<i32>)[OK]\n\
             \t\t0: (i32) 1 == 1\n\
             \t\t1: (i32) 2 == 2\n"
        );
    }

    #[test]
    fn passing_tree_renders_nothing_when_quiet() {
        let a = big(&[1]);
        let node = compare(&a, &a);
        let (text, failure) = Reporter::default().render_to_string(&node);
        assert!(text.is_empty());
        assert!(failure.is_none());
    }

    #[test]
    fn root_leaf_renders_single_line() {
        let (a, b) = (Value::I32(1), Value::String("ding".into()));
        let node = compare(&a, &b);
        let (text, failure) = Reporter::default().render_to_string(&node);
        assert_eq!(text, "(i32) 1 != ding\n");
        assert!(failure.unwrap().is(Taxonomy::DifferingKinds));
    }
}
