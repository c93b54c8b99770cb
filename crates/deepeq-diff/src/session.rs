//! Comparison sessions.
//!
//! A [`Session`] bundles a dispatch table, excluded field paths, a reporter
//! and an output sink. [`SessionBuilder`] assembles one, optionally from a
//! loaded [`SessionConfig`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use deepeq_types::{Kind, Reflect, Value};
use tracing::warn;

use crate::config::SessionConfig;
use crate::dispatch::{DispatchTable, Rule};
use crate::engine::Comparator;
use crate::error::{CompareError, CompareResult};
use crate::node::ComparisonNode;
use crate::report::Reporter;
use crate::style::{Palette, Style};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A configured comparison context.
///
/// A session owns its dispatch table, its excluded field paths and the sink
/// reports are written to. It can be reused for any number of comparisons.
///
/// ```
/// use deepeq_diff::{SharedBuffer, Session, Taxonomy};
///
/// let out = SharedBuffer::new();
/// let session = Session::builder().sink(out.clone()).build();
///
/// assert!(session.equal(&vec![1, 2, 3], &vec![1, 2, 3]).is_ok());
///
/// let err = session.equal(&vec![1, 2, 3], &vec![1, 2, 4]).unwrap_err();
/// assert!(err.is(Taxonomy::NotEqual));
/// assert_eq!(out.contents(), "(Vec<i32>)[FAIL]\n2: (i32) 3 != 4\n");
/// ```
pub struct Session {
    table: DispatchTable,
    excluded: HashSet<String>,
    reporter: Reporter,
    sort_map_keys: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Session {
    /// A session with the built-in rules, writing failures to stdout.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start from the built-in rules, a plain palette and stdout.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// A session with the built-in rules and `config` applied.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Compare two values, write the report to the sink and return the
    /// first failure.
    pub fn equal<A, B>(&self, a: &A, b: &B) -> CompareResult<()>
    where
        A: Reflect + ?Sized,
        B: Reflect + ?Sized,
    {
        self.equal_values(&a.reflect(), &b.reflect())
    }

    /// [`equal`](Self::equal) for values that are already lowered.
    pub fn equal_values(&self, a: &Value, b: &Value) -> CompareResult<()> {
        let (a, b) = (self.prepare(a), self.prepare(b));
        let node = self.compare(&a, &b);
        match self.report(&node) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Build the comparison tree without reporting it. Map keys are
    /// compared in the operands' own order.
    pub fn compare<'a>(&self, a: &'a Value, b: &'a Value) -> ComparisonNode<'a> {
        Comparator::new(&self.table, &self.excluded).compare(a, b)
    }

    /// The reporter this session renders with.
    pub fn reporter(&self) -> Reporter {
        self.reporter
    }

    /// Whether mapping entries are put in key order before comparing.
    pub fn sorts_map_keys(&self) -> bool {
        self.sort_map_keys
    }

    /// Whether `path` (as `Type::field`) is skipped.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.contains(path)
    }

    fn prepare<'v>(&self, value: &'v Value) -> Cow<'v, Value> {
        if !self.sort_map_keys {
            return Cow::Borrowed(value);
        }
        let mut sorted = value.clone();
        sorted.sort_map_keys();
        Cow::Owned(sorted)
    }

    /// Render to the sink. A failing sink is logged and does not change
    /// the outcome.
    fn report(&self, node: &ComparisonNode<'_>) -> Option<CompareError> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let out: &mut (dyn Write + Send) = &mut **sink;
        let rendered = self
            .reporter
            .render(node, out)
            .and_then(|failure| out.flush().map(|()| failure));
        match rendered {
            Ok(failure) => failure,
            Err(err) => {
                warn!(error = %err, "failed to write comparison report");
                node.failure().cloned()
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("table", &self.table)
            .field("excluded", &self.excluded)
            .field("reporter", &self.reporter)
            .field("sort_map_keys", &self.sort_map_keys)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SessionBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`Session`].
pub struct SessionBuilder {
    table: DispatchTable,
    excluded: HashSet<String>,
    verbose: bool,
    palette: Palette,
    sort_map_keys: bool,
    sink: Option<Box<dyn Write + Send>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            table: DispatchTable::standard(),
            excluded: HashSet::new(),
            verbose: false,
            palette: Palette::plain(),
            sort_map_keys: false,
            sink: None,
        }
    }
}

impl SessionBuilder {
    /// Render every node, not only the failing path.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Write reports to `sink` instead of stdout.
    pub fn sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Skip the named fields, given as `Type::field`.
    pub fn exclude_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    /// Colour the report with `palette`.
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Shorthand for [`palette`](Self::palette) with a named style.
    pub fn style(self, style: Style) -> Self {
        self.palette(style.palette())
    }

    /// Compare and render mapping entries in key order rather than the
    /// order the operands hold them in.
    pub fn sort_map_keys(mut self, enabled: bool) -> Self {
        self.sort_map_keys = enabled;
        self
    }

    /// Replace the rule for `kind`.
    pub fn rule(mut self, kind: Kind, rule: Rule) -> Self {
        self.table.insert(kind, rule);
        self
    }

    /// Remove the rule for `kind`; values of that kind become unsupported.
    pub fn without_rule(mut self, kind: Kind) -> Self {
        self.table.remove(kind);
        self
    }

    /// Apply a loaded configuration on top of the current settings.
    pub fn config(mut self, config: &SessionConfig) -> Self {
        self.verbose |= config.verbose;
        self.sort_map_keys |= config.sort_map_keys;
        self.excluded.extend(config.exclude.iter().cloned());
        self.palette(config.style.palette())
    }

    /// Finish the session. Without a sink, reports go to stdout.
    pub fn build(self) -> Session {
        Session {
            table: self.table,
            excluded: self.excluded,
            reporter: Reporter::new(self.verbose, self.palette),
            sort_map_keys: self.sort_map_keys,
            sink: Mutex::new(self.sink.unwrap_or_else(|| Box::new(io::stdout()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use deepeq_types::{Mapping, Record, TypeName};

    use super::*;
    use crate::dispatch::rule;
    use crate::error::Taxonomy;
    use crate::sink::SharedBuffer;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }

    #[test]
    fn sink_failure_keeps_the_verdict() {
        let session = Session::builder().sink(BrokenSink).build();
        let err = session.equal(&1, &2).unwrap_err();
        assert!(err.is(Taxonomy::NotEqual));
        assert!(session.equal(&1, &1).is_ok());
    }

    #[test]
    fn config_is_applied() {
        let config = SessionConfig {
            verbose: true,
            exclude: vec!["Doc::id".into()],
            style: Style::Ansi,
            sort_map_keys: true,
        };
        let session = Session::from_config(&config);
        assert!(session.reporter().verbose());
        assert_eq!(session.reporter().palette(), Palette::ansi());
        assert!(session.is_excluded("Doc::id"));
    }

    #[test]
    fn excluded_fields_do_not_count() {
        let out = SharedBuffer::new();
        let session = Session::builder()
            .sink(out.clone())
            .verbose()
            .exclude_fields(["Doc::id"])
            .build();

        let doc = |id: u64| -> Value {
            Record::new(TypeName::bare("Doc"))
                .with_field("id", Value::U64(id))
                .with_field("title", Value::String("t".into()))
                .into()
        };
        assert!(session.equal_values(&doc(1), &doc(2)).is_ok());
        assert_eq!(out.contents(), "(Doc)[OK]\ntitle: (string) t == t\n");
    }

    #[test]
    fn sorted_map_keys_render_in_order() {
        let out = SharedBuffer::new();
        let session = Session::builder()
            .sink(out.clone())
            .verbose()
            .sort_map_keys(true)
            .build();

        let map: Value = Mapping::new("map")
            .with_entry("b", Value::I32(2))
            .with_entry("a", Value::I32(1))
            .into();
        session.equal_values(&map, &map).unwrap();
        assert_eq!(out.contents(), "(map)[OK]\na: (i32) 1 == 1\nb: (i32) 2 == 2\n");
    }

    #[test]
    fn custom_rules_and_removed_rules() {
        let session = Session::builder()
            .sink(io::sink())
            .rule(
                Kind::String,
                rule(|_cx, a, b| {
                    let equal = a.to_string().eq_ignore_ascii_case(&b.to_string());
                    ComparisonNode::check(equal, a, b)
                }),
            )
            .without_rule(Kind::Bool)
            .build();

        assert!(session.equal("Hello", "HELLO").is_ok());
        let err = session.equal(&true, &true).unwrap_err();
        assert!(err.is(Taxonomy::UnsupportedKind));
    }
}
