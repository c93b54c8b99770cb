//! Error types for the comparison engine.

use std::error::Error as StdError;
use std::path::PathBuf;

use deepeq_types::Value;

/// The closed set of reasons a comparison can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Taxonomy {
    /// Same kind, values differ under that kind's rule.
    #[error("not equal")]
    NotEqual,

    /// No comparison rule is registered for the kind.
    #[error("type not supported for evaluation")]
    UnsupportedKind,

    /// The operands are of different kinds.
    #[error("given values were not of same type")]
    DifferingKinds,
}

impl Taxonomy {
    /// Find the taxonomy of the first [`CompareError`] (or bare [`Taxonomy`])
    /// in an error's source chain.
    pub fn of(err: &(dyn StdError + 'static)) -> Option<Taxonomy> {
        let mut current = Some(err);
        while let Some(err) = current {
            if let Some(err) = err.downcast_ref::<CompareError>() {
                return Some(err.kind);
            }
            if let Some(taxonomy) = err.downcast_ref::<Taxonomy>() {
                return Some(*taxonomy);
            }
            current = err.source();
        }
        None
    }
}

/// A comparison failure: a [`Taxonomy`] plus a formatted detail string.
///
/// The message already names the taxonomy, so the error has no source.
/// Classify through [`kind`](CompareError::kind) or [`Taxonomy::of`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct CompareError {
    kind: Taxonomy,
    detail: String,
}

pub type CompareResult<T> = Result<T, CompareError>;

impl CompareError {
    /// A failure with a caller-formatted detail.
    pub fn new(kind: Taxonomy, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Both operands rendered side by side.
    pub fn not_equal(a: &Value, b: &Value) -> Self {
        Self::new(Taxonomy::NotEqual, format!("{a} != {b}"))
    }

    /// Both operands with their kinds, one per line.
    pub fn differing_kinds(a: &Value, b: &Value) -> Self {
        Self::new(
            Taxonomy::DifferingKinds,
            format!("\na: ({}) {a}\nb: ({}) {b}\n", a.kind(), b.kind()),
        )
    }

    /// Same kind, but declared as different types (e.g. two record types).
    pub fn differing_types(a: &Value, b: &Value) -> Self {
        Self::new(
            Taxonomy::DifferingKinds,
            format!("\na: ({}) {a}\nb: ({}) {b}\n", a.type_name(), b.type_name()),
        )
    }

    /// The kind and type of the value no rule accepted.
    pub fn unsupported(value: &Value) -> Self {
        Self::new(
            Taxonomy::UnsupportedKind,
            format!(
                "(kind: {}, type: {}, value: {value})",
                value.kind(),
                value.type_name()
            ),
        )
    }

    pub fn kind(&self) -> Taxonomy {
        self.kind
    }

    /// The message without the taxonomy prefix.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns `true` if this failure belongs to `taxonomy`.
    pub fn is(&self, taxonomy: Taxonomy) -> bool {
        self.kind == taxonomy
    }
}

/// Errors raised while loading a session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_taxonomy() {
        let err = CompareError::not_equal(&Value::I32(7), &Value::I32(8));
        assert_eq!(err.to_string(), "not equal: 7 != 8");
        assert!(err.is(Taxonomy::NotEqual));
        assert!(!err.is(Taxonomy::DifferingKinds));
    }

    #[test]
    fn differing_kinds_detail_names_both_sides() {
        let err = CompareError::differing_kinds(&Value::I32(1), &Value::String("ding".into()));
        assert_eq!(err.detail(), "\na: (i32) 1\nb: (string) ding\n");
        assert_eq!(err.kind(), Taxonomy::DifferingKinds);
    }

    #[test]
    fn unsupported_detail_has_kind_type_and_value() {
        let err = CompareError::unsupported(&Value::Invalid);
        assert_eq!(
            err.detail(),
            "(kind: invalid, type: <invalid>, value: <absent>)"
        );
    }

    #[derive(Debug, thiserror::Error)]
    #[error("loading fixture")]
    struct Wrapped(#[source] CompareError);

    #[test]
    fn taxonomy_is_found_through_source_chain() {
        let err = CompareError::new(Taxonomy::UnsupportedKind, "x");
        assert_eq!(Taxonomy::of(&err), Some(Taxonomy::UnsupportedKind));

        let wrapped = Wrapped(CompareError::new(Taxonomy::DifferingKinds, "y"));
        assert_eq!(Taxonomy::of(&wrapped), Some(Taxonomy::DifferingKinds));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "unrelated");
        assert_eq!(Taxonomy::of(&io), None);
    }

    #[test]
    fn taxonomy_is_named_once_in_error_chain() {
        let err = CompareError::not_equal(&Value::I32(7), &Value::I32(8));
        assert!(err.source().is_none());

        let chained = format!("{:#}", anyhow::Error::new(err).context("a.json and b.json differ"));
        assert_eq!(chained, "a.json and b.json differ: not equal: 7 != 8");
        assert_eq!(chained.matches("not equal").count(), 1);
    }

    #[test]
    fn equality_includes_detail() {
        let a = CompareError::new(Taxonomy::NotEqual, "a");
        let b = CompareError::new(Taxonomy::NotEqual, "b");
        assert_ne!(a, b);
        assert_eq!(a.kind(), b.kind());
    }
}
