//! Deep structural comparison with a hierarchical diff report.
//!
//! Two values are lowered into [`Value`] trees and compared kind by kind.
//! Composites are compared member by member until the first mismatch, and
//! the resulting [`ComparisonNode`] tree is rendered to the session's sink
//! showing the path down to the offending leaf.
//!
//! # Key Types
//!
//! - [`Session`] / [`SessionBuilder`] -- Configured comparison context (sink, verbosity, exclusions)
//! - [`DispatchTable`] / [`Rule`] -- Kind to comparison rule mapping
//! - [`Comparator`] -- The recursive engine handed to every rule
//! - [`ComparisonNode`] / [`Verdict`] -- The comparison result tree
//! - [`Reporter`] / [`Palette`] -- Rendering of result trees
//! - [`CompareError`] / [`Taxonomy`] -- Failure classification

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod node;
pub mod report;
pub mod session;
pub mod sink;
pub mod style;

pub use config::SessionConfig;
pub use deepeq_types::{reflect_struct, Dynamic, Kind, Reflect, Serde, Value};
pub use dispatch::{rule, DispatchTable, Rule};
pub use engine::Comparator;
pub use error::{CompareError, CompareResult, ConfigError, Taxonomy};
pub use node::{ComparisonNode, Verdict};
pub use report::Reporter;
pub use session::{Session, SessionBuilder};
pub use sink::SharedBuffer;
pub use style::{Palette, Style};

/// Assert that two [`Reflect`] values are deeply equal, printing the diff
/// report and panicking on mismatch.
///
/// A session can be given first to control exclusions and output:
///
/// ```
/// use deepeq_diff::{assert_deep_eq, Session};
///
/// assert_deep_eq!(vec![1, 2], vec![1, 2]);
///
/// let session = Session::builder().verbose().build();
/// assert_deep_eq!(session => "same", "same");
/// ```
#[macro_export]
macro_rules! assert_deep_eq {
    ($session:expr => $left:expr, $right:expr $(,)?) => {
        match $session.equal(&$left, &$right) {
            Ok(()) => {}
            Err(err) => panic!("assertion `left deep-equals right` failed: {err}"),
        }
    };
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_deep_eq!($crate::Session::new() => $left, $right)
    };
}
