//! Self-verifying conformance graphs.
//!
//! A case builds a behavior graph that exercises some part of the node set and checks its own
//! results: every assertion ([`CheckBox`]) observes a flow or a value from inside the graph,
//! stores the outcome in a persistent variable, logs `PASS`/`FAIL` and flips a visual marker
//! once the case's entry point has settled. Hosts only fire the entry events listed in the
//! [`CaseReport`] and read the result variables back.

pub mod case;
pub mod cases;
pub mod checkbox;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod marker;
pub mod report;

pub use case::{build_all, build_case, prepared, BuiltCase, CaseRegistry, TestCase};
pub use checkbox::{CheckBox, CheckBoxBuilder, CheckBoxId, Expectation, ValueDiffers};
pub use compare::{select_comparator, strategy_for, CompareStrategy, Comparator};
pub use config::BuildConfig;
pub use context::{Counter, Entry, EntryId, TestContext};
pub use error::ConstructionError;
pub use marker::{MarkerNodes, MarkerState};
pub use report::{AssertionReport, CaseReport};
