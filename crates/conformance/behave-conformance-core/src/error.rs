use behave_api_core::JsonValueError;
use behave_graph_core::GraphError;
use thiserror::Error;

use crate::checkbox::CheckBoxId;

/// Authoring mistakes detected while a conformance graph is being built.
///
/// These never end up in the emitted graph: a case that hits one of them is not exported.
#[derive(Debug, Error, PartialEq)]
pub enum ConstructionError {
    #[error("no entry point exists yet; create one with new_entry_point first")]
    NoEntryPoint,
    #[error("entry point '{0}' already exists in this case")]
    DuplicateEntry(String),
    #[error("entry delay must be finite and non-negative, got {0}")]
    InvalidDelay(f32),
    #[error("assertion '{label}' has no expected value")]
    MissingExpectedValue { label: String },
    #[error("unknown assertion {0:?}")]
    UnknownCheckBox(CheckBoxId),
    #[error("assertion '{label}' was already set up")]
    AlreadyConfigured { label: String },
    #[error("assertion '{label}' is not fully constructed")]
    Incomplete { label: String },
    #[error("{what} needs at least {min} entries, got {got}")]
    InvalidCount {
        what: &'static str,
        min: usize,
        got: usize,
    },
    #[error("{what} supports at most {max}, got {got}")]
    CountOutOfRange {
        what: &'static str,
        max: usize,
        got: usize,
    },
    #[error("case '{case}' used an assertion before prepare_objects created it")]
    NotPrepared { case: String },
    #[error("expected value: {0}")]
    Json(#[from] JsonValueError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
