//! Bundled catalog of conformance cases.
//!
//! Each case exercises one area of the node set and asserts on it from inside the graph.

mod flow;
mod math;
mod state;

pub use flow::{BranchCase, DelayCase, DoNCase, ForLoopCase, MultiGateCase, SequenceCase, WaitAllCase};
pub use math::{AddCase, DivideByZeroCase, MatrixCase, NormalizeCase, RandomCase};
pub use state::{PointerCase, VariableCase};

use crate::case::CaseRegistry;

pub(crate) fn standard() -> CaseRegistry {
    let mut cases = CaseRegistry::new();
    cases
        .register(AddCase::default())
        .register(DivideByZeroCase::default())
        .register(NormalizeCase::default())
        .register(MatrixCase::default())
        .register(RandomCase::default())
        .register(BranchCase::default())
        .register(SequenceCase::default())
        .register(ForLoopCase::default())
        .register(DoNCase::default())
        .register(MultiGateCase::default())
        .register(WaitAllCase::default())
        .register(DelayCase::default())
        .register(VariableCase::default())
        .register(PointerCase::default());
    cases
}
