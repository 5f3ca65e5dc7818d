//! Test cases and the caller-owned case registry.
//!
//! A [`TestCase`] is built in two phases against a fresh [`TestContext`]: `prepare_objects`
//! creates its assertions (reserving their marker nodes), `create_nodes` wires the behavior
//! under test to them. [`build_case`] runs both phases, validates the graph and collects the
//! report.

use anyhow::Context as _;
use behave_graph_core::{Graph, Registry};

use crate::checkbox::CheckBoxId;
use crate::config::BuildConfig;
use crate::context::TestContext;
use crate::error::ConstructionError;
use crate::report::CaseReport;

pub trait TestCase {
    /// Unique case name; also the prefix of every persistent variable and event of the case.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError>;

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError>;
}

/// Resolve an assertion id stored by `prepare_objects`.
pub fn prepared(id: Option<CheckBoxId>, case: &str) -> Result<CheckBoxId, ConstructionError> {
    id.ok_or_else(|| ConstructionError::NotPrepared {
        case: case.to_string(),
    })
}

/// Ordered list of cases to build. Owned by the caller; nothing is discovered implicitly.
#[derive(Default)]
pub struct CaseRegistry {
    cases: Vec<Box<dyn TestCase>>,
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every case of the bundled catalog.
    pub fn standard() -> Self {
        crate::cases::standard()
    }

    pub fn register(&mut self, case: impl TestCase + 'static) -> &mut Self {
        self.cases.push(Box::new(case));
        self
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name()).collect()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn TestCase + 'static)> {
        self.cases
            .iter_mut()
            .find(|c| c.name() == name)
            .map(|c| c.as_mut())
    }
}

pub struct BuiltCase<'r> {
    pub graph: Graph<'r>,
    pub report: CaseReport,
}

pub fn build_case<'r>(
    registry: &'r Registry,
    case: &mut dyn TestCase,
    config: &BuildConfig,
) -> Result<BuiltCase<'r>, ConstructionError> {
    let mut ctx = TestContext::with_config(registry, case.name(), config.clone());
    case.prepare_objects(&mut ctx)?;
    case.create_nodes(&mut ctx)?;
    let report = CaseReport::collect(&ctx, case.description())?;
    let graph = ctx.into_graph();
    graph.validate()?;
    log::info!(
        "built case '{}': {} nodes, {} assertions",
        report.name,
        graph.nodes().len(),
        report.assertions.len()
    );
    Ok(BuiltCase { graph, report })
}

/// Build every registered case, stopping at the first failure.
pub fn build_all<'r>(
    registry: &'r Registry,
    cases: &mut CaseRegistry,
    config: &BuildConfig,
) -> anyhow::Result<Vec<BuiltCase<'r>>> {
    cases
        .cases
        .iter_mut()
        .map(|case| {
            let name = case.name().to_string();
            build_case(registry, case.as_mut(), config)
                .with_context(|| format!("building case '{name}'"))
        })
        .collect()
}
