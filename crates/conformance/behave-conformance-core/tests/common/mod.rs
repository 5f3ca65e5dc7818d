#![allow(dead_code)]

use behave_api_core::Value;
use behave_conformance::{CaseReport, CheckBoxId, MarkerNodes, TestContext};
use behave_graph_core::{FlowRuntime, Graph};

pub const CASE: &str = "contract";
pub const ENTRY_EVENT: &str = "contract_main";

pub fn visibility(node: i32) -> String {
    format!("/nodes/{node}/extensions/KHR_node_visibility/visible")
}

/// Fire every entry of `report` in order and let its fallbacks settle.
pub fn settle(rt: &mut FlowRuntime<'_, '_>, report: &CaseReport) {
    for (event, delay) in report.entry_events.iter().zip(&report.entry_delays) {
        rt.trigger_event(event).expect("entry event");
        if let Some(delay) = delay {
            rt.run_for(delay + 0.5, 0.05).expect("advance timers");
        }
    }
}

/// What a host observes after one run of an assertion.
#[derive(Debug, Clone)]
pub struct Observation {
    pub passed: bool,
    pub logs: Vec<String>,
    pub waiting_visible: Option<Value>,
    pub passed_visible: Option<Value>,
    pub failed_visible: Option<Value>,
}

impl Observation {
    pub fn read(rt: &FlowRuntime<'_, '_>, result_variable: &str, marker: &MarkerNodes) -> Self {
        let visible = |node: i32| rt.pointer(&visibility(node)).cloned();
        Observation {
            passed: rt.variable(result_variable) == Some(&Value::Bool(true)),
            logs: rt.logs().to_vec(),
            waiting_visible: visible(marker.waiting),
            passed_visible: visible(marker.passed),
            failed_visible: visible(marker.failed),
        }
    }
}

/// A context with a single `main` entry, ready for one assertion.
pub fn fixture(registry: &behave_graph_core::Registry) -> TestContext<'_> {
    let mut ctx = TestContext::new(registry, CASE);
    ctx.new_entry_point("main").expect("entry point");
    ctx
}

/// Validate the graph, fire `arrivals` (external events) and then the entry event.
pub fn observe(ctx: TestContext<'_>, id: CheckBoxId, arrivals: &[&str]) -> Observation {
    let checkbox = ctx.checkbox(id).expect("assertion exists").clone();
    let result_variable = checkbox
        .result_variable_name()
        .expect("result variable allocated")
        .to_string();
    let graph: Graph<'_> = ctx.into_graph();
    graph.validate().expect("valid graph");
    let mut rt = FlowRuntime::new(&graph);
    for event in arrivals {
        rt.trigger_event(event).expect("arrival event");
    }
    rt.trigger_event(ENTRY_EVENT).expect("entry event");
    Observation::read(&rt, &result_variable, checkbox.marker())
}
