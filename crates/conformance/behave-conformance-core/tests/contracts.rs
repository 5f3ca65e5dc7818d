//! Behavioural coverage for every assertion shape, executed with the reference interpreter.

mod common;

use behave_api_core::Value;
use behave_conformance::TestContext;
use behave_graph_core::{FlowOutRef, Registry};
use common::{fixture, observe, Observation};

fn checkbox(ctx: &mut TestContext<'_>, label: &str, negated: bool) -> behave_conformance::CheckBoxId {
    if negated {
        ctx.add_negated_checkbox(label)
    } else {
        ctx.add_checkbox(label)
    }
}

fn arrival(ctx: &mut TestContext<'_>, event: &str) -> FlowOutRef {
    let graph = ctx.graph_mut();
    let node = graph.receive_event(event).expect("receive node");
    graph.flow_out(node, "out").expect("receive out")
}

fn value_check(expected: Value, proximity: bool, observed: Value, negated: bool) -> Observation {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let var = ctx
        .graph_mut()
        .add_variable("observed", observed)
        .expect("observed variable");
    let source = ctx.graph_mut().get_variable(var).expect("variable/get");
    let id = checkbox(&mut ctx, "value", negated);
    let flow = ctx
        .check(id)
        .expect("checkbox")
        .setup_check_value(&source, expected, proximity)
        .expect("value check");
    ctx.add_sequenced_flow(&flow).expect("sequenced");
    observe(ctx, id, &[])
}

fn flow_times(expected: usize, hits: usize, negated: bool) -> Observation {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let hit = arrival(&mut ctx, "hit");
    let id = checkbox(&mut ctx, "hits", negated);
    let counted = ctx
        .check(id)
        .expect("checkbox")
        .setup_check_flow_times(expected)
        .expect("times check");
    ctx.graph_mut().connect_flow(&hit, &counted).expect("connect");
    observe(ctx, id, &vec!["hit"; hits])
}

fn order(arrivals: &[&str], negated: bool) -> Observation {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let flows: Vec<FlowOutRef> = ["a", "b", "c"]
        .iter()
        .map(|event| arrival(&mut ctx, event))
        .collect();
    let id = checkbox(&mut ctx, "order", negated);
    ctx.check(id)
        .expect("checkbox")
        .setup_order_flow_check(&flows)
        .expect("order check");
    observe(ctx, id, arrivals)
}

fn multi_flow(arrivals: &[&str], negated: bool) -> Observation {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let flows: Vec<FlowOutRef> = ["a", "b", "c"]
        .iter()
        .map(|event| arrival(&mut ctx, event))
        .collect();
    let id = checkbox(&mut ctx, "all", negated);
    let inputs = ctx
        .check(id)
        .expect("checkbox")
        .setup_multi_flow_check(3, &["a", "b", "c"])
        .expect("multi-flow check");
    for (flow, input) in flows.iter().zip(&inputs) {
        ctx.graph_mut().connect_flow(flow, input).expect("connect");
    }
    observe(ctx, id, arrivals)
}

fn triggered(fire: bool, negated: bool) -> Observation {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let flow = arrival(&mut ctx, "go");
    let id = checkbox(&mut ctx, "go", negated);
    let observed = ctx
        .check(id)
        .expect("checkbox")
        .setup_check_flow()
        .expect("flow check");
    ctx.graph_mut().connect_flow(&flow, &observed).expect("connect");
    let arrivals: &[&str] = if fire { &["go"] } else { &[] };
    observe(ctx, id, arrivals)
}

// --- Value contracts ----------------------------------------------------

#[test]
fn exact_values_pass_only_on_equality() {
    assert!(value_check(Value::Float(3.0), false, Value::Float(3.0), false).passed);
    assert!(!value_check(Value::Float(3.0), false, Value::Float(3.0001), false).passed);
    assert!(value_check(Value::Int(7), false, Value::Int(7), false).passed);
    assert!(!value_check(Value::Int(7), false, Value::Float(7.0), false).passed);
}

#[test]
fn proximity_values_pass_within_epsilon() {
    assert!(value_check(Value::Float(1.0), true, Value::Float(1.00005), false).passed);
    assert!(!value_check(Value::Float(1.0), true, Value::Float(1.001), false).passed);
    assert!(value_check(Value::Int(2), true, Value::Int(2), false).passed);
}

#[test]
fn nan_passes_only_for_nan() {
    let nan = Value::Float(f32::NAN);
    assert!(value_check(nan.clone(), false, Value::Float(f32::NAN), false).passed);
    assert!(!value_check(nan.clone(), false, Value::Float(0.0), false).passed);
    assert!(value_check(nan, true, Value::Float(f32::NAN), false).passed);
}

#[test]
fn vectors_compare_by_direction_and_magnitude() {
    let up = Value::vec3(0.0, 1.0, 0.0);
    assert!(value_check(up.clone(), true, Value::vec3(0.0, 1.00002, 0.0), false).passed);
    assert!(!value_check(up.clone(), true, Value::vec3(0.0, 0.0, 1.0), false).passed);
    assert!(!value_check(up, true, Value::vec3(0.0, 2.0, 0.0), false).passed);
    let identity = Value::quat(0.0, 0.0, 0.0, 1.0);
    assert!(value_check(identity, true, Value::quat(0.0, 0.0, 0.0, -1.0), false).passed);
}

#[test]
fn matrices_compare_element_wise() {
    let identity = Value::Mat4(Value::IDENTITY_MAT4);
    assert!(value_check(identity.clone(), true, identity.clone(), false).passed);
    let mut moved = Value::IDENTITY_MAT4;
    moved[12] = 1.0;
    assert!(!value_check(identity, true, Value::Mat4(moved), false).passed);
}

#[test]
fn observed_value_is_recorded() {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let var = ctx.graph_mut().add_variable("observed", 2.0_f32).unwrap();
    let source = ctx.graph_mut().get_variable(var).unwrap();
    let id = ctx.add_checkbox("sample");
    let flow = ctx
        .check(id)
        .unwrap()
        .setup_check_value(&source, Value::Float(5.0), false)
        .unwrap();
    ctx.add_sequenced_flow(&flow).unwrap();
    let sample_name = ctx
        .checkbox(id)
        .unwrap()
        .value_variable_name()
        .unwrap()
        .to_string();
    assert_eq!(sample_name, "contract_sample_value");
    let obs = observe(ctx, id, &[]);
    assert!(!obs.passed);
    assert!(
        obs.logs
            .iter()
            .any(|l| l == "FAIL sample: expected 5, observed 2"),
        "{:?}",
        obs.logs
    );
}

// --- Flow contracts -----------------------------------------------------

#[test]
fn triggered_flows_pass_and_silent_flows_fail() {
    assert!(triggered(true, false).passed);
    assert!(!triggered(false, false).passed);
}

#[test]
fn flow_counts_must_match_exactly() {
    for expected in [2, 3, 4] {
        for hits in 0..=5 {
            assert_eq!(
                flow_times(expected, hits, false).passed,
                hits == expected,
                "expected {expected}, hit {hits} times"
            );
        }
    }
}

#[test]
fn flow_count_failure_reports_the_count() {
    let obs = flow_times(2, 3, false);
    assert!(
        obs.logs
            .iter()
            .any(|l| l == "FAIL hits: expected 2 calls, counted 3"),
        "{:?}",
        obs.logs
    );
}

#[test]
fn order_passes_only_for_the_listed_order() {
    assert!(order(&["a", "b", "c"], false).passed);
    assert!(!order(&["a", "c", "b"], false).passed);
    assert!(!order(&["b", "a", "c"], false).passed);
    assert!(!order(&["a", "b"], false).passed);
    assert!(!order(&[], false).passed);
}

#[test]
fn order_failures_are_sticky() {
    // a late in-order run can not repair an earlier violation
    assert!(!order(&["a", "c", "b", "a", "b", "c"], false).passed);
    assert!(!order(&["c", "a", "b", "c"], false).passed);
}

#[test]
fn multi_flow_accepts_any_permutation() {
    let permutations: [[&str; 3]; 6] = [
        ["a", "b", "c"],
        ["a", "c", "b"],
        ["b", "a", "c"],
        ["b", "c", "a"],
        ["c", "a", "b"],
        ["c", "b", "a"],
    ];
    for arrivals in permutations {
        assert!(multi_flow(&arrivals, false).passed, "{arrivals:?}");
    }
    assert!(multi_flow(&["a", "a", "b", "c", "b"], false).passed);
}

#[test]
fn multi_flow_fails_when_a_flow_is_missing() {
    let obs = multi_flow(&["a", "c"], false);
    assert!(!obs.passed);
    assert!(
        obs.logs
            .iter()
            .any(|l| l == "FAIL all: arrived flags a=true, b=false, c=true"),
        "{:?}",
        obs.logs
    );
}

// --- Negation -----------------------------------------------------------

#[test]
fn negation_is_the_exact_complement() {
    for fire in [true, false] {
        assert_eq!(triggered(fire, true).passed, !triggered(fire, false).passed);
    }
    for hits in 0..=3 {
        assert_eq!(flow_times(2, hits, true).passed, !flow_times(2, hits, false).passed);
    }
    let scenarios: [&[&str]; 4] = [&["a", "b", "c"], &["a", "c", "b"], &["a"], &[]];
    for arrivals in scenarios {
        assert_eq!(order(arrivals, true).passed, !order(arrivals, false).passed);
        assert_eq!(
            multi_flow(arrivals, true).passed,
            !multi_flow(arrivals, false).passed
        );
    }
    for observed in [Value::Float(1.0), Value::Float(1.5)] {
        assert_eq!(
            value_check(Value::Float(1.0), true, observed.clone(), true).passed,
            !value_check(Value::Float(1.0), true, observed, false).passed
        );
    }
}

// --- Resolution ---------------------------------------------------------

#[test]
fn passing_assertions_log_and_reveal_the_pass_marker() {
    let obs = triggered(true, false);
    assert_eq!(obs.logs, ["PASS go"]);
    assert_eq!(obs.waiting_visible, Some(Value::Bool(false)));
    assert_eq!(obs.passed_visible, Some(Value::Bool(true)));
    assert_eq!(obs.failed_visible, None);
}

#[test]
fn failing_assertions_log_and_reveal_the_fail_marker() {
    let obs = triggered(false, false);
    assert_eq!(obs.logs, ["FAIL go: flow was never triggered"]);
    assert_eq!(obs.waiting_visible, Some(Value::Bool(false)));
    assert_eq!(obs.passed_visible, None);
    assert_eq!(obs.failed_visible, Some(Value::Bool(true)));
}

#[test]
fn nothing_resolves_before_the_entry_fires() {
    let registry = Registry::standard();
    let mut ctx = fixture(&registry);
    let flow = arrival(&mut ctx, "go");
    let id = ctx.add_checkbox("go");
    let observed = ctx.check(id).unwrap().setup_check_flow().unwrap();
    ctx.graph_mut().connect_flow(&flow, &observed).unwrap();
    let name = ctx
        .checkbox(id)
        .unwrap()
        .result_variable_name()
        .unwrap()
        .to_string();
    let marker = *ctx.checkbox(id).unwrap().marker();

    let graph = ctx.into_graph();
    let mut rt = behave_graph_core::FlowRuntime::new(&graph);
    rt.trigger_event("go").unwrap();
    let obs = Observation::read(&rt, &name, &marker);
    assert!(obs.passed);
    assert!(obs.logs.is_empty());
    assert_eq!(obs.waiting_visible, None);
}
