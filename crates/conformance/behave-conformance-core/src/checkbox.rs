//! Assertions ("check boxes").
//!
//! A [`CheckBox`] verifies one expected behavior entirely inside the emitted graph and records
//! the outcome in a persistent boolean variable. Setup helpers on [`CheckBoxBuilder`] emit the
//! observation fragment for one contract shape and register fallbacks on the current entry:
//!
//! 1. an optional evaluation fallback for contracts only decidable once every flow ran
//!    (call counts, arrival flags),
//! 2. the resolution fallback, which branches on the result variable, logs PASS or FAIL with
//!    diagnostics and drives the marker transition. It is registered once per assertion, so
//!    the marker changes exactly once per run.
//!
//! The result variable always holds the logical outcome with negation applied: negation only
//! decides which branch writes `true`. Before anything was observed it holds the outcome of
//! "nothing happened", which is a pass for negated flow contracts and a fail otherwise.

use behave_api_core::{value_from_json, JsonValueError, Value, ValueKind};
use behave_graph_core::{
    FlowInRef, FlowOutRef, NodeParams, NodeType, ValueInRef, ValueOutRef, VariableId,
};
use serde::Serialize;

use crate::compare::{all_of, math, select_comparator};
use crate::context::TestContext;
use crate::error::ConstructionError;
use crate::marker::{emit_transition, MarkerNodes, MarkerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CheckBoxId(pub usize);

/// The contract an assertion verifies.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// A flow runs at least once before the fallback.
    Triggered,
    /// A flow runs exactly this many times before the fallback.
    TriggeredTimes(usize),
    /// Every named flow runs, in any order.
    AllTriggered { names: Vec<String> },
    /// `count` flows run in their listed order.
    TriggeredInOrder { count: usize },
    /// An observed value matches; `epsilon` is set for proximity checks.
    Value { expected: Value, epsilon: Option<f32> },
    /// Two values sampled at the same instant differ.
    ValuesDiffer,
}

impl Expectation {
    /// Contracts about flows arriving, as opposed to sampled values.
    pub fn is_flow_triggered(&self) -> bool {
        !matches!(self, Expectation::Value { .. } | Expectation::ValuesDiffer)
    }

    pub fn describe(&self) -> String {
        match self {
            Expectation::Triggered => "triggered".to_string(),
            Expectation::TriggeredTimes(n) => format!("triggered {n} times"),
            Expectation::AllTriggered { names } => {
                format!("all of [{}] triggered", names.join(", "))
            }
            Expectation::TriggeredInOrder { count } => format!("{count} flows triggered in order"),
            Expectation::Value {
                expected,
                epsilon: None,
            } => expected.to_string(),
            Expectation::Value {
                expected,
                epsilon: Some(eps),
            } => format!("{expected} +/- {eps}"),
            Expectation::ValuesDiffer => "values differ".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckBox {
    label: String,
    negated: bool,
    marker: MarkerNodes,
    expectation: Option<Expectation>,
    result: Option<(VariableId, String)>,
    observed: Option<(VariableId, String)>,
    resolution: Option<FlowInRef>,
}

impl CheckBox {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn marker(&self) -> &MarkerNodes {
        &self.marker
    }

    pub fn expectation(&self) -> Option<&Expectation> {
        self.expectation.as_ref()
    }

    pub fn result_variable(&self) -> Option<VariableId> {
        self.result.as_ref().map(|(id, _)| *id)
    }

    pub fn result_variable_name(&self) -> Option<&str> {
        self.result.as_ref().map(|(_, name)| name.as_str())
    }

    pub fn value_variable(&self) -> Option<VariableId> {
        self.observed.as_ref().map(|(id, _)| *id)
    }

    pub fn value_variable_name(&self) -> Option<&str> {
        self.observed.as_ref().map(|(_, name)| name.as_str())
    }

    /// Head of the resolution fallback, once registered.
    pub fn resolution(&self) -> Option<&FlowInRef> {
        self.resolution.as_ref()
    }

    /// What a passing run looks like, e.g. `3`, `(0, 1, 0) +/- 0.0001` or `not triggered`.
    pub fn expected_value_as_string(&self) -> Option<String> {
        self.expectation.as_ref().map(|e| {
            let text = e.describe();
            if self.negated {
                format!("not {text}")
            } else {
                text
            }
        })
    }
}

/// Inputs of a value-differs check.
#[derive(Debug, Clone)]
pub struct ValueDiffers {
    /// Samples both values and stores the outcome.
    pub flow: FlowInRef,
    pub a: ValueInRef,
    pub b: ValueInRef,
}

impl<'r> TestContext<'r> {
    /// Register an assertion; its marker nodes are reserved immediately.
    pub fn add_checkbox(&mut self, label: &str) -> CheckBoxId {
        self.push_checkbox(label, false)
    }

    /// An assertion that passes exactly when the plain one would fail.
    pub fn add_negated_checkbox(&mut self, label: &str) -> CheckBoxId {
        self.push_checkbox(label, true)
    }

    fn push_checkbox(&mut self, label: &str, negated: bool) -> CheckBoxId {
        let marker = self.allocate_marker();
        let id = CheckBoxId(self.checkboxes.len());
        self.checkboxes.push(CheckBox {
            label: label.to_string(),
            negated,
            marker,
            expectation: None,
            result: None,
            observed: None,
            resolution: None,
        });
        id
    }

    pub fn checkbox(&self, id: CheckBoxId) -> Result<&CheckBox, ConstructionError> {
        self.checkboxes
            .get(id.0)
            .ok_or(ConstructionError::UnknownCheckBox(id))
    }

    pub fn checkboxes(&self) -> &[CheckBox] {
        &self.checkboxes
    }

    /// Builder for setting up assertion `id`.
    pub fn check(&mut self, id: CheckBoxId) -> Result<CheckBoxBuilder<'_, 'r>, ConstructionError> {
        self.checkbox(id)?;
        Ok(CheckBoxBuilder { ctx: self, id })
    }
}

pub struct CheckBoxBuilder<'c, 'r> {
    ctx: &'c mut TestContext<'r>,
    id: CheckBoxId,
}

impl<'c, 'r> CheckBoxBuilder<'c, 'r> {
    fn checkbox(&self) -> &CheckBox {
        &self.ctx.checkboxes[self.id.0]
    }

    fn checkbox_mut(&mut self) -> &mut CheckBox {
        &mut self.ctx.checkboxes[self.id.0]
    }

    fn ensure_unconfigured(&self) -> Result<(), ConstructionError> {
        match self.checkbox().expectation {
            Some(_) => Err(ConstructionError::AlreadyConfigured {
                label: self.checkbox().label.clone(),
            }),
            None => Ok(()),
        }
    }

    fn begin(&mut self, expectation: Expectation) -> Result<(), ConstructionError> {
        self.ctx.current_entry()?;
        self.ensure_unconfigured()?;
        log::debug!(
            "assertion '{}': {}{}",
            self.checkbox().label,
            if self.checkbox().negated { "not " } else { "" },
            expectation.describe()
        );
        self.checkbox_mut().expectation = Some(expectation);
        // a result allocated ahead of setup was seeded without the contract
        if let Some(id) = self.checkbox().result.as_ref().map(|(id, _)| *id) {
            let initial = self.initial_outcome();
            self.ctx.graph_mut().set_initial_value(id, initial)?;
        }
        Ok(())
    }

    /// Outcome when nothing was observed.
    fn initial_outcome(&self) -> bool {
        let cb = self.checkbox();
        cb.negated
            && cb
                .expectation
                .as_ref()
                .is_some_and(Expectation::is_flow_triggered)
    }

    fn negated(&self) -> bool {
        self.checkbox().negated
    }

    /// The pass-state variable, allocated on first use.
    pub fn ensure_result_variable(&mut self) -> Result<VariableId, ConstructionError> {
        if let Some((id, _)) = &self.checkbox().result {
            return Ok(*id);
        }
        let initial = self.initial_outcome();
        let base = self.ctx.persistent_name(&[self.checkbox().label.as_str()]);
        let name = self.ctx.unique_variable_name(&base);
        let id = self.ctx.graph_mut().add_variable(&name, initial)?;
        self.checkbox_mut().result = Some((id, name));
        Ok(id)
    }

    /// The observed-value variable typed as `kind`, allocated on first use.
    pub fn ensure_value_variable(&mut self, kind: ValueKind) -> Result<VariableId, ConstructionError> {
        if let Some((id, _)) = &self.checkbox().observed {
            return Ok(*id);
        }
        let base = self
            .ctx
            .persistent_name(&[self.checkbox().label.as_str(), "value"]);
        let name = self.ctx.unique_variable_name(&base);
        let id = self
            .ctx
            .graph_mut()
            .add_variable(&name, kind.default_value())?;
        self.checkbox_mut().observed = Some((id, name));
        Ok(id)
    }

    /// `result := condition` (or its complement when negated).
    fn store_outcome(
        &mut self,
        condition: &ValueOutRef,
    ) -> Result<(FlowInRef, FlowOutRef), ConstructionError> {
        let result = self.ensure_result_variable()?;
        let negated = self.negated();
        let graph = self.ctx.graph_mut();
        let value = if negated {
            math(graph, NodeType::MathNot, condition, None)?
        } else {
            condition.clone()
        };
        let set = graph.set_variable(result)?;
        graph.link_input(set, "value", &value)?;
        Ok((graph.flow_in(set, "in")?, graph.flow_out(set, "out")?))
    }

    /// `result := literal`, for branch points where the outcome is already decided.
    fn store_literal(&mut self, pass: bool) -> Result<(FlowInRef, FlowOutRef), ConstructionError> {
        let result = self.ensure_result_variable()?;
        let value = pass != self.negated();
        let graph = self.ctx.graph_mut();
        let set = graph.set_variable(result)?;
        graph.set_input(set, "value", value)?;
        Ok((graph.flow_in(set, "in")?, graph.flow_out(set, "out")?))
    }

    /// Register the PASS/FAIL resolution on the current entry. `detail` may reference
    /// `diagnostics` as `{0}`, `{1}`...
    fn resolve(
        &mut self,
        detail: &str,
        diagnostics: &[ValueOutRef],
    ) -> Result<(), ConstructionError> {
        if self.checkbox().resolution.is_some() {
            return Ok(());
        }
        let result = self.ensure_result_variable()?;
        let cb = self.checkbox().clone();
        let config = self.ctx.config().clone();

        let passed = self.ctx.graph_mut().get_variable(result)?;
        let (pass_in, pass_out) = self
            .ctx
            .add_log(&format!("{} {}", config.pass_prefix, cb.label), &[])?;
        let (fail_in, fail_out) = self.ctx.add_log(
            &format!("{} {}: {detail}", config.fail_prefix, cb.label),
            diagnostics,
        )?;

        let graph = self.ctx.graph_mut();
        let branch = graph.create_node(NodeType::FlowBranch)?;
        graph.link_input(branch, "condition", &passed)?;
        let template = config.marker_visibility_pointer.as_str();
        for (out, log_in, log_out, state) in [
            ("true", pass_in, pass_out, MarkerState::Passed),
            ("false", fail_in, fail_out, MarkerState::Failed),
        ] {
            let (marker_in, _) = emit_transition(graph, template, &cb.marker, state)?;
            graph.connect_flow(&graph.flow_out(branch, out)?, &log_in)?;
            graph.connect_flow(&log_out, &marker_in)?;
        }
        let head = graph.flow_in(branch, "in")?;
        self.ctx.add_fallback_flow(&head)?;
        self.checkbox_mut().resolution = Some(head);
        Ok(())
    }

    // --- Flow contracts -------------------------------------------------

    /// Passes iff the returned Flow-In runs before the entry's fallbacks.
    pub fn setup_check_flow(&mut self) -> Result<FlowInRef, ConstructionError> {
        self.begin(Expectation::Triggered)?;
        let (observe, _) = self.store_literal(true)?;
        let detail = if self.negated() {
            "flow was triggered"
        } else {
            "flow was never triggered"
        };
        self.resolve(detail, &[])?;
        Ok(observe)
    }

    /// Passes iff the returned Flow-In never runs before the entry's fallbacks.
    pub fn setup_negate_check_flow(&mut self) -> Result<FlowInRef, ConstructionError> {
        self.ensure_unconfigured()?;
        let was_negated = self.negated();
        self.checkbox_mut().negated = true;
        let observe = self.setup_check_flow();
        if observe.is_err() {
            self.checkbox_mut().negated = was_negated;
        }
        observe
    }

    /// Passes iff the returned Flow-In runs exactly `call_times` times before the fallbacks.
    /// The count is compared when the fallbacks run, not on arrival.
    pub fn setup_check_flow_times(
        &mut self,
        call_times: usize,
    ) -> Result<FlowInRef, ConstructionError> {
        let expected =
            i32::try_from(call_times).map_err(|_| ConstructionError::CountOutOfRange {
                what: "flow count check",
                max: i32::MAX as usize,
                got: call_times,
            })?;
        self.begin(Expectation::TriggeredTimes(call_times))?;
        let label = self.checkbox().label.clone();
        let counter = self.ctx.add_named_counter(&[label.as_str(), "count"], 0)?;

        let graph = self.ctx.graph_mut();
        let eq = graph.create_configured(
            NodeType::MathEq,
            NodeParams {
                value_type: Some(ValueKind::Int),
                ..Default::default()
            },
        )?;
        graph.link_input(eq, "a", &counter.value)?;
        graph.set_input(eq, "b", Value::Int(expected))?;
        let matched = graph.value_out(eq, "value")?;

        let (evaluate, _) = self.store_outcome(&matched)?;
        self.ctx.add_fallback_flow(&evaluate)?;
        let detail = format!("expected {call_times} calls, counted {{0}}");
        self.resolve(&detail, &[counter.value.clone()])?;
        Ok(counter.increment)
    }

    /// `count` flows that may arrive in any order; passes iff each arrived by fallback time.
    /// Arrivals are flags, so repeated arrivals are not failures. `names` label the flags in
    /// the failure log; missing names fall back to the flow's index.
    pub fn setup_multi_flow_check(
        &mut self,
        count: usize,
        names: &[&str],
    ) -> Result<Vec<FlowInRef>, ConstructionError> {
        if count == 0 {
            return Err(ConstructionError::InvalidCount {
                what: "multi-flow check",
                min: 1,
                got: count,
            });
        }
        let names: Vec<String> = (0..count)
            .map(|i| names.get(i).map_or_else(|| i.to_string(), |n| n.to_string()))
            .collect();
        self.begin(Expectation::AllTriggered {
            names: names.clone(),
        })?;
        let label = self.checkbox().label.clone();

        let mut inputs = Vec::with_capacity(count);
        let mut flags = Vec::with_capacity(count);
        for name in &names {
            let base = self
                .ctx
                .persistent_name(&[label.as_str(), "arrived", name.as_str()]);
            let var_name = self.ctx.unique_variable_name(&base);
            let graph = self.ctx.graph_mut();
            let flag = graph.add_variable(&var_name, false)?;
            let set = graph.set_variable(flag)?;
            graph.set_input(set, "value", true)?;
            inputs.push(graph.flow_in(set, "in")?);
            flags.push(graph.get_variable(flag)?);
        }

        let all = all_of(
            self.ctx.graph_mut(),
            flags[0].clone(),
            flags.iter().skip(1).cloned(),
        )?;
        let (evaluate, _) = self.store_outcome(&all)?;
        self.ctx.add_fallback_flow(&evaluate)?;

        let detail = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{name}={{{i}}}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.resolve(&format!("arrived flags {detail}"), &flags)?;
        Ok(inputs)
    }

    /// Passes iff `flows` arrive in their listed order. A flow arriving out of turn writes the
    /// configured sentinel into the order counter, so no later arrival can match again.
    pub fn setup_order_flow_check(&mut self, flows: &[FlowOutRef]) -> Result<(), ConstructionError> {
        if flows.is_empty() {
            return Err(ConstructionError::InvalidCount {
                what: "order check",
                min: 1,
                got: 0,
            });
        }
        self.begin(Expectation::TriggeredInOrder { count: flows.len() })?;
        let label = self.checkbox().label.clone();
        let sentinel = self.ctx.config().order_sentinel;
        let counter = self.ctx.add_named_counter(&[label.as_str(), "order"], 1)?;
        let last = flows.len() - 1;

        for (index, flow) in flows.iter().enumerate() {
            let position = index as i32 + 1;
            let (increment_in, increment_out) = if index == 0 {
                (counter.increment.clone(), counter.done.clone())
            } else {
                self.ctx.add_counter_increment(counter.variable)?
            };

            let graph = self.ctx.graph_mut();
            let eq = graph.create_configured(
                NodeType::MathEq,
                NodeParams {
                    value_type: Some(ValueKind::Int),
                    ..Default::default()
                },
            )?;
            graph.link_input(eq, "a", &counter.value)?;
            graph.set_input(eq, "b", Value::Int(position))?;
            let in_turn = graph.value_out(eq, "value")?;
            let branch = graph.create_node(NodeType::FlowBranch)?;
            graph.link_input(branch, "condition", &in_turn)?;
            let branch_in = graph.flow_in(branch, "in")?;
            graph.connect_flow(flow, &branch_in)?;
            let on_time = graph.flow_out(branch, "true")?;
            graph.connect_flow(&on_time, &increment_in)?;

            let poison = graph.set_variable(counter.variable)?;
            graph.set_input(poison, "value", Value::Int(sentinel))?;
            let out_of_turn = graph.flow_out(branch, "false")?;
            let poison_in = graph.flow_in(poison, "in")?;
            graph.connect_flow(&out_of_turn, &poison_in)?;
            let poison_out = graph.flow_out(poison, "out")?;

            let (fail_in, _) = self.store_literal(false)?;
            self.ctx.graph_mut().connect_flow(&poison_out, &fail_in)?;
            if index == last {
                let (pass_in, _) = self.store_literal(true)?;
                self.ctx.graph_mut().connect_flow(&increment_out, &pass_in)?;
            }
        }

        let detail = if self.negated() {
            "flows arrived in order"
        } else {
            "flows missing or out of order, counter at {0}"
        };
        self.resolve(detail, &[counter.value.clone()])
    }

    // --- Value contracts ------------------------------------------------

    /// Passes iff `source` matches `expected` when the returned Flow-In runs. The sample is
    /// stored in the observed-value variable and the comparison result in the result variable
    /// at that instant. Proximity checks use the configured default epsilon.
    pub fn setup_check_value(
        &mut self,
        source: &ValueOutRef,
        expected: impl Into<Option<Value>>,
        proximity: bool,
    ) -> Result<FlowInRef, ConstructionError> {
        let epsilon = proximity.then_some(self.ctx.config().default_epsilon);
        self.check_value(source, expected.into(), epsilon)
    }

    /// Proximity check with an explicit tolerance.
    pub fn setup_check_value_within(
        &mut self,
        source: &ValueOutRef,
        expected: impl Into<Option<Value>>,
        epsilon: f32,
    ) -> Result<FlowInRef, ConstructionError> {
        self.check_value(source, expected.into(), Some(epsilon))
    }

    /// Like [`setup_check_value`](Self::setup_check_value) with the expected value given as
    /// JSON (see [`value_from_json`]).
    pub fn setup_check_value_json(
        &mut self,
        source: &ValueOutRef,
        expected: &serde_json::Value,
        proximity: bool,
    ) -> Result<FlowInRef, ConstructionError> {
        let expected = match value_from_json(expected) {
            Ok(v) => Some(v),
            Err(JsonValueError::Missing) => None,
            Err(e) => return Err(e.into()),
        };
        self.setup_check_value(source, expected, proximity)
    }

    fn check_value(
        &mut self,
        source: &ValueOutRef,
        expected: Option<Value>,
        epsilon: Option<f32>,
    ) -> Result<FlowInRef, ConstructionError> {
        let expected = expected.ok_or_else(|| ConstructionError::MissingExpectedValue {
            label: self.checkbox().label.clone(),
        })?;
        self.begin(Expectation::Value {
            expected: expected.clone(),
            epsilon,
        })?;
        let observed = self.ensure_value_variable(expected.kind())?;

        let graph = self.ctx.graph_mut();
        let sample = graph.set_variable(observed)?;
        graph.link_input(sample, "value", source)?;
        let stored = graph.get_variable(observed)?;
        let comparator =
            select_comparator(graph, &expected, epsilon.is_some(), epsilon.unwrap_or(0.0))?;
        comparator.connect_candidate(graph, &stored)?;
        let sample_in = graph.flow_in(sample, "in")?;
        let sample_out = graph.flow_out(sample, "out")?;

        let (store_in, _) = self.store_outcome(&comparator.is_equal)?;
        self.ctx.graph_mut().connect_flow(&sample_out, &store_in)?;

        let expected_text = self
            .checkbox()
            .expected_value_as_string()
            .unwrap_or_default();
        self.resolve(
            &format!("expected {expected_text}, observed {{0}}"),
            &[stored],
        )?;
        Ok(sample_in)
    }

    /// Passes iff inputs `a` and `b` differ when the returned flow runs.
    pub fn setup_check_value_differs(&mut self) -> Result<ValueDiffers, ConstructionError> {
        self.begin(Expectation::ValuesDiffer)?;
        let graph = self.ctx.graph_mut();
        let eq = graph.create_node(NodeType::MathEq)?;
        let a = graph.value_in(eq, "a")?;
        let b = graph.value_in(eq, "b")?;
        let equal = graph.value_out(eq, "value")?;
        let differ = math(graph, NodeType::MathNot, &equal, None)?;
        let (flow, _) = self.store_outcome(&differ)?;
        let detail = if self.negated() {
            "values differed"
        } else {
            "values were equal"
        };
        self.resolve(detail, &[])?;
        Ok(ValueDiffers { flow, a, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use behave_graph_core::Registry;

    #[test]
    fn allocation_is_idempotent() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "idem");
        let id = ctx.add_checkbox("sum");
        let mut check = ctx.check(id).unwrap();
        let first = check.ensure_result_variable().unwrap();
        let second = check.ensure_result_variable().unwrap();
        assert_eq!(first, second);
        let value = check.ensure_value_variable(ValueKind::Float).unwrap();
        assert_eq!(check.ensure_value_variable(ValueKind::Float).unwrap(), value);
        assert_eq!(ctx.graph().variables().count(), 2);
        let cb = ctx.checkbox(id).unwrap();
        assert_eq!(cb.result_variable_name(), Some("idem_sum"));
        assert_eq!(cb.value_variable_name(), Some("idem_sum_value"));
    }

    #[test]
    fn colliding_labels_get_suffixes() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "dup");
        let a = ctx.add_checkbox("same");
        let b = ctx.add_checkbox("same");
        ctx.check(a).unwrap().ensure_result_variable().unwrap();
        ctx.check(b).unwrap().ensure_result_variable().unwrap();
        assert_eq!(ctx.checkbox(a).unwrap().result_variable_name(), Some("dup_same"));
        assert_eq!(ctx.checkbox(b).unwrap().result_variable_name(), Some("dup_same_1"));
    }

    #[test]
    fn markers_are_reserved_per_assertion() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "markers");
        let a = ctx.add_checkbox("a");
        let b = ctx.add_checkbox("b");
        assert_eq!(ctx.checkbox(a).unwrap().marker().failed, 2);
        assert_eq!(ctx.checkbox(b).unwrap().marker().waiting, 3);
    }

    #[test]
    fn setup_requires_an_entry_point() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "early");
        let id = ctx.add_checkbox("flow");
        assert_eq!(
            ctx.check(id).unwrap().setup_check_flow(),
            Err(ConstructionError::NoEntryPoint)
        );
    }

    #[test]
    fn null_expected_value_fails_construction() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "null");
        ctx.new_entry_point("main").unwrap();
        let var = ctx.graph_mut().add_variable("x", 1.0_f32).unwrap();
        let source = ctx.graph_mut().get_variable(var).unwrap();
        let id = ctx.add_checkbox("value");
        let err = ctx
            .check(id)
            .unwrap()
            .setup_check_value(&source, None::<Value>, false)
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::MissingExpectedValue {
                label: "value".into()
            }
        );
        let err = ctx
            .check(id)
            .unwrap()
            .setup_check_value_json(&source, &serde_json::Value::Null, false)
            .unwrap_err();
        assert!(matches!(err, ConstructionError::MissingExpectedValue { .. }));
        assert!(ctx.checkbox(id).unwrap().expectation().is_none());
    }

    #[test]
    fn assertions_are_set_up_once() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "twice");
        ctx.new_entry_point("main").unwrap();
        let id = ctx.add_checkbox("flow");
        ctx.check(id).unwrap().setup_check_flow().unwrap();
        assert!(matches!(
            ctx.check(id).unwrap().setup_check_flow_times(2),
            Err(ConstructionError::AlreadyConfigured { .. })
        ));
        assert!(matches!(
            ctx.check(id).unwrap().setup_negate_check_flow(),
            Err(ConstructionError::AlreadyConfigured { .. })
        ));
        assert!(!ctx.checkbox(id).unwrap().is_negated());
    }

    #[test]
    fn invalid_counts_are_rejected() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "counts");
        ctx.new_entry_point("main").unwrap();
        let id = ctx.add_checkbox("multi");
        assert!(matches!(
            ctx.check(id).unwrap().setup_multi_flow_check(0, &[]),
            Err(ConstructionError::InvalidCount { got: 0, .. })
        ));
        assert!(matches!(
            ctx.check(id).unwrap().setup_order_flow_check(&[]),
            Err(ConstructionError::InvalidCount { .. })
        ));
    }

    #[test]
    fn expected_strings_describe_the_contract() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "describe");
        ctx.new_entry_point("main").unwrap();
        let var = ctx
            .graph_mut()
            .add_variable("dir", Value::vec3(0.0, 1.0, 0.0))
            .unwrap();
        let source = ctx.graph_mut().get_variable(var).unwrap();

        let value = ctx.add_checkbox("dir");
        ctx.check(value)
            .unwrap()
            .setup_check_value(&source, Value::vec3(0.0, 1.0, 0.0), true)
            .unwrap();
        let never = ctx.add_checkbox("never");
        ctx.check(never).unwrap().setup_negate_check_flow().unwrap();
        let times = ctx.add_checkbox("times");
        ctx.check(times).unwrap().setup_check_flow_times(3).unwrap();

        let text = |id| ctx.checkbox(id).unwrap().expected_value_as_string();
        assert_eq!(text(value).as_deref(), Some("(0, 1, 0) +/- 0.0001"));
        assert_eq!(text(never).as_deref(), Some("not triggered"));
        assert_eq!(text(times).as_deref(), Some("triggered 3 times"));
    }

    #[test]
    fn result_defaults_follow_negation() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "defaults");
        ctx.new_entry_point("main").unwrap();
        let plain = ctx.add_checkbox("plain");
        ctx.check(plain).unwrap().setup_check_flow().unwrap();
        let negated = ctx.add_checkbox("negated");
        ctx.check(negated).unwrap().setup_negate_check_flow().unwrap();

        let initial = |id| {
            let var = ctx.checkbox(id).unwrap().result_variable().unwrap();
            ctx.graph().variable(var).unwrap().value.clone()
        };
        assert_eq!(initial(plain), Value::Bool(false));
        assert_eq!(initial(negated), Value::Bool(true));
    }

    #[test]
    fn preallocated_result_follows_a_later_negation() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "early");
        ctx.new_entry_point("main").unwrap();
        let id = ctx.add_checkbox("never");
        let mut check = ctx.check(id).unwrap();
        let result = check.ensure_result_variable().unwrap();
        check.setup_negate_check_flow().unwrap();
        assert_eq!(ctx.graph().variable(result).unwrap().value, Value::Bool(true));

        let graph = ctx.into_graph();
        let mut rt = behave_graph_core::FlowRuntime::new(&graph);
        rt.trigger_event("early_main").unwrap();
        assert_eq!(rt.variable_by_id(result), Some(&Value::Bool(true)));
        assert_eq!(rt.logs(), ["PASS never"]);
    }

    #[test]
    fn failed_negated_setup_leaves_the_assertion_plain() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "retry");
        let id = ctx.add_checkbox("flow");
        assert_eq!(
            ctx.check(id).unwrap().setup_negate_check_flow(),
            Err(ConstructionError::NoEntryPoint)
        );
        assert!(!ctx.checkbox(id).unwrap().is_negated());

        ctx.new_entry_point("main").unwrap();
        ctx.check(id).unwrap().setup_check_flow().unwrap();
        let cb = ctx.checkbox(id).unwrap();
        assert!(!cb.is_negated());
        assert_eq!(cb.expected_value_as_string().as_deref(), Some("triggered"));
    }

    #[test]
    fn flow_counts_beyond_the_int_range_are_rejected() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "huge");
        ctx.new_entry_point("main").unwrap();
        let id = ctx.add_checkbox("count");
        let too_many = i32::MAX as usize + 1;
        assert!(matches!(
            ctx.check(id).unwrap().setup_check_flow_times(too_many),
            Err(ConstructionError::CountOutOfRange { got, .. }) if got == too_many
        ));
        assert!(ctx.checkbox(id).unwrap().expectation().is_none());
    }
}
