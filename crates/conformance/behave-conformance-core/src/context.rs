//! Per-case build context: entry points, fallback sequencing and shared helper fragments.
//!
//! An [`Entry`] is an externally triggered `event/receive` node. Flows added to it run in
//! accumulation order when the event fires; fallback flows run afterwards, optionally behind a
//! single `flow/setDelay` timer. The trigger's Flow-Out fans out to the primary head first and
//! the fallback head second, so fallbacks only run once every primary flow had its chance.
//!
//! Wiring is re-finalized after every addition: one flow is connected straight to the trigger,
//! the second one lazily introduces a `flow/sequence` and later flows append outputs to it.

use behave_api_core::Value;
use behave_graph_core::{
    FlowInRef, FlowOutRef, Graph, GraphError, NodeId, NodeType, Registry, ValueOutRef,
    VariableId,
};
use hashbrown::HashMap;
use serde::Serialize;

use crate::checkbox::CheckBox;
use crate::compare::math;
use crate::config::BuildConfig;
use crate::error::ConstructionError;
use crate::marker::MarkerNodes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub usize);

#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    event: String,
    trigger: FlowOutRef,
    flows: Vec<FlowInRef>,
    fallbacks: Vec<FlowInRef>,
    delay: Option<f32>,
    sequence: Option<NodeId>,
    fallback_sequence: Option<NodeId>,
    timer: Option<NodeId>,
    /// Flow-Ins this entry wired onto `trigger`; other edges on the trigger are left alone.
    heads: Vec<FlowInRef>,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event name a host fires to start this entry.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Fires when the entry event is received. Edges callers add here are kept when the
    /// entry rewires its own flows.
    pub fn trigger(&self) -> &FlowOutRef {
        &self.trigger
    }

    pub fn flows(&self) -> &[FlowInRef] {
        &self.flows
    }

    pub fn fallbacks(&self) -> &[FlowInRef] {
        &self.fallbacks
    }

    /// Settle time before fallbacks are evaluated.
    pub fn delay(&self) -> Option<f32> {
        self.delay
    }

    fn extend_delay(&mut self, seconds: f32) {
        self.delay = Some(self.delay.map_or(seconds, |d| d.max(seconds)));
    }
}

/// An integer state variable with a read-add-write chain.
#[derive(Debug, Clone)]
pub struct Counter {
    pub variable: VariableId,
    /// Current value.
    pub value: ValueOutRef,
    /// Adds one when triggered.
    pub increment: FlowInRef,
    /// Continues after the increment was written.
    pub done: FlowOutRef,
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn check_delay(seconds: f32) -> Result<f32, ConstructionError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(ConstructionError::InvalidDelay(seconds))
    }
}

pub struct TestContext<'r> {
    graph: Graph<'r>,
    config: BuildConfig,
    case_name: String,
    entries: Vec<Entry>,
    entry_names: HashMap<String, EntryId>,
    pub(crate) checkboxes: Vec<CheckBox>,
    next_scene_node: i32,
}

impl<'r> TestContext<'r> {
    pub fn new(registry: &'r Registry, case_name: &str) -> Self {
        Self::with_config(registry, case_name, BuildConfig::default())
    }

    pub fn with_config(registry: &'r Registry, case_name: &str, config: BuildConfig) -> Self {
        TestContext {
            graph: Graph::new(registry),
            config,
            case_name: case_name.to_string(),
            entries: Vec::new(),
            entry_names: HashMap::new(),
            checkboxes: Vec::new(),
            next_scene_node: 0,
        }
    }

    pub fn graph(&self) -> &Graph<'r> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph<'r> {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph<'r> {
        self.graph
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn case_name(&self) -> &str {
        &self.case_name
    }

    // --- Entry points ---------------------------------------------------

    pub fn new_entry_point(&mut self, name: &str) -> Result<EntryId, ConstructionError> {
        self.create_entry(name, None)
    }

    /// An entry whose fallbacks wait `seconds` after the trigger before they are evaluated.
    pub fn new_entry_point_with_delay(
        &mut self,
        name: &str,
        seconds: f32,
    ) -> Result<EntryId, ConstructionError> {
        let seconds = check_delay(seconds)?;
        self.create_entry(name, Some(seconds))
    }

    fn create_entry(
        &mut self,
        name: &str,
        delay: Option<f32>,
    ) -> Result<EntryId, ConstructionError> {
        if self.entry_names.contains_key(name) {
            return Err(ConstructionError::DuplicateEntry(name.to_string()));
        }
        let event = self.persistent_name(&[name]);
        let node = self.graph.receive_event(&event)?;
        let trigger = self.graph.flow_out(node, "out")?;
        let id = EntryId(self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            event,
            trigger,
            flows: Vec::new(),
            fallbacks: Vec::new(),
            delay,
            sequence: None,
            fallback_sequence: None,
            timer: None,
            heads: Vec::new(),
        });
        self.entry_names.insert(name.to_string(), id);
        log::debug!("case '{}': entry '{name}' created", self.case_name);
        Ok(id)
    }

    /// The most recently created entry; flow helpers and assertions attach to it.
    pub fn current_entry(&self) -> Result<EntryId, ConstructionError> {
        self.entries
            .len()
            .checked_sub(1)
            .map(EntryId)
            .ok_or(ConstructionError::NoEntryPoint)
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.0)
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&Entry> {
        self.entry_names.get(name).and_then(|id| self.entry(*id))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Run `flow` when the current entry fires, after the flows added before it.
    pub fn add_sequenced_flow(&mut self, flow: &FlowInRef) -> Result<(), ConstructionError> {
        let id = self.current_entry()?;
        self.entries[id.0].flows.push(flow.clone());
        self.finalize(id)
    }

    /// Run `flow` once every primary flow of the current entry had the opportunity to run.
    pub fn add_fallback_flow(&mut self, flow: &FlowInRef) -> Result<(), ConstructionError> {
        let id = self.current_entry()?;
        self.entries[id.0].fallbacks.push(flow.clone());
        self.finalize(id)
    }

    /// Like [`add_fallback_flow`](Self::add_fallback_flow), but fallbacks of the entry wait at
    /// least `seconds` after the trigger.
    pub fn add_fallback_flow_delayed(
        &mut self,
        flow: &FlowInRef,
        seconds: f32,
    ) -> Result<(), ConstructionError> {
        let seconds = check_delay(seconds)?;
        let id = self.current_entry()?;
        let entry = &mut self.entries[id.0];
        entry.extend_delay(seconds);
        entry.fallbacks.push(flow.clone());
        self.finalize(id)
    }

    fn finalize(&mut self, id: EntryId) -> Result<(), ConstructionError> {
        let graph = &mut self.graph;
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or(ConstructionError::NoEntryPoint)?;

        // Release our heads; inner sequence edges stay in place.
        for head in entry.heads.drain(..) {
            graph.disconnect_flow(&entry.trigger, &head)?;
        }
        if let Some(timer) = entry.timer {
            let done = graph.flow_out(timer, "done")?;
            graph.disconnect_flow_out(&done)?;
        }

        let primary = fan_out(graph, &mut entry.sequence, &entry.flows)?;
        let chain = fan_out(graph, &mut entry.fallback_sequence, &entry.fallbacks)?;
        let fallback = match (chain, entry.delay) {
            (Some(chain), Some(seconds)) => {
                let timer = match entry.timer {
                    Some(timer) => timer,
                    None => {
                        let timer = graph.create_node(NodeType::FlowSetDelay)?;
                        entry.timer = Some(timer);
                        timer
                    }
                };
                graph.set_input(timer, "duration", seconds)?;
                let done = graph.flow_out(timer, "done")?;
                graph.connect_flow(&done, &chain)?;
                Some(graph.flow_in(timer, "in")?)
            }
            (chain, _) => chain,
        };

        for head in primary.into_iter().chain(fallback) {
            graph.connect_flow(&entry.trigger, &head)?;
            entry.heads.push(head);
        }
        log::debug!(
            "entry '{}' finalized: {} flows, {} fallbacks, delay {:?}",
            entry.name,
            entry.flows.len(),
            entry.fallbacks.len(),
            entry.delay
        );
        Ok(())
    }

    // --- Helper fragments ------------------------------------------------

    /// An integer counter starting at zero.
    pub fn add_plus_one_counter(&mut self) -> Result<Counter, ConstructionError> {
        self.add_counter_from(0)
    }

    pub fn add_counter_from(&mut self, initial: i32) -> Result<Counter, ConstructionError> {
        self.add_named_counter(&["counter"], initial)
    }

    /// A counter whose variable is named from `parts` (see [`persistent_name`](Self::persistent_name)).
    pub fn add_named_counter(
        &mut self,
        parts: &[&str],
        initial: i32,
    ) -> Result<Counter, ConstructionError> {
        let base = self.persistent_name(parts);
        let name = self.unique_variable_name(&base);
        let variable = self.graph.add_variable(&name, initial)?;
        let value = self.graph.get_variable(variable)?;
        let (increment, done) = self.add_counter_increment(variable)?;
        Ok(Counter {
            variable,
            value,
            increment,
            done,
        })
    }

    /// A further read-add-write chain on an integer variable. Every writer gets its own chain
    /// since a Flow-In accepts a single source.
    pub fn add_counter_increment(
        &mut self,
        variable: VariableId,
    ) -> Result<(FlowInRef, FlowOutRef), ConstructionError> {
        let current = self.graph.get_variable(variable)?;
        let next = math(
            &mut self.graph,
            NodeType::MathAdd,
            &current,
            Some(Value::Int(1).into()),
        )?;
        let set = self.graph.set_variable(variable)?;
        self.graph.link_input(set, "value", &next)?;
        Ok((self.graph.flow_in(set, "in")?, self.graph.flow_out(set, "out")?))
    }

    /// A `debug/log` node; `{0}`, `{1}`... in `message` are replaced by `values`.
    pub fn add_log(
        &mut self,
        message: &str,
        values: &[ValueOutRef],
    ) -> Result<(FlowInRef, FlowOutRef), ConstructionError> {
        let node = self.graph.debug_log(message)?;
        for (index, value) in values.iter().enumerate() {
            self.graph.link_input(node, &index.to_string(), value)?;
        }
        Ok((self.graph.flow_in(node, "in")?, self.graph.flow_out(node, "out")?))
    }

    // --- Naming & scene -------------------------------------------------

    /// `case`, then each part, joined by the configured separator. Characters outside
    /// `[A-Za-z0-9_]` become `_`.
    pub fn persistent_name(&self, parts: &[&str]) -> String {
        let mut name = sanitize(&self.case_name);
        for part in parts {
            name.push_str(&self.config.variable_separator);
            name.push_str(&sanitize(part));
        }
        name
    }

    /// `base`, or `base` with the first free numeric suffix when a variable already uses it.
    pub fn unique_variable_name(&self, base: &str) -> String {
        if !self.graph.has_variable(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}{}{suffix}", self.config.variable_separator);
            if !self.graph.has_variable(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Reserve waiting/passed/failed scene nodes for one assertion.
    pub fn allocate_marker(&mut self) -> MarkerNodes {
        let nodes = MarkerNodes::from_base(self.next_scene_node);
        self.next_scene_node += 3;
        nodes
    }
}

/// Head of `flows`: the flow itself when there is one, else a sequence wired in order.
fn fan_out(
    graph: &mut Graph<'_>,
    sequence: &mut Option<NodeId>,
    flows: &[FlowInRef],
) -> Result<Option<FlowInRef>, GraphError> {
    match flows {
        [] => Ok(None),
        [single] if sequence.is_none() => Ok(Some(single.clone())),
        _ => {
            let seq = match *sequence {
                Some(seq) => seq,
                None => {
                    let seq = graph.create_node(NodeType::FlowSequence)?;
                    log::debug!("sequence {seq} introduced for {} flows", flows.len());
                    *sequence = Some(seq);
                    seq
                }
            };
            for (index, flow) in flows.iter().enumerate() {
                let out = graph.flow_out(seq, &index.to_string())?;
                if graph.flow_source(flow) != Some(&out) {
                    graph.connect_flow(&out, flow)?;
                }
            }
            Ok(Some(graph.flow_in(seq, "in")?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use behave_graph_core::FlowRuntime;

    fn log_flow(ctx: &mut TestContext<'_>, message: &str) -> FlowInRef {
        ctx.add_log(message, &[]).expect("log node").0
    }

    #[test]
    fn flow_helpers_need_an_entry() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "no entry");
        let flow = log_flow(&mut ctx, "x");
        assert_eq!(
            ctx.add_sequenced_flow(&flow),
            Err(ConstructionError::NoEntryPoint)
        );
        assert_eq!(
            ctx.add_fallback_flow(&flow),
            Err(ConstructionError::NoEntryPoint)
        );
        assert!(ctx.add_plus_one_counter().is_ok());
    }

    #[test]
    fn single_flow_connects_to_the_trigger() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "single");
        let id = ctx.new_entry_point("main").unwrap();
        let flow = log_flow(&mut ctx, "only");
        ctx.add_sequenced_flow(&flow).unwrap();
        let trigger = ctx.entry(id).unwrap().trigger().clone();
        assert_eq!(ctx.graph().flow_source(&flow), Some(&trigger));
        assert_eq!(ctx.entry(id).unwrap().event(), "single_main");
    }

    #[test]
    fn later_flows_append_to_a_lazy_sequence() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "seq");
        let id = ctx.new_entry_point("main").unwrap();
        let flows: Vec<FlowInRef> = ["a", "b", "c"]
            .iter()
            .map(|m| log_flow(&mut ctx, m))
            .collect();
        ctx.add_sequenced_flow(&flows[0]).unwrap();
        ctx.add_sequenced_flow(&flows[1]).unwrap();
        let first_source = ctx.graph().flow_source(&flows[0]).cloned();
        let second_source = ctx.graph().flow_source(&flows[1]).cloned();
        ctx.add_sequenced_flow(&flows[2]).unwrap();
        assert_eq!(ctx.graph().flow_source(&flows[0]).cloned(), first_source);
        assert_eq!(ctx.graph().flow_source(&flows[1]).cloned(), second_source);
        assert_eq!(first_source.map(|s| s.socket), Some("0".to_string()));

        let event = ctx.entry(id).unwrap().event().to_string();
        let graph = ctx.into_graph();
        graph.validate().expect("valid graph");
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event(&event).unwrap();
        assert_eq!(rt.logs(), ["a", "b", "c"]);
    }

    #[test]
    fn caller_edges_on_the_trigger_survive_rewiring() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "shared");
        let id = ctx.new_entry_point("main").unwrap();
        let trigger = ctx.entry(id).unwrap().trigger().clone();
        let own = log_flow(&mut ctx, "own");
        ctx.graph_mut().connect_flow(&trigger, &own).unwrap();

        let a = log_flow(&mut ctx, "a");
        ctx.add_sequenced_flow(&a).unwrap();
        let b = log_flow(&mut ctx, "b");
        ctx.add_sequenced_flow(&b).unwrap();
        let fb = log_flow(&mut ctx, "fallback");
        ctx.add_fallback_flow(&fb).unwrap();
        assert_eq!(ctx.graph().flow_source(&own), Some(&trigger));

        let graph = ctx.into_graph();
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event("shared_main").unwrap();
        assert_eq!(rt.logs(), ["own", "a", "b", "fallback"]);
    }

    #[test]
    fn fallbacks_run_after_primary_flows() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "fallback");
        ctx.new_entry_point("main").unwrap();
        let fb1 = log_flow(&mut ctx, "fallback 1");
        ctx.add_fallback_flow(&fb1).unwrap();
        let a = log_flow(&mut ctx, "a");
        ctx.add_sequenced_flow(&a).unwrap();
        let fb2 = log_flow(&mut ctx, "fallback 2");
        ctx.add_fallback_flow(&fb2).unwrap();
        let b = log_flow(&mut ctx, "b");
        ctx.add_sequenced_flow(&b).unwrap();

        let graph = ctx.into_graph();
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event("fallback_main").unwrap();
        assert_eq!(rt.logs(), ["a", "b", "fallback 1", "fallback 2"]);
    }

    #[test]
    fn delayed_fallbacks_wait_for_the_longest_delay() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "delayed");
        let id = ctx.new_entry_point("main").unwrap();
        let a = log_flow(&mut ctx, "a");
        ctx.add_sequenced_flow(&a).unwrap();
        let fb1 = log_flow(&mut ctx, "fallback 1");
        ctx.add_fallback_flow(&fb1).unwrap();
        let fb2 = log_flow(&mut ctx, "fallback 2");
        ctx.add_fallback_flow_delayed(&fb2, 0.5).unwrap();
        let fb3 = log_flow(&mut ctx, "fallback 3");
        ctx.add_fallback_flow_delayed(&fb3, 0.25).unwrap();
        assert_eq!(ctx.entry(id).unwrap().delay(), Some(0.5));

        let graph = ctx.into_graph();
        graph.validate().expect("valid graph");
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event("delayed_main").unwrap();
        assert_eq!(rt.logs(), ["a"]);
        rt.advance(0.25).unwrap();
        assert_eq!(rt.logs(), ["a"]);
        rt.advance(0.25).unwrap();
        assert_eq!(rt.logs(), ["a", "fallback 1", "fallback 2", "fallback 3"]);
    }

    #[test]
    fn entry_level_delay_applies_to_plain_fallbacks() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "settle");
        ctx.new_entry_point_with_delay("main", 1.0).unwrap();
        let fb = log_flow(&mut ctx, "late");
        ctx.add_fallback_flow(&fb).unwrap();
        let graph = ctx.into_graph();
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event("settle_main").unwrap();
        rt.advance(0.5).unwrap();
        assert!(rt.logs().is_empty());
        rt.advance(0.5).unwrap();
        assert_eq!(rt.logs(), ["late"]);
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "bad");
        ctx.new_entry_point("main").unwrap();
        assert_eq!(
            ctx.new_entry_point("main"),
            Err(ConstructionError::DuplicateEntry("main".into()))
        );
        assert!(matches!(
            ctx.new_entry_point_with_delay("late", -1.0),
            Err(ConstructionError::InvalidDelay(_))
        ));
        let flow = log_flow(&mut ctx, "x");
        assert!(matches!(
            ctx.add_fallback_flow_delayed(&flow, f32::NAN),
            Err(ConstructionError::InvalidDelay(_))
        ));
    }

    #[test]
    fn counters_increment_per_trigger() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "count");
        ctx.new_entry_point("main").unwrap();
        let counter = ctx.add_counter_from(5).unwrap();
        ctx.add_sequenced_flow(&counter.increment).unwrap();
        let (extra, _) = ctx.add_counter_increment(counter.variable).unwrap();
        ctx.add_sequenced_flow(&extra).unwrap();
        let name = ctx.graph().variable(counter.variable).unwrap().name.clone();

        let graph = ctx.into_graph();
        let mut rt = FlowRuntime::new(&graph);
        rt.trigger_event("count_main").unwrap();
        rt.trigger_event("count_main").unwrap();
        assert_eq!(rt.variable(&name), Some(&Value::Int(9)));
    }

    #[test]
    fn persistent_names_are_sanitized_and_unique() {
        let registry = Registry::standard();
        let mut ctx = TestContext::new(&registry, "math/add");
        let base = ctx.persistent_name(&["sum ok"]);
        assert_eq!(base, "math_add_sum_ok");
        assert_eq!(ctx.unique_variable_name(&base), base);
        ctx.graph_mut().add_variable(&base, false).unwrap();
        assert_eq!(ctx.unique_variable_name(&base), "math_add_sum_ok_1");
        ctx.graph_mut()
            .add_variable("math_add_sum_ok_1", false)
            .unwrap();
        assert_eq!(ctx.unique_variable_name(&base), "math_add_sum_ok_2");
    }
}
