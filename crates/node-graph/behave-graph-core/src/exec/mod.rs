//! Reference interpreter for emitted behavior graphs.
//!
//! [`FlowRuntime`] runs a [`Graph`] under the cooperative, single-threaded model the graphs are
//! written for: a flow activation runs to completion (depth first, fan-out and sequence outputs
//! in order) before control returns, and the only suspension points are `flow/setDelay` timers
//! which fire from [`FlowRuntime::advance`].
//!
//! - [`eval_node`] evaluates pure value nodes on demand.
//! - [`numeric`] provides the shared arithmetic helpers.
//!
//! The interpreter is test tooling: it lets emitted graphs be checked end to end without an
//! engine.

use behave_api_core::{coercion, PointerError, Value};
use hashbrown::HashMap;
use thiserror::Error;

use crate::error::GraphError;
use crate::graph::{Graph, Node};
use crate::types::{FlowInRef, NodeId, NodeType, ValueInput, ValueOutRef, VariableId};

pub mod eval_node;
mod numeric;


const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Error, PartialEq)]
pub enum ExecError {
    #[error("no event/receive node listens to '{0}'")]
    UnknownEvent(String),
    #[error("node {node} has no bound value input '{socket}'")]
    MissingInput { node: NodeId, socket: String },
    #[error("node {node} has no value output '{socket}'")]
    UnknownOutput { node: NodeId, socket: String },
    #[error("node {node} ({op}) is not a pure value node")]
    NotPure { node: NodeId, op: NodeType },
    #[error("node {node} ({op}) cannot be entered through flow input '{socket}'")]
    BadFlowInput {
        node: NodeId,
        op: NodeType,
        socket: String,
    },
    #[error("activation depth exceeded {limit} at node {node}")]
    RecursionLimit { node: NodeId, limit: usize },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Pointer(#[from] PointerError),
}

/// Per-node state persisted between activations.
#[derive(Debug, Clone)]
enum NodeState {
    Loop { index: i32 },
    DoN { count: i32 },
    Gate { next: usize, last: i32 },
    WaitAll { arrived: Vec<bool> },
    Random { state: u64 },
}

#[derive(Debug, Clone)]
struct Timer {
    due: f32,
    seq: u64,
    node: NodeId,
}

pub struct FlowRuntime<'g, 'r> {
    graph: &'g Graph<'r>,
    time: f32,
    variables: Vec<Value>,
    pointers: HashMap<String, Value>,
    logs: Vec<String>,
    states: HashMap<NodeId, NodeState>,
    timers: Vec<Timer>,
    timer_seq: u64,
    depth: usize,
    max_depth: usize,
}

impl<'g, 'r> FlowRuntime<'g, 'r> {
    pub fn new(graph: &'g Graph<'r>) -> Self {
        FlowRuntime {
            graph,
            time: 0.0,
            variables: graph.variables().map(|(_, v)| v.value.clone()).collect(),
            pointers: HashMap::new(),
            logs: Vec::new(),
            states: HashMap::new(),
            timers: Vec::new(),
            timer_seq: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.graph
            .variable_id(name)
            .and_then(|id| self.variables.get(id.0))
    }

    pub fn variable_by_id(&self, id: VariableId) -> Option<&Value> {
        self.variables.get(id.0)
    }

    pub fn pointer(&self, path: &str) -> Option<&Value> {
        self.pointers.get(path)
    }

    /// Seed external state read by `pointer/get`.
    pub fn set_pointer(&mut self, path: &str, value: Value) {
        self.pointers.insert(path.to_string(), value);
    }

    /// Fire every `event/onStart` node.
    pub fn start(&mut self) -> Result<(), ExecError> {
        self.depth = 0;
        let graph = self.graph;
        for node in graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeType::EventOnStart)
        {
            self.fire(node, "out")?;
        }
        Ok(())
    }

    /// Fire every `event/receive` node listening to `name`.
    pub fn trigger_event(&mut self, name: &str) -> Result<(), ExecError> {
        self.depth = 0;
        let graph = self.graph;
        let listeners: Vec<&Node> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeType::EventReceive && n.params.event.as_deref() == Some(name))
            .collect();
        if listeners.is_empty() {
            return Err(ExecError::UnknownEvent(name.to_string()));
        }
        log::debug!("event '{name}' at t={}", self.time);
        for node in listeners {
            self.fire(node, "out")?;
        }
        Ok(())
    }

    /// Advance the clock by `dt` seconds, firing due timers in due-time order.
    pub fn advance(&mut self, dt: f32) -> Result<(), ExecError> {
        self.time += dt;
        loop {
            self.depth = 0;
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= self.time)
                .min_by(|(_, a), (_, b)| {
                    a.due
                        .partial_cmp(&b.due)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.seq.cmp(&b.seq))
                })
                .map(|(i, _)| i);
            let Some(index) = due else { break };
            let timer = self.timers.remove(index);
            let graph = self.graph;
            let node = graph.node(timer.node)?;
            self.fire(node, "done")?;
        }
        Ok(())
    }

    /// Advance in fixed steps until `duration` seconds have elapsed.
    pub fn run_for(&mut self, duration: f32, step: f32) -> Result<(), ExecError> {
        let step = step.max(f32::EPSILON);
        let end = self.time + duration;
        while self.time + step <= end + f32::EPSILON {
            self.advance(step)?;
        }
        Ok(())
    }

    fn enter(&mut self, node: NodeId) -> Result<(), ExecError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExecError::RecursionLimit {
                node,
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Activate every destination of `node.socket`, in connection order.
    fn fire(&mut self, node: &'g Node, socket: &str) -> Result<(), ExecError> {
        for target in node.flow_targets(socket) {
            self.activate(target)?;
        }
        Ok(())
    }

    fn activate(&mut self, target: &FlowInRef) -> Result<(), ExecError> {
        self.enter(target.node)?;
        let result = self.execute(target);
        self.leave();
        result
    }

    fn execute(&mut self, target: &FlowInRef) -> Result<(), ExecError> {
        let graph = self.graph;
        let node = graph.node(target.node)?;
        let socket = target.socket.as_str();
        let bad_input = || ExecError::BadFlowInput {
            node: node.id,
            op: node.kind,
            socket: socket.to_string(),
        };
        match node.kind {
            NodeType::FlowSequence => {
                for (_, out) in node.numbered_flow_outputs() {
                    self.fire(node, out)?;
                }
            }
            NodeType::FlowBranch => {
                let cond = coercion::to_bool(&self.input(node, "condition")?);
                self.fire(node, if cond { "true" } else { "false" })?;
            }
            NodeType::FlowSetDelay => match socket {
                "in" => {
                    let duration = coercion::to_float(&self.input(node, "duration")?);
                    if !duration.is_finite() || duration < 0.0 {
                        self.fire(node, "err")?;
                    } else {
                        self.timer_seq += 1;
                        self.timers.push(Timer {
                            due: self.time + duration,
                            seq: self.timer_seq,
                            node: node.id,
                        });
                        self.fire(node, "out")?;
                    }
                }
                "cancel" => self.timers.retain(|t| t.node != node.id),
                _ => return Err(bad_input()),
            },
            NodeType::FlowFor => {
                let start = coercion::to_int(&self.input(node, "startIndex")?);
                let end = coercion::to_int(&self.input(node, "endIndex")?);
                for i in start..end {
                    self.states.insert(node.id, NodeState::Loop { index: i });
                    self.fire(node, "loopBody")?;
                }
                self.states
                    .insert(node.id, NodeState::Loop { index: end.max(start) });
                self.fire(node, "completed")?;
            }
            NodeType::FlowDoN => match socket {
                "in" => {
                    let n = coercion::to_int(&self.input(node, "n")?);
                    let count = match self.states.get(&node.id) {
                        Some(NodeState::DoN { count }) => *count,
                        _ => 0,
                    };
                    if count < n {
                        self.states
                            .insert(node.id, NodeState::DoN { count: count + 1 });
                        self.fire(node, "out")?;
                    }
                }
                "reset" => {
                    self.states.insert(node.id, NodeState::DoN { count: 0 });
                }
                _ => return Err(bad_input()),
            },
            NodeType::FlowMultiGate => {
                let outputs = node.numbered_flow_outputs();
                match socket {
                    "in" => {
                        let (mut next, _) = match self.states.get(&node.id) {
                            Some(NodeState::Gate { next, last }) => (*next, *last),
                            _ => (0, -1),
                        };
                        if next >= outputs.len() && node.params.is_loop.unwrap_or(false) {
                            next = 0;
                        }
                        if let Some((index, out)) = outputs.get(next).copied() {
                            self.states.insert(
                                node.id,
                                NodeState::Gate {
                                    next: next + 1,
                                    last: index as i32,
                                },
                            );
                            self.fire(node, out)?;
                        }
                    }
                    "reset" => {
                        self.states
                            .insert(node.id, NodeState::Gate { next: 0, last: -1 });
                    }
                    _ => return Err(bad_input()),
                }
            }
            NodeType::FlowWaitAll => {
                let expected = node.params.input_flows.unwrap_or(0);
                if socket == "reset" {
                    self.states.insert(
                        node.id,
                        NodeState::WaitAll {
                            arrived: vec![false; expected],
                        },
                    );
                    return Ok(());
                }
                let slot: usize = socket.parse().map_err(|_| bad_input())?;
                let mut arrived = match self.states.get(&node.id) {
                    Some(NodeState::WaitAll { arrived }) => arrived.clone(),
                    _ => vec![false; expected],
                };
                if let Some(flag) = arrived.get_mut(slot) {
                    *flag = true;
                }
                if arrived.iter().all(|a| *a) {
                    self.states.insert(
                        node.id,
                        NodeState::WaitAll {
                            arrived: vec![false; expected],
                        },
                    );
                    self.fire(node, "completed")?;
                } else {
                    self.states.insert(node.id, NodeState::WaitAll { arrived });
                    self.fire(node, "out")?;
                }
            }
            NodeType::VariableSet => {
                let value = self.input(node, "value")?;
                let id = node.params.variable.ok_or(GraphError::MissingParam {
                    node: node.id,
                    op: node.kind,
                    param: "variable",
                })?;
                match self.variables.get_mut(id.0) {
                    Some(slot) => *slot = value,
                    None => return Err(GraphError::UnknownVariable(id).into()),
                }
                self.fire(node, "out")?;
            }
            NodeType::PointerSet => {
                let path = self.pointer_path(node)?;
                let value = self.input(node, "value")?;
                log::trace!("pointer {path} = {value}");
                self.pointers.insert(path, value);
                self.fire(node, "out")?;
            }
            NodeType::DebugLog => {
                let mut line = node.params.message.clone().unwrap_or_default();
                for (index, key) in node.numbered_value_inputs() {
                    let value = self.input(node, key)?;
                    line = line.replace(&format!("{{{index}}}"), &value.to_string());
                }
                log::info!("{line}");
                self.logs.push(line);
                self.fire(node, "out")?;
            }
            NodeType::EventOnStart | NodeType::EventReceive => self.fire(node, "out")?,
            _ => return Err(bad_input()),
        }
        Ok(())
    }

    fn pointer_path(&mut self, node: &'g Node) -> Result<String, ExecError> {
        let template = node.params.pointer.as_ref().ok_or(GraphError::MissingParam {
            node: node.id,
            op: node.kind,
            param: "pointer",
        })?;
        let mut args: Vec<(&str, i32)> = Vec::new();
        for param in template.params() {
            let value = self.input(node, param)?;
            args.push((param, coercion::to_int(&value)));
        }
        Ok(template.resolve(&args)?)
    }

    /// Resolve the value bound to `socket` on `node`.
    fn input(&mut self, node: &'g Node, socket: &str) -> Result<Value, ExecError> {
        match node.values.get(socket) {
            Some(ValueInput::Literal(v)) => Ok(v.clone()),
            Some(ValueInput::Link(src)) => self.output(src),
            None => Err(ExecError::MissingInput {
                node: node.id,
                socket: socket.to_string(),
            }),
        }
    }

    /// Read a Value-Out: published state for flow nodes, on-demand evaluation for pure nodes.
    pub fn output(&mut self, src: &ValueOutRef) -> Result<Value, ExecError> {
        self.enter(src.node)?;
        let result = self.read_output(src);
        self.leave();
        result
    }

    fn read_output(&mut self, src: &ValueOutRef) -> Result<Value, ExecError> {
        let graph = self.graph;
        let node = graph.node(src.node)?;
        let socket = src.socket.as_str();
        let unknown = || ExecError::UnknownOutput {
            node: node.id,
            socket: socket.to_string(),
        };
        match (node.kind, socket) {
            (NodeType::FlowFor, "index") => match self.states.get(&node.id) {
                Some(NodeState::Loop { index }) => Ok(Value::Int(*index)),
                _ if node.values.contains_key("initialIndex") => self.input(node, "initialIndex"),
                _ => Ok(Value::Int(0)),
            },
            (NodeType::FlowDoN, "currentCount") => Ok(Value::Int(match self.states.get(&node.id) {
                Some(NodeState::DoN { count }) => *count,
                _ => 0,
            })),
            (NodeType::FlowMultiGate, "lastIndex") => {
                Ok(Value::Int(match self.states.get(&node.id) {
                    Some(NodeState::Gate { last, .. }) => *last,
                    _ => -1,
                }))
            }
            (NodeType::FlowWaitAll, "remainingInputs") => {
                let expected = node.params.input_flows.unwrap_or(0);
                let arrived = match self.states.get(&node.id) {
                    Some(NodeState::WaitAll { arrived }) => arrived.iter().filter(|a| **a).count(),
                    _ => 0,
                };
                Ok(Value::Int((expected - arrived) as i32))
            }
            (NodeType::VariableGet, "value") => {
                let id = node.params.variable.ok_or(GraphError::MissingParam {
                    node: node.id,
                    op: node.kind,
                    param: "variable",
                })?;
                self.variables
                    .get(id.0)
                    .cloned()
                    .ok_or_else(|| GraphError::UnknownVariable(id).into())
            }
            (NodeType::PointerGet, "value") => {
                let path = self.pointer_path(node)?;
                Ok(self
                    .pointers
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| eval_node::unset_value(node.params.value_type)))
            }
            (NodeType::PointerGet, "isValid") => {
                let path = self.pointer_path(node)?;
                Ok(Value::Bool(self.pointers.contains_key(&path)))
            }
            (NodeType::MathRandom, "value") => Ok(Value::Float(self.next_random(node))),
            (kind, _) if kind.has_flow() => Err(unknown()),
            (kind, _) => {
                let mut inputs = HashMap::with_capacity(node.values.len());
                for key in node.values.keys() {
                    let value = self.input(node, key)?;
                    inputs.insert(key.clone(), value);
                }
                eval_node::eval_pure(node.id, kind, &node.params, &inputs, socket)
            }
        }
    }

    /// xorshift64 sample in [0, 1).
    fn next_random(&mut self, node: &Node) -> f32 {
        let mut x = match self.states.get(&node.id) {
            Some(NodeState::Random { state }) => *state,
            _ => scramble(node.params.seed.unwrap_or(node.id.0 as u64)),
        };
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.states.insert(node.id, NodeState::Random { state: x });
        (x >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// splitmix64 finalizer; spreads small seeds over the whole state and never yields zero.
fn scramble(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31)).max(1)
}
