//! Arena behavior graph: nodes addressed by stable index, explicit value and flow edges.
//!
//! A [`Graph`] borrows the [`Registry`] it was created with; every socket accessor checks the
//! socket name against the node's [`NodeSignature`](crate::schema::NodeSignature) so that a
//! misspelled socket fails at construction time instead of producing a dangling edge.

use behave_api_core::{PointerTemplate, Value, ValueKind};
use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::GraphError;
use crate::schema::{NodeSignature, Registry};
use crate::types::{
    FlowInRef, FlowOutRef, NodeId, NodeParams, NodeType, ValueInRef, ValueInput, ValueOutRef,
    VariableId,
};

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "op")]
    pub kind: NodeType,
    #[serde(skip_serializing_if = "is_default_params")]
    pub params: NodeParams,
    /// Value-In bindings keyed by socket name, in binding order.
    pub values: IndexMap<String, ValueInput>,
    /// Flow-Out edges keyed by socket name; destinations fire in connection order.
    pub flows: IndexMap<String, Vec<FlowInRef>>,
}

fn is_default_params(params: &NodeParams) -> bool {
    *params == NodeParams::default()
}

impl Node {
    /// Destinations connected to `socket`, empty when unconnected.
    pub fn flow_targets(&self, socket: &str) -> &[FlowInRef] {
        self.flows.get(socket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Numbered flow outputs (`"0"`, `"1"`, ...) in numeric order.
    pub fn numbered_flow_outputs(&self) -> Vec<(usize, &str)> {
        let mut out: Vec<(usize, &str)> = self
            .flows
            .keys()
            .filter_map(|k| k.parse::<usize>().ok().map(|i| (i, k.as_str())))
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out
    }

    /// Numbered value inputs (`"0"`, `"1"`, ...) in numeric order.
    pub fn numbered_value_inputs(&self) -> Vec<(usize, &str)> {
        let mut out: Vec<(usize, &str)> = self
            .values
            .keys()
            .filter_map(|k| k.parse::<usize>().ok().map(|i| (i, k.as_str())))
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Graph<'r> {
    #[serde(skip)]
    registry: &'r Registry,
    nodes: Vec<Node>,
    variables: IndexMap<String, Variable>,
    events: Vec<String>,
    #[serde(skip)]
    flow_sources: HashMap<FlowInRef, FlowOutRef>,
}

impl<'r> Graph<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Graph {
            registry,
            nodes: Vec::new(),
            variables: IndexMap::new(),
            events: Vec::new(),
            flow_sources: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::UnknownNode(id))
    }

    fn signature(&self, id: NodeId) -> Result<&'r NodeSignature, GraphError> {
        let kind = self.node(id)?.kind;
        self.registry
            .get(kind)
            .ok_or(GraphError::NotRegistered(kind))
    }

    /// Instantiate an operation node.
    pub fn create_node(&mut self, kind: NodeType) -> Result<NodeId, GraphError> {
        if self.registry.get(kind).is_none() {
            return Err(GraphError::NotRegistered(kind));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            params: NodeParams::default(),
            values: IndexMap::new(),
            flows: IndexMap::new(),
        });
        log::trace!("created node {id} ({kind})");
        Ok(id)
    }

    /// Instantiate an operation node by its schema name (e.g. `math/add`).
    pub fn create_node_by_name(&mut self, op: &str) -> Result<NodeId, GraphError> {
        let kind = self
            .registry
            .by_name(op)
            .map(|sig| sig.type_id)
            .ok_or_else(|| GraphError::UnknownOp(op.to_string()))?;
        self.create_node(kind)
    }

    /// Instantiate a node and apply its static configuration.
    pub fn create_configured(
        &mut self,
        kind: NodeType,
        params: NodeParams,
    ) -> Result<NodeId, GraphError> {
        let id = self.create_node(kind)?;
        self.node_mut(id)?.params = params;
        Ok(id)
    }

    fn admits_value_input(&self, id: NodeId, socket: &str) -> Result<bool, GraphError> {
        let node = self.node(id)?;
        let sig = self.signature(id)?;
        if sig.input(socket).is_some() {
            return Ok(true);
        }
        if sig.variadic_inputs.as_ref().is_some_and(|v| v.admits(socket)) {
            return Ok(true);
        }
        Ok(node
            .params
            .pointer
            .as_ref()
            .is_some_and(|p| p.params().any(|name| name == socket)))
    }

    pub fn value_in(&self, id: NodeId, socket: &str) -> Result<ValueInRef, GraphError> {
        if !self.admits_value_input(id, socket)? {
            return Err(GraphError::UnknownSocket {
                node: id,
                op: self.node(id)?.kind,
                direction: "value input",
                socket: socket.to_string(),
            });
        }
        Ok(ValueInRef {
            node: id,
            socket: socket.to_string(),
        })
    }

    /// Value-Out handle, tagged with the port's declared type or the node's configured type.
    pub fn value_out(&self, id: NodeId, socket: &str) -> Result<ValueOutRef, GraphError> {
        let node = self.node(id)?;
        let sig = self.signature(id)?;
        let declared = match sig.output(socket) {
            Some(port) => port.ty.kind(),
            None if sig.variadic_outputs.as_ref().is_some_and(|v| v.admits(socket)) => sig
                .variadic_outputs
                .as_ref()
                .and_then(|v| v.ty.kind()),
            None => {
                return Err(GraphError::UnknownSocket {
                    node: id,
                    op: node.kind,
                    direction: "value output",
                    socket: socket.to_string(),
                })
            }
        };
        let kind = declared.or(match node.kind {
            NodeType::VariableGet => node
                .params
                .variable
                .and_then(|v| self.variables.get_index(v.0))
                .map(|(_, var)| var.value.kind()),
            NodeType::PointerGet if socket == "value" => node.params.value_type,
            _ => None,
        });
        Ok(ValueOutRef::new(id, socket, kind))
    }

    pub fn flow_in(&self, id: NodeId, socket: &str) -> Result<FlowInRef, GraphError> {
        if !self.signature(id)?.has_flow_input(socket) {
            return Err(GraphError::UnknownSocket {
                node: id,
                op: self.node(id)?.kind,
                direction: "flow input",
                socket: socket.to_string(),
            });
        }
        Ok(FlowInRef {
            node: id,
            socket: socket.to_string(),
        })
    }

    pub fn flow_out(&self, id: NodeId, socket: &str) -> Result<FlowOutRef, GraphError> {
        if !self.signature(id)?.has_flow_output(socket) {
            return Err(GraphError::UnknownSocket {
                node: id,
                op: self.node(id)?.kind,
                direction: "flow output",
                socket: socket.to_string(),
            });
        }
        Ok(FlowOutRef {
            node: id,
            socket: socket.to_string(),
        })
    }

    /// Bind a literal to a Value-In.
    pub fn set_value(
        &mut self,
        input: &ValueInRef,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(input.node)?;
        node.values
            .insert(input.socket.clone(), ValueInput::Literal(value.into()));
        Ok(())
    }

    /// Connect a Value-In to a producing Value-Out, replacing any previous binding.
    pub fn connect_value(
        &mut self,
        input: &ValueInRef,
        source: &ValueOutRef,
    ) -> Result<(), GraphError> {
        self.node(source.node)?;
        let node = self.node_mut(input.node)?;
        node.values
            .insert(input.socket.clone(), ValueInput::Link(source.clone()));
        log::trace!(
            "value {}.{} <- {}.{}",
            input.node,
            input.socket,
            source.node,
            source.socket
        );
        Ok(())
    }

    /// Shorthand for `value_in` followed by `set_value`.
    pub fn set_input(
        &mut self,
        id: NodeId,
        socket: &str,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let input = self.value_in(id, socket)?;
        self.set_value(&input, value)
    }

    /// Shorthand for `value_in` followed by `connect_value`.
    pub fn link_input(
        &mut self,
        id: NodeId,
        socket: &str,
        source: &ValueOutRef,
    ) -> Result<(), GraphError> {
        let input = self.value_in(id, socket)?;
        self.connect_value(&input, source)
    }

    /// Connect a Flow-Out to a Flow-In. A Flow-Out may fan out; a Flow-In accepts one source.
    pub fn connect_flow(&mut self, from: &FlowOutRef, to: &FlowInRef) -> Result<(), GraphError> {
        self.node(to.node)?;
        if let Some(existing) = self.flow_sources.get(to) {
            return Err(GraphError::FlowFanIn {
                target: to.clone(),
                existing: existing.clone(),
            });
        }
        let node = self.node_mut(from.node)?;
        node.flows
            .entry(from.socket.clone())
            .or_default()
            .push(to.clone());
        self.flow_sources.insert(to.clone(), from.clone());
        log::trace!("flow {from} -> {to}");
        Ok(())
    }

    /// Remove every edge leaving `from`, returning the former destinations in order.
    pub fn disconnect_flow_out(&mut self, from: &FlowOutRef) -> Result<Vec<FlowInRef>, GraphError> {
        let node = self.node_mut(from.node)?;
        let removed = node
            .flows
            .get_mut(&from.socket)
            .map(std::mem::take)
            .unwrap_or_default();
        for target in &removed {
            self.flow_sources.remove(target);
        }
        Ok(removed)
    }

    /// Remove the single edge `from -> to`. Returns whether it existed.
    pub fn disconnect_flow(
        &mut self,
        from: &FlowOutRef,
        to: &FlowInRef,
    ) -> Result<bool, GraphError> {
        if self.flow_sources.get(to) != Some(from) {
            return Ok(false);
        }
        let node = self.node_mut(from.node)?;
        if let Some(targets) = node.flows.get_mut(&from.socket) {
            targets.retain(|t| t != to);
        }
        self.flow_sources.remove(to);
        Ok(true)
    }

    /// The Flow-Out currently driving `to`, if any.
    pub fn flow_source(&self, to: &FlowInRef) -> Option<&FlowOutRef> {
        self.flow_sources.get(to)
    }

    /// Reserve a numbered flow output on variadic nodes so it appears even when unconnected.
    pub fn ensure_flow_output(&mut self, from: &FlowOutRef) -> Result<(), GraphError> {
        let node = self.node_mut(from.node)?;
        node.flows.entry(from.socket.clone()).or_default();
        Ok(())
    }

    // --- Variables -------------------------------------------------------

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.variables
            .values()
            .enumerate()
            .map(|(i, v)| (VariableId(i), v))
    }

    pub fn variable(&self, id: VariableId) -> Result<&Variable, GraphError> {
        self.variables
            .get_index(id.0)
            .map(|(_, v)| v)
            .ok_or(GraphError::UnknownVariable(id))
    }

    pub fn variable_id(&self, name: &str) -> Option<VariableId> {
        self.variables.get_index_of(name).map(VariableId)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Declare a new variable. Names are unique within the graph.
    pub fn add_variable(
        &mut self,
        name: &str,
        initial: impl Into<Value>,
    ) -> Result<VariableId, GraphError> {
        if self.variables.contains_key(name) {
            return Err(GraphError::DuplicateVariable(name.to_string()));
        }
        let value = initial.into();
        log::debug!("variable '{name}' = {value} ({})", value.kind());
        let (index, _) = self.variables.insert_full(
            name.to_string(),
            Variable {
                name: name.to_string(),
                value,
            },
        );
        Ok(VariableId(index))
    }

    /// Return the id of `name`, declaring it with `initial` when absent.
    pub fn add_variable_with_id_if_needed(
        &mut self,
        name: &str,
        initial: impl Into<Value>,
    ) -> VariableId {
        match self.variable_id(name) {
            Some(id) => id,
            None => {
                let (index, _) = self.variables.insert_full(
                    name.to_string(),
                    Variable {
                        name: name.to_string(),
                        value: initial.into(),
                    },
                );
                VariableId(index)
            }
        }
    }

    /// Replace the initial value of `id`. The variable keeps its kind.
    pub fn set_initial_value(
        &mut self,
        id: VariableId,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let value = value.into();
        let (_, variable) = self
            .variables
            .get_index_mut(id.0)
            .ok_or(GraphError::UnknownVariable(id))?;
        if variable.value.kind() != value.kind() {
            return Err(GraphError::VariableKind {
                name: variable.name.clone(),
                declared: variable.value.kind(),
                got: value.kind(),
            });
        }
        log::debug!("variable '{}' reset to {value}", variable.name);
        variable.value = value;
        Ok(())
    }

    /// A `variable/get` node reading `id`; returns its typed Value-Out.
    pub fn get_variable(&mut self, id: VariableId) -> Result<ValueOutRef, GraphError> {
        self.variable(id)?;
        let node = self.create_configured(
            NodeType::VariableGet,
            NodeParams {
                variable: Some(id),
                ..Default::default()
            },
        )?;
        self.value_out(node, "value")
    }

    /// A `variable/set` node writing `id`. Bind its `value` input and drive its `in` flow.
    pub fn set_variable(&mut self, id: VariableId) -> Result<NodeId, GraphError> {
        self.variable(id)?;
        self.create_configured(
            NodeType::VariableSet,
            NodeParams {
                variable: Some(id),
                ..Default::default()
            },
        )
    }

    // --- Events, pointers, logging ----------------------------------------

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// An `event/receive` node for a named, externally triggerable event.
    pub fn receive_event(&mut self, name: &str) -> Result<NodeId, GraphError> {
        if !self.events.iter().any(|e| e == name) {
            self.events.push(name.to_string());
        }
        self.create_configured(
            NodeType::EventReceive,
            NodeParams {
                event: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    /// A `pointer/get` or `pointer/set` node for `template`, with one Value-In per template
    /// parameter. Parameters bound in `targets` are set to the given literal.
    pub fn pointer_node(
        &mut self,
        kind: NodeType,
        template: &str,
        value_type: ValueKind,
        targets: &[(&str, i32)],
    ) -> Result<NodeId, GraphError> {
        let pointer = PointerTemplate::parse(template)?;
        let id = self.create_configured(
            kind,
            NodeParams {
                pointer: Some(pointer),
                value_type: Some(value_type),
                ..Default::default()
            },
        )?;
        for (param, value) in targets {
            self.set_input(id, param, Value::Int(*value))?;
        }
        Ok(id)
    }

    /// A `debug/log` node with `message`; numbered inputs `"0"..` feed its placeholders.
    pub fn debug_log(&mut self, message: &str) -> Result<NodeId, GraphError> {
        self.create_configured(
            NodeType::DebugLog,
            NodeParams {
                message: Some(message.to_string()),
                ..Default::default()
            },
        )
    }

    // --- Validation & export --------------------------------------------

    /// Check that every required input is bound, configured nodes carry their configuration
    /// and value connections are acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        for node in &self.nodes {
            let sig = self.signature(node.id)?;
            for port in sig.inputs.iter().filter(|p| !p.optional) {
                if !node.values.contains_key(port.id) {
                    return Err(GraphError::UnboundInput {
                        node: node.id,
                        op: node.kind,
                        socket: port.id.to_string(),
                    });
                }
            }
            if let Some(pointer) = &node.params.pointer {
                for param in pointer.params() {
                    if !node.values.contains_key(param) {
                        return Err(GraphError::UnboundInput {
                            node: node.id,
                            op: node.kind,
                            socket: param.to_string(),
                        });
                    }
                }
            }
            let missing = match node.kind {
                NodeType::EventReceive if node.params.event.is_none() => Some("event"),
                NodeType::VariableGet | NodeType::VariableSet if node.params.variable.is_none() => {
                    Some("variable")
                }
                NodeType::PointerGet | NodeType::PointerSet if node.params.pointer.is_none() => {
                    Some("pointer")
                }
                NodeType::DebugLog if node.params.message.is_none() => Some("message"),
                NodeType::FlowWaitAll if node.params.input_flows.is_none() => Some("inputFlows"),
                _ => None,
            };
            if let Some(param) = missing {
                return Err(GraphError::MissingParam {
                    node: node.id,
                    op: node.kind,
                    param,
                });
            }
            for input in node.values.values() {
                if let ValueInput::Link(src) = input {
                    self.node(src.node)?;
                }
            }
            if let Some(var) = node.params.variable {
                self.variable(var)?;
            }
        }
        crate::topo::topo_order(&self.nodes)?;
        Ok(())
    }

    /// Serialize the graph document.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
