//! Node signatures and the explicit operation registry.
//!
//! The registry is built once by the caller ([`Registry::standard`]) and passed by reference to
//! every [`Graph`](crate::graph::Graph); there is no process-wide catalog.

use crate::types::NodeType;
use behave_api_core::ValueKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Mat4,
    Any,
}

impl PortType {
    /// Concrete value kind of the port, `None` for generic ports.
    pub fn kind(self) -> Option<ValueKind> {
        match self {
            PortType::Bool => Some(ValueKind::Bool),
            PortType::Int => Some(ValueKind::Int),
            PortType::Float => Some(ValueKind::Float),
            PortType::Vec2 => Some(ValueKind::Vec2),
            PortType::Vec3 => Some(ValueKind::Vec3),
            PortType::Vec4 => Some(ValueKind::Vec4),
            PortType::Quat => Some(ValueKind::Quat),
            PortType::Mat4 => Some(ValueKind::Mat4),
            PortType::Any => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortSpec {
    pub id: &'static str,
    pub ty: PortType,
    pub label: &'static str,
    #[serde(skip_serializing_if = "is_blank")]
    pub doc: &'static str,
    pub optional: bool,
}

/// Numbered sockets `"0"`, `"1"`, ... beyond the fixed ones.
#[derive(Debug, Clone, Serialize)]
pub struct VariadicSpec {
    pub ty: PortType,
    pub label: &'static str,
    pub min: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl VariadicSpec {
    /// Whether `socket` is a numbered socket admitted by this spec.
    pub fn admits(&self, socket: &str) -> bool {
        match socket.parse::<usize>() {
            Ok(index) => self.max.map_or(true, |max| index < max) && index.to_string() == socket,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSignature {
    pub type_id: NodeType,
    pub name: &'static str,
    pub category: &'static str,
    pub flow_inputs: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic_flow_inputs: Option<VariadicSpec>,
    pub flow_outputs: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic_flow_outputs: Option<VariadicSpec>,
    pub inputs: Vec<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic_inputs: Option<VariadicSpec>,
    pub outputs: Vec<PortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic_outputs: Option<VariadicSpec>,
}

impl NodeSignature {
    fn new(type_id: NodeType, name: &'static str, category: &'static str) -> Self {
        NodeSignature {
            type_id,
            name,
            category,
            flow_inputs: Vec::new(),
            variadic_flow_inputs: None,
            flow_outputs: Vec::new(),
            variadic_flow_outputs: None,
            inputs: Vec::new(),
            variadic_inputs: None,
            outputs: Vec::new(),
            variadic_outputs: None,
        }
    }

    fn flows(mut self, inputs: &[&'static str], outputs: &[&'static str]) -> Self {
        self.flow_inputs = inputs.to_vec();
        self.flow_outputs = outputs.to_vec();
        self
    }

    fn inputs(mut self, inputs: Vec<PortSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    fn outputs(mut self, outputs: Vec<PortSpec>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn has_flow_input(&self, socket: &str) -> bool {
        self.flow_inputs.contains(&socket)
            || self
                .variadic_flow_inputs
                .as_ref()
                .is_some_and(|v| v.admits(socket))
    }

    pub fn has_flow_output(&self, socket: &str) -> bool {
        self.flow_outputs.contains(&socket)
            || self
                .variadic_flow_outputs
                .as_ref()
                .is_some_and(|v| v.admits(socket))
    }

    pub fn input(&self, socket: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.id == socket)
    }

    pub fn output(&self, socket: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.id == socket)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub version: &'static str,
    pub nodes: Vec<NodeSignature>,
}

impl Registry {
    /// Build a registry from an explicit list of signatures.
    pub fn with_nodes(nodes: Vec<NodeSignature>) -> Self {
        Registry {
            version: "1.0.0",
            nodes,
        }
    }

    /// The standard catalog of every operation the graph crate understands.
    pub fn standard() -> Self {
        Registry::with_nodes(standard_signatures())
    }

    pub fn get(&self, kind: NodeType) -> Option<&NodeSignature> {
        self.nodes.iter().find(|n| n.type_id == kind)
    }

    /// Look up a signature by its operation name (e.g. `flow/branch`).
    pub fn by_name(&self, op: &str) -> Option<&NodeSignature> {
        self.nodes.iter().find(|n| n.type_id.op_name() == op)
    }

    /// A copy of this registry without `kind`.
    pub fn without(&self, kind: NodeType) -> Self {
        Registry {
            version: self.version,
            nodes: self
                .nodes
                .iter()
                .filter(|n| n.type_id != kind)
                .cloned()
                .collect(),
        }
    }
}

fn is_blank(s: &&'static str) -> bool {
    s.is_empty()
}

// Helpers
fn port(id: &'static str, ty: PortType, label: &'static str) -> PortSpec {
    PortSpec {
        id,
        ty,
        label,
        doc: "",
        optional: false,
    }
}

fn optional(mut spec: PortSpec, doc: &'static str) -> PortSpec {
    spec.optional = true;
    spec.doc = doc;
    spec
}

fn p_a(ty: PortType) -> PortSpec {
    port("a", ty, "A")
}

fn p_b(ty: PortType) -> PortSpec {
    port("b", ty, "B")
}

fn p_value(ty: PortType) -> PortSpec {
    port("value", ty, "Value")
}

fn numbered(ty: PortType, label: &'static str, min: usize, max: Option<usize>) -> VariadicSpec {
    VariadicSpec {
        ty,
        label,
        min,
        max,
    }
}

fn binary(kind: NodeType, name: &'static str, out: PortType) -> NodeSignature {
    NodeSignature::new(kind, name, "Math")
        .inputs(vec![p_a(PortType::Any), p_b(PortType::Any)])
        .outputs(vec![p_value(out)])
}

fn unary(kind: NodeType, name: &'static str, out: PortType) -> NodeSignature {
    NodeSignature::new(kind, name, "Math")
        .inputs(vec![p_a(PortType::Any)])
        .outputs(vec![p_value(out)])
}

fn standard_signatures() -> Vec<NodeSignature> {
    use NodeType::*;
    let mut nodes: Vec<NodeSignature> = Vec::new();

    // Events
    nodes.push(NodeSignature::new(EventOnStart, "On Start", "Event").flows(&[], &["out"]));
    nodes.push(NodeSignature::new(EventReceive, "Receive", "Event").flows(&[], &["out"]));

    // Flow control
    let mut sequence = NodeSignature::new(FlowSequence, "Sequence", "Flow").flows(&["in"], &[]);
    sequence.variadic_flow_outputs = Some(numbered(PortType::Any, "Then", 0, None));
    nodes.push(sequence);

    nodes.push(
        NodeSignature::new(FlowBranch, "Branch", "Flow")
            .flows(&["in"], &["true", "false"])
            .inputs(vec![port("condition", PortType::Bool, "Condition")]),
    );

    nodes.push(
        NodeSignature::new(FlowSetDelay, "Set Delay", "Flow")
            .flows(&["in", "cancel"], &["out", "err", "done"])
            .inputs(vec![port("duration", PortType::Float, "Duration")]),
    );

    nodes.push(
        NodeSignature::new(FlowFor, "For Loop", "Flow")
            .flows(&["in"], &["loopBody", "completed"])
            .inputs(vec![
                port("startIndex", PortType::Int, "Start"),
                port("endIndex", PortType::Int, "End"),
                optional(
                    port("initialIndex", PortType::Int, "Initial"),
                    "Index reported before the loop first runs.",
                ),
            ])
            .outputs(vec![port("index", PortType::Int, "Index")]),
    );

    nodes.push(
        NodeSignature::new(FlowDoN, "Do N", "Flow")
            .flows(&["in", "reset"], &["out"])
            .inputs(vec![port("n", PortType::Int, "N")])
            .outputs(vec![port("currentCount", PortType::Int, "Count")]),
    );

    let mut multi_gate = NodeSignature::new(FlowMultiGate, "Multi Gate", "Flow")
        .flows(&["in", "reset"], &[])
        .outputs(vec![port("lastIndex", PortType::Int, "Last Index")]);
    multi_gate.variadic_flow_outputs = Some(numbered(PortType::Any, "Out", 1, None));
    nodes.push(multi_gate);

    let mut wait_all = NodeSignature::new(FlowWaitAll, "Wait All", "Flow")
        .flows(&["reset"], &["out", "completed"])
        .outputs(vec![port("remainingInputs", PortType::Int, "Remaining")]);
    wait_all.variadic_flow_inputs = Some(numbered(PortType::Any, "In", 1, None));
    nodes.push(wait_all);

    // Math
    nodes.push(binary(MathAdd, "Add", PortType::Any));
    nodes.push(binary(MathSub, "Subtract", PortType::Any));
    nodes.push(binary(MathMul, "Multiply", PortType::Any));
    nodes.push(binary(MathDiv, "Divide", PortType::Any));
    nodes.push(unary(MathAbs, "Absolute", PortType::Any));
    nodes.push(binary(MathLt, "Less Than", PortType::Bool));
    nodes.push(binary(MathGt, "Greater Than", PortType::Bool));
    nodes.push(binary(MathEq, "Equal", PortType::Bool));
    nodes.push(unary(MathIsNaN, "Is NaN", PortType::Bool));
    nodes.push(binary(MathAnd, "And", PortType::Bool));
    nodes.push(binary(MathOr, "Or", PortType::Bool));
    nodes.push(unary(MathNot, "Not", PortType::Bool));
    nodes.push(unary(MathLength, "Length", PortType::Float));
    nodes.push(unary(MathNormalize, "Normalize", PortType::Any));
    nodes.push(binary(MathDot, "Dot", PortType::Float));

    let mut extract = NodeSignature::new(MathExtract4x4, "Extract 4x4", "Math")
        .inputs(vec![p_a(PortType::Mat4)]);
    extract.variadic_outputs = Some(numbered(PortType::Float, "Element", 16, Some(16)));
    nodes.push(extract);

    nodes.push(
        NodeSignature::new(MathSelect, "Select", "Math")
            .inputs(vec![
                port("condition", PortType::Bool, "Condition"),
                p_a(PortType::Any),
                p_b(PortType::Any),
            ])
            .outputs(vec![p_value(PortType::Any)]),
    );

    nodes.push(
        NodeSignature::new(MathRandom, "Random", "Math").outputs(vec![p_value(PortType::Float)]),
    );

    // Type conversion
    nodes.push(
        NodeSignature::new(TypeBoolToFloat, "Bool To Float", "Type")
            .inputs(vec![p_a(PortType::Bool)])
            .outputs(vec![p_value(PortType::Float)]),
    );
    nodes.push(
        NodeSignature::new(TypeIntToFloat, "Int To Float", "Type")
            .inputs(vec![p_a(PortType::Int)])
            .outputs(vec![p_value(PortType::Float)]),
    );

    // State
    nodes.push(
        NodeSignature::new(VariableGet, "Get Variable", "Variable")
            .outputs(vec![p_value(PortType::Any)]),
    );
    nodes.push(
        NodeSignature::new(VariableSet, "Set Variable", "Variable")
            .flows(&["in"], &["out"])
            .inputs(vec![p_value(PortType::Any)]),
    );
    // Pointer template parameters are admitted per instance by the graph.
    nodes.push(
        NodeSignature::new(PointerGet, "Get Pointer", "Pointer").outputs(vec![
            p_value(PortType::Any),
            port("isValid", PortType::Bool, "Is Valid"),
        ]),
    );
    nodes.push(
        NodeSignature::new(PointerSet, "Set Pointer", "Pointer")
            .flows(&["in"], &["out", "err"])
            .inputs(vec![p_value(PortType::Any)]),
    );

    // Sinks
    let mut log = NodeSignature::new(DebugLog, "Log", "Debug").flows(&["in"], &["out"]);
    log.variadic_inputs = Some(numbered(PortType::Any, "Argument", 0, None));
    nodes.push(log);

    nodes
}
