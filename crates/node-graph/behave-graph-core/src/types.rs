use behave_api_core::{PointerTemplate, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable arena index of a node. Nodes are never removed from a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a variable in the graph's variable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeType {
    // Events
    #[serde(rename = "event/onStart")]
    EventOnStart,
    #[serde(rename = "event/receive")]
    EventReceive,

    // Flow control
    #[serde(rename = "flow/sequence")]
    FlowSequence,
    #[serde(rename = "flow/branch")]
    FlowBranch,
    #[serde(rename = "flow/setDelay")]
    FlowSetDelay,
    #[serde(rename = "flow/for")]
    FlowFor,
    #[serde(rename = "flow/doN")]
    FlowDoN,
    #[serde(rename = "flow/multiGate")]
    FlowMultiGate,
    #[serde(rename = "flow/waitAll")]
    FlowWaitAll,

    // Math
    #[serde(rename = "math/add")]
    MathAdd,
    #[serde(rename = "math/sub")]
    MathSub,
    #[serde(rename = "math/mul")]
    MathMul,
    #[serde(rename = "math/div")]
    MathDiv,
    #[serde(rename = "math/abs")]
    MathAbs,
    #[serde(rename = "math/lt")]
    MathLt,
    #[serde(rename = "math/gt")]
    MathGt,
    #[serde(rename = "math/eq")]
    MathEq,
    #[serde(rename = "math/isNaN")]
    MathIsNaN,
    #[serde(rename = "math/and")]
    MathAnd,
    #[serde(rename = "math/or")]
    MathOr,
    #[serde(rename = "math/not")]
    MathNot,
    #[serde(rename = "math/length")]
    MathLength,
    #[serde(rename = "math/normalize")]
    MathNormalize,
    #[serde(rename = "math/dot")]
    MathDot,
    #[serde(rename = "math/extract4x4")]
    MathExtract4x4,
    #[serde(rename = "math/select")]
    MathSelect,
    #[serde(rename = "math/random")]
    MathRandom,

    // Type conversion
    #[serde(rename = "type/boolToFloat")]
    TypeBoolToFloat,
    #[serde(rename = "type/intToFloat")]
    TypeIntToFloat,

    // State
    #[serde(rename = "variable/get")]
    VariableGet,
    #[serde(rename = "variable/set")]
    VariableSet,
    #[serde(rename = "pointer/get")]
    PointerGet,
    #[serde(rename = "pointer/set")]
    PointerSet,

    // Sinks
    #[serde(rename = "debug/log")]
    DebugLog,
}

impl NodeType {
    pub const ALL: [NodeType; 34] = [
        NodeType::EventOnStart,
        NodeType::EventReceive,
        NodeType::FlowSequence,
        NodeType::FlowBranch,
        NodeType::FlowSetDelay,
        NodeType::FlowFor,
        NodeType::FlowDoN,
        NodeType::FlowMultiGate,
        NodeType::FlowWaitAll,
        NodeType::MathAdd,
        NodeType::MathSub,
        NodeType::MathMul,
        NodeType::MathDiv,
        NodeType::MathAbs,
        NodeType::MathLt,
        NodeType::MathGt,
        NodeType::MathEq,
        NodeType::MathIsNaN,
        NodeType::MathAnd,
        NodeType::MathOr,
        NodeType::MathNot,
        NodeType::MathLength,
        NodeType::MathNormalize,
        NodeType::MathDot,
        NodeType::MathExtract4x4,
        NodeType::MathSelect,
        NodeType::MathRandom,
        NodeType::TypeBoolToFloat,
        NodeType::TypeIntToFloat,
        NodeType::VariableGet,
        NodeType::VariableSet,
        NodeType::PointerGet,
        NodeType::PointerSet,
        NodeType::DebugLog,
    ];

    /// Operation identifier as written into serialized graphs (e.g. `math/add`).
    pub fn op_name(self) -> &'static str {
        match self {
            NodeType::EventOnStart => "event/onStart",
            NodeType::EventReceive => "event/receive",
            NodeType::FlowSequence => "flow/sequence",
            NodeType::FlowBranch => "flow/branch",
            NodeType::FlowSetDelay => "flow/setDelay",
            NodeType::FlowFor => "flow/for",
            NodeType::FlowDoN => "flow/doN",
            NodeType::FlowMultiGate => "flow/multiGate",
            NodeType::FlowWaitAll => "flow/waitAll",
            NodeType::MathAdd => "math/add",
            NodeType::MathSub => "math/sub",
            NodeType::MathMul => "math/mul",
            NodeType::MathDiv => "math/div",
            NodeType::MathAbs => "math/abs",
            NodeType::MathLt => "math/lt",
            NodeType::MathGt => "math/gt",
            NodeType::MathEq => "math/eq",
            NodeType::MathIsNaN => "math/isNaN",
            NodeType::MathAnd => "math/and",
            NodeType::MathOr => "math/or",
            NodeType::MathNot => "math/not",
            NodeType::MathLength => "math/length",
            NodeType::MathNormalize => "math/normalize",
            NodeType::MathDot => "math/dot",
            NodeType::MathExtract4x4 => "math/extract4x4",
            NodeType::MathSelect => "math/select",
            NodeType::MathRandom => "math/random",
            NodeType::TypeBoolToFloat => "type/boolToFloat",
            NodeType::TypeIntToFloat => "type/intToFloat",
            NodeType::VariableGet => "variable/get",
            NodeType::VariableSet => "variable/set",
            NodeType::PointerGet => "pointer/get",
            NodeType::PointerSet => "pointer/set",
            NodeType::DebugLog => "debug/log",
        }
    }

    /// Nodes that run when a flow reaches them, as opposed to pure value nodes.
    pub fn has_flow(self) -> bool {
        matches!(
            self,
            NodeType::EventOnStart
                | NodeType::EventReceive
                | NodeType::FlowSequence
                | NodeType::FlowBranch
                | NodeType::FlowSetDelay
                | NodeType::FlowFor
                | NodeType::FlowDoN
                | NodeType::FlowMultiGate
                | NodeType::FlowWaitAll
                | NodeType::VariableSet
                | NodeType::PointerSet
                | NodeType::DebugLog
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_name())
    }
}

/// Static configuration of a node instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeParams {
    /// Event name for `event/receive`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Variable targeted by `variable/get` and `variable/set`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<VariableId>,
    /// Pointer template for `pointer/get` and `pointer/set`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerTemplate>,
    /// Declared value type: pointer value type, or the operand type an `math/eq` is restricted to.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueKind>,
    /// Format string for `debug/log`; `{0}`, `{1}`... refer to the numbered value inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of flow inputs awaited by `flow/waitAll`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_flows: Option<usize>,
    /// `flow/multiGate` restarts from the first output once exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loop: Option<bool>,
    /// Seed for `math/random`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A Value-Out socket handle. Carries the semantic type when known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueOutRef {
    pub node: NodeId,
    pub socket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
}

impl ValueOutRef {
    pub fn new(node: NodeId, socket: impl Into<String>, kind: Option<ValueKind>) -> Self {
        ValueOutRef {
            node,
            socket: socket.into(),
            kind,
        }
    }

    /// Re-tag the handle; the original handle is left untouched.
    pub fn with_kind(&self, kind: ValueKind) -> Self {
        ValueOutRef {
            kind: Some(kind),
            ..self.clone()
        }
    }
}

/// A Value-In socket handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueInRef {
    pub node: NodeId,
    pub socket: String,
}

/// A Flow-In socket handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowInRef {
    pub node: NodeId,
    pub socket: String,
}

/// A Flow-Out socket handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowOutRef {
    pub node: NodeId,
    pub socket: String,
}

impl fmt::Display for FlowInRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

impl fmt::Display for FlowOutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

/// What a Value-In is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueInput {
    Literal(Value),
    Link(ValueOutRef),
}
