use behave_api_core::{PointerError, ValueKind};
use thiserror::Error;

use crate::types::{FlowInRef, FlowOutRef, NodeId, NodeType, VariableId};

/// Construction-time failures raised by [`Graph`](crate::graph::Graph).
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("unknown operation '{0}'")]
    UnknownOp(String),
    #[error("operation '{0}' is not present in the registry")]
    NotRegistered(NodeType),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {node} ({op}) has no {direction} socket '{socket}'")]
    UnknownSocket {
        node: NodeId,
        op: NodeType,
        direction: &'static str,
        socket: String,
    },
    #[error("flow input {target} already has source {existing}")]
    FlowFanIn {
        target: FlowInRef,
        existing: FlowOutRef,
    },
    #[error("variable '{0}' already exists")]
    DuplicateVariable(String),
    #[error("unknown variable {0:?}")]
    UnknownVariable(VariableId),
    #[error("variable '{name}' is declared {declared}, got {got}")]
    VariableKind {
        name: String,
        declared: ValueKind,
        got: ValueKind,
    },
    #[error("node {node} ({op}) is missing configuration '{param}'")]
    MissingParam {
        node: NodeId,
        op: NodeType,
        param: &'static str,
    },
    #[error("node {node} ({op}) has unbound value input '{socket}'")]
    UnboundInput {
        node: NodeId,
        op: NodeType,
        socket: String,
    },
    #[error("cycle detected in value connections")]
    Cycle,
    #[error(transparent)]
    Pointer(#[from] PointerError),
}
