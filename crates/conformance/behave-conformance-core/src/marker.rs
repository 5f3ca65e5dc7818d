//! Visual result markers.
//!
//! Every assertion owns three scene nodes: a "waiting" indicator visible from the start and a
//! "passed" and a "failed" indicator that start hidden. Resolution hides the waiting node and
//! reveals exactly one of the other two through `pointer/set` writes on a visibility pointer.

use behave_api_core::ValueKind;
use behave_graph_core::{FlowInRef, FlowOutRef, Graph, GraphError, NodeType};
use serde::Serialize;

/// Template parameter addressed by the visibility pointer.
pub const NODE_INDEX_PARAM: &str = "nodeIndex";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerNodes {
    pub waiting: i32,
    pub passed: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Passed,
    Failed,
}

impl MarkerNodes {
    /// Three consecutive scene nodes starting at `base`.
    pub fn from_base(base: i32) -> Self {
        MarkerNodes {
            waiting: base,
            passed: base + 1,
            failed: base + 2,
        }
    }

    pub fn node_for(&self, state: MarkerState) -> i32 {
        match state {
            MarkerState::Passed => self.passed,
            MarkerState::Failed => self.failed,
        }
    }
}

fn set_visibility(
    graph: &mut Graph<'_>,
    template: &str,
    node_index: i32,
    visible: bool,
) -> Result<(FlowInRef, FlowOutRef), GraphError> {
    let set = graph.pointer_node(
        NodeType::PointerSet,
        template,
        ValueKind::Bool,
        &[(NODE_INDEX_PARAM, node_index)],
    )?;
    graph.set_input(set, "value", visible)?;
    Ok((graph.flow_in(set, "in")?, graph.flow_out(set, "out")?))
}

/// Emit `waiting -> state`: hide the waiting node, then show the node for `state`.
/// Returns the chain's Flow-In and its final Flow-Out.
pub fn emit_transition(
    graph: &mut Graph<'_>,
    template: &str,
    nodes: &MarkerNodes,
    state: MarkerState,
) -> Result<(FlowInRef, FlowOutRef), GraphError> {
    let (head, hidden) = set_visibility(graph, template, nodes.waiting, false)?;
    let (show, tail) = set_visibility(graph, template, nodes.node_for(state), true)?;
    graph.connect_flow(&hidden, &show)?;
    Ok((head, tail))
}
