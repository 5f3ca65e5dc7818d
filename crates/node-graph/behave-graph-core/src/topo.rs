use crate::error::GraphError;
use crate::graph::Node;
use crate::types::{NodeId, ValueInput};
use std::collections::{HashMap, VecDeque};

/// Order nodes so that every value producer precedes its consumers.
///
/// Only value connections participate: flow edges may legitimately loop back (loop and gate
/// reset wiring), value edges may not.
pub fn topo_order(nodes: &[Node]) -> Result<Vec<NodeId>, GraphError> {
    let mut indeg: HashMap<NodeId, usize> = HashMap::new();
    let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for n in nodes {
        indeg.entry(n.id).or_insert(0);
        for inp in n.values.values() {
            if let ValueInput::Link(src) = inp {
                adj.entry(src.node).or_default().push(n.id);
                *indeg.entry(n.id).or_default() += 1;
            }
        }
    }

    let mut ready: Vec<NodeId> = indeg
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(k, _)| *k)
        .collect();
    ready.sort();
    let mut q: VecDeque<NodeId> = ready.into();

    let mut order = Vec::new();
    while let Some(u) = q.pop_front() {
        order.push(u);
        if let Some(vs) = adj.get(&u) {
            for v in vs {
                if let Some(d) = indeg.get_mut(v) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(*v);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}
