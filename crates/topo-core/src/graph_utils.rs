use crate::{LinkId, NodeId, Topology};
use petgraph::algo::astar;
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeSet;

/// Connectivity summary of a selected (active) link subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubgraph {
    /// Nodes touched by at least one active link, in id order
    pub connected_nodes: Vec<NodeId>,
    /// Number of connected components among the touched nodes
    pub components: usize,
}

impl ActiveSubgraph {
    pub fn touches(&self, node: NodeId) -> bool {
        self.connected_nodes.binary_search(&node).is_ok()
    }
}

/// Labels the components formed by `active` links (union-find over endpoints).
///
/// Nodes not touched by any active link are ignored rather than counted as
/// singleton islands.
pub fn analyze_active(topology: &Topology, active: &[LinkId]) -> ActiveSubgraph {
    let mut sets = UnionFind::<usize>::new(topology.num_nodes());
    let mut touched = BTreeSet::new();
    for id in active {
        let link = topology.link(*id);
        sets.union(link.from.value(), link.to.value());
        touched.insert(link.from);
        touched.insert(link.to);
    }
    let roots: BTreeSet<usize> = touched.iter().map(|n| sets.find(n.value())).collect();
    ActiveSubgraph {
        connected_nodes: touched.into_iter().collect(),
        components: roots.len(),
    }
}

/// True when every node in `required` lies in one component of `active`.
pub fn spans_required(topology: &Topology, active: &[LinkId], required: &[NodeId]) -> bool {
    let mut sets = UnionFind::<usize>::new(topology.num_nodes());
    for id in active {
        let link = topology.link(*id);
        sets.union(link.from.value(), link.to.value());
    }
    match required.split_first() {
        None => true,
        Some((first, rest)) => rest
            .iter()
            .all(|n| sets.equiv(first.value(), n.value())),
    }
}

/// Shortest candidate path (by Euclidean length) between two nodes.
///
/// Returns the link ids along the path; parallel candidates resolve to the
/// shortest one, ties broken by the lower link id.
pub fn shortest_link_path(topology: &Topology, from: NodeId, to: NodeId) -> Option<Vec<LinkId>> {
    if from == to {
        return Some(Vec::new());
    }
    let goal = NodeIndex::new(to.value());
    let (_, nodes) = astar(
        &topology.graph,
        NodeIndex::new(from.value()),
        |n| n == goal,
        |e| e.weight().length,
        |_| 0.0,
    )?;
    nodes
        .windows(2)
        .map(|pair| {
            topology
                .graph
                .edges_connecting(pair[0], pair[1])
                .map(|e| e.weight())
                .min_by(|a, b| a.length.total_cmp(&b.length).then(a.id.cmp(&b.id)))
                .map(|l| l.id)
        })
        .collect()
}
