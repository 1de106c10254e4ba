//! Flow-based connectivity enforcement.
//!
//! Keeps a required node set `R` attached to the selected links with a
//! single-commodity flow: the root ships `|R| - 1` units, every other required
//! node absorbs one, and flow may only use active links.
//!
//! ```text
//!   f⁺_k, f⁻_k ∈ [0, |R|]            one variable per direction of link k
//!   f⁺_k ≤ |R| · active_k            flow only on active links
//!   f⁻_k ≤ |R| · active_k
//!   out(root) - in(root) = |R| - 1
//!   in(v) - out(v) = 1               v ∈ R \ {root}
//!   in(v) - out(v) = 0               v ∉ R
//! ```
//!
//! Feasibility rules out any required node being isolated from the root's
//! component, but it is not a proof that the whole active subgraph is one
//! component: active links carrying no flow may form detached pieces. Cycle
//! elimination would close that gap at a material cost in model size and is
//! intentionally absent.

use crate::error::DesignError;
use crate::milp::{Assignment, MilpModel};
use good_lp::{constraint, Expression, Variable};
use topo_core::{Incidence, LinkId, NodeId, Topology};

/// Variables added by [`enforce_connectivity`].
#[derive(Debug, Clone)]
pub struct ConnectivityFlow {
    pub root: NodeId,
    /// Sorted, de-duplicated required set
    pub required: Vec<NodeId>,
    /// (forward, backward) flow per candidate link, indexed by link id
    arcs: Vec<(Variable, Variable)>,
}

impl ConnectivityFlow {
    /// Net connectivity flow leaving `node` under `assignment`.
    pub fn net_outflow(&self, topology: &Topology, node: NodeId, assignment: &Assignment) -> f64 {
        topology
            .links()
            .filter(|l| l.touches(node))
            .map(|l| {
                let (fwd, bwd) = self.arcs[l.id.value()];
                let along = assignment.value(fwd) - assignment.value(bwd);
                if l.from == node {
                    along
                } else {
                    -along
                }
            })
            .sum()
    }
}

/// Normalize a required-node list and check the minimum size.
pub fn required_set(topology: &Topology, nodes: &[NodeId]) -> Result<Vec<NodeId>, DesignError> {
    let mut required: Vec<NodeId> = nodes.to_vec();
    required.sort();
    required.dedup();
    if let Some(bad) = required.iter().find(|n| !topology.contains_node(**n)) {
        return Err(DesignError::configuration(format!(
            "required node {} does not exist",
            bad
        )));
    }
    if required.len() < 2 {
        return Err(DesignError::configuration(format!(
            "connectivity needs at least two required nodes, got {}",
            required.len()
        )));
    }
    Ok(required)
}

/// Every required node keeps at least one incident active link.
pub fn attach_required(
    model: &mut MilpModel,
    incidence: &Incidence,
    active: &[Variable],
    required: &[NodeId],
) {
    for node in required {
        let links = incidence.links_at(*node);
        if links.is_empty() {
            continue;
        }
        let mut degree = Expression::from(0.0);
        for link in links {
            degree += active[link.value()];
        }
        model.constrain(constraint!(degree >= 1.0));
    }
}

/// Add the single-commodity flow that ties `required` to a root.
///
/// `active` is indexed by link id. The root is the lowest required id.
pub fn enforce_connectivity(
    model: &mut MilpModel,
    topology: &Topology,
    incidence: &Incidence,
    active: &[Variable],
    required: &[NodeId],
) -> Result<ConnectivityFlow, DesignError> {
    let required = required_set(topology, required)?;
    let root = required[0];
    let r = required.len() as f64;

    let mut arcs = Vec::with_capacity(topology.num_links());
    for link in topology.links() {
        let fwd = model.add_bounded(0.0, r);
        let bwd = model.add_bounded(0.0, r);
        let on = active[link.id.value()];
        model.constrain(constraint!(fwd <= r * on));
        model.constrain(constraint!(bwd <= r * on));
        arcs.push((fwd, bwd));
    }

    for node in topology.node_ids() {
        let mut inflow = Expression::from(0.0);
        let mut outflow = Expression::from(0.0);
        for link_id in incidence.links_at(node) {
            let link = topology.link(*link_id);
            let (fwd, bwd) = arcs[link_id.value()];
            if link.from == node {
                outflow += fwd;
                inflow += bwd;
            } else {
                inflow += fwd;
                outflow += bwd;
            }
        }
        if node == root {
            model.constrain(constraint!(outflow - inflow == r - 1.0));
        } else if required.binary_search(&node).is_ok() {
            model.constrain(constraint!(inflow - outflow == 1.0));
        } else {
            model.constrain(constraint!(inflow - outflow == 0.0));
        }
    }

    Ok(ConnectivityFlow {
        root,
        required,
        arcs,
    })
}

/// `Σ active ≥ min_count`; discourages the trivial empty selection.
pub fn sparsity_floor(model: &mut MilpModel, active: &[Variable], min_count: usize) {
    if min_count == 0 {
        return;
    }
    let mut count = Expression::from(0.0);
    for on in active {
        count += *on;
    }
    model.constrain(constraint!(count >= min_count as f64));
}

/// Sparsity floor for `ratio` of `candidates`, never below one member.
pub fn min_active_count(ratio: f64, candidates: usize) -> usize {
    ((ratio.max(0.0) * candidates as f64).floor() as usize).max(1)
}

/// Links carrying connectivity flow in `assignment`, in id order.
pub fn flow_links(flow: &ConnectivityFlow, assignment: &Assignment) -> Vec<LinkId> {
    flow.arcs
        .iter()
        .enumerate()
        .filter(|(_, (fwd, bwd))| assignment.value(*fwd) + assignment.value(*bwd) > 1e-9)
        .map(|(i, _)| LinkId::new(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{solve_model, SolverConfig};
    use topo_core::{Bounds, LinkCosts, NodeRole};

    fn line_with_spur() -> Topology {
        // 0 - 1 - 2 - 3, plus 1 - 4
        let mut t = Topology::new();
        for i in 0..4 {
            t.add_node(i as f64, 0.0, NodeRole::Plain);
        }
        t.add_node(1.0, 1.0, NodeRole::Plain);
        let c = LinkCosts::new(1.0, 0.0);
        let b = Bounds::upto(1.0);
        for (a, z) in [(0, 1), (1, 2), (2, 3), (1, 4)] {
            t.add_link(NodeId::new(a), NodeId::new(z), c, b).unwrap();
        }
        t
    }

    #[test]
    fn test_required_set_validation() {
        let t = line_with_spur();
        assert!(required_set(&t, &[NodeId::new(0)]).is_err());
        assert!(required_set(&t, &[NodeId::new(0), NodeId::new(0)]).is_err());
        assert!(required_set(&t, &[NodeId::new(0), NodeId::new(9)]).is_err());
        let set = required_set(&t, &[NodeId::new(3), NodeId::new(0), NodeId::new(3)]).unwrap();
        assert_eq!(set, vec![NodeId::new(0), NodeId::new(3)]);
    }

    #[test]
    fn test_min_active_count() {
        assert_eq!(min_active_count(0.02, 6), 1);
        assert_eq!(min_active_count(0.5, 6), 3);
        assert_eq!(min_active_count(-1.0, 6), 1);
    }

    #[test]
    fn test_flow_selects_path_between_required_nodes() {
        let t = line_with_spur();
        let inc = t.incidence();
        let mut model = MilpModel::new();
        let active: Vec<Variable> = t.links().map(|_| model.add_binary()).collect();
        for on in &active {
            model.add_to_objective(Expression::from(*on));
        }
        let required = [NodeId::new(0), NodeId::new(3)];
        attach_required(&mut model, &inc, &active, &required);
        let flow = enforce_connectivity(&mut model, &t, &inc, &active, &required).unwrap();

        let report = solve_model(model, &SolverConfig::default());
        let x = report.incumbent.expect("connectivity model is feasible");
        let chosen: Vec<bool> = active.iter().map(|v| x.is_on(*v)).collect();
        // Path 0-1-2-3; the spur stays off
        assert_eq!(chosen, vec![true, true, true, false]);
        assert!((flow.net_outflow(&t, NodeId::new(0), &x) - 1.0).abs() < 1e-6);
        assert!((flow.net_outflow(&t, NodeId::new(3), &x) + 1.0).abs() < 1e-6);
        assert_eq!(flow_links(&flow, &x).len(), 3);
    }
}
