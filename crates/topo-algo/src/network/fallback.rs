//! Degraded network construction used when the exact solve yields nothing.
//!
//! Grows a tree outward from a hub: links touching the hub rank first (a star
//! as far as the hub's degree limit allows), the rest by fixed cost. A link is
//! taken only when it reaches a new node without pushing either endpoint past
//! the maximum degree, and only while the fixed-cost budget allows. Links with
//! no admissible capacity tier are never taken.
//! Utilization and delivered demand are flat estimates, never routed flow.

use super::{NetworkDesign, NetworkProblem};
use crate::driver::SolveOutcome;
use crate::greedy::{greedy_select, GreedyLimits, GreedyState};
use crate::network::solution::CommodityRouting;
use crate::report::{DesignStatus, LinkUsage};
use tracing::warn;
use topo_core::{CandidateLink, NodeId};

/// Hub used by the fallback: the configured one, else the node with the most
/// candidate links, then the most traffic, then the lowest id.
pub fn select_hub(problem: &NetworkProblem) -> Option<NodeId> {
    if let Some(hub) = problem.params.fallback.hub {
        if problem.topology.contains_node(hub) {
            return Some(hub);
        }
    }
    let incidence = problem.topology.incidence();
    problem.topology.node_ids().max_by(|a, b| {
        incidence
            .degree(*a)
            .cmp(&incidence.degree(*b))
            .then(problem.traffic_at(*a).total_cmp(&problem.traffic_at(*b)))
            // max_by keeps the last maximum; reverse ids so the lowest wins
            .then(b.cmp(a))
    })
}

struct TreeGrowth {
    reached: Vec<bool>,
    degree: Vec<usize>,
    max_degree: usize,
    remaining: usize,
}

impl GreedyState<&CandidateLink> for TreeGrowth {
    fn eligible(&self, link: &&CandidateLink) -> bool {
        let (a, b) = (link.from.value(), link.to.value());
        self.reached[a] != self.reached[b]
            && self.degree[a] < self.max_degree
            && self.degree[b] < self.max_degree
    }

    fn accept(&mut self, link: &&CandidateLink) {
        for end in [link.from.value(), link.to.value()] {
            self.degree[end] += 1;
            if !self.reached[end] {
                self.reached[end] = true;
                self.remaining -= 1;
            }
        }
    }

    fn done(&self) -> bool {
        self.remaining == 0
    }
}

/// Build the degraded design. Deterministic; never fails.
pub fn synthesize_fallback(problem: &NetworkProblem, outcome: SolveOutcome) -> NetworkDesign {
    let topology = &problem.topology;
    let params = &problem.params;
    let n = topology.num_nodes();

    let mut growth = TreeGrowth {
        reached: vec![false; n],
        degree: vec![0; n],
        max_degree: params.degree_bounds.map(|b| b.max).unwrap_or(usize::MAX),
        remaining: n,
    };
    let hub = select_hub(problem);
    if let Some(hub) = hub {
        growth.reached[hub.value()] = true;
        growth.remaining -= 1;
    }

    // A link with no admissible capacity tier cannot be built
    let options: Vec<&CandidateLink> = topology
        .links()
        .filter(|l| {
            params.capacity_tiers.is_none()
                || !problem.tiers_within(l.bounds.min, l.bounds.max).is_empty()
        })
        .collect();
    let limits = GreedyLimits {
        budget: params.budget,
        max_count: None,
    };
    let touches_hub = |l: &CandidateLink| hub.map(|h| l.touches(h)).unwrap_or(false);
    let selection = greedy_select(
        &options,
        &limits,
        |a, b| {
            touches_hub(*b)
                .cmp(&touches_hub(*a))
                .then(a.costs.fixed.total_cmp(&b.costs.fixed))
        },
        |l| l.costs.fixed,
        &mut growth,
    );

    if growth.remaining > 0 {
        warn!(
            hub = ?hub,
            unreached = growth.remaining,
            spent = selection.spent,
            skipped_over_budget = selection.over_budget.len(),
            "fallback tree does not reach every node"
        );
    }

    let items: Vec<LinkUsage> = selection
        .chosen
        .iter()
        .map(|&index| {
            let link = options[index];
            let tier = problem
                .tiers_within(link.bounds.min, link.bounds.max)
                .into_iter()
                .reduce(f64::max);
            let capacity = tier.unwrap_or(link.bounds.max);
            let quantity = params.fallback.utilization * capacity;
            let variable = match tier {
                Some(capacity) => link.costs.variable * capacity,
                None => link.costs.variable * quantity,
            };
            LinkUsage {
                link: link.id,
                from: link.from,
                to: link.to,
                quantity,
                capacity,
                utilization: LinkUsage::utilization_of(quantity, capacity),
                cost: link.costs.fixed + variable,
            }
        })
        .collect();

    let commodities = problem
        .commodities()
        .into_iter()
        .map(|c| {
            let served = growth.reached[c.source.value()] && growth.reached[c.dest.value()];
            CommodityRouting {
                source: c.source,
                dest: c.dest,
                volume: c.volume,
                delivered: if served {
                    c.volume * params.fallback.delivery_ratio
                } else {
                    0.0
                },
                flows: Vec::new(),
            }
        })
        .collect();

    NetworkDesign::assemble(
        problem,
        DesignStatus::Fallback,
        outcome,
        items,
        commodities,
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkProblemBuilder;
    use topo_core::{Bounds, LinkCosts, NodeRole, Topology};

    /// Hub candidate 0 with spokes to 1..=4 plus a cheap 1-2 link.
    fn spoked() -> Topology {
        let mut t = Topology::new();
        t.add_node(0.0, 0.0, NodeRole::Plain);
        for (x, y) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)] {
            t.add_node(x, y, NodeRole::Plain);
        }
        for i in 1..=4 {
            t.add_link(NodeId::new(0), NodeId::new(i), LinkCosts::new(10.0 * i as f64, 1.0), Bounds::upto(100.0))
                .unwrap();
        }
        t.add_link(NodeId::new(1), NodeId::new(2), LinkCosts::new(1.0, 1.0), Bounds::upto(100.0))
            .unwrap();
        t
    }

    #[test]
    fn test_hub_selection_prefers_degree() {
        let problem = NetworkProblemBuilder::new(spoked()).build();
        assert_eq!(select_hub(&problem), Some(NodeId::new(0)));

        let pinned = NetworkProblemBuilder::new(spoked()).hub(NodeId::new(3)).build();
        assert_eq!(select_hub(&pinned), Some(NodeId::new(3)));
    }

    #[test]
    fn test_star_around_hub() {
        let problem = NetworkProblemBuilder::new(spoked())
            .demand(NodeId::new(1), NodeId::new(3), 10.0)
            .build();
        let design = synthesize_fallback(&problem, SolveOutcome::Infeasible);

        assert_eq!(design.report.status, DesignStatus::Fallback);
        assert_eq!(design.aggregates.links_built, 4);
        for item in &design.report.items {
            assert!(item.from == NodeId::new(0) || item.to == NodeId::new(0));
            assert_eq!(item.utilization, 0.5);
        }
        assert!(design.aggregates.satisfaction_estimated);
        assert_eq!(design.aggregates.satisfied_demand, 8.0);
        assert_eq!(design.aggregates.components, 1);
    }

    #[test]
    fn test_degree_limit_switches_to_tree() {
        let problem = NetworkProblemBuilder::new(spoked()).degree_bounds(0, 3).build();
        let design = synthesize_fallback(&problem, SolveOutcome::Infeasible);
        // Hub takes its three cheapest spokes; node 4 stays out of reach
        let links: Vec<usize> = design.report.active_links().iter().map(|l| l.value()).collect();
        assert_eq!(links, vec![0, 1, 2]);
        assert_eq!(design.aggregates.connected_nodes, 4);
    }

    #[test]
    fn test_budget_limits_fallback() {
        let problem = NetworkProblemBuilder::new(spoked()).budget(35.0).build();
        let design = synthesize_fallback(&problem, SolveOutcome::Infeasible);
        // Spokes cost 10 and 20; the 30 and 40 spokes do not fit
        assert_eq!(design.aggregates.fixed_cost, 30.0);
        assert!(design.aggregates.within_budget);
    }

    #[test]
    fn test_links_without_admissible_tier_are_skipped() {
        // Node 5 hangs off a link whose capacity tops out below the only tier
        let mut t = spoked();
        t.add_node(2.0, 2.0, NodeRole::Plain);
        t.add_link(NodeId::new(0), NodeId::new(5), LinkCosts::new(0.5, 1.0), Bounds::upto(4.0))
            .unwrap();
        let problem = NetworkProblemBuilder::new(t).capacity_tiers(vec![5.0]).build();
        let design = synthesize_fallback(&problem, SolveOutcome::Infeasible);

        let links: Vec<usize> = design.report.active_links().iter().map(|l| l.value()).collect();
        assert!(!links.contains(&5), "tier-less link built: {:?}", links);
        for item in &design.report.items {
            assert_eq!(item.capacity, 5.0);
        }
        assert_eq!(design.aggregates.connected_nodes, 5);
    }
}
