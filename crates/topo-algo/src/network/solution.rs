//! Network design solution data structures
//!
//! Defines the output of a network design solve and its extraction from a
//! solver assignment.

use super::formulation::NetworkVars;
use super::NetworkProblem;
use crate::driver::SolveOutcome;
use crate::milp::Assignment;
use crate::report::{DesignReport, DesignStatus, LinkUsage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use topo_core::{analyze_active, LinkId, NodeId};

/// Flows below this are reported as zero
const FLOW_EPSILON: f64 = 1e-9;

/// Raw per-direction flow of one commodity on one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcFlow {
    pub link: LinkId,
    /// Flow in the link's `from -> to` direction
    pub forward: f64,
    /// Flow in the link's `to -> from` direction
    pub backward: f64,
}

/// Routing of one commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRouting {
    pub source: NodeId,
    pub dest: NodeId,
    pub volume: f64,
    pub delivered: f64,
    /// Links carrying flow, in link-id order; empty for fallback results
    pub flows: Vec<ArcFlow>,
}

impl CommodityRouting {
    /// Net flow of this commodity leaving `node`.
    pub fn net_outflow(&self, problem: &NetworkProblem, node: NodeId) -> f64 {
        self.flows
            .iter()
            .map(|f| {
                let link = problem.topology.link(f.link);
                if link.from == node {
                    f.forward - f.backward
                } else if link.to == node {
                    f.backward - f.forward
                } else {
                    0.0
                }
            })
            .sum()
    }
}

/// Aggregate metrics of a network design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkAggregates {
    pub total_demand: f64,
    pub satisfied_demand: f64,
    pub satisfaction_rate: f64,
    /// True when the satisfied demand is an estimate rather than routed flow
    pub satisfaction_estimated: bool,
    pub links_built: usize,
    /// Σ fixed cost of the built links
    pub fixed_cost: f64,
    /// Σ per-link cost (fixed plus variable)
    pub total_cost: f64,
    /// Nodes touched by at least one built link
    pub connected_nodes: usize,
    /// Connected components of the built subgraph
    pub components: usize,
    /// `fixed_cost <= budget`; true without a budget
    pub within_budget: bool,
}

/// Complete result of a network design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDesign {
    pub report: DesignReport,
    pub commodities: Vec<CommodityRouting>,
    pub aggregates: NetworkAggregates,
}

impl AsRef<DesignReport> for NetworkDesign {
    fn as_ref(&self) -> &DesignReport {
        &self.report
    }
}

impl NetworkDesign {
    /// Assemble a design from its parts, deriving the aggregates.
    pub(crate) fn assemble(
        problem: &NetworkProblem,
        status: DesignStatus,
        outcome: SolveOutcome,
        mut items: Vec<LinkUsage>,
        commodities: Vec<CommodityRouting>,
        satisfaction_estimated: bool,
    ) -> Self {
        items.sort_by_key(|i| i.link);
        let active: Vec<LinkId> = items.iter().map(|i| i.link).collect();
        let subgraph = analyze_active(&problem.topology, &active);

        let total_demand: f64 = commodities.iter().map(|c| c.volume).sum();
        let satisfied_demand: f64 = commodities.iter().map(|c| c.delivered).sum();
        let fixed_cost: f64 = active
            .iter()
            .map(|l| problem.topology.link(*l).costs.fixed)
            .sum();
        let total_cost: f64 = items.iter().map(|i| i.cost).sum();
        let unmet_penalty = problem
            .params
            .unmet_demand_penalty
            .map(|p| p * (total_demand - satisfied_demand).max(0.0))
            .unwrap_or(0.0);
        let distance_term: f64 = problem.params.distance_weight
            * items
                .iter()
                .map(|i| problem.topology.link(i.link).length * i.quantity)
                .sum::<f64>();
        let within_budget = problem
            .params
            .budget
            .map(|b| fixed_cost <= b + 1e-6 * b.abs().max(1.0))
            .unwrap_or(true);

        let aggregates = NetworkAggregates {
            total_demand,
            satisfied_demand,
            satisfaction_rate: if total_demand > 0.0 {
                satisfied_demand / total_demand
            } else {
                1.0
            },
            satisfaction_estimated,
            links_built: items.len(),
            fixed_cost,
            total_cost,
            connected_nodes: subgraph.connected_nodes.len(),
            components: subgraph.components,
            within_budget,
        };

        NetworkDesign {
            report: DesignReport {
                status,
                outcome,
                objective: total_cost + distance_term + unmet_penalty,
                items,
                solve_time: Duration::ZERO,
            },
            commodities,
            aggregates,
        }
    }

    /// Largest flow-conservation violation over every commodity and node.
    ///
    /// Sources must emit `delivered`, destinations absorb it, every other
    /// node balances. Fallback results carry no routed flow and return zero.
    pub fn conservation_residual(&self, problem: &NetworkProblem) -> f64 {
        if self.aggregates.satisfaction_estimated {
            return 0.0;
        }
        let mut worst: f64 = 0.0;
        for c in &self.commodities {
            for node in problem.topology.node_ids() {
                let expected = if node == c.source {
                    c.delivered
                } else if node == c.dest {
                    -c.delivered
                } else {
                    0.0
                };
                worst = worst.max((c.net_outflow(problem, node) - expected).abs());
            }
        }
        worst
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let a = &self.aggregates;
        let mut s = String::new();
        s.push_str(&format!("Network Design Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!(
            "Status: {} ({})\n",
            self.report.status.as_str(),
            self.report.outcome
        ));
        s.push_str(&format!("Objective: {:.2}\n", self.report.objective));
        s.push_str(&format!("Total Cost: {:.2}\n", a.total_cost));
        s.push_str(&format!("  Fixed: {:.2}\n", a.fixed_cost));
        s.push_str(&format!(
            "Links Built: {} ({} nodes, {} component(s))\n",
            a.links_built, a.connected_nodes, a.components
        ));
        s.push_str(&format!(
            "Demand: {:.2} / {:.2} ({:.1}%{})\n",
            a.satisfied_demand,
            a.total_demand,
            a.satisfaction_rate * 100.0,
            if a.satisfaction_estimated {
                ", estimated"
            } else {
                ""
            }
        ));
        if !a.within_budget {
            s.push_str("Budget: EXCEEDED\n");
        }
        s.push_str(&format!("Solve Time: {:.2?}\n", self.report.solve_time));

        if !self.report.items.is_empty() {
            s.push_str("\nLinks:\n");
            for item in &self.report.items {
                s.push_str(&format!(
                    "  [BUILD] {} {}-{} flow {:.2} / {:.2} ({:.0}%) - {:.2}\n",
                    item.link,
                    item.from,
                    item.to,
                    item.quantity,
                    item.capacity,
                    item.utilization * 100.0,
                    item.cost
                ));
            }
        }
        s
    }
}

/// Read a network design out of a solver assignment.
pub(crate) fn extract(
    problem: &NetworkProblem,
    vars: &NetworkVars,
    x: &Assignment,
    outcome: SolveOutcome,
) -> NetworkDesign {
    let topology = &problem.topology;
    let mut items = Vec::new();

    for link in topology.links() {
        let k = link.id.value();
        if !x.is_on(vars.active[k]) {
            continue;
        }
        let load: f64 = vars
            .flows
            .iter()
            .map(|per_link| x.value(per_link[k].0) + x.value(per_link[k].1))
            .sum();
        let tier = vars.tiers[k]
            .iter()
            .find(|(_, y)| x.is_on(*y))
            .map(|(capacity, _)| *capacity);
        let capacity = tier.unwrap_or(link.bounds.max);
        let variable = match tier {
            Some(capacity) => link.costs.variable * capacity,
            None => link.costs.variable * load,
        };
        items.push(LinkUsage {
            link: link.id,
            from: link.from,
            to: link.to,
            quantity: load,
            capacity,
            utilization: LinkUsage::utilization_of(load, capacity),
            cost: link.costs.fixed + variable,
        });
    }

    let commodities = vars
        .commodities
        .iter()
        .enumerate()
        .map(|(ci, c)| {
            let flows = vars.flows[ci]
                .iter()
                .enumerate()
                .filter_map(|(k, (fwd, bwd))| {
                    let (forward, backward) = (x.value(*fwd), x.value(*bwd));
                    (forward > FLOW_EPSILON || backward > FLOW_EPSILON).then(|| ArcFlow {
                        link: LinkId::new(k),
                        forward,
                        backward,
                    })
                })
                .collect();
            CommodityRouting {
                source: c.source,
                dest: c.dest,
                volume: c.volume,
                delivered: vars.delivered[ci].map(|s| x.value(s)).unwrap_or(c.volume),
                flows,
            }
        })
        .collect();

    let status = DesignStatus::from_outcome(&outcome);
    NetworkDesign::assemble(problem, status, outcome, items, commodities, false)
}
