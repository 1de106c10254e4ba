//! Network design MILP formulation
//!
//! Variables per solve: `active[k]` (binary), one forward and one backward
//! flow per commodity per link, optional tier selectors per link and optional
//! delivered volume per commodity. Everything here is rebuilt on every call.

use super::{Demand, NetworkProblem};
use crate::connectivity::{attach_required, enforce_connectivity, ConnectivityFlow};
use crate::error::DesignError;
use crate::milp::MilpModel;
use good_lp::{constraint, Expression, Variable};
use tracing::debug;

/// Variable handles of one network formulation.
pub struct NetworkVars {
    pub commodities: Vec<Demand>,
    /// Indexed by link id
    pub active: Vec<Variable>,
    /// `flows[c][k]` = (forward, backward) flow of commodity `c` on link `k`
    pub flows: Vec<Vec<(Variable, Variable)>>,
    /// Per link: (tier capacity, selector); empty without a tier menu
    pub tiers: Vec<Vec<(f64, Variable)>>,
    /// Per commodity, present when partial delivery is allowed
    pub delivered: Vec<Option<Variable>>,
    pub connectivity: Option<ConnectivityFlow>,
}

pub(crate) fn formulate(problem: &NetworkProblem) -> Result<(MilpModel, NetworkVars), DesignError> {
    let topology = &problem.topology;
    let params = &problem.params;
    let incidence = topology.incidence();
    let commodities = problem.commodities();
    let mut model = MilpModel::new();

    // === Variables ===
    let active: Vec<Variable> = topology.links().map(|_| model.add_binary()).collect();

    let mut flows = Vec::with_capacity(commodities.len());
    for c in &commodities {
        let mut per_link = Vec::with_capacity(topology.num_links());
        for _ in topology.links() {
            let fwd = model.add_bounded(0.0, c.volume);
            let bwd = model.add_bounded(0.0, c.volume);
            per_link.push((fwd, bwd));
        }
        flows.push(per_link);
    }

    let delivered: Vec<Option<Variable>> = commodities
        .iter()
        .map(|c| {
            params
                .unmet_demand_penalty
                .map(|_| model.add_bounded(0.0, c.volume))
        })
        .collect();

    // === Flow conservation, one system per commodity ===
    for (ci, c) in commodities.iter().enumerate() {
        let supply = match delivered[ci] {
            Some(s) => Expression::from(s),
            None => Expression::from(c.volume),
        };
        for node in topology.node_ids() {
            let mut outflow = Expression::from(0.0);
            let mut inflow = Expression::from(0.0);
            for link_id in incidence.links_at(node) {
                let (fwd, bwd) = flows[ci][link_id.value()];
                if topology.link(*link_id).from == node {
                    outflow += fwd;
                    inflow += bwd;
                } else {
                    outflow += bwd;
                    inflow += fwd;
                }
            }
            if node == c.source {
                model.constrain(constraint!(outflow - inflow == supply.clone()));
            } else if node == c.dest {
                model.constrain(constraint!(inflow - outflow == supply.clone()));
            } else {
                model.constrain(constraint!(outflow - inflow == 0.0));
            }
        }
    }

    // === Capacity, costs ===
    let mut tiers = Vec::with_capacity(topology.num_links());
    let mut fixed_cost = Expression::from(0.0);
    let mut variable_cost = Expression::from(0.0);
    let mut distance = Expression::from(0.0);

    for link in topology.links() {
        let k = link.id.value();
        let on = active[k];

        let mut load = Expression::from(0.0);
        for per_link in &flows {
            let (fwd, bwd) = per_link[k];
            load += fwd;
            load += bwd;
        }

        let mut selectors = Vec::new();
        let capacity = if params.capacity_tiers.is_some() {
            let mut capacity = Expression::from(0.0);
            let mut chosen = Expression::from(0.0);
            for tier in problem.tiers_within(link.bounds.min, link.bounds.max) {
                let y = model.add_binary();
                capacity += tier * y;
                chosen += y;
                selectors.push((tier, y));
            }
            // Exactly one tier iff the link is built
            model.constrain(constraint!(chosen - on == 0.0));
            capacity
        } else {
            link.bounds.max * on
        };
        model.constrain(constraint!(load.clone() <= capacity.clone()));

        fixed_cost += link.costs.fixed * on;
        if selectors.is_empty() {
            variable_cost += link.costs.variable * load.clone();
        } else {
            variable_cost += link.costs.variable * capacity;
        }
        distance += link.length * load;
        tiers.push(selectors);
    }

    // === Degree bounds ===
    if let Some(bounds) = params.degree_bounds {
        for node in topology.node_ids() {
            let mut degree = Expression::from(0.0);
            for link_id in incidence.links_at(node) {
                degree += active[link_id.value()];
            }
            model.constrain(constraint!(degree.clone() >= bounds.min as f64));
            model.constrain(constraint!(degree <= bounds.max as f64));
        }
    }

    // === Budget ===
    if let Some(budget) = params.budget {
        model.constrain(constraint!(fixed_cost.clone() + variable_cost.clone() <= budget));
    }

    // === Connectivity ===
    let connectivity = if params.require_connectivity {
        let required = problem.required_nodes();
        attach_required(&mut model, &incidence, &active, &required);
        Some(enforce_connectivity(
            &mut model, topology, &incidence, &active, &required,
        )?)
    } else {
        None
    };

    // === Objective ===
    model.add_to_objective(fixed_cost);
    model.add_to_objective(variable_cost);
    if params.distance_weight > 0.0 {
        model.add_to_objective(params.distance_weight * distance);
    }
    if let Some(penalty) = params.unmet_demand_penalty {
        for (c, s) in commodities.iter().zip(&delivered) {
            if let Some(s) = s {
                model.add_to_objective(penalty * (Expression::from(c.volume) - *s));
            }
        }
    }

    debug!(
        links = topology.num_links(),
        commodities = commodities.len(),
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        "network model formulated"
    );

    Ok((
        model,
        NetworkVars {
            commodities,
            active,
            flows,
            tiers,
            delivered,
            connectivity,
        },
    ))
}
