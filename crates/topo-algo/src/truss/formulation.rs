//! Truss topology MILP formulation
//!
//! Areas are modeled in mm² (`AREA_SCALE`) so that area, force and mass
//! coefficients stay within a few orders of magnitude of each other.

use super::TrussProblem;
use crate::connectivity::{
    attach_required, enforce_connectivity, min_active_count, sparsity_floor, ConnectivityFlow,
};
use crate::error::DesignError;
use crate::milp::MilpModel;
use good_lp::{constraint, Expression, Variable};
use tracing::debug;

/// m² per unit of the area variable
pub const AREA_SCALE: f64 = 1e-6;

/// Variable handles of one truss formulation, indexed by link id.
pub struct TrussVars {
    pub active: Vec<Variable>,
    /// Cross-section in units of `AREA_SCALE`
    pub area: Vec<Variable>,
    /// Axial force (N), positive in compression
    pub force: Vec<Variable>,
    pub connectivity: Option<ConnectivityFlow>,
}

pub(crate) fn formulate(problem: &TrussProblem) -> Result<(MilpModel, TrussVars), DesignError> {
    let topology = &problem.topology;
    let params = &problem.params;
    let incidence = topology.incidence();
    let sigma = params.allowable_stress;
    let mut model = MilpModel::new();

    let m = topology.num_links();
    let mut active = Vec::with_capacity(m);
    let mut area = Vec::with_capacity(m);
    let mut force = Vec::with_capacity(m);
    let mut mass = Expression::from(0.0);
    let mut penalty = Expression::from(0.0);

    for link in topology.links() {
        let bounds = problem.area_bounds(link.bounds);
        let (a_min, a_max) = (bounds.min / AREA_SCALE, bounds.max / AREA_SCALE);
        let f_max = sigma * bounds.max;

        let on = model.add_binary();
        let a = model.add_bounded(0.0, a_max);
        let f = model.add_bounded(-f_max, f_max);

        // Active members have an area within bounds, inactive ones none
        model.constrain(constraint!(a <= a_max * on));
        model.constrain(constraint!(a >= a_min * on));
        // |f| ≤ σ · A
        let capacity = sigma * AREA_SCALE;
        model.constrain(constraint!(f - capacity * a <= 0.0));
        model.constrain(constraint!(f + capacity * a >= 0.0));

        mass += (params.density * AREA_SCALE * link.length) * a;
        penalty += (params.length_penalty * link.length) * on;

        active.push(on);
        area.push(a);
        force.push(f);
    }

    // === Equilibrium at every free node ===
    //
    // A member pushes its `from` node along -dir and its `to` node along +dir
    // when in compression, so at node v:
    //   Σ_{from = v} F·dir - Σ_{to = v} F·dir = P_v
    for node in topology.node_ids() {
        if problem.is_fixed(node) || incidence.degree(node) == 0 {
            continue;
        }
        let (px, py) = problem.load_at(node);
        let mut sum_x = Expression::from(0.0);
        let mut sum_y = Expression::from(0.0);
        for link_id in incidence.links_at(node) {
            let link = topology.link(*link_id);
            let (dx, dy) = link.direction(topology);
            let sign = if link.from == node { 1.0 } else { -1.0 };
            let f = force[link_id.value()];
            sum_x += (sign * dx) * f;
            sum_y += (sign * dy) * f;
        }
        model.constrain(constraint!(sum_x == px));
        model.constrain(constraint!(sum_y == py));
    }

    // === Connectivity and sparsity ===
    let connectivity = if params.enforce_connectivity {
        let required = problem.required_nodes();
        attach_required(&mut model, &incidence, &active, &required);
        Some(enforce_connectivity(
            &mut model, topology, &incidence, &active, &required,
        )?)
    } else {
        None
    };
    sparsity_floor(&mut model, &active, min_active_count(params.min_member_ratio, m));

    model.add_to_objective(mass);
    if params.length_penalty > 0.0 {
        model.add_to_objective(penalty);
    }

    debug!(
        members = m,
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        "truss model formulated"
    );

    Ok((
        model,
        TrussVars {
            active,
            area,
            force,
            connectivity,
        },
    ))
}
