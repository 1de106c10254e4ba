//! Truss design solution data structures

use super::formulation::{TrussVars, AREA_SCALE};
use super::TrussProblem;
use crate::driver::SolveOutcome;
use crate::milp::Assignment;
use crate::report::{DesignReport, DesignStatus, LinkUsage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use topo_core::{LinkId, NodeId};

/// Equilibrium residual tolerance, relative to the largest applied load
pub const EQUILIBRIUM_TOLERANCE: f64 = 1e-6;

/// Sizing of one active member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDesign {
    pub link: LinkId,
    /// Cross-section (m²)
    pub area: f64,
    /// Axial force (N), positive in compression
    pub force: f64,
    /// force / area (Pa)
    pub stress: f64,
    /// m
    pub length: f64,
    /// kg
    pub mass: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrussAggregates {
    pub total_mass: f64,
    pub active_members: usize,
    pub candidate_members: usize,
    /// False when forces were not computed or fail the equilibrium check
    pub equilibrium_verified: bool,
}

/// Complete result of a truss design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrussDesign {
    pub report: DesignReport,
    pub members: Vec<MemberDesign>,
    pub aggregates: TrussAggregates,
}

impl AsRef<DesignReport> for TrussDesign {
    fn as_ref(&self) -> &DesignReport {
        &self.report
    }
}

impl TrussDesign {
    pub(crate) fn assemble(
        problem: &TrussProblem,
        status: DesignStatus,
        outcome: SolveOutcome,
        mut members: Vec<MemberDesign>,
        forces_computed: bool,
    ) -> Self {
        members.sort_by_key(|m| m.link);
        let sigma = problem.params.allowable_stress;
        let topology = &problem.topology;

        let items: Vec<LinkUsage> = members
            .iter()
            .map(|m| {
                let link = topology.link(m.link);
                let capacity = sigma * m.area;
                LinkUsage {
                    link: m.link,
                    from: link.from,
                    to: link.to,
                    quantity: m.force,
                    capacity,
                    utilization: LinkUsage::utilization_of(m.force, capacity),
                    cost: m.mass,
                }
            })
            .collect();
        let total_mass: f64 = members.iter().map(|m| m.mass).sum();
        let active_length: f64 = members.iter().map(|m| m.length).sum();

        let mut design = TrussDesign {
            report: DesignReport {
                status,
                outcome,
                objective: total_mass + problem.params.length_penalty * active_length,
                items,
                solve_time: Duration::ZERO,
            },
            aggregates: TrussAggregates {
                total_mass,
                active_members: members.len(),
                candidate_members: topology.num_links(),
                equilibrium_verified: false,
            },
            members,
        };
        if forces_computed {
            let tolerance = EQUILIBRIUM_TOLERANCE * problem.max_load().max(1.0);
            design.aggregates.equilibrium_verified =
                design.equilibrium_residual(problem) <= tolerance;
        }
        design
    }

    /// Net member force on `node`: Σ_{from} F·dir - Σ_{to} F·dir.
    pub fn member_force_at(&self, problem: &TrussProblem, node: NodeId) -> (f64, f64) {
        let topology = &problem.topology;
        self.members
            .iter()
            .filter_map(|m| {
                let link = topology.link(m.link);
                let sign = if link.from == node {
                    1.0
                } else if link.to == node {
                    -1.0
                } else {
                    return None;
                };
                let (dx, dy) = link.direction(topology);
                Some((sign * m.force * dx, sign * m.force * dy))
            })
            .fold((0.0, 0.0), |(x, y), (fx, fy)| (x + fx, y + fy))
    }

    /// Largest per-axis equilibrium violation over the free nodes (N).
    pub fn equilibrium_residual(&self, problem: &TrussProblem) -> f64 {
        problem
            .topology
            .node_ids()
            .filter(|n| !problem.is_fixed(*n))
            .map(|n| {
                let (sx, sy) = self.member_force_at(problem, n);
                let (px, py) = problem.load_at(n);
                (sx - px).abs().max((sy - py).abs())
            })
            .fold(0.0, f64::max)
    }

    /// Largest |force| / (allowable stress · area) over active members.
    pub fn max_stress_ratio(&self, problem: &TrussProblem) -> f64 {
        let sigma = problem.params.allowable_stress;
        self.members
            .iter()
            .map(|m| LinkUsage::utilization_of(m.force, sigma * m.area))
            .fold(0.0, f64::max)
    }

    /// How far the worst member exceeds the stress limit, as a ratio; zero
    /// when every member is within it.
    pub fn stress_violation(&self, problem: &TrussProblem) -> f64 {
        (self.max_stress_ratio(problem) - 1.0).max(0.0)
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let a = &self.aggregates;
        let mut s = String::new();
        s.push_str(&format!("Truss Design Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!(
            "Status: {} ({})\n",
            self.report.status.as_str(),
            self.report.outcome
        ));
        s.push_str(&format!("Objective: {:.6}\n", self.report.objective));
        s.push_str(&format!("Total Mass: {:.6} kg\n", a.total_mass));
        s.push_str(&format!(
            "Members: {} active of {} candidates\n",
            a.active_members, a.candidate_members
        ));
        s.push_str(&format!(
            "Equilibrium: {}\n",
            if a.equilibrium_verified {
                "verified"
            } else {
                "not verified"
            }
        ));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.report.solve_time));

        if !self.members.is_empty() {
            s.push_str("\nMembers:\n");
            for (m, item) in self.members.iter().zip(&self.report.items) {
                s.push_str(&format!(
                    "  {} {}-{} A={:.3e} m² F={:.2} N σ={:.3e} Pa ({:.0}%)\n",
                    m.link,
                    item.from,
                    item.to,
                    m.area,
                    m.force,
                    m.stress,
                    item.utilization * 100.0
                ));
            }
        }
        s
    }
}

/// Read a truss design out of a solver assignment.
pub(crate) fn extract(
    problem: &TrussProblem,
    vars: &TrussVars,
    x: &Assignment,
    outcome: SolveOutcome,
) -> TrussDesign {
    let density = problem.params.density;
    let members = problem
        .topology
        .links()
        .filter(|link| x.is_on(vars.active[link.id.value()]))
        .map(|link| {
            let k = link.id.value();
            let area = x.value(vars.area[k]) * AREA_SCALE;
            let force = x.value(vars.force[k]);
            MemberDesign {
                link: link.id,
                area,
                force,
                stress: if area > 0.0 { force / area } else { 0.0 },
                length: link.length,
                mass: density * area * link.length,
            }
        })
        .collect();

    let status = DesignStatus::from_outcome(&outcome);
    TrussDesign::assemble(problem, status, outcome, members, true)
}
