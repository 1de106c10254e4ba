//! Network design entry point

use super::fallback::synthesize_fallback;
use super::formulation::{formulate, NetworkVars};
use super::solution::extract;
use super::{NetworkDesign, NetworkProblem};
use crate::connectivity::flow_links;
use crate::driver::{SolveOutcome, SolverConfig};
use crate::error::DesignError;
use crate::lifecycle::{solve_design, DesignProblem};
use crate::milp::{Assignment, MilpModel};
use crate::report::DesignReport;
use tracing::{debug, warn};

/// Conservation residual above which an extracted design is logged
const CONSERVATION_TOLERANCE: f64 = 1e-6;

impl DesignProblem for NetworkProblem {
    type Built = NetworkVars;
    type Design = NetworkDesign;

    fn kind(&self) -> &'static str {
        "network"
    }

    fn validate(&self) -> Result<(), DesignError> {
        NetworkProblem::validate(self)
    }

    fn formulate(&self) -> Result<(MilpModel, NetworkVars), DesignError> {
        formulate(self)
    }

    fn extract(
        &self,
        built: &NetworkVars,
        assignment: &Assignment,
        outcome: SolveOutcome,
    ) -> NetworkDesign {
        if let Some(flow) = &built.connectivity {
            debug!(
                root = %flow.root,
                required = flow.required.len(),
                carrying = flow_links(flow, assignment).len(),
                "connectivity flow routed"
            );
        }
        let design = extract(self, built, assignment, outcome);
        let residual = design.conservation_residual(self);
        if residual > CONSERVATION_TOLERANCE {
            warn!(residual, "extracted flows violate conservation");
        }
        design
    }

    fn fallback(&self, outcome: SolveOutcome) -> NetworkDesign {
        synthesize_fallback(self, outcome)
    }

    fn report_mut(design: &mut NetworkDesign) -> &mut DesignReport {
        &mut design.report
    }
}

/// Solve a network design problem.
///
/// Returns `Err` only for malformed input. Infeasible models, engine errors
/// and time-outs without an incumbent produce a [`DesignStatus::Fallback`]
/// design instead.
///
/// # Example
///
/// ```
/// use topo_algo::network::{design_network, NetworkProblem};
/// use topo_algo::SolverConfig;
///
/// let problem = NetworkProblem::ring(4, 10.0, 5.0)?;
/// let design = design_network(&problem, &SolverConfig::default())?;
/// println!("{}", design.summary());
/// # Ok::<(), topo_algo::DesignError>(())
/// ```
///
/// [`DesignStatus::Fallback`]: crate::DesignStatus::Fallback
pub fn design_network(
    problem: &NetworkProblem,
    config: &SolverConfig,
) -> Result<NetworkDesign, DesignError> {
    solve_design(problem, config)
}
