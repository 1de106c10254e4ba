//! Truss design entry point

use super::fallback::synthesize_fallback;
use super::formulation::{formulate, TrussVars};
use super::solution::{extract, EQUILIBRIUM_TOLERANCE};
use super::{TrussDesign, TrussProblem};
use crate::connectivity::flow_links;
use crate::driver::{SolveOutcome, SolverConfig};
use crate::error::DesignError;
use crate::lifecycle::{solve_design, DesignProblem};
use crate::milp::{Assignment, MilpModel};
use crate::report::DesignReport;
use tracing::{debug, warn};

/// Relative tolerance on the stress bound before an extracted design is logged
const STRESS_TOLERANCE: f64 = 1e-3;

impl DesignProblem for TrussProblem {
    type Built = TrussVars;
    type Design = TrussDesign;

    fn kind(&self) -> &'static str {
        "truss"
    }

    fn validate(&self) -> Result<(), DesignError> {
        TrussProblem::validate(self)
    }

    fn formulate(&self) -> Result<(MilpModel, TrussVars), DesignError> {
        formulate(self)
    }

    fn extract(
        &self,
        built: &TrussVars,
        assignment: &Assignment,
        outcome: SolveOutcome,
    ) -> TrussDesign {
        if let Some(flow) = &built.connectivity {
            debug!(
                root = %flow.root,
                required = flow.required.len(),
                carrying = flow_links(flow, assignment).len(),
                "connectivity flow routed"
            );
        }
        let design = extract(self, built, assignment, outcome);
        if !design.aggregates.equilibrium_verified {
            warn!(
                residual = design.equilibrium_residual(self),
                tolerance = EQUILIBRIUM_TOLERANCE,
                "extracted forces miss equilibrium"
            );
        }
        let violation = design.stress_violation(self);
        if violation > STRESS_TOLERANCE {
            warn!(violation, "extracted members exceed the allowable stress");
        }
        design
    }

    fn fallback(&self, outcome: SolveOutcome) -> TrussDesign {
        synthesize_fallback(self, outcome)
    }

    fn report_mut(design: &mut TrussDesign) -> &mut DesignReport {
        &mut design.report
    }
}

/// Solve a truss topology problem.
///
/// Returns `Err` only for malformed input; a failed exact solve produces a
/// fallback design whose forces are not computed.
///
/// # Example
///
/// ```
/// use topo_algo::truss::{design_truss, TrussProblemBuilder};
/// use topo_algo::SolverConfig;
/// use topo_core::NodeId;
///
/// let problem = TrussProblemBuilder::grid(2, 2, 1.0)?
///     .support(NodeId::new(0))
///     .support(NodeId::new(1))
///     .load(NodeId::new(3), 0.0, -1000.0)
///     .build();
/// let design = design_truss(&problem, &SolverConfig::default())?;
/// println!("{}", design.summary());
/// # Ok::<(), topo_algo::DesignError>(())
/// ```
pub fn design_truss(
    problem: &TrussProblem,
    config: &SolverConfig,
) -> Result<TrussDesign, DesignError> {
    solve_design(problem, config)
}
