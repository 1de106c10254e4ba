//! Solve → extract → fallback lifecycle shared by every design problem.

use crate::driver::{solve_model, SolveOutcome, SolverConfig};
use crate::error::DesignError;
use crate::milp::{Assignment, MilpModel};
use crate::report::DesignReport;
use tracing::{info, warn};

/// A topology-selection problem that can be formulated as a MILP.
///
/// `Built` carries the variable handles produced by [`formulate`](Self::formulate);
/// it lives only for the duration of one [`solve_design`] call.
pub trait DesignProblem {
    type Built;
    type Design: AsRef<DesignReport>;

    /// Short name used in log events.
    fn kind(&self) -> &'static str;

    /// Reject malformed input before any model is built.
    fn validate(&self) -> Result<(), DesignError>;

    fn formulate(&self) -> Result<(MilpModel, Self::Built), DesignError>;

    /// Turn an incumbent into a result record.
    fn extract(&self, built: &Self::Built, assignment: &Assignment, outcome: SolveOutcome)
        -> Self::Design;

    /// Solver-independent result. Must not fail for input that passed
    /// [`validate`](Self::validate) and must be deterministic.
    fn fallback(&self, outcome: SolveOutcome) -> Self::Design;

    fn report_mut(design: &mut Self::Design) -> &mut DesignReport;
}

/// Validate, formulate, solve and either extract the incumbent or fall back.
///
/// Only configuration errors escape; every solver-side failure ends in a
/// fallback result tagged as such.
pub fn solve_design<P: DesignProblem>(
    problem: &P,
    config: &SolverConfig,
) -> Result<P::Design, DesignError> {
    problem.validate()?;
    let (model, built) = problem.formulate()?;
    let run = solve_model(model, config);

    let design = match &run.incumbent {
        Some(assignment) => {
            let mut design = problem.extract(&built, assignment, run.outcome.clone());
            P::report_mut(&mut design).solve_time = run.solve_time;
            design
        }
        // Fallback results keep a zero solve time so reruns serialize identically
        None => {
            warn!(
                problem = problem.kind(),
                outcome = %run.outcome,
                elapsed_ms = run.solve_time.as_millis() as u64,
                "exact solve failed; synthesizing fallback design"
            );
            problem.fallback(run.outcome.clone())
        }
    };

    let report = design.as_ref();
    info!(
        problem = problem.kind(),
        status = report.status.as_str(),
        objective = report.objective,
        active = report.items.len(),
        "design complete"
    );
    Ok(design)
}
