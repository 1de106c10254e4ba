//! Optimization driver.
//!
//! Runs a [`MilpModel`] on the configured good_lp engine under a wall-clock
//! limit and optimality-gap tolerance, then classifies the termination into a
//! [`SolveOutcome`]. The engine model is created inside [`solve_model`] and is
//! dropped before it returns, on success, error or engine panic alike.

use crate::milp::{Assignment, MilpModel};
use good_lp::{ResolutionError, SolverModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use web_time::Instant;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
#[cfg(feature = "solver-microlp")]
use good_lp::solvers::microlp::microlp as microlp_solver;

#[cfg(not(any(feature = "solver-microlp", feature = "solver-highs")))]
compile_error!("enable at least one MILP engine: `solver-microlp` or `solver-highs`");

/// MILP engine used for the exact solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpBackend {
    /// Pure-Rust branch-and-bound; ignores the gap and runs under a watchdog
    #[cfg(feature = "solver-microlp")]
    Microlp,
    /// HiGHS branch-and-cut
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl Default for MilpBackend {
    fn default() -> Self {
        // Native engine first when compiled in
        #[cfg(feature = "solver-highs")]
        {
            MilpBackend::Highs
        }
        #[cfg(not(feature = "solver-highs"))]
        {
            MilpBackend::Microlp
        }
    }
}

const AVAILABLE_BACKENDS: &[&str] = &[
    #[cfg(feature = "solver-microlp")]
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl MilpBackend {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => "highs",
        }
    }

    /// Whether the engine enforces [`SolverConfig::max_time_seconds`] itself.
    pub fn honors_time_limit(&self) -> bool {
        match self {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => false,
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => true,
        }
    }
}

impl fmt::Display for MilpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown or not-compiled-in engine names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown milp backend '{}'; supported values: {}",
            self.0,
            MilpBackend::available().join(", ")
        )
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for MilpBackend {
    type Err = UnknownBackend;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            #[cfg(feature = "solver-microlp")]
            "microlp" => Ok(MilpBackend::Microlp),
            #[cfg(feature = "solver-highs")]
            "highs" => Ok(MilpBackend::Highs),
            _ => Err(UnknownBackend(normalized)),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum solve time (seconds)
    pub max_time_seconds: f64,
    /// MIP optimality gap tolerance
    pub mip_gap: f64,
    /// Engine used for the exact solve
    pub backend: MilpBackend,
    /// Whether to enable verbose solver output
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_time_seconds: 60.0,
            mip_gap: 1e-3,
            backend: MilpBackend::default(),
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.max_time_seconds = seconds;
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }

    pub fn with_backend(mut self, backend: MilpBackend) -> Self {
        self.backend = backend;
        self
    }

    /// `max_time_seconds` as a duration; unbounded for infinite values.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_time_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Classified termination of one exact solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SolveOutcome {
    /// Proven optimal within the gap tolerance
    Optimal,
    /// Stopped at the time limit
    TimeLimitedFeasible,
    /// The constraint set admits no solution
    Infeasible,
    /// Engine unavailable, crashed, or returned an unusable status
    SolverError(String),
}

impl SolveOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SolveOutcome::Optimal => "optimal",
            SolveOutcome::TimeLimitedFeasible => "time-limited",
            SolveOutcome::Infeasible => "infeasible",
            SolveOutcome::SolverError(_) => "solver-error",
        }
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::SolverError(msg) => write!(f, "solver-error ({msg})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of a driver run: outcome plus the incumbent, if any.
#[derive(Debug, Clone)]
pub struct DriverReport {
    pub outcome: SolveOutcome,
    pub incumbent: Option<Assignment>,
    pub solve_time: Duration,
}

impl DriverReport {
    /// True when the caller must synthesize a fallback result.
    pub fn needs_fallback(&self) -> bool {
        self.incumbent.is_none()
    }
}

/// How one engine invocation ended, before classification.
enum EngineRun {
    /// The engine returned on its own
    Finished(Result<Assignment, ResolutionError>),
    /// The watchdog stopped waiting at the time limit
    Abandoned,
    /// The engine panicked or its worker could not run
    Failed(String),
}

/// Solve `model` on the configured engine and classify the outcome.
///
/// The call returns within the time limit for every engine: those that do
/// not enforce it themselves run on a worker thread that is abandoned once
/// the limit passes.
pub fn solve_model(model: MilpModel, config: &SolverConfig) -> DriverReport {
    let start = Instant::now();
    debug!(
        backend = %config.backend,
        variables = model.num_variables(),
        binaries = model.num_binaries(),
        constraints = model.num_constraints(),
        time_limit_s = config.max_time_seconds,
        "solving milp"
    );

    let run = if config.backend.honors_time_limit() {
        run_contained(model, config)
    } else {
        run_with_watchdog(model, config)
    };
    let report = classify(run, start.elapsed(), config);

    match &report.outcome {
        SolveOutcome::Optimal | SolveOutcome::TimeLimitedFeasible => info!(
            outcome = %report.outcome,
            elapsed_ms = report.solve_time.as_millis() as u64,
            incumbent = report.incumbent.is_some(),
            "milp solve finished"
        ),
        SolveOutcome::Infeasible | SolveOutcome::SolverError(_) => warn!(
            outcome = %report.outcome,
            elapsed_ms = report.solve_time.as_millis() as u64,
            "milp solve produced no incumbent"
        ),
    }
    report
}

fn run_contained(model: MilpModel, config: &SolverConfig) -> EngineRun {
    match catch_unwind(AssertUnwindSafe(|| run_backend(model, config))) {
        Ok(result) => EngineRun::Finished(result),
        Err(panic) => EngineRun::Failed(
            panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "engine panicked".to_string()),
        ),
    }
}

/// Run the engine on a worker thread and wait at most the time limit.
///
/// An abandoned worker finishes in the background and its result is dropped;
/// it owns its model, so nothing is shared with later solves.
fn run_with_watchdog(model: MilpModel, config: &SolverConfig) -> EngineRun {
    let (tx, rx) = mpsc::channel();
    let worker_config = config.clone();
    let spawned = thread::Builder::new()
        .name("milp-engine".to_string())
        .spawn(move || {
            let _ = tx.send(run_contained(model, &worker_config));
        });
    if let Err(err) = spawned {
        return EngineRun::Failed(format!("cannot start engine worker: {err}"));
    }

    match rx.recv_timeout(config.time_limit()) {
        Ok(run) => run,
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                backend = %config.backend,
                time_limit_s = config.max_time_seconds,
                "engine did not finish within the time limit; abandoning it"
            );
            EngineRun::Abandoned
        }
        Err(RecvTimeoutError::Disconnected) => {
            EngineRun::Failed("engine worker exited without a result".to_string())
        }
    }
}

fn run_backend(model: MilpModel, config: &SolverConfig) -> Result<Assignment, ResolutionError> {
    let MilpModel {
        vars,
        registry,
        objective,
        constraints,
        ..
    } = model;

    match config.backend {
        #[cfg(feature = "solver-microlp")]
        MilpBackend::Microlp => {
            let mut problem = vars.minimise(objective).using(microlp_solver);
            for c in constraints {
                problem = problem.with(c);
            }
            let solution = problem.solve()?;
            Ok(Assignment::capture(&solution, &registry))
        }
        #[cfg(feature = "solver-highs")]
        MilpBackend::Highs => {
            let mut problem = vars
                .minimise(objective)
                .using(highs_solver)
                .set_option("output_flag", config.verbose)
                .set_option("time_limit", config.max_time_seconds.max(0.0))
                .set_option("mip_rel_gap", config.mip_gap.max(0.0));
            for c in constraints {
                problem = problem.with(c);
            }
            let solution = problem.solve()?;
            Ok(Assignment::capture(&solution, &registry))
        }
    }
}

fn classify(run: EngineRun, solve_time: Duration, config: &SolverConfig) -> DriverReport {
    let limit = config.time_limit();
    let (outcome, incumbent) = match run {
        EngineRun::Finished(Ok(assignment)) => {
            if config.backend.honors_time_limit() && solve_time >= limit {
                // The engine itself stopped at the limit with an incumbent
                (SolveOutcome::TimeLimitedFeasible, Some(assignment))
            } else {
                if solve_time > limit {
                    warn!(
                        backend = %config.backend,
                        elapsed_ms = solve_time.as_millis() as u64,
                        limit_ms = limit.as_millis() as u64,
                        "engine overran the time limit"
                    );
                }
                (SolveOutcome::Optimal, Some(assignment))
            }
        }
        EngineRun::Finished(Err(ResolutionError::Infeasible)) => (SolveOutcome::Infeasible, None),
        EngineRun::Finished(Err(ResolutionError::Unbounded)) => (
            SolveOutcome::SolverError("model is unbounded".to_string()),
            None,
        ),
        EngineRun::Finished(Err(other)) => {
            let msg = other.to_string();
            if msg.to_ascii_lowercase().contains("time limit") {
                // Time limit reached before any incumbent was found
                (SolveOutcome::TimeLimitedFeasible, None)
            } else {
                (SolveOutcome::SolverError(msg), None)
            }
        }
        EngineRun::Abandoned => (SolveOutcome::TimeLimitedFeasible, None),
        EngineRun::Failed(msg) => (SolveOutcome::SolverError(msg), None),
    };
    DriverReport {
        outcome,
        incumbent,
        solve_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::constraint;

    #[test]
    fn test_backend_round_trips_through_str() {
        for name in MilpBackend::available() {
            let backend: MilpBackend = name.parse().unwrap();
            assert_eq!(backend.as_str(), *name);
        }
        let err = "gurobi".parse::<MilpBackend>().unwrap_err();
        assert!(err.to_string().contains("supported values"));
    }

    #[test]
    fn test_classify_infeasible() {
        let report = classify(
            EngineRun::Finished(Err(ResolutionError::Infeasible)),
            Duration::from_millis(5),
            &SolverConfig::default(),
        );
        assert_eq!(report.outcome, SolveOutcome::Infeasible);
        assert!(report.needs_fallback());
    }

    #[cfg(feature = "solver-highs")]
    #[test]
    fn test_classify_engine_stopped_at_limit_keeps_incumbent() {
        let config = SolverConfig::default()
            .with_backend(MilpBackend::Highs)
            .with_time_limit(0.0);
        let report = classify(
            EngineRun::Finished(Ok(Assignment::default())),
            Duration::from_millis(1),
            &config,
        );
        assert_eq!(report.outcome, SolveOutcome::TimeLimitedFeasible);
        assert!(!report.needs_fallback());
    }

    #[cfg(feature = "solver-microlp")]
    #[test]
    fn test_classify_slow_finish_is_still_optimal() {
        // microlp runs to completion, so a late result is a proven optimum
        let config = SolverConfig::default()
            .with_backend(MilpBackend::Microlp)
            .with_time_limit(0.0);
        let report = classify(
            EngineRun::Finished(Ok(Assignment::default())),
            Duration::from_millis(40),
            &config,
        );
        assert_eq!(report.outcome, SolveOutcome::Optimal);
        assert!(report.incumbent.is_some());
    }

    #[test]
    fn test_classify_abandoned_run_has_no_incumbent() {
        let config = SolverConfig::default().with_time_limit(0.5);
        let report = classify(EngineRun::Abandoned, Duration::from_millis(500), &config);
        assert_eq!(report.outcome, SolveOutcome::TimeLimitedFeasible);
        assert!(report.incumbent.is_none());
        assert!(report.needs_fallback());
    }

    #[test]
    fn test_classify_engine_error() {
        let report = classify(
            EngineRun::Finished(Err(ResolutionError::Str("license missing".to_string()))),
            Duration::ZERO,
            &SolverConfig::default(),
        );
        assert!(matches!(report.outcome, SolveOutcome::SolverError(_)));
        assert!(report.needs_fallback());

        let crashed = classify(
            EngineRun::Failed("engine panicked".to_string()),
            Duration::ZERO,
            &SolverConfig::default(),
        );
        assert_eq!(
            crashed.outcome,
            SolveOutcome::SolverError("engine panicked".to_string())
        );
    }

    #[test]
    fn test_time_limit_handles_non_finite_values() {
        let unbounded = SolverConfig::default().with_time_limit(f64::INFINITY);
        assert_eq!(unbounded.time_limit(), Duration::MAX);
        let negative = SolverConfig::default().with_time_limit(-3.0);
        assert_eq!(negative.time_limit(), Duration::ZERO);
    }

    #[cfg(feature = "solver-microlp")]
    #[test]
    fn test_watchdog_returns_within_limit() {
        // Enough binaries that branch-and-bound cannot finish instantly
        let mut model = MilpModel::new();
        let items: Vec<_> = (0..60).map(|_| model.add_binary()).collect();
        let weights: good_lp::Expression = items
            .iter()
            .enumerate()
            .map(|(i, v)| (3.0 + (i * 7 % 11) as f64) * *v)
            .sum();
        let values: good_lp::Expression = items
            .iter()
            .enumerate()
            .map(|(i, v)| -(5.0 + (i * 13 % 17) as f64) * *v)
            .sum();
        model.constrain(constraint!(weights <= 151.5));
        model.add_to_objective(values);

        let config = SolverConfig::default()
            .with_backend(MilpBackend::Microlp)
            .with_time_limit(0.0);
        let start = std::time::Instant::now();
        let report = solve_model(model, &config);
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(report.outcome, SolveOutcome::TimeLimitedFeasible);
        assert!(report.incumbent.is_none());
    }

    #[test]
    fn test_solve_small_knapsack() {
        // max 5a + 4b + 3c  s.t. 2a + 3b + c <= 4   (as a minimisation)
        let mut model = MilpModel::new();
        let a = model.add_binary();
        let b = model.add_binary();
        let c = model.add_binary();
        model.constrain(constraint!(2.0 * a + 3.0 * b + c <= 4.0));
        model.add_to_objective(-5.0 * a - 4.0 * b - 3.0 * c);

        let report = solve_model(model, &SolverConfig::default());
        assert_eq!(report.outcome, SolveOutcome::Optimal);
        let x = report.incumbent.expect("incumbent");
        assert!(x.is_on(a));
        assert!(!x.is_on(b));
        assert!(x.is_on(c));
    }

    #[test]
    fn test_solve_infeasible_model() {
        let mut model = MilpModel::new();
        let a = model.add_binary();
        model.constrain(constraint!(a >= 2.0));
        model.add_to_objective(a.into());

        let report = solve_model(model, &SolverConfig::default());
        assert_eq!(report.outcome, SolveOutcome::Infeasible);
        assert!(report.incumbent.is_none());
    }
}
