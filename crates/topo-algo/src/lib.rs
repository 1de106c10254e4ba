//! # topo-algo: MILP Topology Design
//!
//! Formulates topology-selection problems as mixed-integer linear programs,
//! solves them on a good_lp engine, and always returns a usable result.
//!
//! ## Instantiations
//!
//! | Problem | Conservation | Extra constraints | Objective |
//! |---------|--------------|-------------------|-----------|
//! | [`network`] | Per-commodity flow balance | Capacity, degree bounds, budget | Fixed + variable cost |
//! | [`truss`] | Static equilibrium at free nodes | Stress limit, connectivity, sparsity floor | Total mass |
//!
//! ### Lifecycle
//!
//! Every solve runs the same steps ([`solve_design`]):
//!
//! 1. **Validate**: malformed input fails with [`DesignError::Configuration`]
//! 2. **Formulate**: a fresh [`MilpModel`] and variable set for this call only
//! 3. **Drive**: [`solve_model`] runs the engine under a time limit and gap,
//!    classifying the end state as a [`SolveOutcome`]
//! 4. **Extract** the incumbent, or **fall back** to a deterministic
//!    solver-free construction tagged [`DesignStatus::Fallback`]
//!
//! Solver-side failures never surface as errors.
//!
//! ## Engines
//!
//! - `solver-microlp` (default): pure-Rust branch-and-bound, abandoned at the
//!   time limit
//! - `solver-highs`: HiGHS, honors the time limit and MIP gap
//!
//! ## Example
//!
//! ```
//! use topo_algo::network::{design_network, NetworkProblemBuilder};
//! use topo_algo::{DesignStatus, SolverConfig};
//! use topo_core::{Bounds, LinkCosts, NodeId, NodeRole, Topology};
//!
//! let mut topology = Topology::new();
//! for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
//!     topology.add_node(x, y, NodeRole::Plain);
//! }
//! for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
//!     topology.add_link(NodeId::new(a), NodeId::new(b), LinkCosts::new(100.0, 1.0), Bounds::upto(50.0))?;
//! }
//!
//! let problem = NetworkProblemBuilder::new(topology)
//!     .demand(NodeId::new(0), NodeId::new(2), 10.0)
//!     .build();
//! let design = design_network(&problem, &SolverConfig::default())?;
//! assert_eq!(design.report.status, DesignStatus::Optimal);
//! assert_eq!(design.aggregates.links_built, 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod connectivity;
pub mod driver;
pub mod error;
pub mod greedy;
pub mod lifecycle;
pub mod milp;
pub mod network;
pub mod report;
pub mod truss;

pub use driver::{solve_model, DriverReport, MilpBackend, SolveOutcome, SolverConfig, UnknownBackend};
pub use error::DesignError;
pub use lifecycle::{solve_design, DesignProblem};
pub use milp::{Assignment, MilpModel};
pub use network::{design_network, NetworkDesign, NetworkParams, NetworkProblem};
pub use report::{DesignReport, DesignStatus, LinkUsage};
pub use truss::{design_truss, TrussDesign, TrussParams, TrussProblem};
