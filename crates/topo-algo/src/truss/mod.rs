//! Truss topology optimization
//!
//! Selects members from a ground structure and sizes them so that every free
//! node is in static equilibrium under the applied loads, no member exceeds
//! the allowable stress, and the total mass is minimal.
//!
//! ## MILP Formulation
//!
//! ```text
//! minimize    Σ_k ρ · A_k · L_k + λ · Σ_k L_k · y_k
//!
//! subject to:
//!   A_min · y_k ≤ A_k ≤ A_max · y_k                  Area linking
//!   -σ · A_k ≤ F_k ≤ σ · A_k                         Stress limit
//!   Σ_{from = v} F_k · e_k - Σ_{to = v} F_k · e_k = P_v   Equilibrium, free nodes v
//!   Σ_k y_k ≥ max(1, ⌊r · m⌋)                        Sparsity floor
//!   connectivity flow over supports ∪ loaded nodes   (see [`crate::connectivity`])
//!   y_k ∈ {0,1}
//! ```
//!
//! `e_k` is the unit vector from the member's `from` node to its `to` node;
//! `F_k > 0` is compression. Areas are carried in mm² inside the model.

mod fallback;
mod formulation;
mod problem;
mod solution;
mod solver;

pub use fallback::synthesize_fallback;
pub use formulation::AREA_SCALE;
pub use problem::{Load, Support, TrussParams, TrussProblem, TrussProblemBuilder, DEFAULT_AREA_BOUNDS};
pub use solution::{MemberDesign, TrussAggregates, TrussDesign, EQUILIBRIUM_TOLERANCE};
pub use solver::design_truss;
