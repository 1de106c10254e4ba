//! Network capacity planning
//!
//! Chooses which candidate links to build, and with what capacity, so that
//! every traffic demand can be routed at minimum cost.
//!
//! ## MILP Formulation
//!
//! One commodity per ordered node pair with positive demand. Each undirected
//! link `k = (i, j)` carries a forward and a backward flow per commodity.
//!
//! ```text
//! minimize    Σ_k F_k · y_k + Σ_k V_k · load_k + w · Σ_k L_k · load_k + p · Σ_c (d_c - s_c)
//!             └───────────┘   └─────────────┘   └───────────────────┘   └────────────────┘
//!             fixed cost      variable cost     distance term (opt.)    unmet demand (opt.)
//!
//! subject to:
//!   out_c(v) - in_c(v) = s_c · [v = src_c] - s_c · [v = dst_c]   Conservation per commodity
//!   load_k = Σ_c (f⁺_ck + f⁻_ck) ≤ U_k · y_k                     Capacity linking
//!   δ_min ≤ Σ_{k ∋ v} y_k ≤ δ_max                                Degree bounds
//!   Σ_k F_k · y_k + Σ_k V_k · load_k ≤ B                         Budget (optional)
//!   y_k ∈ {0,1},  0 ≤ s_c ≤ d_c  (s_c = d_c unless unmet demand is allowed)
//! ```
//!
//! With a capacity-tier menu, `U_k · y_k` becomes `Σ_t U_t · z_kt` with
//! `Σ_t z_kt = y_k`, and the variable cost is charged per unit of installed
//! capacity instead of per unit of flow.
//!
//! When the exact solve produces no incumbent, a star/tree is grown from a hub
//! node (see [`synthesize_fallback`]) and tagged as a fallback.

mod fallback;
mod formulation;
mod problem;
mod solution;
mod solver;

pub use fallback::{select_hub, synthesize_fallback};
pub use problem::{
    DegreeBounds, Demand, FallbackParams, NetworkParams, NetworkProblem, NetworkProblemBuilder,
};
pub use solution::{ArcFlow, CommodityRouting, NetworkAggregates, NetworkDesign};
pub use solver::design_network;
