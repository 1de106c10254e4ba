//! Common base shared by the network and truss results.

use crate::driver::SolveOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use topo_core::{LinkId, NodeId};

/// How a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignStatus {
    /// Exact solve proven optimal within the gap
    Optimal,
    /// Exact solve stopped at the time limit with an incumbent
    Feasible,
    /// Solver-independent degraded construction
    Fallback,
}

impl DesignStatus {
    /// Status of a result extracted from an exact-solve incumbent.
    pub fn from_outcome(outcome: &SolveOutcome) -> Self {
        match outcome {
            SolveOutcome::Optimal => DesignStatus::Optimal,
            SolveOutcome::TimeLimitedFeasible => DesignStatus::Feasible,
            SolveOutcome::Infeasible | SolveOutcome::SolverError(_) => DesignStatus::Fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStatus::Optimal => "Optimal",
            DesignStatus::Feasible => "Feasible",
            DesignStatus::Fallback => "Fallback",
        }
    }
}

/// Realized usage of one active link or member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkUsage {
    pub link: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    /// Flow volume (network) or signed axial force (truss)
    pub quantity: f64,
    /// Installed capacity (network) or force capacity `stress * area` (truss)
    pub capacity: f64,
    /// `|quantity| / capacity`
    pub utilization: f64,
    /// Monetary cost (network) or mass (truss)
    pub cost: f64,
}

impl LinkUsage {
    pub fn utilization_of(quantity: f64, capacity: f64) -> f64 {
        if capacity > 0.0 {
            quantity.abs() / capacity
        } else {
            0.0
        }
    }
}

/// Fields every design result carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub status: DesignStatus,
    /// Classification of the exact solve that preceded this result
    pub outcome: SolveOutcome,
    pub objective: f64,
    /// Active links only, in link-id order
    pub items: Vec<LinkUsage>,
    pub solve_time: Duration,
}

impl DesignReport {
    pub fn active_links(&self) -> Vec<LinkId> {
        self.items.iter().map(|i| i.link).collect()
    }

    pub fn is_active(&self, link: LinkId) -> bool {
        self.items.binary_search_by_key(&link, |i| i.link).is_ok()
    }

    pub fn is_fallback(&self) -> bool {
        self.status == DesignStatus::Fallback
    }
}
