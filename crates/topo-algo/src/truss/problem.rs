//! Truss topology problem data structures

use crate::connectivity::required_set;
use crate::error::DesignError;
use serde::{Deserialize, Serialize};
use topo_core::{Bounds, LinkCosts, NodeId, NodeRole, Topology};

/// Smallest and largest member cross-section (m²) used by the grid generator
pub const DEFAULT_AREA_BOUNDS: Bounds = Bounds {
    min: 1e-6,
    max: 5e-4,
};

/// External load applied at a node (N).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub node: NodeId,
    pub fx: f64,
    pub fy: f64,
}

impl Load {
    pub fn new(node: NodeId, fx: f64, fy: f64) -> Self {
        Self { node, fx, fy }
    }

    pub fn magnitude(&self) -> f64 {
        self.fx.hypot(self.fy)
    }
}

/// Support at a node. Fixed supports absorb any reaction and are exempt from
/// equilibrium; free ones only mark the node as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    pub node: NodeId,
    pub fixed: bool,
}

impl Support {
    pub fn fixed(node: NodeId) -> Self {
        Self { node, fixed: true }
    }
}

/// Material and design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrussParams {
    /// Material density (kg/m³)
    pub density: f64,
    /// Allowable axial stress (Pa), tension and compression alike
    pub allowable_stress: f64,
    /// Overrides every member's own area bounds (m²) when set
    pub area_bounds: Option<Bounds>,
    /// Σ active ≥ max(1, floor(ratio · candidates))
    pub min_member_ratio: f64,
    /// Objective cost per metre of active member
    pub length_penalty: f64,
    /// Keep supports and loaded nodes connected through active members
    pub enforce_connectivity: bool,
}

impl Default for TrussParams {
    fn default() -> Self {
        Self {
            density: 7850.0,
            allowable_stress: 250e6,
            area_bounds: None,
            min_member_ratio: 0.02,
            length_penalty: 0.0,
            enforce_connectivity: true,
        }
    }
}

/// Truss topology problem definition
#[derive(Debug, Clone)]
pub struct TrussProblem {
    pub topology: Topology,
    pub supports: Vec<Support>,
    pub loads: Vec<Load>,
    pub params: TrussParams,
}

impl TrussProblem {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            supports: Vec::new(),
            loads: Vec::new(),
            params: TrussParams::default(),
        }
    }

    /// Ground structure on an `nx` by `ny` grid: a candidate member between
    /// every node pair at most two grid spacings apart on each axis.
    pub fn grid(nx: usize, ny: usize, spacing: f64) -> Result<Self, DesignError> {
        if nx * ny < 2 || !(spacing > 0.0) {
            return Err(DesignError::configuration(format!(
                "grid {}x{} with spacing {} has no members",
                nx, ny, spacing
            )));
        }
        let mut topology = Topology::grid(nx, ny, spacing);
        topology.connect_neighbors(
            2.0 * spacing,
            2.0 * spacing,
            LinkCosts::new(0.0, 0.0),
            DEFAULT_AREA_BOUNDS,
        )?;
        Ok(TrussProblem::new(topology))
    }

    /// Area bounds of `link`, honoring the global override.
    pub fn area_bounds(&self, link_bounds: Bounds) -> Bounds {
        self.params.area_bounds.unwrap_or(link_bounds)
    }

    pub fn is_fixed(&self, node: NodeId) -> bool {
        self.supports.iter().any(|s| s.node == node && s.fixed)
    }

    /// Net applied load at `node`.
    pub fn load_at(&self, node: NodeId) -> (f64, f64) {
        self.loads
            .iter()
            .filter(|l| l.node == node)
            .fold((0.0, 0.0), |(x, y), l| (x + l.fx, y + l.fy))
    }

    /// Supports and loaded nodes, sorted and de-duplicated.
    pub fn required_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .supports
            .iter()
            .map(|s| s.node)
            .chain(self.loads.iter().map(|l| l.node))
            .collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    pub fn max_load(&self) -> f64 {
        self.loads.iter().map(Load::magnitude).fold(0.0, f64::max)
    }

    pub fn validate(&self) -> Result<(), DesignError> {
        let n = self.topology.num_nodes();
        if self.topology.num_links() == 0 {
            return Err(DesignError::configuration("truss has no candidate members"));
        }
        for node in self
            .supports
            .iter()
            .map(|s| s.node)
            .chain(self.loads.iter().map(|l| l.node))
        {
            if node.value() >= n {
                return Err(DesignError::configuration(format!(
                    "support or load references node {} but only {} node(s) exist",
                    node, n
                )));
            }
        }
        if !self.supports.iter().any(|s| s.fixed) {
            return Err(DesignError::configuration("truss needs at least one fixed support"));
        }
        if self.loads.iter().any(|l| !l.fx.is_finite() || !l.fy.is_finite()) {
            return Err(DesignError::configuration("load components must be finite"));
        }
        let incidence = self.topology.incidence();
        if let Some(load) = self
            .loads
            .iter()
            .find(|l| incidence.degree(l.node) == 0 && !self.is_fixed(l.node))
        {
            return Err(DesignError::configuration(format!(
                "loaded node {} has no candidate members",
                load.node
            )));
        }

        let p = &self.params;
        if !(p.allowable_stress > 0.0) {
            return Err(DesignError::configuration(format!(
                "allowable stress must be positive, got {}",
                p.allowable_stress
            )));
        }
        if !(p.density >= 0.0) || !(p.length_penalty >= 0.0) {
            return Err(DesignError::configuration(
                "density and length penalty must be non-negative",
            ));
        }
        for link in self.topology.links() {
            let b = self.area_bounds(link.bounds);
            if !(b.min >= 0.0) || !(b.max > 0.0) || b.max < b.min {
                return Err(DesignError::configuration(format!(
                    "member {} has invalid area bounds [{}, {}]",
                    link.id, b.min, b.max
                )));
            }
        }
        if p.enforce_connectivity {
            required_set(&self.topology, &self.required_nodes())?;
        }
        Ok(())
    }
}

/// Builder for constructing truss problems
pub struct TrussProblemBuilder {
    problem: TrussProblem,
}

impl TrussProblemBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            problem: TrussProblem::new(topology),
        }
    }

    /// Start from [`TrussProblem::grid`].
    pub fn grid(nx: usize, ny: usize, spacing: f64) -> Result<Self, DesignError> {
        Ok(Self {
            problem: TrussProblem::grid(nx, ny, spacing)?,
        })
    }

    /// Add a fixed support
    pub fn support(mut self, node: NodeId) -> Self {
        self.problem.supports.push(Support::fixed(node));
        self
    }

    /// Add a support that does not absorb reactions
    pub fn free_support(mut self, node: NodeId) -> Self {
        self.problem.supports.push(Support { node, fixed: false });
        self
    }

    pub fn load(mut self, node: NodeId, fx: f64, fy: f64) -> Self {
        self.problem.loads.push(Load::new(node, fx, fy));
        self
    }

    pub fn params(mut self, params: TrussParams) -> Self {
        self.problem.params = params;
        self
    }

    pub fn area_bounds(mut self, min: f64, max: f64) -> Self {
        self.problem.params.area_bounds = Some(Bounds::new(min, max));
        self
    }

    pub fn allowable_stress(mut self, stress: f64) -> Self {
        self.problem.params.allowable_stress = stress;
        self
    }

    pub fn length_penalty(mut self, penalty: f64) -> Self {
        self.problem.params.length_penalty = penalty;
        self
    }

    pub fn enforce_connectivity(mut self, enabled: bool) -> Self {
        self.problem.params.enforce_connectivity = enabled;
        self
    }

    /// Build the problem; supports and loaded nodes take their roles.
    pub fn build(mut self) -> TrussProblem {
        let topology = &mut self.problem.topology;
        for load in &self.problem.loads {
            let _ = topology.set_role(load.node, NodeRole::LoadSink);
        }
        for support in &self.problem.supports {
            let _ = topology.set_role(support.node, NodeRole::Support);
        }
        self.problem
    }
}
