//! Network design problem data structures
//!
//! Defines the input of a capacity-planning problem: candidate topology,
//! traffic demands and design parameters.

use crate::error::DesignError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use topo_core::{NodeId, NodeRole, Topology};

/// Traffic volume from `source` to `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub source: NodeId,
    pub dest: NodeId,
    pub volume: f64,
}

impl Demand {
    pub fn new(source: NodeId, dest: NodeId, volume: f64) -> Self {
        Self {
            source,
            dest,
            volume,
        }
    }
}

/// Inclusive bounds on the number of active links at every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for DegreeBounds {
    fn default() -> Self {
        Self { min: 2, max: 4 }
    }
}

/// Knobs of the degraded star/tree construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackParams {
    /// Hub node; chosen from the topology when absent
    pub hub: Option<NodeId>,
    /// Utilization reported on every selected link
    pub utilization: f64,
    /// Share of each reachable commodity reported as delivered
    pub delivery_ratio: f64,
}

impl Default for FallbackParams {
    fn default() -> Self {
        Self {
            hub: None,
            utilization: 0.5,
            delivery_ratio: 0.8,
        }
    }
}

/// Parameters of the network design formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Upper bound on fixed plus variable cost
    pub budget: Option<f64>,
    /// Active-link count per node; `None` disables the constraint
    pub degree_bounds: Option<DegreeBounds>,
    /// Discrete capacity menu; replaces the continuous link capacity
    pub capacity_tiers: Option<Vec<f64>>,
    /// Objective weight per unit of flow per unit of length
    pub distance_weight: f64,
    /// Allow partial delivery at this cost per undelivered unit
    pub unmet_demand_penalty: Option<f64>,
    /// Keep every demand endpoint and role-bearing node connected
    pub require_connectivity: bool,
    pub fallback: FallbackParams,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            budget: None,
            degree_bounds: Some(DegreeBounds::default()),
            capacity_tiers: None,
            distance_weight: 0.0,
            unmet_demand_penalty: None,
            require_connectivity: false,
            fallback: FallbackParams::default(),
        }
    }
}

/// Network design problem definition
#[derive(Debug, Clone)]
pub struct NetworkProblem {
    pub topology: Topology,
    pub demands: Vec<Demand>,
    pub params: NetworkParams,
}

impl NetworkProblem {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            demands: Vec::new(),
            params: NetworkParams::default(),
        }
    }

    pub fn with_params(mut self, params: NetworkParams) -> Self {
        self.params = params;
        self
    }

    pub fn add_demand(&mut self, demand: Demand) {
        self.demands.push(demand);
    }

    /// Demo instance: `n` cities evenly spaced on a circle of `radius`, a
    /// complete candidate graph with length-derived costs, and `volume` units
    /// of traffic from every city to the one diametrically opposite.
    pub fn ring(n: usize, radius: f64, volume: f64) -> Result<Self, DesignError> {
        if n < 3 {
            return Err(DesignError::configuration(format!(
                "a ring needs at least 3 nodes, got {}",
                n
            )));
        }
        let mut topology = Topology::new();
        for i in 0..n {
            let angle = 2.0 * PI * i as f64 / n as f64;
            topology.add_named_node(
                format!("city-{}", i),
                // Rounded so the geometry is reproducible across platforms
                (radius * angle.cos() * 1e6).round() / 1e6,
                (radius * angle.sin() * 1e6).round() / 1e6,
                NodeRole::Plain,
            );
        }
        topology.connect_complete()?;

        let mut problem = NetworkProblem::new(topology);
        let half = n / 2;
        for i in 0..n {
            let source = NodeId::new(i);
            let dest = NodeId::new((i + half) % n);
            problem.add_demand(Demand::new(source, dest, volume));
            problem
                .topology
                .set_role(source, NodeRole::LoadSource)?;
        }
        Ok(problem)
    }

    /// Commodities: demands merged per ordered pair, positive volume only,
    /// ordered by (source, dest).
    pub fn commodities(&self) -> Vec<Demand> {
        let mut merged: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
        for d in &self.demands {
            *merged.entry((d.source, d.dest)).or_insert(0.0) += d.volume;
        }
        merged
            .into_iter()
            .filter(|(_, volume)| *volume > 0.0)
            .map(|((source, dest), volume)| Demand::new(source, dest, volume))
            .collect()
    }

    pub fn total_demand(&self) -> f64 {
        self.commodities().iter().map(|d| d.volume).sum()
    }

    /// Traffic originating at or destined to `node`.
    pub fn traffic_at(&self, node: NodeId) -> f64 {
        self.demands
            .iter()
            .filter(|d| d.source == node || d.dest == node)
            .map(|d| d.volume.max(0.0))
            .sum()
    }

    /// Demand endpoints plus role-bearing nodes, sorted and de-duplicated.
    pub fn required_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.topology.required_nodes();
        for c in self.commodities() {
            nodes.push(c.source);
            nodes.push(c.dest);
        }
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Capacity tiers usable on a link with the given capacity bounds.
    pub(crate) fn tiers_within(&self, min: f64, max: f64) -> Vec<f64> {
        match &self.params.capacity_tiers {
            Some(tiers) => tiers
                .iter()
                .copied()
                .filter(|t| *t >= min - 1e-9 && *t <= max + 1e-9)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Reject malformed input before any model is built.
    pub fn validate(&self) -> Result<(), DesignError> {
        let n = self.topology.num_nodes();
        if self.topology.num_links() == 0 {
            return Err(DesignError::configuration(
                "network has no candidate links",
            ));
        }
        for d in &self.demands {
            for endpoint in [d.source, d.dest] {
                if endpoint.value() >= n {
                    return Err(DesignError::configuration(format!(
                        "demand {}->{} references node {} but only {} node(s) exist",
                        d.source, d.dest, endpoint, n
                    )));
                }
            }
            if !(d.volume >= 0.0) {
                return Err(DesignError::configuration(format!(
                    "demand {}->{} has invalid volume {}",
                    d.source, d.dest, d.volume
                )));
            }
            if d.source == d.dest && d.volume > 0.0 {
                return Err(DesignError::configuration(format!(
                    "demand {}->{} has identical endpoints",
                    d.source, d.dest
                )));
            }
        }

        let p = &self.params;
        if let Some(budget) = p.budget {
            if !(budget >= 0.0) {
                return Err(DesignError::configuration(format!(
                    "budget must be non-negative, got {}",
                    budget
                )));
            }
        }
        if let Some(bounds) = p.degree_bounds {
            if bounds.min > bounds.max {
                return Err(DesignError::configuration(format!(
                    "degree bounds [{}, {}] are empty",
                    bounds.min, bounds.max
                )));
            }
        }
        if let Some(tiers) = &p.capacity_tiers {
            if tiers.is_empty() || tiers.iter().any(|t| !(*t > 0.0)) {
                return Err(DesignError::configuration(
                    "capacity tiers must be a non-empty list of positive values",
                ));
            }
        }
        if !(p.distance_weight >= 0.0) {
            return Err(DesignError::configuration(format!(
                "distance weight must be non-negative, got {}",
                p.distance_weight
            )));
        }
        if let Some(penalty) = p.unmet_demand_penalty {
            if !(penalty >= 0.0) {
                return Err(DesignError::configuration(format!(
                    "unmet demand penalty must be non-negative, got {}",
                    penalty
                )));
            }
        }
        if let Some(hub) = p.fallback.hub {
            if hub.value() >= n {
                return Err(DesignError::configuration(format!(
                    "fallback hub {} does not exist",
                    hub
                )));
            }
        }
        for (name, value) in [
            ("fallback utilization", p.fallback.utilization),
            ("fallback delivery ratio", p.fallback.delivery_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DesignError::configuration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if p.require_connectivity && self.required_nodes().len() < 2 {
            return Err(DesignError::configuration(format!(
                "connectivity needs at least two required nodes, got {}",
                self.required_nodes().len()
            )));
        }
        Ok(())
    }
}

/// Builder for constructing network design problems
pub struct NetworkProblemBuilder {
    problem: NetworkProblem,
}

impl NetworkProblemBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            problem: NetworkProblem::new(topology),
        }
    }

    /// Add a demand
    pub fn demand(mut self, source: NodeId, dest: NodeId, volume: f64) -> Self {
        self.problem.add_demand(Demand::new(source, dest, volume));
        self
    }

    pub fn budget(mut self, budget: f64) -> Self {
        self.problem.params.budget = Some(budget);
        self
    }

    pub fn degree_bounds(mut self, min: usize, max: usize) -> Self {
        self.problem.params.degree_bounds = Some(DegreeBounds { min, max });
        self
    }

    pub fn without_degree_bounds(mut self) -> Self {
        self.problem.params.degree_bounds = None;
        self
    }

    pub fn capacity_tiers(mut self, tiers: Vec<f64>) -> Self {
        self.problem.params.capacity_tiers = Some(tiers);
        self
    }

    pub fn distance_weight(mut self, weight: f64) -> Self {
        self.problem.params.distance_weight = weight;
        self
    }

    pub fn unmet_demand_penalty(mut self, penalty: f64) -> Self {
        self.problem.params.unmet_demand_penalty = Some(penalty);
        self
    }

    pub fn require_connectivity(mut self, enabled: bool) -> Self {
        self.problem.params.require_connectivity = enabled;
        self
    }

    pub fn hub(mut self, hub: NodeId) -> Self {
        self.problem.params.fallback.hub = Some(hub);
        self
    }

    pub fn params(mut self, params: NetworkParams) -> Self {
        self.problem.params = params;
        self
    }

    /// Build the problem; demand endpoints take the source/sink roles.
    pub fn build(mut self) -> NetworkProblem {
        for d in self.problem.demands.clone() {
            if d.volume <= 0.0 {
                continue;
            }
            for (node, role) in [(d.source, NodeRole::LoadSource), (d.dest, NodeRole::LoadSink)] {
                // Unknown nodes are left for validate() to report
                let topology = &mut self.problem.topology;
                if topology.contains_node(node) && topology.node(node).role == NodeRole::Plain {
                    let _ = topology.set_role(node, role);
                }
            }
        }
        self.problem
    }
}
