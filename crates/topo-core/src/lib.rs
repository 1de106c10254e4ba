//! # topo-core: Topology Model for Design Optimization
//!
//! Provides the graph container shared by the network and truss designers.
//!
//! ## Design Philosophy
//!
//! A design problem is modeled as an **undirected multigraph** where:
//! - **Nodes**: positioned points with a role (plain, support, load source, load sink)
//! - **Edges**: candidate links (network) or candidate members (truss)
//!
//! Node and link ids are dense indices that coincide with the petgraph
//! `NodeIndex`/`EdgeIndex` of the underlying graph. Elements are never removed,
//! so ids stay stable for the lifetime of a [`Topology`].
//!
//! ## Quick Start
//!
//! ```rust
//! use topo_core::*;
//!
//! let mut topology = Topology::new();
//! let a = topology.add_node(0.0, 0.0, NodeRole::Support);
//! let b = topology.add_node(3.0, 4.0, NodeRole::Plain);
//! let link = topology
//!     .add_link(a, b, LinkCosts::new(100.0, 2.0), Bounds::new(0.0, 50.0))
//!     .unwrap();
//!
//! assert_eq!(topology.link(link).length, 5.0);
//! assert_eq!(topology.incidence().links_at(a), &[link]);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - [`TopoError`] and the [`TopoResult`] alias
//! - [`graph_utils`] - Active-subgraph analysis (components, shortest paths)

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod graph_utils;

pub use error::{TopoError, TopoResult};
pub use graph_utils::*;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(usize);

impl NodeId {
    #[inline]
    pub fn new(value: usize) -> Self {
        NodeId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl LinkId {
    #[inline]
    pub fn new(value: usize) -> Self {
        LinkId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// What a node is for in the design problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    #[default]
    Plain,
    /// Fixed support (truss) - excluded from equilibrium
    Support,
    /// Origin of traffic or application point of an outward load
    LoadSource,
    /// Destination of traffic or application point of an external load
    LoadSink,
}

impl NodeRole {
    /// Nodes with any role other than `Plain` must stay attached to the design.
    pub fn is_required(&self) -> bool {
        !matches!(self, NodeRole::Plain)
    }
}

/// A positioned node of the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub role: NodeRole,
}

impl Node {
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Closed interval used for capacity (network) or cross-sectional area (truss).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Upper bound only; the lower bound is zero.
    pub fn upto(max: f64) -> Self {
        Self { min: 0.0, max }
    }
}

/// Cost attributes of a candidate link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkCosts {
    /// Cost incurred once if the link is built
    pub fixed: f64,
    /// Cost per unit of flow (or per unit of installed capacity with tiers)
    pub variable: f64,
}

impl LinkCosts {
    pub fn new(fixed: f64, variable: f64) -> Self {
        Self { fixed, variable }
    }

    /// Length-based costs used when a link is created from geometry alone.
    pub fn from_length(length: f64) -> Self {
        Self {
            fixed: DEFAULT_FIXED_COST_BASE + DEFAULT_FIXED_COST_PER_LENGTH * length,
            variable: DEFAULT_VARIABLE_COST_PER_LENGTH * length,
        }
    }
}

pub const DEFAULT_FIXED_COST_BASE: f64 = 1000.0;
pub const DEFAULT_FIXED_COST_PER_LENGTH: f64 = 50.0;
pub const DEFAULT_VARIABLE_COST_PER_LENGTH: f64 = 5.0;
pub const DEFAULT_LINK_CAPACITY: f64 = 1000.0;

/// A candidate link (network) or member (truss) between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLink {
    pub id: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    /// Euclidean distance between the endpoints, derived at insertion
    pub length: f64,
    pub costs: LinkCosts,
    /// Capacity (network) or cross-sectional area (truss) bounds
    pub bounds: Bounds,
}

impl CandidateLink {
    /// Unit vector pointing from `from` to `to`; zero for coincident endpoints.
    pub fn direction(&self, topology: &Topology) -> (f64, f64) {
        if self.length <= f64::EPSILON {
            return (0.0, 0.0);
        }
        let a = topology.node(self.from);
        let b = topology.node(self.to);
        ((b.x - a.x) / self.length, (b.y - a.y) / self.length)
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}

/// Per-node list of incident candidate links, computed once per solve.
#[derive(Debug, Clone, Default)]
pub struct Incidence {
    links: Vec<Vec<LinkId>>,
}

impl Incidence {
    pub fn links_at(&self, node: NodeId) -> &[LinkId] {
        &self.links[node.value()]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.links[node.value()].len()
    }
}

/// Graph container of nodes and candidate links.
///
/// The graph is only mutated through [`Topology::add_node`] and
/// [`Topology::add_link`], which keep ids dense and endpoints valid:
///
/// ```compile_fail
/// let mut topology = topo_core::Topology::new();
/// topology.graph.clear();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) graph: UnGraph<Node, CandidateLink>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a topology from explicit parts, validating every link reference.
    ///
    /// Node ids are reassigned densely in input order; link endpoints refer to
    /// those positions.
    pub fn from_parts(
        nodes: Vec<Node>,
        links: Vec<(NodeId, NodeId, LinkCosts, Bounds)>,
    ) -> TopoResult<Self> {
        let mut topology = Topology::new();
        for node in nodes {
            topology.add_named_node(node.name, node.x, node.y, node.role);
        }
        for (from, to, costs, bounds) in links {
            topology.add_link(from, to, costs, bounds)?;
        }
        Ok(topology)
    }

    pub fn add_node(&mut self, x: f64, y: f64, role: NodeRole) -> NodeId {
        let name = format!("n{}", self.graph.node_count());
        self.add_named_node(name, x, y, role)
    }

    pub fn add_named_node(
        &mut self,
        name: impl Into<String>,
        x: f64,
        y: f64,
        role: NodeRole,
    ) -> NodeId {
        let id = NodeId::new(self.graph.node_count());
        self.graph.add_node(Node {
            id,
            name: name.into(),
            x,
            y,
            role,
        });
        id
    }

    /// Add a candidate link; the length is derived from the endpoint positions.
    pub fn add_link(
        &mut self,
        from: NodeId,
        to: NodeId,
        costs: LinkCosts,
        bounds: Bounds,
    ) -> TopoResult<LinkId> {
        let n = self.num_nodes();
        let id = LinkId::new(self.graph.edge_count());
        for endpoint in [from, to] {
            if endpoint.value() >= n {
                return Err(TopoError::configuration(format!(
                    "link {} references node {} but only {} node(s) exist",
                    id, endpoint, n
                )));
            }
        }
        if from == to {
            return Err(TopoError::configuration(format!(
                "link {} is a self-loop at node {}",
                id, from
            )));
        }
        if bounds.min < 0.0 || bounds.max < bounds.min {
            return Err(TopoError::configuration(format!(
                "link {} has invalid bounds [{}, {}]",
                id, bounds.min, bounds.max
            )));
        }
        let length = self.node(from).distance_to(self.node(to));
        self.graph.add_edge(
            NodeIndex::new(from.value()),
            NodeIndex::new(to.value()),
            CandidateLink {
                id,
                from,
                to,
                length,
                costs,
                bounds,
            },
        );
        Ok(id)
    }

    /// Add a link whose costs derive from its length, with the default capacity.
    pub fn add_link_with_default_costs(&mut self, from: NodeId, to: NodeId) -> TopoResult<LinkId> {
        let n = self.num_nodes();
        if from.value() >= n || to.value() >= n {
            return Err(TopoError::configuration(format!(
                "link {}-{} references a node outside 0..{}",
                from, to, n
            )));
        }
        let length = self.node(from).distance_to(self.node(to));
        self.add_link(
            from,
            to,
            LinkCosts::from_length(length),
            Bounds::upto(DEFAULT_LINK_CAPACITY),
        )
    }

    /// Regular `nx` by `ny` grid of plain nodes, row-major from the origin.
    pub fn grid(nx: usize, ny: usize, spacing: f64) -> Self {
        let mut topology = Topology::new();
        for j in 0..ny {
            for i in 0..nx {
                topology.add_node(i as f64 * spacing, j as f64 * spacing, NodeRole::Plain);
            }
        }
        topology
    }

    /// Add a candidate link between every pair of nodes whose coordinate
    /// offsets are within `max_dx` and `max_dy`.
    pub fn connect_neighbors(
        &mut self,
        max_dx: f64,
        max_dy: f64,
        costs: LinkCosts,
        bounds: Bounds,
    ) -> TopoResult<usize> {
        let pairs: Vec<(NodeId, NodeId)> = self
            .node_pairs()
            .filter(|(a, b)| {
                let (na, nb) = (self.node(*a), self.node(*b));
                (na.x - nb.x).abs() <= max_dx + 1e-9 && (na.y - nb.y).abs() <= max_dy + 1e-9
            })
            .collect();
        let count = pairs.len();
        for (a, b) in pairs {
            self.add_link(a, b, costs, bounds)?;
        }
        Ok(count)
    }

    /// Add a default-cost candidate link for every unordered node pair.
    pub fn connect_complete(&mut self) -> TopoResult<usize> {
        let pairs: Vec<(NodeId, NodeId)> = self.node_pairs().collect();
        let count = pairs.len();
        for (a, b) in pairs {
            self.add_link_with_default_costs(a, b)?;
        }
        Ok(count)
    }

    fn node_pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> {
        let n = self.num_nodes();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (NodeId::new(i), NodeId::new(j))))
    }

    pub fn set_role(&mut self, node: NodeId, role: NodeRole) -> TopoResult<()> {
        let weight = self
            .graph
            .node_weight_mut(NodeIndex::new(node.value()))
            .ok_or_else(|| TopoError::configuration(format!("unknown node {}", node)))?;
        weight.role = role;
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        node.value() < self.num_nodes()
    }

    /// Node by id.
    ///
    /// # Panics
    /// If `id` is not a node of this topology; ids are dense, check with
    /// [`Topology::contains_node`] for untrusted input.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[NodeIndex::new(id.value())]
    }

    /// Candidate link by id.
    ///
    /// # Panics
    /// If `id` is not a link of this topology.
    pub fn link(&self, id: LinkId) -> &CandidateLink {
        &self.graph[EdgeIndex::new(id.value())]
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Candidate links in id order.
    pub fn links(&self) -> impl Iterator<Item = &CandidateLink> {
        self.graph.edge_weights()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.num_nodes()).map(NodeId::new)
    }

    /// Nodes whose role requires them to stay attached, in id order.
    pub fn required_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.role.is_required())
            .map(|n| n.id)
            .collect()
    }

    /// Incident link lists for every node, in link-id order.
    pub fn incidence(&self) -> Incidence {
        let mut links = vec![Vec::new(); self.num_nodes()];
        for (index, per_node) in links.iter_mut().enumerate() {
            let mut incident: Vec<LinkId> = self
                .graph
                .edges(NodeIndex::new(index))
                .map(|e| e.weight().id)
                .collect();
            incident.sort();
            *per_node = incident;
        }
        Incidence { links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Topology {
        let mut t = Topology::new();
        t.add_node(0.0, 0.0, NodeRole::Support);
        t.add_node(1.0, 0.0, NodeRole::Support);
        t.add_node(1.0, 1.0, NodeRole::LoadSink);
        t.add_node(0.0, 1.0, NodeRole::Plain);
        t
    }

    #[test]
    fn test_link_length_is_derived() {
        let mut t = square();
        let id = t
            .add_link(NodeId::new(0), NodeId::new(2), LinkCosts::new(1.0, 0.0), Bounds::upto(1.0))
            .unwrap();
        assert!((t.link(id).length - 2f64.sqrt()).abs() < 1e-12);
        let (dx, dy) = t.link(id).direction(&t);
        assert!((dx - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!((dy - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_dangling_reference_is_configuration_error() {
        let mut t = square();
        let err = t
            .add_link(NodeId::new(0), NodeId::new(7), LinkCosts::new(1.0, 0.0), Bounds::upto(1.0))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(t.num_links(), 0);
    }

    #[test]
    fn test_from_parts_rejects_dangling_link() {
        let nodes = vec![Node {
            id: NodeId::new(0),
            name: "a".into(),
            x: 0.0,
            y: 0.0,
            role: NodeRole::Plain,
        }];
        let links = vec![(
            NodeId::new(0),
            NodeId::new(1),
            LinkCosts::new(1.0, 1.0),
            Bounds::upto(1.0),
        )];
        assert!(Topology::from_parts(nodes, links).is_err());
    }

    #[test]
    fn test_incidence() {
        let mut t = square();
        t.connect_neighbors(1.0, 1.0, LinkCosts::new(1.0, 0.0), Bounds::upto(1.0))
            .unwrap();
        // Complete graph on 4 nodes within unit offsets
        assert_eq!(t.num_links(), 6);
        let inc = t.incidence();
        for node in t.node_ids() {
            assert_eq!(inc.degree(node), 3);
            for link in inc.links_at(node) {
                assert!(t.link(*link).touches(node));
            }
        }
    }

    #[test]
    fn test_grid_and_required_nodes() {
        let mut t = Topology::grid(3, 2, 1.0);
        assert_eq!(t.num_nodes(), 6);
        assert_eq!(t.node(NodeId::new(4)).x, 1.0);
        assert_eq!(t.node(NodeId::new(4)).y, 1.0);
        t.set_role(NodeId::new(0), NodeRole::Support).unwrap();
        t.set_role(NodeId::new(5), NodeRole::LoadSink).unwrap();
        assert_eq!(t.required_nodes(), vec![NodeId::new(0), NodeId::new(5)]);
        assert!(t.set_role(NodeId::new(9), NodeRole::Support).is_err());
    }

    #[test]
    fn test_default_costs_follow_length() {
        let mut t = Topology::new();
        let a = t.add_node(0.0, 0.0, NodeRole::Plain);
        let b = t.add_node(0.0, 10.0, NodeRole::Plain);
        let id = t.add_link_with_default_costs(a, b).unwrap();
        let link = t.link(id);
        assert_eq!(link.costs.fixed, 1500.0);
        assert_eq!(link.costs.variable, 50.0);
        assert_eq!(link.bounds.max, DEFAULT_LINK_CAPACITY);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&NodeId::new(3)).unwrap();
        assert_eq!(json, "3");
        let role = serde_json::to_string(&NodeRole::LoadSink).unwrap();
        assert_eq!(role, "\"load-sink\"");
    }
}
