//! Physical topology and virtual ring
//!
//! The [`Topology`] is the undirected physical graph that frames actually
//! travel over. The [`VirtualRing`] is a cyclic ordering of every node that
//! defines logical predecessor/successor relationships independent of
//! physical adjacency. Both are fixed configuration: validated once when
//! built and read-only afterwards.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::Direction;
use crate::identity::NodeId;

/// Undirected physical adjacency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    adjacency: Vec<Vec<bool>>,
}

impl Topology {
    /// Build a topology from an N x N adjacency matrix
    ///
    /// The matrix must be non-empty, square, symmetric and free of
    /// self-loops.
    pub fn from_matrix(adjacency: Vec<Vec<bool>>) -> Result<Self, ConfigError> {
        let n = adjacency.len();
        if n == 0 {
            return Err(ConfigError::EmptyTopology);
        }

        for (row, links) in adjacency.iter().enumerate() {
            if links.len() != n {
                return Err(ConfigError::NotSquare {
                    row,
                    len: links.len(),
                    expected: n,
                });
            }
        }

        for a in 0..n {
            if adjacency[a][a] {
                return Err(ConfigError::SelfLoop(a));
            }
            for b in (a + 1)..n {
                if adjacency[a][b] != adjacency[b][a] {
                    return Err(ConfigError::Asymmetric { a, b });
                }
            }
        }

        Ok(Self { adjacency })
    }

    /// Build a topology from a 0/1 integer matrix (any non-zero is a link)
    pub fn from_int_matrix(matrix: &[Vec<u8>]) -> Result<Self, ConfigError> {
        Self::from_matrix(
            matrix
                .iter()
                .map(|row| row.iter().map(|&cell| cell != 0).collect())
                .collect(),
        )
    }

    /// Build a topology of `node_count` nodes from an undirected edge list
    pub fn from_edges(node_count: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, ConfigError> {
        if node_count == 0 {
            return Err(ConfigError::EmptyTopology);
        }

        let mut adjacency = vec![vec![false; node_count]; node_count];
        for &(a, b) in edges {
            let a = a.ensure_within(node_count)?.index();
            let b = b.ensure_within(node_count)?.index();
            if a == b {
                return Err(ConfigError::SelfLoop(a));
            }
            adjacency[a][b] = true;
            adjacency[b][a] = true;
        }

        Ok(Self { adjacency })
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Iterate over every node id in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count()).map(NodeId)
    }

    /// Check whether `node` belongs to this graph
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    /// Physical neighbours of a node, in increasing id order
    ///
    /// Returns an empty list for a node outside the graph.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(node.index())
            .map(|links| {
                links
                    .iter()
                    .enumerate()
                    .filter(|(_, linked)| **linked)
                    .map(|(peer, _)| NodeId(peer))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if two nodes share a physical link
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a.index())
            .and_then(|links| links.get(b.index()))
            .copied()
            .unwrap_or(false)
    }

    /// Number of undirected links
    pub fn edge_count(&self) -> usize {
        self.adjacency
            .iter()
            .enumerate()
            .map(|(a, links)| links.iter().skip(a + 1).filter(|l| **l).count())
            .sum()
    }

    /// Print a simple adjacency-list view of the graph (one-indexed)
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Physical Topology:");
        let _ = writeln!(output, "  Nodes: {}", self.node_count());
        let _ = writeln!(output, "  Links: {}", self.edge_count());
        for node in self.nodes() {
            let neighbors: Vec<String> = self
                .neighbors(node)
                .iter()
                .map(|n| n.one_indexed().to_string())
                .collect();
            let _ = writeln!(
                output,
                "  [{}] -> [{}]",
                node.one_indexed(),
                neighbors.join(", ")
            );
        }
        output
    }
}

/// Cyclic logical ordering of every node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRing {
    order: Vec<NodeId>,
    /// Position of each node id within `order`
    position: Vec<usize>,
}

impl VirtualRing {
    /// Build a ring from an ordering that must be a permutation of
    /// `0..node_count`
    pub fn new(order: Vec<NodeId>, node_count: usize) -> Result<Self, ConfigError> {
        if node_count == 0 {
            return Err(ConfigError::EmptyTopology);
        }
        if order.len() != node_count {
            return Err(ConfigError::RingLength {
                expected: node_count,
                actual: order.len(),
            });
        }

        let mut position = vec![usize::MAX; node_count];
        for (slot, node) in order.iter().enumerate() {
            let index = node.ensure_within(node_count)?.index();
            if position[index] != usize::MAX {
                return Err(ConfigError::DuplicateRingEntry(index));
            }
            position[index] = slot;
        }

        if let Some(missing) = position.iter().position(|slot| *slot == usize::MAX) {
            return Err(ConfigError::MissingRingEntry(missing));
        }

        Ok(Self { order, position })
    }

    /// The ring order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of nodes in the ring
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the ring is empty (never true for a validated ring)
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The node before `node` in ring order
    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        let slot = *self.position.get(node.index())?;
        let n = self.order.len();
        Some(self.order[(slot + n - 1) % n])
    }

    /// The node after `node` in ring order
    pub fn successor(&self, node: NodeId) -> Option<NodeId> {
        let slot = *self.position.get(node.index())?;
        Some(self.order[(slot + 1) % self.order.len()])
    }

    /// The ring neighbour of `node` in the given direction
    pub fn neighbor(&self, node: NodeId, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Left => self.predecessor(node),
            Direction::Right => self.successor(node),
        }
    }
}

/// A validated physical topology together with its virtual ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayTopology {
    topology: Topology,
    ring: VirtualRing,
}

impl OverlayTopology {
    /// Pair a topology with a ring, checking they cover the same nodes
    pub fn new(topology: Topology, ring: VirtualRing) -> Result<Self, ConfigError> {
        if topology.node_count() != ring.len() {
            return Err(ConfigError::RingLength {
                expected: topology.node_count(),
                actual: ring.len(),
            });
        }
        Ok(Self { topology, ring })
    }

    /// The physical graph
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The virtual ring
    pub fn ring(&self) -> &VirtualRing {
        &self.ring
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    /// Physical neighbours of a node
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.topology.neighbors(node)
    }

    /// Check if two nodes share a physical link
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.topology.is_adjacent(a, b)
    }

    /// Ring predecessor of a node
    pub fn predecessor_in_ring(&self, node: NodeId) -> Option<NodeId> {
        self.ring.predecessor(node)
    }

    /// Ring successor of a node
    pub fn successor_in_ring(&self, node: NodeId) -> Option<NodeId> {
        self.ring.successor(node)
    }
}

/// Serializable description of an overlay: edge list plus ring order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Number of nodes; defaults to the ring length
    #[serde(default)]
    pub node_count: Option<usize>,

    /// Undirected physical links
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,

    /// Ring order, every node exactly once
    pub ring: Vec<usize>,

    /// Whether ids in `edges` and `ring` are one-indexed
    #[serde(default)]
    pub one_indexed: bool,
}

impl TopologyConfig {
    /// The five-node example overlay
    ///
    /// Links (one-indexed) 1-3, 2-3, 2-4, 2-5, 4-5 and ring `[1, 4, 3, 5, 2]`.
    pub fn example() -> Self {
        Self {
            node_count: Some(5),
            edges: vec![[1, 3], [2, 3], [2, 4], [2, 5], [4, 5]],
            ring: vec![1, 4, 3, 5, 2],
            one_indexed: true,
        }
    }

    fn to_node(&self, raw: usize) -> Result<NodeId, ConfigError> {
        if self.one_indexed {
            NodeId::from_one_indexed(raw)
        } else {
            Ok(NodeId(raw))
        }
    }

    /// Validate the configuration and build the overlay
    pub fn build(&self) -> Result<OverlayTopology, ConfigError> {
        let node_count = self.node_count.unwrap_or(self.ring.len());

        let edges = self
            .edges
            .iter()
            .map(|[a, b]| Ok((self.to_node(*a)?, self.to_node(*b)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let order = self
            .ring
            .iter()
            .map(|raw| self.to_node(*raw))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let topology = Topology::from_edges(node_count, &edges)?;
        let ring = VirtualRing::new(order, node_count)?;
        OverlayTopology::new(topology, ring)
    }
}
