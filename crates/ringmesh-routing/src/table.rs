//! Immutable next-hop routing table
//!
//! The [`RoutingTable`] is computed once from the topology when a node
//! starts and is never mutated afterwards, so it can be shared freely
//! between readers without locking.

use std::fmt;

use ringmesh_core::{NodeId, RoutingError, Topology};
use tracing::{debug, warn};

use crate::bfs::ShortestPathTree;

/// Route to one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    /// The destination node
    pub destination: NodeId,
    /// Physical neighbour to hand frames to (the local node for itself)
    pub next_hop: NodeId,
    /// Hop count to the destination
    pub hop_count: u32,
}

/// Destination -> next-hop mapping local to one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    local: NodeId,
    /// Indexed by destination id; `None` for unreachable destinations
    routes: Vec<Option<RouteInfo>>,
}

impl RoutingTable {
    /// Build the table for `local` from a full BFS over `topology`
    pub fn build(topology: &Topology, local: NodeId) -> Self {
        let tree = ShortestPathTree::compute(topology, local);
        Self::from_tree(&tree, topology.node_count())
    }

    /// Build the table from an existing shortest-path tree
    pub fn from_tree(tree: &ShortestPathTree, node_count: usize) -> Self {
        let local = tree.source();
        let routes: Vec<Option<RouteInfo>> = (0..node_count)
            .map(NodeId)
            .map(|destination| {
                let next_hop = tree.first_hop(destination)?;
                let hop_count = tree.distance(destination)?;
                Some(RouteInfo {
                    destination,
                    next_hop,
                    hop_count,
                })
            })
            .collect();

        let table = Self { local, routes };
        let unreachable = table.unreachable();
        if unreachable.is_empty() {
            debug!(node = %local, destinations = node_count, "Routing table built");
        } else {
            warn!(
                node = %local,
                unreachable = ?unreachable,
                "Routing table built with unreachable destinations"
            );
        }
        table
    }

    /// The node this table belongs to
    pub fn local(&self) -> NodeId {
        self.local
    }

    /// Number of destinations covered (reachable or not)
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table covers no destinations
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route to a destination, `None` if unknown or unreachable
    pub fn route(&self, dest: NodeId) -> Option<&RouteInfo> {
        self.routes.get(dest.index()).and_then(Option::as_ref)
    }

    /// Next physical hop towards `dest`
    ///
    /// # Errors
    ///
    /// - [`RoutingError::UnknownDestination`] if `dest` is not a node of the network
    /// - [`RoutingError::NoRoute`] if `dest` is unreachable
    pub fn next_hop(&self, dest: NodeId) -> Result<NodeId, RoutingError> {
        match self.routes.get(dest.index()) {
            None => Err(RoutingError::UnknownDestination {
                destination: dest,
                node_count: self.routes.len(),
            }),
            Some(None) => Err(RoutingError::NoRoute { destination: dest }),
            Some(Some(route)) => Ok(route.next_hop),
        }
    }

    /// All reachable routes in destination order
    pub fn routes(&self) -> impl Iterator<Item = &RouteInfo> + '_ {
        self.routes.iter().flatten()
    }

    /// Destinations with no physical path from the local node
    pub fn unreachable(&self) -> Vec<NodeId> {
        self.routes
            .iter()
            .enumerate()
            .filter(|(_, route)| route.is_none())
            .map(|(dest, _)| NodeId(dest))
            .collect()
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Routing table for node [{}]:", self.local.one_indexed())?;
        for (dest, route) in self.routes.iter().enumerate() {
            match route {
                Some(route) => writeln!(
                    f,
                    "  [{}] via [{}] ({} hops)",
                    dest + 1,
                    route.next_hop.one_indexed(),
                    route.hop_count
                )?,
                None => writeln!(f, "  [{}] unreachable", dest + 1)?,
            }
        }
        Ok(())
    }
}
