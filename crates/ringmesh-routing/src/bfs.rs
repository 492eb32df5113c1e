//! Single-source breadth-first search

use std::collections::VecDeque;

use ringmesh_core::{NodeId, Topology};

/// BFS result from one source node
///
/// `distance[d]` is the hop count from the source, `parent[d]` the node
/// through which `d` was first reached. Both are `None` for unreachable
/// nodes; the source has distance 0 and no parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPathTree {
    source: NodeId,
    distance: Vec<Option<u32>>,
    parent: Vec<Option<NodeId>>,
}

impl ShortestPathTree {
    /// Run BFS over `topology` starting at `source`
    ///
    /// A source outside the topology yields a tree where everything is
    /// unreachable.
    pub fn compute(topology: &Topology, source: NodeId) -> Self {
        let n = topology.node_count();
        let mut distance: Vec<Option<u32>> = vec![None; n];
        let mut parent: Vec<Option<NodeId>> = vec![None; n];

        if !topology.contains(source) {
            return Self {
                source,
                distance,
                parent,
            };
        }

        let mut queue = VecDeque::with_capacity(n);
        distance[source.index()] = Some(0);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            let next_distance = distance[current.index()].map_or(u32::MAX, |d| d + 1);
            for neighbor in topology.neighbors(current) {
                let slot = &mut distance[neighbor.index()];
                if slot.is_none_or(|known| next_distance < known) {
                    *slot = Some(next_distance);
                    parent[neighbor.index()] = Some(current);
                    queue.push_back(neighbor);
                }
            }
        }

        Self {
            source,
            distance,
            parent,
        }
    }

    /// The source node
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Hop count from the source, `None` if unreachable
    pub fn distance(&self, dest: NodeId) -> Option<u32> {
        self.distance.get(dest.index()).copied().flatten()
    }

    /// The node `dest` was reached through
    pub fn parent(&self, dest: NodeId) -> Option<NodeId> {
        self.parent.get(dest.index()).copied().flatten()
    }

    /// Check if `dest` is reachable from the source
    pub fn is_reachable(&self, dest: NodeId) -> bool {
        self.distance(dest).is_some()
    }

    /// The physical neighbour of the source on the path to `dest`
    ///
    /// Walks the parent chain back from `dest` until the chain node's parent
    /// is the source. Returns the source itself for `dest == source` and
    /// `None` when `dest` is unreachable.
    pub fn first_hop(&self, dest: NodeId) -> Option<NodeId> {
        if !self.is_reachable(dest) {
            return None;
        }
        let mut hop = dest;
        while hop != self.source {
            let parent = self.parent(hop)?;
            if parent == self.source {
                return Some(hop);
            }
            hop = parent;
        }
        Some(self.source)
    }

    /// Full path from the source to `dest`, both ends included
    pub fn path_to(&self, dest: NodeId) -> Option<Vec<NodeId>> {
        let hops = self.distance(dest)? as usize;
        let mut path = Vec::with_capacity(hops + 1);
        let mut hop = dest;
        path.push(hop);
        while hop != self.source {
            hop = self.parent(hop)?;
            path.push(hop);
        }
        path.reverse();
        Some(path)
    }
}
