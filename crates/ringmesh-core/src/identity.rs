//! Node identity
//!
//! Nodes are addressed by their zero-indexed position in the physical
//! adjacency matrix. Operators usually number nodes from one, so
//! [`NodeId::from_one_indexed`] and [`NodeId::one_indexed`] convert at the
//! edges of the system (CLI arguments, console output).

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Zero-indexed identity of a node in the overlay
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a node id from a zero-indexed value
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Create a node id from a one-indexed value
    ///
    /// Fails for `0`, which has no zero-indexed counterpart.
    pub fn from_one_indexed(value: usize) -> Result<Self, ConfigError> {
        value
            .checked_sub(1)
            .map(Self)
            .ok_or(ConfigError::ZeroInOneIndexed)
    }

    /// Get the zero-indexed value
    pub const fn index(self) -> usize {
        self.0
    }

    /// Get the one-indexed value (for operator-facing output)
    pub const fn one_indexed(self) -> usize {
        self.0 + 1
    }

    /// Check that this id is valid for a network of `node_count` nodes
    pub fn ensure_within(self, node_count: usize) -> Result<Self, ConfigError> {
        if self.0 < node_count {
            Ok(self)
        } else {
            Err(ConfigError::NodeOutOfRange {
                node: self.0,
                node_count,
            })
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<usize>().map(Self)
    }
}
