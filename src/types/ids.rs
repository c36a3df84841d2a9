//! Stable arena identifiers for document entities.
//!
//! Nodes, state graphs and behaviors live in arenas inside a
//! [`GraphDocument`](crate::document::GraphDocument) and are addressed by
//! these ids instead of references. Ids are never reused within a document,
//! so a removed node's id cannot alias a later clone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node (animation state) in the document.
///
/// Implements `Ord` so maps keyed by node identity iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Identity of a state graph (state machine) in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphId(u64);

impl GraphId {
    /// Create a graph id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

/// Identity of a behavior instance.
///
/// Behavior instances can be shared by several nodes (a clone references
/// the same instances as its source), so nodes hold ids, not values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BehaviorId(u64);

impl BehaviorId {
    /// Create a behavior id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering() {
        assert!(NodeId::new(1) < NodeId::new(2));
        assert_eq!(NodeId::new(7).as_u64(), 7);
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(NodeId::new(3).to_string(), "node#3");
        assert_eq!(GraphId::new(4).to_string(), "graph#4");
        assert_eq!(BehaviorId::new(5).to_string(), "behavior#5");
    }
}
