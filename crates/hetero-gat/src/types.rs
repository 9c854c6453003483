//! Identifiers for heterogeneous graph node and edge types.
//!
//! Node and edge types are small value types usable as map keys. Their
//! ordering inside the layer follows the construction-time declaration
//! order, which determines the physical slice positions in the fused
//! parameter layout.

use std::collections::HashMap;
use std::fmt;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// A class of nodes in a heterogeneous graph (e.g. `"author"`, `"paper"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(String);

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A relation `(source type, relation label, destination type)`.
///
/// The triple uniquely identifies a relation; two edge types may share a
/// relation label as long as their endpoints differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeType {
    pub src: NodeType,
    pub rel: String,
    pub dst: NodeType,
}

impl EdgeType {
    pub fn new(
        src: impl Into<NodeType>,
        rel: impl Into<String>,
        dst: impl Into<NodeType>,
    ) -> Self {
        Self {
            src: src.into(),
            rel: rel.into(),
            dst: dst.into(),
        }
    }

    /// Whether source and destination are the same node type.
    #[must_use]
    pub fn is_homogeneous(&self) -> bool {
        self.src == self.dst
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}__{}", self.src, self.rel, self.dst)
    }
}

impl From<(&str, &str, &str)> for EdgeType {
    fn from((src, rel, dst): (&str, &str, &str)) -> Self {
        Self::new(src, rel, dst)
    }
}

/// Node features keyed by node type: `(num_nodes, in_channels)` per entry.
/// Owned by the caller; the layer only owns its parameters.
pub type FeatureDict = HashMap<NodeType, Tensor>;

/// Edge lists keyed by edge type: each tensor is `(2, num_edges)` `i64`,
/// row 0 source node indices, row 1 destination node indices.
pub type EdgeIndexDict = HashMap<EdgeType, Tensor>;

/// Aggregated layer outputs keyed by destination node type. Covers only
/// node types that received at least one relation's output.
pub type OutputDict = HashMap<NodeType, Tensor>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_display_and_eq() {
        let a = NodeType::from("paper");
        let b = NodeType::new("paper");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "paper");
    }

    #[test]
    fn edge_type_display() {
        let et = EdgeType::new("author", "writes", "paper");
        assert_eq!(et.to_string(), "author__writes__paper");
        assert!(!et.is_homogeneous());
    }

    #[test]
    fn homogeneous_edge_type() {
        let et = EdgeType::from(("paper", "cites", "paper"));
        assert!(et.is_homogeneous());
    }

    #[test]
    fn usable_as_map_keys() {
        let mut m = HashMap::new();
        m.insert(EdgeType::new("a", "r", "b"), 1usize);
        assert_eq!(m[&EdgeType::new("a", "r", "b")], 1);
    }

    #[test]
    fn serde_round_trip() {
        let et = EdgeType::new("author", "writes", "paper");
        let json = serde_json::to_string(&et).unwrap();
        let back: EdgeType = serde_json::from_str(&json).unwrap();
        assert_eq!(et, back);
    }
}
