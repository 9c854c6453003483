//! Layer configuration.
//!
//! Mirrors the construction parameters of the fused heterogeneous attention
//! layer: node/edge type declarations, channel widths, head count, and the
//! multi-relation aggregation scheme.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::error::{GnnError, GnnResult};
use crate::types::{EdgeType, NodeType};

fn default_heads() -> usize {
    1
}

fn default_concat() -> bool {
    true
}

fn default_negative_slope() -> f64 {
    0.2
}

fn default_bias() -> bool {
    true
}

fn default_aggr() -> Aggregation {
    Aggregation::Sum
}

/// Input feature width: one width for every node type, or a per-type map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InChannels {
    /// Same input width for all node types.
    Uniform(usize),
    /// Explicit width per node type.
    PerType(HashMap<NodeType, usize>),
}

impl From<usize> for InChannels {
    fn from(width: usize) -> Self {
        Self::Uniform(width)
    }
}

impl From<HashMap<NodeType, usize>> for InChannels {
    fn from(map: HashMap<NodeType, usize>) -> Self {
        Self::PerType(map)
    }
}

/// Construction parameters for [`HeteroGatConv`](crate::conv::HeteroGatConv).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeteroGatConfig {
    /// Input feature width(s) per node type.
    pub in_channels: InChannels,

    /// Output feature width per attention head.
    pub out_channels: usize,

    /// All node types the layer is built for.
    pub node_types: Vec<NodeType>,

    /// All relations. Declaration order is load-bearing: it fixes the slice
    /// positions inside each node type's fused weight.
    pub edge_types: Vec<EdgeType>,

    /// Number of attention heads.
    #[serde(default = "default_heads")]
    pub heads: usize,

    /// Concatenate head outputs (`true`) or average them (`false`).
    #[serde(default = "default_concat")]
    pub concat: bool,

    /// LeakyReLU negative slope for attention scores.
    #[serde(default = "default_negative_slope")]
    pub negative_slope: f64,

    /// Learn an additive per-relation bias.
    #[serde(default = "default_bias")]
    pub bias: bool,

    /// Reduction combining relation outputs per destination node type.
    #[serde(default = "default_aggr")]
    pub aggr: Aggregation,
}

impl HeteroGatConfig {
    /// Configuration with defaults for everything past the required fields.
    pub fn new(
        in_channels: impl Into<InChannels>,
        out_channels: usize,
        node_types: Vec<NodeType>,
        edge_types: Vec<EdgeType>,
    ) -> Self {
        Self {
            in_channels: in_channels.into(),
            out_channels,
            node_types,
            edge_types,
            heads: default_heads(),
            concat: default_concat(),
            negative_slope: default_negative_slope(),
            bias: default_bias(),
            aggr: default_aggr(),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `GnnError::Config` if:
    /// - `node_types` is empty, or contains duplicates
    /// - `out_channels` or `heads` is 0
    /// - an edge type endpoint is not a declared node type
    /// - a per-type `in_channels` map misses a declared node type, or maps a
    ///   node type to width 0
    /// - `negative_slope` is not finite
    pub fn validate(&self) -> GnnResult<()> {
        if self.node_types.is_empty() {
            return Err(GnnError::config("node_types must not be empty"));
        }
        for (i, ntype) in self.node_types.iter().enumerate() {
            if self.node_types[..i].contains(ntype) {
                return Err(GnnError::config(format!(
                    "duplicate node type: {ntype}"
                )));
            }
        }
        if self.out_channels == 0 {
            return Err(GnnError::config("out_channels must be > 0"));
        }
        if self.heads == 0 {
            return Err(GnnError::config("heads must be > 0"));
        }
        if !self.negative_slope.is_finite() {
            return Err(GnnError::config("negative_slope must be finite"));
        }
        for edge_type in &self.edge_types {
            for endpoint in [&edge_type.src, &edge_type.dst] {
                if !self.node_types.contains(endpoint) {
                    return Err(GnnError::config(format!(
                        "edge type {edge_type} references undeclared node type {endpoint}"
                    )));
                }
            }
        }
        match &self.in_channels {
            InChannels::Uniform(width) => {
                if *width == 0 {
                    return Err(GnnError::config("in_channels must be > 0"));
                }
            }
            InChannels::PerType(map) => {
                for ntype in &self.node_types {
                    match map.get(ntype) {
                        None => {
                            return Err(GnnError::config(format!(
                                "in_channels map has no entry for node type {ntype}"
                            )));
                        }
                        Some(0) => {
                            return Err(GnnError::config(format!(
                                "in_channels for node type {ntype} must be > 0"
                            )));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Expand `in_channels` into one width per declared node type.
    #[must_use]
    pub fn resolved_in_channels(&self) -> HashMap<NodeType, usize> {
        match &self.in_channels {
            InChannels::Uniform(width) => self
                .node_types
                .iter()
                .map(|nt| (nt.clone(), *width))
                .collect(),
            InChannels::PerType(map) => map.clone(),
        }
    }

    /// Output width per node: `heads * out_channels` when concatenating,
    /// `out_channels` when averaging heads.
    #[must_use]
    pub fn out_dim(&self) -> usize {
        if self.concat {
            self.heads * self.out_channels
        } else {
            self.out_channels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> HeteroGatConfig {
        HeteroGatConfig::new(
            8,
            4,
            vec!["a".into(), "b".into()],
            vec![EdgeType::new("a", "r1", "b"), EdgeType::new("b", "r2", "a")],
        )
    }

    #[test]
    fn defaults() {
        let config = base_config();
        assert_eq!(config.heads, 1);
        assert!(config.concat);
        assert_eq!(config.negative_slope, 0.2);
        assert!(config.bias);
        assert!(matches!(config.aggr, Aggregation::Sum));
        config.validate().unwrap();
    }

    #[test]
    fn out_dim_depends_on_concat() {
        let mut config = base_config();
        config.heads = 2;
        assert_eq!(config.out_dim(), 8);
        config.concat = false;
        assert_eq!(config.out_dim(), 4);
    }

    #[test]
    fn rejects_undeclared_endpoint() {
        let mut config = base_config();
        config.edge_types.push(EdgeType::new("a", "r3", "c"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared"));
    }

    #[test]
    fn rejects_zero_dims() {
        let mut config = base_config();
        config.out_channels = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.heads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_node_type() {
        let mut config = base_config();
        config.node_types.push("a".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn per_type_map_must_cover_all_node_types() {
        let mut config = base_config();
        let mut map = HashMap::new();
        map.insert(NodeType::from("a"), 8usize);
        config.in_channels = InChannels::PerType(map);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no entry"));
    }

    #[test]
    fn uniform_in_channels_broadcasts() {
        let config = base_config();
        let resolved = config.resolved_in_channels();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[&NodeType::from("a")], 8);
        assert_eq!(resolved[&NodeType::from("b")], 8);
    }

    #[test]
    fn serde_defaults_fill_optional_fields() {
        let json = r#"{
            "in_channels": 16,
            "out_channels": 4,
            "node_types": ["a", "b"],
            "edge_types": [{"src": "a", "rel": "r", "dst": "b"}]
        }"#;
        let config: HeteroGatConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.heads, 1);
        assert!(config.bias);
        assert!(matches!(config.in_channels, InChannels::Uniform(16)));
        config.validate().unwrap();
    }
}
