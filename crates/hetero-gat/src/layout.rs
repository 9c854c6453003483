//! Fused-parameter layout planning.
//!
//! The natural per-edge-type decomposition (one small linear layer per
//! relation) is replaced by one fused weight matrix per node type plus this
//! table describing how to slice it. The table is built once at
//! construction and consulted by both the split routine and parameter
//! reinitialization; slice positions are fixed by edge-type declaration
//! order: all source-role slots first, then destination-role slots.

use std::collections::HashMap;

use crate::types::{EdgeType, NodeType};

/// Which role a node type plays in a relation's fused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Src,
    Dst,
}

/// Ordered relations incident to one node type.
///
/// A same-type relation (source type == destination type) registers only in
/// `src_relations`; its single chunk serves both attention roles downstream.
#[derive(Debug, Clone, Default)]
pub struct NodeRelations {
    pub src_relations: Vec<EdgeType>,
    pub dst_relations: Vec<EdgeType>,
}

impl NodeRelations {
    /// Total incident relation slots for this node type.
    #[must_use]
    pub fn num_relations(&self) -> usize {
        self.src_relations.len() + self.dst_relations.len()
    }

    /// Slots in physical order: source relations first (declaration order),
    /// then destination relations.
    pub fn slots(&self) -> impl Iterator<Item = (&EdgeType, Role)> {
        self.src_relations
            .iter()
            .map(|et| (et, Role::Src))
            .chain(self.dst_relations.iter().map(|et| (et, Role::Dst)))
    }
}

/// Construction-time layout table: node type -> incident relations, plus the
/// derived fused tensor shapes.
#[derive(Debug, Clone)]
pub struct RelationLayout {
    per_node: HashMap<NodeType, NodeRelations>,
    chunk_rows: usize,
}

impl RelationLayout {
    /// Build the layout from declared node and edge types.
    ///
    /// Each edge type `(s, _, d)` appends to `s`'s source list and, only
    /// when `d != s`, to `d`'s destination list. Node types untouched by any
    /// edge type get zero relations (legal; they produce a zero-row fused
    /// weight and no forward output).
    #[must_use]
    pub fn build(
        node_types: &[NodeType],
        edge_types: &[EdgeType],
        heads: usize,
        out_channels: usize,
    ) -> Self {
        let mut per_node: HashMap<NodeType, NodeRelations> = node_types
            .iter()
            .map(|nt| (nt.clone(), NodeRelations::default()))
            .collect();

        for edge_type in edge_types {
            if let Some(rels) = per_node.get_mut(&edge_type.src) {
                rels.src_relations.push(edge_type.clone());
            }
            if edge_type.src != edge_type.dst {
                if let Some(rels) = per_node.get_mut(&edge_type.dst) {
                    rels.dst_relations.push(edge_type.clone());
                }
            }
        }

        Self {
            per_node,
            chunk_rows: heads * out_channels,
        }
    }

    /// Relations incident to `ntype`. Panics only if `ntype` was not among
    /// the declared node types; the layer validates inputs before calling.
    #[must_use]
    pub fn relations(&self, ntype: &NodeType) -> &NodeRelations {
        &self.per_node[ntype]
    }

    #[must_use]
    pub fn contains(&self, ntype: &NodeType) -> bool {
        self.per_node.contains_key(ntype)
    }

    /// Incident relation count for `ntype`.
    #[must_use]
    pub fn num_relations(&self, ntype: &NodeType) -> usize {
        self.per_node[ntype].num_relations()
    }

    /// Rows of one relation's weight block: `heads * out_channels`.
    #[must_use]
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    /// Total rows of `ntype`'s fused weight:
    /// `num_relations * heads * out_channels`.
    #[must_use]
    pub fn fused_rows(&self, ntype: &NodeType) -> usize {
        self.num_relations(ntype) * self.chunk_rows
    }
}
