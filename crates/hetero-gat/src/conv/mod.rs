//! The fused heterogeneous graph attention layer.
//!
//! One graph attention operator per edge type, with the per-node-type
//! linear projections of all incident relations fused into a single weight
//! matrix, so each node type costs one GEMM per forward instead of one per
//! relation. The fused output is sliced back into per-relation chunks,
//! dispatched through the attention kernel, and re-aggregated per
//! destination node type.


use std::collections::HashMap;

use candle_core::{Device, Tensor};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::aggregate::group;
use crate::attention::{ensure_compatible, mha_gat_n2n, GatFeatures};
use crate::config::HeteroGatConfig;
use crate::error::{GnnError, GnnResult};
use crate::graph::CscGraph;
use crate::init::{glorot, zeros};
use crate::layout::{RelationLayout, Role};
use crate::types::{EdgeIndexDict, EdgeType, FeatureDict, NodeType, OutputDict};

/// Minimum attention-kernel API this layer was validated against.
/// Checked once at construction; forward never re-checks.
pub const MIN_KERNEL_API: (u32, u32, u32) = (2, 4, 0);

/// Heterogeneous graph attention layer with fused per-node-type projections.
///
/// Parameters are allocated at construction and initialized by
/// [`reset_parameters`](Self::reset_parameters); the layer owns only its
/// parameters, never the node features or edge lists it is applied to.
#[derive(Debug)]
pub struct HeteroGatConv {
    config: HeteroGatConfig,
    in_channels: HashMap<NodeType, usize>,
    layout: RelationLayout,
    device: Device,
    /// Per node type: `(n_rel * heads * out_channels, in_channels)`.
    lin_weights: HashMap<NodeType, Tensor>,
    /// Per edge type: `(2 * heads * out_channels,)`.
    attn_weights: HashMap<EdgeType, Tensor>,
    /// Per edge type: `(heads * out_channels,)` when concatenating heads,
    /// `(out_channels,)` when averaging. `None` when bias is disabled.
    bias: Option<HashMap<EdgeType, Tensor>>,
}

impl HeteroGatConv {
    /// Build the layer and initialize its parameters from ambient
    /// randomness.
    ///
    /// # Errors
    ///
    /// - `GnnError::Compatibility` if the attention kernel API is below
    ///   [`MIN_KERNEL_API`]
    /// - `GnnError::Config` if the configuration is invalid
    /// - `GnnError::Tensor` if parameter allocation fails
    pub fn new(config: HeteroGatConfig, device: &Device) -> GnnResult<Self> {
        ensure_compatible(MIN_KERNEL_API)?;
        config.validate()?;

        let layout = RelationLayout::build(
            &config.node_types,
            &config.edge_types,
            config.heads,
            config.out_channels,
        );

        let mut layer = Self {
            in_channels: config.resolved_in_channels(),
            layout,
            device: device.clone(),
            lin_weights: HashMap::new(),
            attn_weights: HashMap::new(),
            bias: None,
            config,
        };
        layer.reset_parameters(None)?;

        tracing::info!(
            node_types = layer.config.node_types.len(),
            edge_types = layer.config.edge_types.len(),
            heads = layer.config.heads,
            out_channels = layer.config.out_channels,
            parameter_count = layer.parameter_count(),
            "created fused heterogeneous attention layer"
        );

        Ok(layer)
    }

    /// Reinitialize all parameters.
    ///
    /// Weight blocks and attention vectors get Glorot draws, biases are
    /// zeroed. With `Some(seed)` the result is bit-identical across calls;
    /// with `None` it draws from entropy. Draws happen per edge type in
    /// declaration order: source block, destination block (only when the
    /// endpoint types differ), attention vector.
    pub fn reset_parameters(&mut self, seed: Option<u64>) -> GnnResult<()> {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let heads = self.config.heads;
        let out_channels = self.config.out_channels;
        let chunk_rows = heads * out_channels;

        let mut weight_chunks: HashMap<(EdgeType, Role), Vec<f32>> = HashMap::new();
        let mut attn_weights = HashMap::new();
        let mut biases = HashMap::new();

        for edge_type in &self.config.edge_types {
            let src_in = self.in_channels[&edge_type.src];
            weight_chunks.insert(
                (edge_type.clone(), Role::Src),
                glorot(&mut rng, chunk_rows, src_in, chunk_rows * src_in),
            );
            if !edge_type.is_homogeneous() {
                let dst_in = self.in_channels[&edge_type.dst];
                weight_chunks.insert(
                    (edge_type.clone(), Role::Dst),
                    glorot(&mut rng, chunk_rows, dst_in, chunk_rows * dst_in),
                );
            }

            // Attention vector viewed as (2, heads, out_channels) for the
            // variance calculation.
            let attn = glorot(&mut rng, heads, out_channels, 2 * chunk_rows);
            attn_weights.insert(
                edge_type.clone(),
                Tensor::from_vec(attn, (2 * chunk_rows,), &self.device)?,
            );

            if self.config.bias {
                let len = self.config.out_dim();
                biases.insert(
                    edge_type.clone(),
                    Tensor::from_vec(zeros(len), (len,), &self.device)?,
                );
            }
        }

        // Assemble each node type's fused weight: chunk rows concatenated in
        // layout slot order (source relations first, then destinations).
        let mut lin_weights = HashMap::new();
        for ntype in &self.config.node_types {
            let in_ch = self.in_channels[ntype];
            let rows = self.layout.fused_rows(ntype);
            let mut fused = Vec::with_capacity(rows * in_ch);
            for (edge_type, role) in self.layout.relations(ntype).slots() {
                fused.extend_from_slice(&weight_chunks[&(edge_type.clone(), role)]);
            }
            lin_weights.insert(
                ntype.clone(),
                Tensor::from_vec(fused, (rows, in_ch), &self.device)?,
            );
        }

        self.lin_weights = lin_weights;
        self.attn_weights = attn_weights;
        self.bias = self.config.bias.then_some(biases);
        Ok(())
    }

    /// Slice fused per-node-type tensors into per-relation chunks.
    ///
    /// `dim` is 0 for weights (rows) and 1 for projected activations
    /// (columns). Returns source-role and destination-role chunk dicts keyed
    /// by edge type; same-type relations appear only in the source dict and
    /// reuse that chunk for both roles downstream.
    ///
    /// # Errors
    ///
    /// `GnnError::UnknownNodeType` for tensors keyed by an undeclared node
    /// type, `GnnError::UnevenChunk` when a tensor's `dim` extent is not an
    /// exact multiple of the node type's relation count.
    pub fn split_tensors(
        &self,
        fused: &HashMap<NodeType, Tensor>,
        dim: usize,
    ) -> GnnResult<(HashMap<EdgeType, Tensor>, HashMap<EdgeType, Tensor>)> {
        let mut x_src = HashMap::new();
        let mut x_dst = HashMap::new();

        for (ntype, tensor) in fused {
            if !self.layout.contains(ntype) {
                return Err(GnnError::UnknownNodeType(ntype.to_string()));
            }
            let n_rel = self.layout.num_relations(ntype);
            if n_rel == 0 {
                continue;
            }
            let size = tensor.dims()[dim];
            if size % n_rel != 0 {
                return Err(GnnError::UnevenChunk {
                    size,
                    chunks: n_rel,
                });
            }

            let chunks = tensor.chunk(n_rel, dim)?;
            for ((edge_type, role), chunk) in
                self.layout.relations(ntype).slots().zip(chunks)
            {
                match role {
                    Role::Src => x_src.insert(edge_type.clone(), chunk),
                    Role::Dst => x_dst.insert(edge_type.clone(), chunk),
                };
            }
        }

        Ok((x_src, x_dst))
    }

    /// Forward pass.
    ///
    /// Projects each node type's features through its fused weight (one
    /// GEMM per node type), slices per relation, runs the attention kernel
    /// per edge type present in `edge_index_dict`, and reduces the relation
    /// outputs per destination node type with the configured aggregation.
    ///
    /// The output covers only node types receiving at least one relation's
    /// output in this call; callers must not assume full `node_types`
    /// coverage.
    ///
    /// # Errors
    ///
    /// - `GnnError::UnknownNodeType` / `GnnError::Config` for inputs keyed
    ///   by types the layer was not built with
    /// - `GnnError::DimensionMismatch` when a feature width disagrees with
    ///   the configured `in_channels`
    /// - `GnnError::MissingFeatures` when an edge type's endpoint has no
    ///   entry in `x_dict`
    /// - `GnnError::Tensor` propagated from the tensor/kernel layer
    pub fn forward(
        &self,
        x_dict: &FeatureDict,
        edge_index_dict: &EdgeIndexDict,
    ) -> GnnResult<OutputDict> {
        for edge_type in edge_index_dict.keys() {
            if !self.attn_weights.contains_key(edge_type) {
                return Err(GnnError::config(format!(
                    "unknown edge type: {edge_type}"
                )));
            }
        }

        // One fused GEMM per node type covering all its incident relations.
        let mut fused = HashMap::new();
        for (ntype, x) in x_dict {
            if !self.layout.contains(ntype) {
                return Err(GnnError::UnknownNodeType(ntype.to_string()));
            }
            let (_, width) = x.dims2()?;
            let expected = self.in_channels[ntype];
            if width != expected {
                return Err(GnnError::DimensionMismatch {
                    expected,
                    actual: width,
                });
            }
            if self.layout.num_relations(ntype) == 0 {
                continue;
            }
            let projected = x.matmul(&self.lin_weights[ntype].t()?)?;
            fused.insert(ntype.clone(), projected);
        }

        let (x_src, x_dst) = self.split_tensors(&fused, 1)?;

        // Two-phase aggregation: bucket relation outputs by destination
        // type, then reduce each bucket.
        let mut buckets: HashMap<NodeType, Vec<Tensor>> = HashMap::new();
        let mut relations_run = 0usize;

        for edge_type in &self.config.edge_types {
            let Some(edge_index) = edge_index_dict.get(edge_type) else {
                continue;
            };

            let n_src = num_nodes(x_dict, &edge_type.src, edge_type)?;
            let n_dst = num_nodes(x_dict, &edge_type.dst, edge_type)?;
            let csc = CscGraph::from_edge_index(edge_index, n_src, n_dst)?;

            let src_chunk = x_src
                .get(edge_type)
                .ok_or_else(|| missing(&edge_type.src, edge_type))?;
            let features = if edge_type.is_homogeneous() {
                GatFeatures::Homogeneous(src_chunk)
            } else {
                GatFeatures::Bipartite {
                    src: src_chunk,
                    dst: x_dst
                        .get(edge_type)
                        .ok_or_else(|| missing(&edge_type.dst, edge_type))?,
                }
            };

            let mut out = mha_gat_n2n(
                features,
                &self.attn_weights[edge_type],
                &csc,
                self.config.heads,
                self.config.negative_slope,
                self.config.concat,
            )?;

            if let Some(bias) = &self.bias {
                out = out.broadcast_add(&bias[edge_type])?;
            }

            buckets.entry(edge_type.dst.clone()).or_default().push(out);
            relations_run += 1;
        }

        let mut out_dict = OutputDict::new();
        for (ntype, outputs) in buckets {
            out_dict.insert(ntype, group(&outputs, self.config.aggr)?);
        }

        tracing::debug!(
            relations = relations_run,
            output_node_types = out_dict.len(),
            aggr = %self.config.aggr,
            "fused attention forward"
        );

        Ok(out_dict)
    }

    /// Output width per node: `heads * out_channels` when concatenating,
    /// `out_channels` when averaging.
    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.config.out_dim()
    }

    #[must_use]
    pub fn config(&self) -> &HeteroGatConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &RelationLayout {
        &self.layout
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Fused projection weight of one node type.
    #[must_use]
    pub fn lin_weight(&self, ntype: &NodeType) -> Option<&Tensor> {
        self.lin_weights.get(ntype)
    }

    /// Attention-parameter vector of one edge type.
    #[must_use]
    pub fn attn_weight(&self, edge_type: &EdgeType) -> Option<&Tensor> {
        self.attn_weights.get(edge_type)
    }

    /// Bias vector of one edge type, if bias is enabled.
    #[must_use]
    pub fn bias(&self, edge_type: &EdgeType) -> Option<&Tensor> {
        self.bias.as_ref().and_then(|b| b.get(edge_type))
    }

    /// Total learnable scalar count across fused weights, attention vectors
    /// and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        let weights: usize = self
            .lin_weights
            .values()
            .map(Tensor::elem_count)
            .sum();
        let attn: usize = self.attn_weights.values().map(Tensor::elem_count).sum();
        let bias: usize = self
            .bias
            .iter()
            .flat_map(|b| b.values())
            .map(Tensor::elem_count)
            .sum();
        weights + attn + bias
    }
}

fn num_nodes(x_dict: &FeatureDict, ntype: &NodeType, edge_type: &EdgeType) -> GnnResult<usize> {
    let x = x_dict.get(ntype).ok_or_else(|| missing(ntype, edge_type))?;
    Ok(x.dims2()?.0)
}

fn missing(ntype: &NodeType, edge_type: &EdgeType) -> GnnError {
    GnnError::MissingFeatures {
        node_type: ntype.to_string(),
        edge_type: edge_type.to_string(),
    }
}
