//! Node-to-node multi-head GAT kernel.
//!
//! Per edge `(i -> j)` and head `h`:
//! `e = LeakyReLU(a_src[h] . x_src[i, h] + a_dst[h] . x_dst[j, h])`,
//! softmax over each destination's incoming edges, then attention-weighted
//! sum of the source features. Head outputs are concatenated or averaged.

use candle_core::Tensor;

use crate::error::{GnnError, GnnResult};
use crate::graph::CscGraph;

/// Feature input of one relation.
///
/// Same-type relations pass a single tensor serving both attention roles;
/// cross-type relations pass the source-role and destination-role chunks.
#[derive(Debug, Clone, Copy)]
pub enum GatFeatures<'a> {
    Homogeneous(&'a Tensor),
    Bipartite { src: &'a Tensor, dst: &'a Tensor },
}

/// Attention-weighted neighbor aggregation over one relation's graph.
///
/// `attn_weights` has length `2 * heads * out_channels`: the first half
/// holds the source-role coefficients, the second half the destination-role
/// coefficients, each laid out `(heads, out_channels)` row-major. Feature
/// tensors are `(num_nodes, heads * out_channels)` `f32`.
///
/// Returns `(n_dst, heads * out_channels)` when `concat_heads`, else
/// `(n_dst, out_channels)`. Destination nodes without incoming edges get
/// zero rows.
///
/// # Errors
///
/// `GnnError::DimensionMismatch` when the attention vector length is not
/// `2 * heads * c` or the feature widths/node counts disagree with the
/// graph; `GnnError::Tensor` on dtype or device failures.
pub fn mha_gat_n2n(
    features: GatFeatures<'_>,
    attn_weights: &Tensor,
    graph: &CscGraph,
    heads: usize,
    negative_slope: f64,
    concat_heads: bool,
) -> GnnResult<Tensor> {
    let (x_src, x_dst) = match features {
        GatFeatures::Homogeneous(x) => (x, x),
        GatFeatures::Bipartite { src, dst } => (src, dst),
    };

    let attn_len = attn_weights.dims1()?;
    if heads == 0 || attn_len % (2 * heads) != 0 {
        return Err(GnnError::DimensionMismatch {
            expected: 2 * heads,
            actual: attn_len,
        });
    }
    let out_channels = attn_len / (2 * heads);
    let width = heads * out_channels;

    check_shape(x_src, graph.n_src(), width)?;
    check_shape(x_dst, graph.n_dst(), width)?;

    let attn = attn_weights.to_vec1::<f32>()?;
    let (a_src, a_dst) = attn.split_at(width);

    let h_src = x_src.to_vec2::<f32>()?;
    let h_dst = match features {
        GatFeatures::Homogeneous(_) => None,
        GatFeatures::Bipartite { dst, .. } => Some(dst.to_vec2::<f32>()?),
    };
    let h_dst: &[Vec<f32>] = h_dst.as_deref().unwrap_or(&h_src);

    // Per-node, per-head attention logit halves: a . x restricted to one
    // head's channel block.
    let s_src = head_scores(&h_src, a_src, heads, out_channels);
    let s_dst = head_scores(h_dst, a_dst, heads, out_channels);

    let slope = negative_slope as f32;
    let leaky = |v: f32| if v > 0.0 { v } else { slope * v };

    let n_dst = graph.n_dst();
    let out_width = if concat_heads { width } else { out_channels };
    let mut out = vec![0.0f32; n_dst * out_width];

    for j in 0..n_dst {
        let neighbors = graph.neighbors(j);
        if neighbors.is_empty() {
            continue;
        }

        for h in 0..heads {
            let mut scores: Vec<f32> = neighbors
                .iter()
                .map(|&i| leaky(s_src[i * heads + h] + s_dst[j * heads + h]))
                .collect();

            // Max-subtracted softmax over this destination's edges.
            let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for s in &mut scores {
                *s = (*s - max).exp();
                sum += *s;
            }

            let head_offset = h * out_channels;
            for (&i, &e) in neighbors.iter().zip(scores.iter()) {
                let alpha = e / sum;
                let row = &h_src[i];
                if concat_heads {
                    let base = j * out_width + head_offset;
                    for c in 0..out_channels {
                        out[base + c] += alpha * row[head_offset + c];
                    }
                } else {
                    let base = j * out_width;
                    for c in 0..out_channels {
                        out[base + c] += alpha * row[head_offset + c] / heads as f32;
                    }
                }
            }
        }
    }

    Ok(Tensor::from_vec(out, (n_dst, out_width), x_src.device())?)
}

fn check_shape(x: &Tensor, nodes: usize, width: usize) -> GnnResult<()> {
    let (n, w) = x.dims2()?;
    if n != nodes {
        return Err(GnnError::DimensionMismatch {
            expected: nodes,
            actual: n,
        });
    }
    if w != width {
        return Err(GnnError::DimensionMismatch {
            expected: width,
            actual: w,
        });
    }
    Ok(())
}

/// Dot product of each node's per-head feature block with the matching
/// attention coefficient block, flattened `(node, head)`.
fn head_scores(x: &[Vec<f32>], coeffs: &[f32], heads: usize, out_channels: usize) -> Vec<f32> {
    let mut scores = vec![0.0f32; x.len() * heads];
    for (i, row) in x.iter().enumerate() {
        for h in 0..heads {
            let offset = h * out_channels;
            let mut acc = 0.0f32;
            for c in 0..out_channels {
                acc += coeffs[offset + c] * row[offset + c];
            }
            scores[i * heads + h] = acc;
        }
    }
    scores
}
