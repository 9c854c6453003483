//! Edge-list to compressed-sparse-column conversion.

use candle_core::Tensor;

use crate::error::{GnnError, GnnResult};

/// Compressed sparse column adjacency of one relation's graph.
///
/// Edges are grouped by destination node: `col_offsets[j]..col_offsets[j+1]`
/// indexes into `row_indices`, listing the source nodes of all edges landing
/// on destination `j`. Covers both the homogeneous case (`n_src == n_dst`,
/// one shared node set) and the bipartite case.
#[derive(Debug, Clone)]
pub struct CscGraph {
    col_offsets: Vec<usize>,
    row_indices: Vec<usize>,
    n_src: usize,
    n_dst: usize,
}

impl CscGraph {
    /// Build from an edge-list tensor of shape `(2, num_edges)`, dtype
    /// `i64`: row 0 holds source node indices, row 1 destination indices.
    ///
    /// # Errors
    ///
    /// - `GnnError::DimensionMismatch` if the tensor is not `(2, E)`
    /// - `GnnError::IndexOutOfBounds` if any index falls outside
    ///   `[0, n_src)` / `[0, n_dst)` or is negative
    /// - `GnnError::Tensor` on dtype mismatch
    pub fn from_edge_index(edge_index: &Tensor, n_src: usize, n_dst: usize) -> GnnResult<Self> {
        let dims = edge_index.dims();
        if dims.len() != 2 || dims[0] != 2 {
            return Err(GnnError::DimensionMismatch {
                expected: 2,
                actual: *dims.first().unwrap_or(&0),
            });
        }
        let rows = edge_index.to_vec2::<i64>()?;
        let (src, dst) = (&rows[0], &rows[1]);

        let mut degree = vec![0usize; n_dst];
        for (&s, &d) in src.iter().zip(dst.iter()) {
            if s < 0 || s as usize >= n_src {
                return Err(GnnError::IndexOutOfBounds {
                    index: s,
                    num_nodes: n_src,
                });
            }
            if d < 0 || d as usize >= n_dst {
                return Err(GnnError::IndexOutOfBounds {
                    index: d,
                    num_nodes: n_dst,
                });
            }
            degree[d as usize] += 1;
        }

        let mut col_offsets = vec![0usize; n_dst + 1];
        for j in 0..n_dst {
            col_offsets[j + 1] = col_offsets[j] + degree[j];
        }

        // Counting sort of edges by destination, preserving edge order
        // within each destination.
        let mut cursor = col_offsets[..n_dst].to_vec();
        let mut row_indices = vec![0usize; src.len()];
        for (&s, &d) in src.iter().zip(dst.iter()) {
            let slot = cursor[d as usize];
            row_indices[slot] = s as usize;
            cursor[d as usize] += 1;
        }

        Ok(Self {
            col_offsets,
            row_indices,
            n_src,
            n_dst,
        })
    }

    /// Source nodes of all edges landing on destination `dst`.
    #[must_use]
    pub fn neighbors(&self, dst: usize) -> &[usize] {
        &self.row_indices[self.col_offsets[dst]..self.col_offsets[dst + 1]]
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.row_indices.len()
    }

    #[must_use]
    pub fn n_src(&self) -> usize {
        self.n_src
    }

    #[must_use]
    pub fn n_dst(&self) -> usize {
        self.n_dst
    }
}
