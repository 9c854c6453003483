//! Core error types for layer construction and forward passes.

use thiserror::Error;

/// Result type alias for layer operations.
pub type GnnResult<T> = Result<T, GnnError>;

/// Error type for all fused-attention layer failures.
///
/// Every variant is a programmer or configuration error: the layer performs
/// no retries and no local recovery. The first error aborts the whole
/// forward pass.
#[derive(Debug, Error)]
pub enum GnnError {
    /// Attention kernel API older than the minimum this layer was validated
    /// against. Raised at construction, never during forward.
    #[error("attention kernel API {found} is older than required {required}")]
    Compatibility { required: String, found: String },

    /// Invalid construction parameter.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Feature or parameter width does not match the configured layout.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A fused tensor cannot be split into equal per-relation chunks.
    /// This is a layout bug, not a runtime data error.
    #[error("cannot split {size} rows/cols into {chunks} equal chunks")]
    UnevenChunk { size: usize, chunks: usize },

    /// An input dict references a node type the layer was not built with.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// An edge type in the forward inputs has an endpoint with no feature
    /// tensor in `x_dict`.
    #[error("no features for node type {node_type} required by edge type {edge_type}")]
    MissingFeatures {
        node_type: String,
        edge_type: String,
    },

    /// An edge index refers to a node outside the feature tensor.
    #[error("edge index {index} out of bounds for {num_nodes} nodes")]
    IndexOutOfBounds { index: i64, num_nodes: usize },

    /// Propagated tensor/kernel error (shape mismatch, device mismatch).
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl GnnError {
    /// Shorthand for configuration errors.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
