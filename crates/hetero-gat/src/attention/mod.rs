//! Multi-head graph attention message passing.
//!
//! This is the kernel the layer dispatches each relation through: given one
//! relation's projected features, its attention-parameter vector and a CSC
//! adjacency, it computes attention-weighted neighbor aggregation
//! (node-to-node, `mha_gat_n2n`). The fused GEMM upstream stays in the
//! tensor library; this module only consumes its per-relation slices.

mod kernel;


pub use kernel::{mha_gat_n2n, GatFeatures};

use crate::error::{GnnError, GnnResult};

/// Version of the attention kernel API this module provides.
pub const KERNEL_API_VERSION: (u32, u32, u32) = (2, 4, 0);

/// Fail fast when the kernel API is older than `required`.
///
/// Layers call this once at construction; forward passes never re-check.
pub fn ensure_compatible(required: (u32, u32, u32)) -> GnnResult<()> {
    if KERNEL_API_VERSION < required {
        return Err(GnnError::Compatibility {
            required: format_version(required),
            found: format_version(KERNEL_API_VERSION),
        });
    }
    Ok(())
}

fn format_version((major, minor, patch): (u32, u32, u32)) -> String {
    format!("{major}.{minor}.{patch}")
}
