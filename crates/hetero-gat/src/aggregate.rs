//! Multi-relation reduction.
//!
//! Combines the per-relation outputs landing on one destination node type
//! into a single tensor.

use std::fmt;
use std::str::FromStr;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{GnnError, GnnResult};

/// Reduction applied across relation outputs sharing a destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = GnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(GnnError::config(format!(
                "unknown aggregation {other:?}, expected sum/mean/min/max"
            ))),
        }
    }
}

/// Reduce a non-empty group of same-shaped tensors into one.
///
/// Stacks along a fresh leading axis and reduces it; a single-element group
/// therefore returns that element's values for every reduction.
///
/// # Errors
///
/// `GnnError::Config` on an empty group; `GnnError::Tensor` when shapes or
/// devices disagree.
pub fn group(outputs: &[Tensor], aggr: Aggregation) -> GnnResult<Tensor> {
    if outputs.is_empty() {
        return Err(GnnError::config("cannot aggregate an empty relation group"));
    }
    let stacked = Tensor::stack(outputs, 0)?;
    let reduced = match aggr {
        Aggregation::Sum => stacked.sum(0)?,
        Aggregation::Mean => stacked.mean(0)?,
        Aggregation::Min => stacked.min(0)?,
        Aggregation::Max => stacked.max(0)?,
    };
    Ok(reduced)
}
