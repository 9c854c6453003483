//! Fused heterogeneous graph attention.
//!
//! A graph attentional operator for heterogeneous graphs: one `GAT`-style
//! attention computation per edge type, with the linear projections of all
//! relations incident to a node type fused into a single weight matrix so
//! that each node type costs one GEMM per forward pass instead of one per
//! relation.
//!
//! # Pipeline
//!
//! ```text
//! x_dict: {node type -> (n, in_ch)}
//!        |
//!        v
//!   [fused GEMM per node type]      (n, n_rel * heads * out)
//!        |
//!        v
//!   [split per relation slot]       x_src / x_dst chunks per edge type
//!        |
//!        v
//!   [attention kernel per relation] (n_dst, heads * out) each
//!        |
//!        v
//!   [reduce per destination type]   {node type -> aggregated output}
//! ```
//!
//! # Example
//!
//! ```
//! use candle_core::{Device, Tensor};
//! use hetero_gat::{
//!     EdgeIndexDict, EdgeType, FeatureDict, HeteroGatConfig, HeteroGatConv, NodeType,
//! };
//!
//! let device = Device::Cpu;
//! let config = HeteroGatConfig::new(
//!     8,
//!     4,
//!     vec!["author".into(), "paper".into()],
//!     vec![EdgeType::new("author", "writes", "paper")],
//! );
//! let layer = HeteroGatConv::new(config, &device)?;
//!
//! let mut x_dict = FeatureDict::new();
//! x_dict.insert("author".into(), Tensor::zeros((3, 8), candle_core::DType::F32, &device)?);
//! x_dict.insert("paper".into(), Tensor::zeros((2, 8), candle_core::DType::F32, &device)?);
//! let mut edges = EdgeIndexDict::new();
//! edges.insert(
//!     EdgeType::new("author", "writes", "paper"),
//!     Tensor::from_vec(vec![0i64, 1, 2, 0, 1, 1], (2, 3), &device)?,
//! );
//!
//! let out = layer.forward(&x_dict, &edges)?;
//! assert_eq!(out[&NodeType::from("paper")].dims(), &[2, 4]);
//! # Ok::<(), hetero_gat::GnnError>(())
//! ```

pub mod aggregate;
pub mod attention;
pub mod config;
pub mod conv;
pub mod error;
pub mod graph;
pub mod init;
pub mod layout;
pub mod types;

pub use aggregate::Aggregation;
pub use config::{HeteroGatConfig, InChannels};
pub use conv::{HeteroGatConv, MIN_KERNEL_API};
pub use error::{GnnError, GnnResult};
pub use graph::CscGraph;
pub use types::{EdgeIndexDict, EdgeType, FeatureDict, NodeType, OutputDict};
