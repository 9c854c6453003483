//! Error types for the heterogeneous graph attention layer.

mod types;


pub use types::{GnnError, GnnResult};
