//! Compressed sparse adjacency for the attention kernel.

mod csc;


pub use csc::CscGraph;
