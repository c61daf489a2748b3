//! Target graph: registration and execution-order resolution
//!
//! Built on petgraph for cycle detection; ordering itself is a stable Kahn sort
//! so repeated runs of the same request always produce the same order.

pub mod target_graph;

pub use target_graph::{Target, TargetGraph};
