//! # recall-graph
//!
//! Graph-augmented reranking for Recall.
//!
//! Builds a node/edge graph over chunks with two edge kinds:
//! - Sequential: adjacent chunks of the same source document
//! - Semantic: nearest-neighbor pairs above a similarity threshold,
//!   discovered through the vector index
//!
//! Queries propagate relevance from similarity-weighted seed nodes via
//! a random walk with restart and blend visitation frequency with the
//! initial similarity.

pub mod error;
pub mod graph;
pub mod walk;

pub use error::GraphError;
pub use graph::{Edge, EdgeKind, GraphRetriever, GraphStats};
pub use walk::{EdgeFilter, GraphHit, WalkConfig};
