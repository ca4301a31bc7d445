//! # recall-vector
//!
//! Approximate nearest-neighbor vector index for Recall.
//!
//! Implements a hierarchical navigable proximity graph: vectors live in
//! a stack of layers, each node is assigned a random top layer drawn
//! from an exponential decay distribution, and search descends greedily
//! from the sparse top layers into a bounded best-first search at the
//! bottom. Expected sublinear query time, tunable recall via `ef`.
//!
//! ## Features
//! - Insert, update, delete with full neighbor-list repair
//! - Cosine or Euclidean metric, fixed per index instance
//! - Serializable snapshot of nodes and adjacency
//! - All public scores are similarities in [0, 1], higher is better

pub mod error;
pub mod hnsw;
pub mod metric;
pub mod snapshot;

pub use error::VectorError;
pub use hnsw::{HnswConfig, HnswIndex, VectorHit, VectorIndexStats};
pub use metric::Metric;
pub use snapshot::{NodeSnapshot, VectorSnapshot};
