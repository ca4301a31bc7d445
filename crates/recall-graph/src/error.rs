//! Graph retriever error types.

use thiserror::Error;

use recall_vector::VectorError;

/// Errors that can occur during graph construction or querying.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A tuning parameter is out of its valid range (threshold, restart
    /// probability)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Query embedding dimension does not match the stored chunks
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Semantic edge construction queries the vector index
    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),
}
