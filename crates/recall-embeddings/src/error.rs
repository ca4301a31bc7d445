//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding generation.
///
/// `NotConfigured` carries actionable remediation (missing credentials,
/// missing model file) and is distinct from `Transient`, which callers
/// may retry with their own deadline.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider is not configured; the message says what to fix
    #[error("Embedding provider not configured: {0}")]
    NotConfigured(String),

    /// Transient backend failure (network, timeout); retryable
    #[error("Embedding backend failure: {0}")]
    Transient(String),

    /// Provider returned a vector of unexpected dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Input cannot be embedded (e.g. empty batch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
