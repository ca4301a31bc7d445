//! Engine error types.
//!
//! Component errors convert upward into `EngineError` at the facade.
//! Embedding errors split into two surfaced variants: configuration
//! problems carry actionable remediation, transient backend failures
//! may be retried by the caller.

use thiserror::Error;

use recall_embeddings::EmbeddingError;
use recall_graph::GraphError;
use recall_lexical::LexicalError;
use recall_vector::VectorError;

/// Errors surfaced by the retrieval engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Vector index error
    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),

    /// Lexical index error
    #[error("Lexical index error: {0}")]
    Lexical(#[from] LexicalError),

    /// Graph retriever error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A tuning parameter is out of its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Embedding provider misconfigured; message says what to fix
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Embedding generation failed; retryable by the caller
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Snapshot checksum mismatch or malformed snapshot file
    #[error("Snapshot corrupt: {0}")]
    SnapshotCorrupt(String),

    /// IO error during snapshot persistence
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error during snapshot persistence
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<EmbeddingError> for EngineError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::NotConfigured(msg) => EngineError::ProviderUnavailable(msg),
            other => EngineError::EmbeddingFailed(other.to_string()),
        }
    }
}
