//! Embedding provider trait.
//!
//! The seam between the synchronous retrieval core and whatever
//! actually turns text into vectors.

use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::error::EmbeddingError;

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync). The output
/// dimension is fixed for the lifetime of a provider instance; every
/// index built against it inherits that dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Output dimension of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, preserving input order.
    ///
    /// `is_query` lets asymmetric models (query vs. passage encoders)
    /// pick the right head; symmetric providers ignore it.
    async fn embed_batch(
        &self,
        texts: &[String],
        is_query: bool,
    ) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str, is_query: bool) -> Result<Embedding, EmbeddingError> {
        let batch = self.embed_batch(&[text.to_string()], is_query).await?;
        batch
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidInput("provider returned empty batch".into()))
    }
}
