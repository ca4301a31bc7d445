//! Deterministic hashing embedder.
//!
//! Buckets token hashes into a fixed-dimension vector and normalizes.
//! No model, no network, fully deterministic: texts sharing tokens get
//! correlated vectors, which is exactly what tests and offline setups
//! need. Not a substitute for a real semantic model.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::Embedding;
use crate::error::EmbeddingError;
use crate::provider::EmbeddingProvider;

/// Reference embedding provider based on token hashing.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut buckets = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h % self.dimension as u64) as usize;
            // Sign bit from a higher hash bit spreads mass around zero,
            // which keeps unrelated texts near-orthogonal.
            let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            buckets[bucket] += sign;
        }
        Embedding::new(buckets)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _is_query: bool,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let embeddings: Vec<Embedding> = texts.iter().map(|t| self.embed_text(t)).collect();
        debug!(count = embeddings.len(), dim = self.dimension, "Embedded batch");
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("the cat sat", false).await.unwrap();
        let b = embedder.embed("the cat sat", false).await.unwrap();
        assert_eq!(a.values, b.values);
    }

    #[tokio::test]
    async fn test_dimension_respected() {
        let embedder = HashEmbedder::new(32);
        let emb = embedder.embed("hello world", false).await.unwrap();
        assert_eq!(emb.dimension(), 32);
    }

    #[tokio::test]
    async fn test_shared_tokens_correlate() {
        let embedder = HashEmbedder::new(128);
        let cat1 = embedder.embed("cats are great pets", false).await.unwrap();
        let cat2 = embedder.embed("cats make great pets", false).await.unwrap();
        let other = embedder
            .embed("quarterly revenue projections", false)
            .await
            .unwrap();

        let near = cat1.cosine_similarity(&cat2);
        let far = cat1.cosine_similarity(&other);
        assert!(near > far);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let batch = embedder.embed_batch(&texts, false).await.unwrap();
        let first = embedder.embed("first text", false).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].values, first.values);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let emb = embedder.embed("", false).await.unwrap();
        assert!(emb.values.iter().all(|v| *v == 0.0));
    }
}
