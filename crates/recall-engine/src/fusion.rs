//! Score fusion across the vector and lexical indexes.
//!
//! The two indexes score on incompatible scales (similarities in
//! [0, 1] versus unbounded BM25), so each result set is min-max
//! normalized to [0, 1] before blending. Fusion runs over the union of
//! both sets: a document absent from one side contributes 0 from that
//! side.

use std::collections::HashMap;

use tracing::debug;

use recall_lexical::Bm25Index;
use recall_vector::HnswIndex;

use crate::error::EngineError;

/// A fused hit with normalized per-component contributions.
#[derive(Debug, Clone)]
pub struct FusedHit {
    pub id: String,
    /// `(1 - alpha) * lexical + alpha * vector`, in [0, 1]
    pub score: f32,
    /// Normalized vector similarity, if the vector side returned this doc
    pub vector_score: Option<f32>,
    /// Normalized lexical score, if any query term matched
    pub lexical_score: Option<f32>,
}

/// Hybrid score fusion.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    /// Per-index fetch multiplier: each side is queried for
    /// `limit * headroom` so the union has candidates to rerank
    pub headroom: usize,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self { headroom: 3 }
    }
}

impl FusionEngine {
    pub fn new(headroom: usize) -> Self {
        Self {
            headroom: headroom.max(1),
        }
    }

    /// Blend vector and lexical rankings.
    ///
    /// `alpha` weights the vector side: 0 reproduces pure lexical
    /// ranking order, 1 pure vector order. Out-of-range alpha fails
    /// with `InvalidParameter`. An empty vector index contributes
    /// nothing and is not an error.
    pub fn search(
        &self,
        vector: &HnswIndex,
        lexical: &Bm25Index,
        query_text: &str,
        query_embedding: &[f32],
        alpha: f32,
        limit: usize,
    ) -> Result<Vec<FusedHit>, EngineError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(EngineError::InvalidParameter(format!(
                "alpha must be in [0, 1], got {}",
                alpha
            )));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let fetch = limit * self.headroom;

        let vector_hits = if vector.is_empty() {
            Vec::new()
        } else {
            vector.search(query_embedding, fetch)?
        };
        let lexical_hits = lexical.search(query_text, fetch);

        let dense = min_max_normalize(vector_hits.iter().map(|h| (h.id.as_str(), h.score)));
        let sparse = min_max_normalize(lexical_hits.iter().map(|h| (h.doc_id.as_str(), h.score)));

        let mut hits: Vec<FusedHit> = dense
            .keys()
            .chain(sparse.keys())
            .map(|id| id.to_string())
            .collect::<std::collections::BTreeSet<String>>()
            .into_iter()
            .map(|id| {
                let vector_score = dense.get(id.as_str()).copied();
                let lexical_score = sparse.get(id.as_str()).copied();
                let score = (1.0 - alpha) * lexical_score.unwrap_or(0.0)
                    + alpha * vector_score.unwrap_or(0.0);
                FusedHit {
                    id,
                    score,
                    vector_score,
                    lexical_score,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);

        debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            fused = hits.len(),
            alpha = alpha,
            "Fusion search complete"
        );
        Ok(hits)
    }
}

/// Min-max normalize `(id, score)` pairs to [0, 1].
///
/// An empty set stays empty; a set where every score is equal maps to
/// 1.0 (those documents matched equally well, not equally badly).
fn min_max_normalize<'a>(scores: impl Iterator<Item = (&'a str, f32)>) -> HashMap<&'a str, f32> {
    let pairs: Vec<(&str, f32)> = scores.collect();
    if pairs.is_empty() {
        return HashMap::new();
    }

    let min = pairs.iter().map(|(_, s)| *s).fold(f32::INFINITY, f32::min);
    let max = pairs
        .iter()
        .map(|(_, s)| *s)
        .fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    pairs
        .into_iter()
        .map(|(id, s)| {
            let norm = if range > 0.0 { (s - min) / range } else { 1.0 };
            (id, norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_vector::HnswConfig;

    fn lexical_corpus() -> Bm25Index {
        let mut index = Bm25Index::new();
        index.index("d1", "the cat sat on the mat");
        index.index("d2", "dogs are great pets");
        index.index("d3", "cats and dogs are both pets");
        index
    }

    fn vector_corpus() -> HnswIndex {
        let mut index = HnswIndex::new(HnswConfig::new(2).with_seed(5));
        index.insert("d1", vec![1.0, 0.0]).unwrap();
        index.insert("d2", vec![0.0, 1.0]).unwrap();
        index.insert("d3", vec![0.7, 0.7]).unwrap();
        index
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let fusion = FusionEngine::default();
        let vector = vector_corpus();
        let lexical = lexical_corpus();

        for alpha in [-0.1, 1.1] {
            let err = fusion
                .search(&vector, &lexical, "cat", &[1.0, 0.0], alpha, 10)
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_alpha_zero_preserves_lexical_order() {
        let fusion = FusionEngine::default();
        let vector = vector_corpus();
        let lexical = lexical_corpus();

        let lexical_only = lexical.search("cat pets", 10);
        let fused = fusion
            .search(&vector, &lexical, "cat pets", &[1.0, 0.0], 0.0, 10)
            .unwrap();

        // Lexical hits must appear in the same relative order
        let lexical_ids: Vec<&str> = lexical_only.iter().map(|h| h.doc_id.as_str()).collect();
        let fused_positions: Vec<usize> = lexical_ids
            .iter()
            .map(|id| fused.iter().position(|h| h.id == *id).unwrap())
            .collect();
        assert!(fused_positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_alpha_one_preserves_vector_order() {
        let fusion = FusionEngine::default();
        let vector = vector_corpus();
        let lexical = lexical_corpus();

        let vector_only = vector.search(&[1.0, 0.1], 10).unwrap();
        let fused = fusion
            .search(&vector, &lexical, "cat pets", &[1.0, 0.1], 1.0, 10)
            .unwrap();

        let vector_ids: Vec<&str> = vector_only.iter().map(|h| h.id.as_str()).collect();
        let fused_positions: Vec<usize> = vector_ids
            .iter()
            .map(|id| fused.iter().position(|h| h.id == *id).unwrap())
            .collect();
        assert!(fused_positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_union_includes_single_side_documents() {
        let fusion = FusionEngine::default();
        let mut vector = HnswIndex::new(HnswConfig::new(2).with_seed(5));
        vector.insert("vec-only", vec![1.0, 0.0]).unwrap();
        let mut lexical = Bm25Index::new();
        lexical.index("lex-only", "cat");

        let fused = fusion
            .search(&vector, &lexical, "cat", &[1.0, 0.0], 0.5, 10)
            .unwrap();

        let ids: Vec<&str> = fused.iter().map(|h| h.id.as_str()).collect();
        assert!(ids.contains(&"vec-only"));
        assert!(ids.contains(&"lex-only"));

        let vec_hit = fused.iter().find(|h| h.id == "vec-only").unwrap();
        assert!(vec_hit.lexical_score.is_none());
        assert!(vec_hit.vector_score.is_some());
    }

    #[test]
    fn test_empty_vector_index_falls_back_to_lexical() {
        let fusion = FusionEngine::default();
        let vector = HnswIndex::new(HnswConfig::new(2));
        let lexical = lexical_corpus();

        let fused = fusion
            .search(&vector, &lexical, "cat pets", &[1.0, 0.0], 0.5, 10)
            .unwrap();
        assert!(!fused.is_empty());
        assert!(fused.iter().all(|h| h.vector_score.is_none()));

        // Deterministic ordering on repeat
        let again = fusion
            .search(&vector, &lexical, "cat pets", &[1.0, 0.0], 0.5, 10)
            .unwrap();
        let a: Vec<&str> = fused.iter().map(|h| h.id.as_str()).collect();
        let b: Vec<&str> = again.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_equal_scores_normalize_to_one() {
        let normalized = min_max_normalize(vec![("a", 2.5), ("b", 2.5)].into_iter());
        assert_eq!(normalized["a"], 1.0);
        assert_eq!(normalized["b"], 1.0);
    }

    #[test]
    fn test_min_max_spreads_scores() {
        let normalized = min_max_normalize(vec![("a", 1.0), ("b", 2.0), ("c", 3.0)].into_iter());
        assert_eq!(normalized["a"], 0.0);
        assert_eq!(normalized["b"], 0.5);
        assert_eq!(normalized["c"], 1.0);
    }

    #[test]
    fn test_limit_truncates() {
        let fusion = FusionEngine::default();
        let vector = vector_corpus();
        let lexical = lexical_corpus();

        let fused = fusion
            .search(&vector, &lexical, "cats dogs pets mat", &[0.7, 0.7], 0.5, 2)
            .unwrap();
        assert_eq!(fused.len(), 2);
    }
}
