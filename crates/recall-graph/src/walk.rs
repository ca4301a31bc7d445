//! Random walk with restart.
//!
//! Relevance propagates from similarity-weighted seed nodes: each step
//! either restarts at a seed (probability `restart_prob`) or moves to a
//! neighbor sampled proportionally to edge weight. Visitation counts,
//! normalized to frequencies summing to 1, blend with the initial
//! similarity to produce the final score.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use recall_embeddings::cosine_similarity;

use crate::error::GraphError;
use crate::graph::{EdgeKind, GraphRetriever};

/// Which edge kinds the walk may traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    Sequential,
    Semantic,
    Both,
}

impl EdgeFilter {
    fn admits(&self, kind: EdgeKind) -> bool {
        match self {
            EdgeFilter::Sequential => kind == EdgeKind::Sequential,
            EdgeFilter::Semantic => kind == EdgeKind::Semantic,
            EdgeFilter::Both => true,
        }
    }
}

/// Random walk configuration.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Number of results to return
    pub top_k: usize,
    /// Total transitions in the walk
    pub steps: usize,
    /// Probability of jumping back to a seed node at each step
    pub restart_prob: f64,
    /// Edge kinds the walk may follow
    pub edge_filter: EdgeFilter,
    /// RNG seed; None draws from the OS
    pub seed: Option<u64>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            steps: 2000,
            restart_prob: 0.15,
            edge_filter: EdgeFilter::Both,
            seed: None,
        }
    }
}

impl WalkConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_restart_prob(mut self, p: f64) -> Self {
        self.restart_prob = p;
        self
    }

    pub fn with_edge_filter(mut self, filter: EdgeFilter) -> Self {
        self.edge_filter = filter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A graph-reranked hit with its score breakdown.
#[derive(Debug, Clone)]
pub struct GraphHit {
    pub id: String,
    /// Blended final score in [0, 1]
    pub score: f32,
    /// Fraction of walk steps spent on this node (sums to 1 across hits)
    pub walk_frequency: f32,
    /// Initial query similarity in [0, 1]
    pub similarity: f32,
}

impl GraphRetriever {
    /// Rerank chunks by random walk with restart from the query.
    ///
    /// The empty graph returns an empty result. Restart weights come
    /// from the cosine similarity between the query and each node's
    /// embedding (negatives clamp to zero); a query orthogonal to every
    /// node falls back to uniform restarts.
    pub fn query(
        &self,
        query_embedding: &[f32],
        config: &WalkConfig,
    ) -> Result<Vec<GraphHit>, GraphError> {
        if !(0.0..=1.0).contains(&config.restart_prob) {
            return Err(GraphError::InvalidParameter(format!(
                "restart_prob must be in [0, 1], got {}",
                config.restart_prob
            )));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self
            .nodes()
            .values()
            .next()
            .map(|c| c.embedding.len())
            .unwrap_or(0);
        if query_embedding.len() != expected {
            return Err(GraphError::DimensionMismatch {
                expected,
                actual: query_embedding.len(),
            });
        }

        // Sorted node order makes seed sampling deterministic per seed
        let mut ids: Vec<&str> = self.nodes().keys().map(String::as_str).collect();
        ids.sort_unstable();

        let similarities: HashMap<&str, f32> = ids
            .iter()
            .map(|&id| {
                let sim = cosine_similarity(query_embedding, &self.nodes()[id].embedding);
                (id, sim.clamp(0.0, 1.0))
            })
            .collect();

        let total: f32 = similarities.values().sum();
        let restart_weights: Vec<(usize, f64)> = if total > 0.0 {
            ids.iter()
                .enumerate()
                .map(|(i, id)| (i, (similarities[id] / total) as f64))
                .collect()
        } else {
            let uniform = 1.0 / ids.len() as f64;
            (0..ids.len()).map(|i| (i, uniform)).collect()
        };

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut visits: HashMap<&str, u64> = HashMap::new();
        let mut current = ids[sample_weighted(&mut rng, &restart_weights)];

        for _ in 0..config.steps {
            *visits.entry(current).or_insert(0) += 1;

            let restart = rng.random::<f64>() < config.restart_prob;
            if restart {
                current = ids[sample_weighted(&mut rng, &restart_weights)];
                continue;
            }

            let neighbors: Vec<(&str, f64)> = self
                .edges_of(current)
                .iter()
                .filter(|e| config.edge_filter.admits(e.kind))
                .map(|e| (e.target.as_str(), e.weight as f64))
                .collect();

            if neighbors.is_empty() {
                // Dead end: restart instead of stalling in place
                current = ids[sample_weighted(&mut rng, &restart_weights)];
            } else {
                let picks: Vec<(usize, f64)> = neighbors
                    .iter()
                    .enumerate()
                    .map(|(i, (_, w))| (i, *w))
                    .collect();
                current = neighbors[sample_weighted(&mut rng, &picks)].0;
            }
        }

        let steps = config.steps.max(1) as f32;
        let max_freq = visits.values().copied().max().unwrap_or(0) as f32 / steps;

        let mut hits: Vec<GraphHit> = ids
            .iter()
            .filter_map(|&id| {
                let freq = visits.get(id).copied().unwrap_or(0) as f32 / steps;
                let sim = similarities[id];
                if freq == 0.0 && sim == 0.0 {
                    return None;
                }
                let walk_component = if max_freq > 0.0 { freq / max_freq } else { 0.0 };
                Some(GraphHit {
                    id: id.to_string(),
                    score: 0.5 * walk_component + 0.5 * sim,
                    walk_frequency: freq,
                    similarity: sim,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(config.top_k);

        debug!(
            nodes = ids.len(),
            steps = config.steps,
            returned = hits.len(),
            "Random walk complete"
        );
        Ok(hits)
    }
}

/// Sample an index from `(index, weight)` pairs proportionally to
/// weight. Weights need not be normalized.
fn sample_weighted(rng: &mut StdRng, weights: &[(usize, f64)]) -> usize {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    let mut target = rng.random::<f64>() * total;
    for (index, weight) in weights {
        target -= weight;
        if target <= 0.0 {
            return *index;
        }
    }
    // Floating-point underflow on the last bucket
    weights.last().map(|(i, _)| *i).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_types::Chunk;

    fn chunk(doc: &str, idx: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: Chunk::derive_id(doc, idx),
            text: String::new(),
            embedding,
            source_doc_id: doc.to_string(),
            chunk_index: idx,
            title: doc.to_string(),
        }
    }

    fn two_cluster_graph() -> GraphRetriever {
        let mut graph = GraphRetriever::new();
        graph.add_chunk(chunk("a", 0, vec![1.0, 0.0]));
        graph.add_chunk(chunk("a", 1, vec![0.95, 0.05]));
        graph.add_chunk(chunk("b", 0, vec![0.0, 1.0]));
        graph.add_chunk(chunk("b", 1, vec![0.05, 0.95]));
        graph.build_sequential_edges();
        graph
    }

    #[test]
    fn test_empty_graph_returns_empty() {
        let graph = GraphRetriever::new();
        let hits = graph.query(&[1.0, 0.0], &WalkConfig::default()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_visit_frequencies_sum_to_one() {
        let graph = two_cluster_graph();
        let config = WalkConfig::default().with_seed(42).with_top_k(100);
        let hits = graph.query(&[1.0, 0.0], &config).unwrap();

        let total: f32 = hits.iter().map(|h| h.walk_frequency).sum();
        assert!(hits.iter().all(|h| h.walk_frequency >= 0.0));
        assert!((total - 1.0).abs() < 1e-4, "frequencies summed to {}", total);
    }

    #[test]
    fn test_similar_cluster_ranks_first() {
        let graph = two_cluster_graph();
        let config = WalkConfig::default().with_seed(7);
        let hits = graph.query(&[1.0, 0.0], &config).unwrap();

        assert!(!hits.is_empty());
        assert!(hits[0].id.starts_with("a::"), "expected a:: first, got {}", hits[0].id);
    }

    #[test]
    fn test_seeded_walk_is_deterministic() {
        let graph = two_cluster_graph();
        let config = WalkConfig::default().with_seed(99);
        let a = graph.query(&[1.0, 0.2], &config).unwrap();
        let b = graph.query(&[1.0, 0.2], &config).unwrap();

        let ids_a: Vec<&str> = a.iter().map(|h| h.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_invalid_restart_prob_rejected() {
        let graph = two_cluster_graph();
        let config = WalkConfig::default().with_restart_prob(1.5);
        let err = graph.query(&[1.0, 0.0], &config).unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter(_)));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let graph = two_cluster_graph();
        let err = graph
            .query(&[1.0, 0.0, 0.0], &WalkConfig::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_orthogonal_query_uses_uniform_restarts() {
        let mut graph = GraphRetriever::new();
        graph.add_chunk(chunk("a", 0, vec![1.0, 0.0]));
        graph.add_chunk(chunk("a", 1, vec![0.8, 0.0]));
        graph.build_sequential_edges();

        // Query orthogonal to every embedding: similarity is 0 for all,
        // walk still visits nodes via uniform restarts
        let config = WalkConfig::default().with_seed(1);
        let hits = graph.query(&[0.0, 1.0], &config).unwrap();
        assert!(!hits.is_empty());
        let total: f32 = hits.iter().map(|h| h.walk_frequency).sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_edge_filter_restricts_traversal() {
        let mut graph = GraphRetriever::new();
        graph.add_chunk(chunk("a", 0, vec![1.0, 0.0]));
        graph.add_chunk(chunk("a", 1, vec![0.9, 0.1]));
        graph.build_sequential_edges();

        // Semantic-only walk over a graph with only sequential edges:
        // every step dead-ends and restarts, which still terminates
        let config = WalkConfig::default()
            .with_edge_filter(EdgeFilter::Semantic)
            .with_seed(3)
            .with_steps(200);
        let hits = graph.query(&[1.0, 0.0], &config).unwrap();
        assert!(!hits.is_empty());
    }
}
