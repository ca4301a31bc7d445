//! Chunk graph construction.
//!
//! Nodes wrap chunks; edges are rebuilt wholesale by the build methods,
//! which keeps edge state consistent after document churn. Edges only
//! ever reference live nodes - removing a node removes every incident
//! edge in the same operation.

use std::collections::HashMap;

use tracing::{debug, info};

use recall_types::Chunk;
use recall_vector::HnswIndex;

use crate::error::GraphError;

/// Edge kind: sequential (document order) or semantic (vector
/// neighborhood).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Sequential,
    Semantic,
}

/// A directed edge; graph construction always inserts both directions.
/// Weight is in (0, 1].
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f32,
}

/// Graph statistics.
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub node_count: usize,
    pub sequential_edges: usize,
    pub semantic_edges: usize,
}

/// Chunk graph with sequential and semantic relationships.
#[derive(Debug, Default)]
pub struct GraphRetriever {
    nodes: HashMap<String, Chunk>,
    adjacency: HashMap<String, Vec<Edge>>,
}

impl GraphRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.nodes.get(id)
    }

    /// Iterate all chunks in the graph, in arbitrary order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.nodes.values()
    }

    pub(crate) fn nodes(&self) -> &HashMap<String, Chunk> {
        &self.nodes
    }

    pub(crate) fn edges_of(&self, id: &str) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.nodes.len(),
            ..Default::default()
        };
        for edges in self.adjacency.values() {
            for edge in edges {
                match edge.kind {
                    EdgeKind::Sequential => stats.sequential_edges += 1,
                    EdgeKind::Semantic => stats.semantic_edges += 1,
                }
            }
        }
        stats
    }

    /// Add a chunk as a graph node. Edges are not derived here; call
    /// the build methods after the batch of additions.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        self.adjacency.entry(chunk.id.clone()).or_default();
        self.nodes.insert(chunk.id.clone(), chunk);
    }

    /// Link chunks with adjacent `chunk_index` within the same source
    /// document. Existing sequential edges are rebuilt from scratch.
    pub fn build_sequential_edges(&mut self) {
        for edges in self.adjacency.values_mut() {
            edges.retain(|e| e.kind != EdgeKind::Sequential);
        }

        let mut by_doc: HashMap<&str, Vec<(usize, &str)>> = HashMap::new();
        for chunk in self.nodes.values() {
            by_doc
                .entry(chunk.source_doc_id.as_str())
                .or_default()
                .push((chunk.chunk_index, chunk.id.as_str()));
        }

        let mut links: Vec<(String, String)> = Vec::new();
        for positions in by_doc.values_mut() {
            positions.sort();
            for pair in positions.windows(2) {
                links.push((pair[0].1.to_string(), pair[1].1.to_string()));
            }
        }

        let count = links.len();
        for (a, b) in links {
            self.push_edge(&a, &b, EdgeKind::Sequential, 1.0);
            self.push_edge(&b, &a, EdgeKind::Sequential, 1.0);
        }

        debug!(links = count, "Built sequential edges");
    }

    /// Create semantic edges between each node and its vector-index
    /// neighbors whose similarity meets `threshold`. Existing semantic
    /// edges are rebuilt from scratch.
    pub fn build_semantic_edges(
        &mut self,
        index: &HnswIndex,
        threshold: f32,
        k: usize,
    ) -> Result<(), GraphError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(GraphError::InvalidParameter(format!(
                "threshold must be in [0, 1], got {}",
                threshold
            )));
        }

        for edges in self.adjacency.values_mut() {
            edges.retain(|e| e.kind != EdgeKind::Semantic);
        }

        // Sorted iteration keeps edge discovery order deterministic
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();

        let mut created = 0usize;
        for id in &ids {
            let embedding = self.nodes[id].embedding.clone();
            // k+1 because the node itself comes back as its own nearest
            let hits = index.search(&embedding, k + 1)?;

            for hit in hits {
                if hit.id == *id || hit.score < threshold || hit.score <= 0.0 {
                    continue;
                }
                if !self.nodes.contains_key(&hit.id) {
                    continue;
                }
                if self.has_semantic_edge(id, &hit.id) {
                    continue;
                }
                self.push_edge(id, &hit.id, EdgeKind::Semantic, hit.score);
                self.push_edge(&hit.id, id, EdgeKind::Semantic, hit.score);
                created += 1;
            }
        }

        info!(
            nodes = ids.len(),
            pairs = created,
            threshold = threshold,
            "Built semantic edges"
        );
        Ok(())
    }

    /// Drop every node tagged with the removed document ID along with
    /// all incident edges, then relink sequential neighbors of the
    /// remaining documents.
    pub fn remove_document(&mut self, source_doc_id: &str) -> usize {
        let removed: Vec<String> = self
            .nodes
            .values()
            .filter(|c| c.source_doc_id == source_doc_id)
            .map(|c| c.id.clone())
            .collect();

        for id in &removed {
            self.nodes.remove(id);
            self.adjacency.remove(id);
        }
        for edges in self.adjacency.values_mut() {
            edges.retain(|e| !removed.contains(&e.target));
        }

        self.build_sequential_edges();

        debug!(doc_id = %source_doc_id, chunks = removed.len(), "Removed document from graph");
        removed.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjacency.clear();
    }

    fn has_semantic_edge(&self, from: &str, to: &str) -> bool {
        self.edges_of(from)
            .iter()
            .any(|e| e.kind == EdgeKind::Semantic && e.target == to)
    }

    fn push_edge(&mut self, from: &str, to: &str, kind: EdgeKind, weight: f32) {
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .push(Edge {
                target: to.to_string(),
                kind,
                weight,
            });
    }
}
