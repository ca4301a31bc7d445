//! Hierarchical proximity-graph index.
//!
//! Parameters follow the usual quality-over-speed defaults:
//! - M = 16 (neighbor cap per upper layer, 2M at layer 0)
//! - ef_construction = 200 (build-time candidate width)
//! - ef_search = 100 (query-time candidate width)
//!
//! Layer assignment draws from an exponential decay distribution so the
//! expected layer population shrinks geometrically; the entry point is
//! always a node of maximal level.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::VectorError;
use crate::metric::Metric;

/// Hard cap on layer assignment; with M >= 2 the draw virtually never
/// reaches this, but it bounds memory on adversarial rng streams.
const MAX_LEVEL: usize = 16;

/// Proximity graph configuration.
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Embedding dimension (must match every inserted vector)
    pub dimension: usize,
    /// Neighbor cap per layer >= 1 (M parameter)
    pub m: usize,
    /// Neighbor cap at layer 0 (conventionally 2M)
    pub m_max0: usize,
    /// Build-time candidate width (ef_construction)
    pub ef_construction: usize,
    /// Default query-time candidate width (ef_search)
    pub ef_search: usize,
    /// Distance metric, fixed for the life of the index
    pub metric: Metric,
    /// RNG seed for level assignment; None draws from the OS
    pub seed: Option<u64>,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            ef_search: 100,
            metric: Metric::Cosine,
            seed: None,
        }
    }
}

impl HnswConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self.m_max0 = m * 2;
        self
    }

    pub fn with_ef(mut self, ef_construction: usize, ef_search: usize) -> Self {
        self.ef_construction = ef_construction;
        self.ef_search = ef_search;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A search hit: chunk ID plus similarity in [0, 1], higher is better.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
}

/// Index statistics.
#[derive(Debug, Clone)]
pub struct VectorIndexStats {
    pub node_count: usize,
    pub dimension: usize,
    pub max_level: usize,
    pub metric: Metric,
}

/// An edge in a node's per-layer neighbor list. The stored distance is
/// between the two endpoint vectors, used when pruning overfull lists.
#[derive(Debug, Clone)]
pub(crate) struct Neighbor {
    pub(crate) id: String,
    pub(crate) distance: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct HnswNode {
    pub(crate) vector: Vec<f32>,
    pub(crate) level: usize,
    /// One neighbor list per layer 0..=level
    pub(crate) neighbors: Vec<Vec<Neighbor>>,
}

/// Distance-ordered candidate for the search heaps. Ties break on ID so
/// heap behavior is deterministic.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    distance: f32,
    id: String,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Hierarchical proximity-graph vector index.
///
/// Not internally synchronized: writers must be serialized by the
/// caller, and concurrent reads are only safe against a non-mutating
/// index.
#[derive(Debug)]
pub struct HnswIndex {
    config: HnswConfig,
    nodes: HashMap<String, HnswNode>,
    entry_point: Option<String>,
    /// 1/ln(M), the exponential decay factor for level draws
    level_mult: f64,
    rng: StdRng,
}

impl HnswIndex {
    pub fn new(config: HnswConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let level_mult = 1.0 / (config.m.max(2) as f64).ln();
        Self {
            config,
            nodes: HashMap::new(),
            entry_point: None,
            level_mult,
            rng,
        }
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn stats(&self) -> VectorIndexStats {
        VectorIndexStats {
            node_count: self.nodes.len(),
            dimension: self.config.dimension,
            max_level: self.nodes.values().map(|n| n.level).max().unwrap_or(0),
            metric: self.config.metric,
        }
    }

    /// Insert a vector. Re-inserting an existing ID replaces it, so
    /// single-document resyncs stay idempotent.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<(), VectorError> {
        let id = id.into();
        self.check_dimension(vector.len())?;

        if self.nodes.contains_key(&id) {
            self.remove(&id);
        }

        let level = self.random_level();
        trace!(id = %id, level = level, "Assigned insertion level");

        let node = HnswNode {
            vector: vector.clone(),
            level,
            neighbors: vec![Vec::new(); level + 1],
        };

        let Some(entry) = self.entry_point.clone() else {
            // First node becomes the entry point
            self.nodes.insert(id.clone(), node);
            self.entry_point = Some(id);
            return Ok(());
        };

        let entry_level = self.nodes[&entry].level;
        self.nodes.insert(id.clone(), node);

        // Greedy descent through layers above the assigned level,
        // keeping a single best entry per layer.
        let mut cur = entry;
        let mut layer = entry_level;
        while layer > level {
            cur = self.greedy_closest(&vector, cur, layer);
            layer -= 1;
        }

        // From the assigned level down, widen to ef_construction
        // candidates and connect bidirectionally.
        for l in (0..=level.min(entry_level)).rev() {
            let candidates = self.search_layer(&vector, &cur, self.config.ef_construction, l);
            let cap = self.layer_cap(l);

            let selected: Vec<Candidate> = candidates
                .iter()
                .filter(|c| c.id != id)
                .take(cap)
                .cloned()
                .collect();

            for cand in &selected {
                self.nodes.get_mut(&id).unwrap().neighbors[l].push(Neighbor {
                    id: cand.id.clone(),
                    distance: cand.distance,
                });
                let peer = self.nodes.get_mut(&cand.id).unwrap();
                peer.neighbors[l].push(Neighbor {
                    id: id.clone(),
                    distance: cand.distance,
                });
                if peer.neighbors[l].len() > cap {
                    // Nearest-first heuristic: keep the cap closest
                    peer.neighbors[l]
                        .sort_by(|a, b| a.distance.total_cmp(&b.distance));
                    peer.neighbors[l].truncate(cap);
                }
            }

            if let Some(best) = selected.first() {
                cur = best.id.clone();
            }
        }

        if level > entry_level {
            self.entry_point = Some(id.clone());
        }

        debug!(id = %id, level = level, nodes = self.nodes.len(), "Inserted vector");
        Ok(())
    }

    /// Search for the `k` nearest neighbors with the configured
    /// `ef_search` width. Empty index returns an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>, VectorError> {
        self.search_ef(query, k, self.config.ef_search)
    }

    /// Search with an explicit candidate width. Larger `ef` trades
    /// latency for recall; values below `k` are raised to `k`.
    pub fn search_ef(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
    ) -> Result<Vec<VectorHit>, VectorError> {
        self.check_dimension(query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let Some(entry) = self.entry_point.clone() else {
            if self.nodes.is_empty() {
                return Ok(Vec::new());
            }
            return Err(VectorError::IndexCorruption(format!(
                "{} nodes present but no entry point",
                self.nodes.len()
            )));
        };

        let ef = ef.max(k);
        let top = self.nodes[&entry].level;

        // Single-path descent to layer 1
        let mut cur = entry;
        for layer in (1..=top).rev() {
            cur = self.greedy_closest(query, cur, layer);
        }

        // Bounded best-first search at layer 0
        let candidates = self.search_layer(query, &cur, ef, 0);

        Ok(candidates
            .into_iter()
            .take(k)
            .map(|c| VectorHit {
                id: c.id,
                score: self.config.metric.similarity(c.distance),
            })
            .collect())
    }

    /// Remove a vector, scrubbing it from every neighbor list. Returns
    /// false if the ID was not present.
    ///
    /// Bidirectional links are pruned asymmetrically during insertion,
    /// so back-references cannot be recovered from the removed node's
    /// own lists; the scrub walks all nodes.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }

        for node in self.nodes.values_mut() {
            for list in node.neighbors.iter_mut() {
                list.retain(|n| n.id != id);
            }
        }

        if self.entry_point.as_deref() == Some(id) {
            // Promote the highest-level survivor; any node reachable
            // through its top layer is a valid entry point.
            self.entry_point = self
                .nodes
                .iter()
                .max_by(|(a_id, a), (b_id, b)| a.level.cmp(&b.level).then(b_id.cmp(a_id)))
                .map(|(node_id, _)| node_id.clone());
        }

        debug!(id = %id, nodes = self.nodes.len(), "Removed vector");
        true
    }

    /// Replace a node's vector, keeping its ID. Returns whether the ID
    /// previously existed.
    pub fn update(&mut self, id: &str, vector: Vec<f32>) -> Result<bool, VectorError> {
        self.check_dimension(vector.len())?;
        let existed = self.remove(id);
        self.insert(id.to_string(), vector)?;
        Ok(existed)
    }

    /// Check structural invariants. A non-empty node set without an
    /// entry point (or with a dangling one) is corruption; callers
    /// should rebuild from source documents.
    pub fn verify(&self) -> Result<(), VectorError> {
        match &self.entry_point {
            None if self.nodes.is_empty() => Ok(()),
            None => Err(VectorError::IndexCorruption(format!(
                "{} nodes present but no entry point",
                self.nodes.len()
            ))),
            Some(entry) if !self.nodes.contains_key(entry) => Err(VectorError::IndexCorruption(
                format!("entry point {} does not exist", entry),
            )),
            Some(_) => {
                for (id, node) in &self.nodes {
                    for list in &node.neighbors {
                        for neighbor in list {
                            if !self.nodes.contains_key(&neighbor.id) {
                                return Err(VectorError::IndexCorruption(format!(
                                    "node {} references missing neighbor {}",
                                    id, neighbor.id
                                )));
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    pub(crate) fn nodes(&self) -> &HashMap<String, HnswNode> {
        &self.nodes
    }

    pub(crate) fn restore(
        config: HnswConfig,
        nodes: HashMap<String, HnswNode>,
        entry_point: Option<String>,
    ) -> Self {
        let mut index = Self::new(config);
        index.nodes = nodes;
        index.entry_point = entry_point;
        index
    }

    fn check_dimension(&self, actual: usize) -> Result<(), VectorError> {
        if actual != self.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.config.dimension,
                actual,
            });
        }
        Ok(())
    }

    fn layer_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m_max0
        } else {
            self.config.m
        }
    }

    /// Draw a top layer from the exponential decay distribution
    /// `floor(-ln(U) / ln(M))`.
    fn random_level(&mut self) -> usize {
        let unif: f64 = self.rng.random::<f64>().max(f64::MIN_POSITIVE);
        ((-unif.ln() * self.level_mult) as usize).min(MAX_LEVEL)
    }

    /// Greedy hill descent within one layer: move to any closer
    /// neighbor until none improves.
    fn greedy_closest(&self, query: &[f32], start: String, layer: usize) -> String {
        let mut cur = start;
        let mut cur_dist = self.config.metric.distance(query, &self.nodes[&cur].vector);

        loop {
            let mut improved = false;
            let neighbors: Vec<String> = self.nodes[&cur]
                .neighbors
                .get(layer)
                .map(|list| list.iter().map(|n| n.id.clone()).collect())
                .unwrap_or_default();

            for neighbor_id in neighbors {
                let d = self
                    .config
                    .metric
                    .distance(query, &self.nodes[&neighbor_id].vector);
                if d < cur_dist {
                    cur = neighbor_id;
                    cur_dist = d;
                    improved = true;
                }
            }

            if !improved {
                return cur;
            }
        }
    }

    /// Best-first search within one layer, keeping a frontier min-heap
    /// and a bounded max-heap of the `ef` best results. Terminates when
    /// the nearest frontier entry cannot improve the worst kept result.
    /// Returns candidates sorted by ascending distance.
    fn search_layer(&self, query: &[f32], entry: &str, ef: usize, layer: usize) -> Vec<Candidate> {
        let entry_dist = self.config.metric.distance(query, &self.nodes[entry].vector);
        let seed = Candidate {
            distance: entry_dist,
            id: entry.to_string(),
        };

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(entry.to_string());

        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        frontier.push(Reverse(seed.clone()));

        // Max-heap: the worst kept result sits on top for cheap eviction
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();
        results.push(seed);

        while let Some(Reverse(cand)) = frontier.pop() {
            let worst = results
                .peek()
                .map(|c| c.distance)
                .unwrap_or(f32::INFINITY);
            if results.len() >= ef && cand.distance > worst {
                break;
            }

            let neighbors: Vec<String> = self.nodes[&cand.id]
                .neighbors
                .get(layer)
                .map(|list| list.iter().map(|n| n.id.clone()).collect())
                .unwrap_or_default();

            for neighbor_id in neighbors {
                if !visited.insert(neighbor_id.clone()) {
                    continue;
                }
                let d = self
                    .config
                    .metric
                    .distance(query, &self.nodes[&neighbor_id].vector);
                let worst = results
                    .peek()
                    .map(|c| c.distance)
                    .unwrap_or(f32::INFINITY);
                if results.len() < ef || d < worst {
                    let cand = Candidate {
                        distance: d,
                        id: neighbor_id,
                    };
                    frontier.push(Reverse(cand.clone()));
                    results.push(cand);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }
}
