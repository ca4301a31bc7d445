//! Serializable snapshot of the proximity graph.
//!
//! Nodes are emitted in ID order so the serialized form is stable and
//! can be checksummed by the persistence layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::VectorError;
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::hnsw::{HnswNode, Neighbor};
use crate::metric::Metric;

/// One node of the proximity graph: vector, level, and per-layer
/// adjacency as `(neighbor_id, distance)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub vector: Vec<f32>,
    pub level: usize,
    pub neighbors: Vec<Vec<(String, f32)>>,
}

/// Full index snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSnapshot {
    pub dimension: usize,
    pub metric: Metric,
    pub entry_point: Option<String>,
    pub nodes: Vec<NodeSnapshot>,
}

impl HnswIndex {
    /// Export the index as a serializable snapshot.
    pub fn to_snapshot(&self) -> VectorSnapshot {
        let mut nodes: Vec<NodeSnapshot> = self
            .nodes()
            .iter()
            .map(|(id, node)| NodeSnapshot {
                id: id.clone(),
                vector: node.vector.clone(),
                level: node.level,
                neighbors: node
                    .neighbors
                    .iter()
                    .map(|list| list.iter().map(|n| (n.id.clone(), n.distance)).collect())
                    .collect(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        VectorSnapshot {
            dimension: self.dimension(),
            metric: self.metric(),
            entry_point: self.entry_point().map(|s| s.to_string()),
            nodes,
        }
    }

    /// Rebuild an index from a snapshot.
    ///
    /// The snapshot's dimension and metric must agree with the supplied
    /// config; the graph structure is validated before it is accepted.
    pub fn from_snapshot(
        snapshot: VectorSnapshot,
        config: HnswConfig,
    ) -> Result<Self, VectorError> {
        if snapshot.dimension != config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: config.dimension,
                actual: snapshot.dimension,
            });
        }
        if snapshot.metric != config.metric {
            return Err(VectorError::InvalidParameter(format!(
                "snapshot metric {:?} does not match configured {:?}",
                snapshot.metric, config.metric
            )));
        }

        let mut nodes = HashMap::with_capacity(snapshot.nodes.len());
        for ns in snapshot.nodes {
            if ns.vector.len() != config.dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: config.dimension,
                    actual: ns.vector.len(),
                });
            }
            if ns.neighbors.len() != ns.level + 1 {
                return Err(VectorError::IndexCorruption(format!(
                    "node {} has {} neighbor lists for level {}",
                    ns.id,
                    ns.neighbors.len(),
                    ns.level
                )));
            }
            nodes.insert(
                ns.id,
                HnswNode {
                    vector: ns.vector,
                    level: ns.level,
                    neighbors: ns
                        .neighbors
                        .into_iter()
                        .map(|list| {
                            list.into_iter()
                                .map(|(id, distance)| Neighbor { id, distance })
                                .collect()
                        })
                        .collect(),
                },
            );
        }

        let index = Self::restore(config, nodes, snapshot.entry_point);
        index.verify()?;
        Ok(index)
    }
}
