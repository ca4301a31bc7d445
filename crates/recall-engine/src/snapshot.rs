//! Checksummed snapshot persistence.
//!
//! The snapshot stores the proximity graph verbatim (rebuilding it is
//! the expensive part) plus every chunk; the lexical index and chunk
//! graph are cheap to rebuild from the chunks on load. The file is a
//! SHA-256 checksum line followed by the JSON body; a mismatch on load
//! fails with `SnapshotCorrupt` so the caller rebuilds from source
//! documents instead of serving corrupted state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use recall_graph::GraphRetriever;
use recall_lexical::Bm25Index;
use recall_types::Chunk;
use recall_vector::{HnswIndex, VectorSnapshot};

use crate::engine::{IndexSet, RetrievalEngine};
use crate::error::EngineError;

const SNAPSHOT_VERSION: u32 = 1;

/// Serialized engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    pub vector: VectorSnapshot,
    pub chunks: Vec<Chunk>,
}

fn checksum(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

impl RetrievalEngine {
    /// Write the engine state to `path`.
    ///
    /// The body is serialized deterministically (nodes and chunks in ID
    /// order), so saving the same state twice produces identical files.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let snapshot = {
            let indexes = self.indexes().read().unwrap();
            let mut chunks: Vec<Chunk> = indexes.graph.chunks().cloned().collect();
            chunks.sort_by(|a, b| a.id.cmp(&b.id));
            EngineSnapshot {
                version: SNAPSHOT_VERSION,
                vector: indexes.vector.to_snapshot(),
                chunks,
            }
        };

        let body = serde_json::to_string(&snapshot)?;
        let content = format!("{}\n{}", checksum(&body), body);
        fs::write(path.as_ref(), content)?;

        info!(
            path = %path.as_ref().display(),
            chunks = snapshot.chunks.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Replace the engine state with the snapshot at `path`.
    ///
    /// The checksum is verified before anything is parsed; the vector
    /// graph is structurally validated and the lexical index and chunk
    /// graph are rebuilt from the stored chunks. On any error the live
    /// state is left untouched.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let content = fs::read_to_string(path.as_ref())?;
        let Some((stored, body)) = content.split_once('\n') else {
            return Err(EngineError::SnapshotCorrupt(
                "missing checksum line".to_string(),
            ));
        };
        if stored != checksum(body) {
            return Err(EngineError::SnapshotCorrupt(
                "checksum mismatch".to_string(),
            ));
        }

        let snapshot: EngineSnapshot = serde_json::from_str(body)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EngineError::SnapshotCorrupt(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let config = self.config();
        let mut hnsw_config = config.hnsw.clone();
        hnsw_config.dimension = self.dimension();
        let vector = HnswIndex::from_snapshot(snapshot.vector, hnsw_config)?;

        let mut lexical = Bm25Index::new()
            .with_tokenizer(config.tokenizer.clone())
            .with_params(config.bm25)?;
        let mut graph = GraphRetriever::new();
        let mut docs: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in snapshot.chunks {
            lexical.index(chunk.id.clone(), &chunk.text);
            docs.entry(chunk.source_doc_id.clone())
                .or_default()
                .push(chunk.id.clone());
            graph.add_chunk(chunk);
        }
        graph.build_sequential_edges();
        graph.build_semantic_edges(&vector, config.semantic_threshold, config.semantic_k)?;

        let chunk_count = vector.len();
        *self.indexes().write().unwrap() = IndexSet {
            vector,
            lexical,
            graph,
            docs,
        };

        info!(
            path = %path.as_ref().display(),
            chunks = chunk_count,
            "Loaded snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use recall_embeddings::HashEmbedder;
    use recall_types::Document;
    use recall_vector::HnswConfig;

    use crate::engine::{EngineConfig, SearchOptions};

    fn engine() -> RetrievalEngine {
        let provider = Arc::new(HashEmbedder::new(64));
        let config = EngineConfig::default().with_hnsw(HnswConfig::new(64).with_seed(13));
        RetrievalEngine::new(provider, config).unwrap()
    }

    async fn populated_engine() -> RetrievalEngine {
        let engine = engine();
        let docs = vec![
            Document::new("d1", "Cats", "the cat sat on the mat"),
            Document::new("d2", "Dogs", "dogs are great pets"),
            Document::new("d3", "Both", "cats and dogs are both pets"),
        ];
        for doc in &docs {
            engine.add_document(doc).await.unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.snapshot");

        let original = populated_engine().await;
        original.save_snapshot(&path).unwrap();

        let restored = engine();
        restored.load_snapshot(&path).unwrap();

        assert_eq!(restored.document_count(), original.document_count());
        assert_eq!(restored.chunk_count(), original.chunk_count());

        let options = SearchOptions::default();
        let before = original.search("cat pets", &options).await.unwrap();
        let after = restored.search("cat pets", &options).await.unwrap();
        let before_ids: Vec<&str> = before.iter().map(|h| h.id.as_str()).collect();
        let after_ids: Vec<&str> = after.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(before_ids, after_ids);
    }

    #[tokio::test]
    async fn test_save_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.snapshot");
        let b = dir.path().join("b.snapshot");

        let engine = populated_engine().await;
        engine.save_snapshot(&a).unwrap();
        engine.save_snapshot(&b).unwrap();

        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[tokio::test]
    async fn test_corrupted_body_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.snapshot");

        let original = populated_engine().await;
        original.save_snapshot(&path).unwrap();

        let mut content = fs::read_to_string(&path).unwrap();
        // Flip a byte in the body, leaving the checksum line alone
        let split = content.find('\n').unwrap() + 1;
        content.replace_range(split..split + 1, "X");
        fs::write(&path, content).unwrap();

        let restored = engine();
        let err = restored.load_snapshot(&path).unwrap_err();
        assert!(matches!(err, EngineError::SnapshotCorrupt(_)));
        // Failed load leaves the engine untouched
        assert_eq!(restored.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_checksum_line_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.snapshot");
        fs::write(&path, "not a snapshot at all").unwrap();

        let err = engine().load_snapshot(&path).unwrap_err();
        assert!(matches!(err, EngineError::SnapshotCorrupt(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.snapshot");

        let original = populated_engine().await;
        original.save_snapshot(&path).unwrap();

        let provider = Arc::new(HashEmbedder::new(32));
        let config = EngineConfig::default().with_hnsw(HnswConfig::new(32).with_seed(13));
        let other = RetrievalEngine::new(provider, config).unwrap();

        let err = other.load_snapshot(&path).unwrap_err();
        assert!(matches!(err, EngineError::Vector(_)));
    }
}
