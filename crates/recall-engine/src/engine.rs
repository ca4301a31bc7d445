//! Retrieval engine facade.
//!
//! Owns the three indexes and the embedding provider. Documents are
//! chunked, embedded in one batch, and only then committed, so a
//! provider failure never leaves a document half-indexed. A full
//! resync builds a fresh index set aside and swaps it in atomically,
//! so concurrent readers never observe a torn index.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use recall_embeddings::EmbeddingProvider;
use recall_graph::{GraphRetriever, WalkConfig};
use recall_lexical::{Bm25Index, Bm25Params, TokenizerConfig};
use recall_types::{Chunk, Document, SearchHit};
use recall_vector::{HnswConfig, HnswIndex};

use crate::chunker::{split_text, ChunkerConfig};
use crate::error::EngineError;
use crate::fusion::FusionEngine;

/// Engine configuration. The embedding dimension always comes from the
/// provider; switching providers invalidates every stored vector and
/// requires a full resync.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chunking parameters
    pub chunker: ChunkerConfig,
    /// Default fusion weight (vector side)
    pub alpha: f32,
    /// Per-index fetch multiplier for fusion
    pub headroom: usize,
    /// Similarity floor for semantic edges
    pub semantic_threshold: f32,
    /// Neighbors considered per node for semantic edges
    pub semantic_k: usize,
    /// Proximity graph parameters (dimension overridden by provider)
    pub hnsw: HnswConfig,
    /// BM25 parameters
    pub bm25: Bm25Params,
    /// Tokenizer shared by indexing and queries
    pub tokenizer: TokenizerConfig,
    /// Random walk defaults for graph-mode search
    pub walk: WalkConfig,
    /// Snippet length in chars
    pub snippet_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            alpha: 0.5,
            headroom: 3,
            semantic_threshold: 0.6,
            semantic_k: 5,
            hnsw: HnswConfig::default(),
            bm25: Bm25Params::default(),
            tokenizer: TokenizerConfig::default(),
            walk: WalkConfig::default(),
            snippet_chars: 160,
        }
    }
}

impl EngineConfig {
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_semantic_edges(mut self, threshold: f32, k: usize) -> Self {
        self.semantic_threshold = threshold;
        self.semantic_k = k;
        self
    }

    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_hnsw(mut self, hnsw: HnswConfig) -> Self {
        self.hnsw = hnsw;
        self
    }

    pub fn with_walk(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }
}

/// How a query is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Fusion of vector and lexical rankings
    #[default]
    Hybrid,
    /// Graph reranking via random walk with restart
    Graph,
}

/// Per-query options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Fusion weight override; None uses the engine default
    pub alpha: Option<f32>,
    pub mode: SearchMode,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            alpha: None,
            mode: SearchMode::Hybrid,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Outcome of a full resync.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub chunks_indexed: usize,
}

/// The index set behind the engine. Replaced wholesale on resync.
pub(crate) struct IndexSet {
    pub(crate) vector: HnswIndex,
    pub(crate) lexical: Bm25Index,
    pub(crate) graph: GraphRetriever,
    /// doc_id -> chunk ids, for O(1) removal
    pub(crate) docs: HashMap<String, Vec<String>>,
}

impl IndexSet {
    fn new(config: &EngineConfig, dimension: usize) -> Result<Self, EngineError> {
        let mut hnsw_config = config.hnsw.clone();
        hnsw_config.dimension = dimension;
        let lexical = Bm25Index::new()
            .with_tokenizer(config.tokenizer.clone())
            .with_params(config.bm25)?;
        Ok(Self {
            vector: HnswIndex::new(hnsw_config),
            lexical,
            graph: GraphRetriever::new(),
            docs: HashMap::new(),
        })
    }

    /// Insert a document's chunks into every index. Any previous chunks
    /// for the same document are removed first. Edges are not rebuilt
    /// here; the caller decides when (per document or once per batch).
    fn commit_document(&mut self, doc_id: &str, chunks: Vec<Chunk>) -> Result<(), EngineError> {
        self.evict_document(doc_id);

        let mut chunk_ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            self.vector.insert(chunk.id.clone(), chunk.embedding.clone())?;
            self.lexical.index(chunk.id.clone(), &chunk.text);
            chunk_ids.push(chunk.id.clone());
            self.graph.add_chunk(chunk);
        }
        self.docs.insert(doc_id.to_string(), chunk_ids);
        Ok(())
    }

    fn evict_document(&mut self, doc_id: &str) -> bool {
        let Some(chunk_ids) = self.docs.remove(doc_id) else {
            return false;
        };
        for chunk_id in &chunk_ids {
            self.vector.remove(chunk_id);
            self.lexical.remove_doc(chunk_id);
        }
        self.graph.remove_document(doc_id);
        true
    }

    fn rebuild_edges(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.graph.build_sequential_edges();
        self.graph
            .build_semantic_edges(&self.vector, config.semantic_threshold, config.semantic_k)?;
        Ok(())
    }
}

/// Hybrid retrieval engine.
///
/// Not a singleton: construct as many independent engines as needed,
/// each with its own provider and indexes. Writers must be serialized
/// by the caller; the internal lock only guards the resync swap.
pub struct RetrievalEngine {
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    fusion: FusionEngine,
    indexes: RwLock<IndexSet>,
}

impl RetrievalEngine {
    /// Construct an engine. Fails if the configured BM25 parameters are
    /// out of range.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let dimension = provider.dimension();
        let indexes = IndexSet::new(&config, dimension)?;
        let fusion = FusionEngine::new(config.headroom);
        info!(dimension = dimension, "Created retrieval engine");
        Ok(Self {
            provider,
            config,
            fusion,
            indexes: RwLock::new(indexes),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn document_count(&self) -> usize {
        self.indexes.read().unwrap().docs.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.indexes.read().unwrap().vector.len()
    }

    /// Ingest one document: chunk, embed, commit, rebuild edges.
    ///
    /// Embedding happens before any index mutation, so a provider
    /// failure leaves the engine exactly as it was. Returns the number
    /// of chunks indexed.
    pub async fn add_document(&self, doc: &Document) -> Result<usize, EngineError> {
        let chunks = self.embed_document(doc).await?;
        let count = chunks.len();

        let mut indexes = self.indexes.write().unwrap();
        indexes.commit_document(&doc.id, chunks)?;
        indexes.rebuild_edges(&self.config)?;

        debug!(doc_id = %doc.id, chunks = count, "Document indexed");
        Ok(count)
    }

    /// Remove a document and all of its chunks from every index.
    /// Returns false if the document was never indexed.
    pub fn remove_document(&self, doc_id: &str) -> bool {
        let mut indexes = self.indexes.write().unwrap();
        let removed = indexes.evict_document(doc_id);
        if removed {
            debug!(doc_id = %doc_id, "Document removed");
        }
        removed
    }

    /// Rebuild every index from scratch and swap the result in
    /// atomically. A document whose embedding fails is logged and
    /// skipped; it never aborts the batch or corrupts other entries.
    ///
    /// Dropping the returned future between documents abandons the
    /// resync without touching the live index set.
    pub async fn sync_all(&self, documents: &[Document]) -> Result<SyncReport, EngineError> {
        let mut fresh = IndexSet::new(&self.config, self.provider.dimension())?;
        let mut report = SyncReport::default();

        for doc in documents {
            match self.embed_document(doc).await {
                Ok(chunks) => {
                    report.chunks_indexed += chunks.len();
                    fresh.commit_document(&doc.id, chunks)?;
                    report.documents_indexed += 1;
                }
                Err(err) => {
                    warn!(doc_id = %doc.id, error = %err, "Skipping document during resync");
                    report.documents_skipped += 1;
                }
            }
        }

        fresh.rebuild_edges(&self.config)?;

        *self.indexes.write().unwrap() = fresh;
        info!(
            indexed = report.documents_indexed,
            skipped = report.documents_skipped,
            chunks = report.chunks_indexed,
            "Resync complete"
        );
        Ok(report)
    }

    /// Execute a search. Empty indexes yield empty results, never
    /// errors; an empty vector index degrades to pure lexical ranking
    /// in hybrid mode.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, EngineError> {
        let alpha = options.alpha.unwrap_or(self.config.alpha);
        let embedding = self.provider.embed(query, true).await?;

        let indexes = self.indexes.read().unwrap();
        match options.mode {
            SearchMode::Hybrid => {
                let fused = self.fusion.search(
                    &indexes.vector,
                    &indexes.lexical,
                    query,
                    &embedding.values,
                    alpha,
                    options.limit,
                )?;
                Ok(fused
                    .into_iter()
                    .filter_map(|hit| {
                        let chunk = indexes.graph.chunk(&hit.id)?;
                        Some(self.hydrate(chunk, hit.score, hit.vector_score, hit.lexical_score))
                    })
                    .collect())
            }
            SearchMode::Graph => {
                let walk = self.config.walk.clone().with_top_k(options.limit);
                let hits = indexes.graph.query(&embedding.values, &walk)?;
                Ok(hits
                    .into_iter()
                    .filter_map(|hit| {
                        let chunk = indexes.graph.chunk(&hit.id)?;
                        Some(self.hydrate(chunk, hit.score, Some(hit.similarity), None))
                    })
                    .collect())
            }
        }
    }

    /// Check structural invariants of the vector index. Corruption
    /// means the caller should run [`sync_all`](Self::sync_all).
    pub fn verify(&self) -> Result<(), EngineError> {
        self.indexes.read().unwrap().vector.verify()?;
        Ok(())
    }

    pub(crate) fn indexes(&self) -> &RwLock<IndexSet> {
        &self.indexes
    }

    async fn embed_document(&self, doc: &Document) -> Result<Vec<Chunk>, EngineError> {
        let texts = split_text(&doc.text, &self.config.chunker);
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.provider.embed_batch(&texts, false).await?;
        if embeddings.len() != texts.len() {
            return Err(EngineError::EmbeddingFailed(format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                texts.len()
            )));
        }

        let expected = self.provider.dimension();
        let chunks = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (text, embedding))| {
                if embedding.dimension() != expected {
                    return Err(EngineError::EmbeddingFailed(format!(
                        "provider returned dimension {} (expected {})",
                        embedding.dimension(),
                        expected
                    )));
                }
                Ok(Chunk {
                    id: Chunk::derive_id(&doc.id, index),
                    text,
                    embedding: embedding.values,
                    source_doc_id: doc.id.clone(),
                    chunk_index: index,
                    title: doc.title.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chunks)
    }

    fn hydrate(
        &self,
        chunk: &Chunk,
        score: f32,
        vector_score: Option<f32>,
        lexical_score: Option<f32>,
    ) -> SearchHit {
        SearchHit {
            id: chunk.id.clone(),
            title: chunk.title.clone(),
            snippet: SearchHit::make_snippet(&chunk.text, self.config.snippet_chars),
            score,
            vector_score,
            lexical_score,
        }
    }
}
