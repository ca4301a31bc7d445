//! Document and chunk types.
//!
//! A document is split into chunks at ingestion time; each chunk carries
//! its embedding and enough provenance (source document, position) to
//! rebuild sequential relationships between neighbors.

use serde::{Deserialize, Serialize};

/// A source document as handed over by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document ID
    pub id: String,
    /// Document title (surfaced in search hits)
    pub title: String,
    /// Full document text
    pub text: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// An embedded fragment of a document - the unit of retrieval.
///
/// The embedding is computed once at ingestion and never mutated;
/// updating a document replaces its chunks wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk ID, unique across the corpus
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Dense embedding (dimension fixed per engine instance)
    pub embedding: Vec<f32>,
    /// ID of the document this chunk was split from
    pub source_doc_id: String,
    /// Position of this chunk within the source document
    pub chunk_index: usize,
    /// Title of the source document
    pub title: String,
}

impl Chunk {
    /// Chunk ID for a given document and position.
    ///
    /// IDs are derived rather than random so that re-ingesting a document
    /// produces the same chunk IDs and index updates stay idempotent.
    pub fn derive_id(source_doc_id: &str, chunk_index: usize) -> String {
        format!("{}::{}", source_doc_id, chunk_index)
    }
}
