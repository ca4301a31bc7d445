//! # recall-embeddings
//!
//! Embedding provider contract for the Recall retrieval engine.
//!
//! Embedding generation is the only asynchronous step in the engine:
//! everything downstream (vector index, lexical index, graph) is
//! synchronous and CPU-bound. Providers are pluggable behind the
//! [`EmbeddingProvider`] trait; the concrete execution mechanism
//! (HTTP call, subprocess, inline model) is hidden from the indexes.
//!
//! ## Features
//! - Fixed output dimension per provider; switching providers
//!   invalidates all stored vectors and requires a full reindex
//! - Batch-first API so providers can amortize per-call overhead
//! - [`HashEmbedder`]: a deterministic, offline reference provider

pub mod embedding;
pub mod error;
pub mod hash;
pub mod provider;

pub use embedding::{cosine_similarity, Embedding};
pub use error::EmbeddingError;
pub use hash::HashEmbedder;
pub use provider::EmbeddingProvider;
