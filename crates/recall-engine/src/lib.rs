//! # recall-engine
//!
//! The query and ingestion surface of the Recall hybrid retrieval
//! engine.
//!
//! Ties the component indexes together:
//! - [`FusionEngine`]: blends vector and lexical rankings by a tunable
//!   alpha weight over the union of both result sets
//! - [`RetrievalEngine`]: chunking, embedding, index population,
//!   document lifecycle, full resync with atomic swap, and search
//! - Snapshot persistence with a SHA-256 checksum; a mismatch on load
//!   forces a rebuild instead of serving corrupted state
//!
//! Writers must be serialized by the caller (single-writer
//! discipline); reads are safe against a non-mutating engine. The only
//! await point is embedding generation.

pub mod chunker;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod snapshot;

pub use chunker::{split_text, ChunkerConfig};
pub use engine::{EngineConfig, RetrievalEngine, SearchMode, SearchOptions, SyncReport};
pub use error::EngineError;
pub use fusion::{FusedHit, FusionEngine};
pub use snapshot::EngineSnapshot;
