//! # recall-types
//!
//! Shared domain types for the Recall hybrid retrieval engine.
//!
//! This crate defines the core data structures passed between indexes:
//! - Documents: source texts as handed over by the note-storage layer
//! - Chunks: embedded document fragments, the unit of retrieval
//! - Search hits: ranked results with per-component score breakdown

pub mod chunk;
pub mod hit;

pub use chunk::{Chunk, Document};
pub use hit::SearchHit;
