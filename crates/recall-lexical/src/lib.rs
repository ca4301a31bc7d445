//! # recall-lexical
//!
//! Sparse lexical index for Recall using BM25 scoring.
//!
//! An inverted index over tokenized documents: postings map terms to
//! per-document frequencies, and queries score term overlap weighted by
//! inverse document frequency and length normalization. Documents
//! sharing no query term score zero and are excluded from results.

pub mod bm25;
pub mod error;
pub mod tokenizer;

pub use bm25::{Bm25Index, Bm25Params, LexicalHit};
pub use error::LexicalError;
pub use tokenizer::{tokenize, TokenizerConfig};
