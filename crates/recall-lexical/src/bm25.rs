//! BM25 inverted index.
//!
//! Postings and corpus statistics (per-document length, average length,
//! document count) stay exactly consistent under insert and remove, so
//! scores never drift after document churn.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::LexicalError;
use crate::tokenizer::{tokenize, TokenizerConfig};

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Length normalization strength, in [0, 1]
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<(), LexicalError> {
        if self.k1 < 0.0 {
            return Err(LexicalError::InvalidParameter(format!(
                "k1 must be non-negative, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(LexicalError::InvalidParameter(format!(
                "b must be in [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// A lexical search hit. Scores are raw BM25 (unbounded, higher is
/// better); the fusion layer normalizes them before blending.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub doc_id: String,
    pub score: f32,
}

/// Inverted index with BM25 scoring.
#[derive(Debug, Default)]
pub struct Bm25Index {
    tokenizer: TokenizerConfig,
    params: Bm25Params,
    /// term -> doc_id -> term frequency
    postings: HashMap<String, HashMap<String, u32>>,
    /// doc_id -> token count
    doc_lens: HashMap<String, usize>,
    /// doc_id -> unique terms, kept so removal never scans the vocabulary
    doc_terms: HashMap<String, Vec<String>>,
    total_len: usize,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_params(mut self, params: Bm25Params) -> Result<Self, LexicalError> {
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    pub fn doc_count(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.doc_lens.contains_key(doc_id)
    }

    pub fn avg_doc_len(&self) -> f32 {
        if self.doc_lens.is_empty() {
            0.0
        } else {
            self.total_len as f32 / self.doc_lens.len() as f32
        }
    }

    /// Index a document. Re-indexing an existing ID replaces it.
    pub fn index(&mut self, doc_id: impl Into<String>, text: &str) {
        let doc_id = doc_id.into();
        if self.contains(&doc_id) {
            self.remove_doc(&doc_id);
        }

        let tokens = tokenize(text, &self.tokenizer);
        let len = tokens.len();

        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }

        let terms: Vec<String> = counts.keys().cloned().collect();
        for (term, tf) in counts {
            self.postings
                .entry(term)
                .or_default()
                .insert(doc_id.clone(), tf);
        }

        self.total_len += len;
        self.doc_lens.insert(doc_id.clone(), len);
        self.doc_terms.insert(doc_id.clone(), terms);

        debug!(doc_id = %doc_id, tokens = len, docs = self.doc_lens.len(), "Indexed document");
    }

    /// Remove a document, decrementing postings and corpus statistics
    /// exactly. Returns false if the ID was not indexed.
    pub fn remove_doc(&mut self, doc_id: &str) -> bool {
        let Some(len) = self.doc_lens.remove(doc_id) else {
            return false;
        };
        self.total_len -= len;

        if let Some(terms) = self.doc_terms.remove(doc_id) {
            for term in terms {
                if let Some(docs) = self.postings.get_mut(&term) {
                    docs.remove(doc_id);
                    if docs.is_empty() {
                        self.postings.remove(&term);
                    }
                }
            }
        }

        debug!(doc_id = %doc_id, docs = self.doc_lens.len(), "Removed document");
        true
    }

    /// Score documents against a query. Only documents sharing at least
    /// one query term appear; an empty query or empty index yields an
    /// empty result. Results sort by descending score, ID as tiebreak.
    pub fn search(&self, query: &str, limit: usize) -> Vec<LexicalHit> {
        let n = self.doc_lens.len();
        if n == 0 || limit == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let terms: Vec<String> = tokenize(query, &self.tokenizer)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let avg_len = self.avg_doc_len();
        let Bm25Params { k1, b } = self.params;
        let mut scores: HashMap<&str, f32> = HashMap::new();

        for term in &terms {
            let Some(docs) = self.postings.get(term) else {
                continue;
            };
            let df = docs.len() as f32;
            let idf = (1.0 + (n as f32 - df + 0.5) / (df + 0.5)).ln();

            for (doc_id, &tf) in docs {
                let tf = tf as f32;
                let doc_len = self.doc_lens[doc_id] as f32;
                let norm = if avg_len > 0.0 { doc_len / avg_len } else { 0.0 };
                let denom = tf + k1 * (1.0 - b + b * norm);
                *scores.entry(doc_id.as_str()).or_insert(0.0) += idf * tf * (k1 + 1.0) / denom;
            }
        }

        let mut hits: Vec<LexicalHit> = scores
            .into_iter()
            .map(|(doc_id, score)| LexicalHit {
                doc_id: doc_id.to_string(),
                score,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(limit);
        hits
    }
}
