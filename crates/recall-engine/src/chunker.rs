//! Document chunking.
//!
//! Word-window splitting with overlap. Overlap keeps sentence
//! fragments that straddle a boundary retrievable from both sides.

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum words per chunk
    pub max_words: usize,
    /// Words shared between consecutive chunks (must be < max_words)
    pub overlap_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_words: 200,
            overlap_words: 40,
        }
    }
}

/// Split text into overlapping word windows. Empty or whitespace-only
/// text yields no chunks.
pub fn split_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let max = config.max_words.max(1);
    let step = max.saturating_sub(config.overlap_words).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}
