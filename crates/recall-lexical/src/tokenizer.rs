//! Tokenization for the lexical index.
//!
//! Lowercases, splits on non-alphanumeric characters, and optionally
//! drops a small built-in English stopword list. Query and document
//! text must go through the same tokenizer or scores skew.

/// Common English stopwords filtered out by default.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he",
    "her", "his", "if", "in", "into", "is", "it", "its", "no", "not", "of", "on", "or", "she",
    "so", "such", "than", "that", "the", "their", "then", "there", "these", "they", "this", "to",
    "was", "we", "were", "will", "with", "you",
];

/// Tokenizer configuration.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Drop stopwords (on by default)
    pub remove_stopwords: bool,
    /// Drop tokens shorter than this many chars
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            remove_stopwords: true,
            min_token_len: 1,
        }
    }
}

impl TokenizerConfig {
    pub fn keep_stopwords() -> Self {
        Self {
            remove_stopwords: false,
            ..Default::default()
        }
    }
}

/// Tokenize text into lowercase alphanumeric terms.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= config.min_token_len)
        .filter(|t| !config.remove_stopwords || !STOPWORDS.contains(&t.as_str()))
        .collect()
}
