//! Search hit type returned by the query surface.

use serde::{Deserialize, Serialize};

/// A ranked search result.
///
/// Scores follow one convention everywhere: similarity in [0, 1],
/// higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Chunk ID
    pub id: String,
    /// Title of the source document
    pub title: String,
    /// Short excerpt of the matched chunk
    pub snippet: String,
    /// Final blended score
    pub score: f32,
    /// Vector-side contribution, if the vector index participated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f32>,
    /// Lexical-side contribution, if any query term matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_score: Option<f32>,
}

impl SearchHit {
    /// Truncate chunk text to a display snippet on a char boundary.
    pub fn make_snippet(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_short_text_unchanged() {
        assert_eq!(SearchHit::make_snippet("short text", 160), "short text");
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        let text = "word ".repeat(100);
        let snippet = SearchHit::make_snippet(&text, 40);
        assert!(snippet.chars().count() <= 41);
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn test_snippet_multibyte_safe() {
        let text = "héllo wörld ünïcode ".repeat(20);
        let snippet = SearchHit::make_snippet(&text, 25);
        assert!(snippet.ends_with('…'));
    }
}
