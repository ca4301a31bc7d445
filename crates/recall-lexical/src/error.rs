//! Lexical index error types.

use thiserror::Error;

/// Errors that can occur during lexical index operations.
#[derive(Debug, Error)]
pub enum LexicalError {
    /// A tuning parameter is out of its valid range (k1, b)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
