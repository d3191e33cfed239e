use std::io;

use thiserror::Error;

/// Errors surfaced by [`encode`](crate::encode) and [`decode`](crate::decode).
#[derive(Debug, Error)]
pub enum LzError {
    /// The token stream ended in the middle of a token.
    #[error("truncated token stream: {trailing} trailing byte(s) do not form a complete token")]
    TruncatedStream { trailing: usize },

    /// A token refers to history the decoder has not produced yet.
    #[error("invalid back-reference (offset={offset}, length={length}) with only {available} byte(s) of history")]
    InvalidBackReference {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// Encoder bookkeeping went wrong. This is a bug, not bad input.
    #[error("window invariant violated: {0}")]
    WindowInvariantViolation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, LzError>;
