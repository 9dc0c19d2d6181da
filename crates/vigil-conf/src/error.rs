//! Error types for the configuration parse mechanism.
//!
//! Configuration *content* problems (bad values, duplicate records) are
//! handled by the keyword handlers themselves and never reach this type.

use std::io;
use thiserror::Error;

/// Result type alias for configuration stream processing.
pub type ConfResult<T> = Result<T, ConfError>;

/// Errors that can occur while reading or scanning a configuration stream.
#[derive(Debug, Error)]
pub enum ConfError {
    /// Failed to read the configuration source.
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        /// Path of the file that could not be read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A quoted string ran to the end of its line without a closing quote.
    #[error("Unterminated quoted string at line {line}")]
    UnterminatedQuote {
        /// 1-based source line number.
        line: usize,
    },

    /// A block was still open when the input ended.
    #[error("Unclosed configuration block (opened at line {line})")]
    UnclosedBlock {
        /// 1-based line number of the line that opened the block.
        line: usize,
    },
}

impl ConfError {
    /// Creates an IO error for the given path.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
