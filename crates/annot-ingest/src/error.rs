//! Error types for tabular ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: the payload cannot be read as delimited text at all.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload exceeds the configured size limit.
    #[error("input is {size} bytes, exceeding the limit of {max_size} bytes")]
    TooLarge { size: usize, max_size: usize },

    /// Byte-order mark of an encoding other than UTF-8.
    #[error("unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: &'static str },

    /// Bytes are not valid UTF-8.
    #[error("input is not valid UTF-8")]
    InvalidUtf8,

    /// A quoted field is never closed.
    #[error("unbalanced quoting: quoted field opened on line {line} is never closed")]
    UnbalancedQuotes { line: u64 },

    /// No header row present.
    #[error("input has no header row")]
    NoHeader,

    /// Header contains a blank column name.
    #[error("header column {position} has an empty name")]
    EmptyColumnName { position: usize },

    /// Parser failure reported by the CSV reader.
    #[error("failed to parse CSV: {message}")]
    CsvParse { message: String },
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        Self::CsvParse {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
