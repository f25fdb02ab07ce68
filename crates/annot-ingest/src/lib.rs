//! Tabular reader for annotation imports.
//!
//! Turns a raw CSV payload into a header and an ordered list of rows.
//! Rows carry cells keyed by column name; empty cells are distinguished from
//! whitespace, which is preserved as-is.

pub mod error;
pub mod reader;

pub use error::{IngestError, Result};
pub use reader::{
    Cell, Header, MAX_INPUT_SIZE, MalformedRow, RawRow, ReadOptions, TabularData, parse, read_file,
};
