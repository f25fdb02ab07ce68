//! Decoding of delimited text into ordered raw rows.
//!
//! Fatal problems (encoding, unterminated quotes, missing header) abort the
//! read. A data row whose field count disagrees with the header is returned
//! as a [`MalformedRow`] so the caller can record it and keep going.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{IngestError, Result};

/// Maximum payload size accepted by default (500 MB).
pub const MAX_INPUT_SIZE: usize = 500 * 1024 * 1024;

/// Options controlling how a payload is decoded.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Cell text that counts as an empty cell. The zero-length cell is always empty.
    pub empty_marker: String,
    /// Upper bound on the payload size in bytes.
    pub max_size: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            empty_marker: String::new(),
            max_size: MAX_INPUT_SIZE,
        }
    }
}

impl ReadOptions {
    pub fn with_empty_marker(mut self, marker: impl Into<String>) -> Self {
        self.empty_marker = marker.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Empty => None,
            Cell::Text(text) => Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Column names in file order, with a lookup index.
///
/// When a header repeats a name, lookups resolve to the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Header {
    pub fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(idx);
        }
        Self { names, positions }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One data row keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Zero-based data row index (the header is not counted).
    pub index: usize,
    /// One-based line on which the record starts.
    pub line: u64,
    header: Arc<Header>,
    cells: Vec<Cell>,
}

impl RawRow {
    /// Cell for `column`, or `None` when the column does not exist.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.header
            .position(column)
            .and_then(|idx| self.cells.get(idx))
    }

    /// Text for `column`, or `None` when the column is absent or the cell is empty.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Cell::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header.contains(column)
    }

    /// Iterates `(column, cell)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.header
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

/// A data row whose field count does not match the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub index: usize,
    pub line: u64,
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: expected {} fields, found {}",
            self.line, self.expected, self.found
        )
    }
}

/// Decoded table: header plus rows in file order.
#[derive(Debug, Clone)]
pub struct TabularData {
    header: Arc<Header>,
    pub rows: Vec<std::result::Result<RawRow, MalformedRow>>,
}

impl TabularData {
    pub fn columns(&self) -> &[String] {
        self.header.names()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses a delimited payload.
///
/// This is a sync function meant to be called via `spawn_blocking` from async contexts.
pub fn parse(bytes: &[u8], options: &ReadOptions) -> Result<TabularData> {
    if bytes.len() > options.max_size {
        return Err(IngestError::TooLarge {
            size: bytes.len(),
            max_size: options.max_size,
        });
    }

    let text = decode(bytes)?;
    check_quotes(&text, options.delimiter)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());

    let header_record = reader.headers()?.clone();
    if header_record.is_empty() {
        return Err(IngestError::NoHeader);
    }
    let names = header_record
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();
    if let Some(position) = names.iter().position(String::is_empty) {
        // A lone empty header cell means the first line was blank.
        if names.len() == 1 {
            return Err(IngestError::NoHeader);
        }
        return Err(IngestError::EmptyColumnName { position });
    }
    let header = Arc::new(Header::new(names));
    if header.positions.len() != header.len() {
        tracing::warn!(
            columns = ?header.names(),
            "Header repeats a column name; lookups use the first occurrence"
        );
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != header.len() {
            tracing::debug!(
                index,
                line,
                expected = header.len(),
                found = record.len(),
                "Malformed row"
            );
            rows.push(Err(MalformedRow {
                index,
                line,
                expected: header.len(),
                found: record.len(),
            }));
            continue;
        }
        let cells = record
            .iter()
            .map(|field| to_cell(field, &options.empty_marker))
            .collect();
        rows.push(Ok(RawRow {
            index,
            line,
            header: Arc::clone(&header),
            cells,
        }));
    }

    tracing::debug!(
        columns = header.len(),
        rows = rows.len(),
        "Parsed tabular payload"
    );

    Ok(TabularData { header, rows })
}

/// Reads and parses a file from disk.
pub fn read_file(path: &Path, options: &ReadOptions) -> Result<TabularData> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&bytes, options)
}

/// Decodes the payload as UTF-8, stripping a UTF-8 byte-order mark.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let mut body = bytes;
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if encoding != UTF_8 {
            return Err(IngestError::UnsupportedEncoding {
                encoding: encoding.name(),
            });
        }
        body = &bytes[bom_len..];
    }
    UTF_8
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(IngestError::InvalidUtf8)
}

/// Rejects payloads in which a quoted field is never closed.
///
/// A quote only opens a quoted field at the start of a field; quotes inside
/// an unquoted field are literal.
fn check_quotes(text: &str, delimiter: u8) -> Result<()> {
    let delimiter = char::from(delimiter);
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut line: u64 = 1;
    let mut opened_on = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                opened_on = line;
                at_field_start = false;
            }
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            '\r' => at_field_start = true,
            c if c == delimiter => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    if in_quotes {
        return Err(IngestError::UnbalancedQuotes { line: opened_on });
    }
    Ok(())
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn to_cell(field: &str, empty_marker: &str) -> Cell {
    if field.is_empty() || (!empty_marker.is_empty() && field == empty_marker) {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}
