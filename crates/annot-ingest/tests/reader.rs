//! Tests for the tabular reader.

use std::io::Write;

use annot_ingest::{Cell, IngestError, ReadOptions, parse, read_file};
use proptest::prelude::*;
use tempfile::NamedTempFile;

fn options() -> ReadOptions {
    ReadOptions::default()
}

#[test]
fn test_columns_and_rows_in_order() {
    let input = "turn_id,user_id,turn_text\n1,alice,hello\n2,bob,hi there\n";
    let data = parse(input.as_bytes(), &options()).unwrap();

    assert_eq!(data.columns(), ["turn_id", "user_id", "turn_text"]);
    assert_eq!(data.row_count(), 2);

    let first = data.rows[0].as_ref().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.text("user_id"), Some("alice"));
    let pairs: Vec<_> = first.iter().map(|(k, _)| k).collect();
    assert_eq!(pairs, ["turn_id", "user_id", "turn_text"]);
}

#[test]
fn test_header_only_has_no_rows() {
    let data = parse(b"turn_id,turn_text\n", &options()).unwrap();
    assert_eq!(data.columns(), ["turn_id", "turn_text"]);
    assert!(data.is_empty());
}

#[test]
fn test_empty_payload_is_fatal() {
    let err = parse(b"", &options()).unwrap_err();
    assert!(matches!(err, IngestError::NoHeader));
}

#[test]
fn test_empty_cells_and_whitespace() {
    let data = parse(b"a,b,c\n,  ,x\n", &options()).unwrap();
    let row = data.rows[0].as_ref().unwrap();

    assert_eq!(row.get("a"), Some(&Cell::Empty));
    assert_eq!(row.text("b"), Some("  "));
    assert_eq!(row.text("c"), Some("x"));
    assert_eq!(row.get("missing"), None);
}

#[test]
fn test_custom_empty_marker() {
    let opts = ReadOptions::default().with_empty_marker("NA");
    let data = parse(b"a,b\nNA,value\n", &opts).unwrap();
    let row = data.rows[0].as_ref().unwrap();

    assert!(row.get("a").unwrap().is_empty());
    assert_eq!(row.text("b"), Some("value"));
}

#[test]
fn test_wrong_field_count_is_row_level() {
    let data = parse(b"a,b\n1,2\n3\n4,5,6\n7,8\n", &options()).unwrap();
    assert_eq!(data.row_count(), 4);

    assert!(data.rows[0].is_ok());
    let short = data.rows[1].as_ref().unwrap_err();
    assert_eq!((short.index, short.expected, short.found), (1, 2, 1));
    let long = data.rows[2].as_ref().unwrap_err();
    assert_eq!(long.found, 3);
    assert_eq!(data.rows[3].as_ref().unwrap().index, 3);
}

#[test]
fn test_unbalanced_quotes_are_fatal() {
    let err = parse(b"a,b\n\"never closed,1\n", &options()).unwrap_err();
    assert!(matches!(err, IngestError::UnbalancedQuotes { line: 2 }));
}

#[test]
fn test_utf8_bom_is_stripped() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"turn_id,text\n1,x\n");
    let data = parse(&bytes, &options()).unwrap();
    assert_eq!(data.columns()[0], "turn_id");
}

#[test]
fn test_utf16_is_rejected() {
    let bytes = [0xFF, 0xFE, b'a', 0x00];
    let err = parse(&bytes, &options()).unwrap_err();
    assert!(matches!(
        err,
        IngestError::UnsupportedEncoding {
            encoding: "UTF-16LE"
        }
    ));
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let err = parse(b"a,b\n\xff\xfe\xfd,1\n", &options()).unwrap_err();
    assert!(matches!(err, IngestError::InvalidUtf8));
}

#[test]
fn test_size_limit() {
    let opts = ReadOptions {
        max_size: 4,
        ..ReadOptions::default()
    };
    let err = parse(b"a,b\n1,2\n", &opts).unwrap_err();
    assert!(matches!(err, IngestError::TooLarge { size: 8, max_size: 4 }));
}

#[test]
fn test_read_file_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "x;y").unwrap();
    writeln!(file, "1;2").unwrap();

    let opts = ReadOptions::default().with_delimiter(b';');
    let data = read_file(file.path(), &opts).unwrap();
    assert_eq!(data.columns(), ["x", "y"]);
    assert_eq!(data.rows[0].as_ref().unwrap().text("y"), Some("2"));
}

#[test]
fn test_missing_file() {
    let err = read_file(std::path::Path::new("/nonexistent/input.csv"), &options()).unwrap_err();
    assert!(matches!(err, IngestError::FileRead { .. }));
}

proptest! {
    #[test]
    fn prop_quoted_cells_survive(cells in prop::collection::vec("[a-z ,\"\n]{0,12}", 1..6)) {
        let header = (0..cells.len()).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");
        let row = cells
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(",");
        let input = format!("{header}\n{row}\n");

        let data = parse(input.as_bytes(), &ReadOptions::default()).unwrap();
        prop_assert_eq!(data.row_count(), 1);
        let parsed = data.rows[0].as_ref().unwrap();
        for (i, cell) in cells.iter().enumerate() {
            let got = parsed.text(&format!("c{i}")).unwrap_or("");
            prop_assert_eq!(got, cell.as_str());
        }
    }
}
