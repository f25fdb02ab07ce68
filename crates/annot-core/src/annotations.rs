//! Annotations derived from import rows.
//!
//! Drafts are built while the row is at hand and bound to an item only after
//! that item has been committed.

use annot_ingest::RawRow;
use annot_model::{
    AnnotationMapping, DerivedAnnotation, ItemId, Metadata, THREAD_ANNOTATION_TYPE, UserId,
};
use serde_json::Value;

pub const THREAD_IMPORT_SOURCE: &str = "import";
pub const THREAD_IMPORT_NOTES: &str = "Initial thread annotation from import";

/// Annotation data waiting for its item identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub row_index: usize,
    pub annotation_type: String,
    pub data: Metadata,
}

impl AnnotationDraft {
    pub fn bind(self, item_id: ItemId, created_by: Option<UserId>) -> DerivedAnnotation {
        DerivedAnnotation {
            item_id,
            annotation_type: self.annotation_type,
            data: self.data,
            created_by,
        }
    }
}

/// Decides which annotations each row yields.
#[derive(Debug, Clone, Default)]
pub struct AnnotationDeriver {
    mapping: Option<AnnotationMapping>,
    thread_column: Option<String>,
}

impl AnnotationDeriver {
    /// `thread_column` only applies when present in `columns` and when the
    /// explicit mapping does not already produce thread annotations.
    pub fn new(
        mapping: Option<&AnnotationMapping>,
        columns: &[String],
        thread_column: &str,
    ) -> Self {
        let explicit_thread =
            mapping.is_some_and(|m| m.annotation_type == THREAD_ANNOTATION_TYPE);
        let thread_column = (!explicit_thread && columns.iter().any(|c| c == thread_column))
            .then(|| thread_column.to_string());
        Self {
            mapping: mapping.cloned(),
            thread_column,
        }
    }

    /// Column driving implicit thread annotations, if active.
    pub fn thread_column(&self) -> Option<&str> {
        self.thread_column.as_deref()
    }

    pub fn derive(&self, row: &RawRow) -> Vec<AnnotationDraft> {
        let mut drafts = Vec::new();
        if let Some(mapping) = &self.mapping
            && let Some(draft) = explicit(mapping, row)
        {
            drafts.push(draft);
        }
        if let Some(column) = &self.thread_column {
            drafts.push(thread(column, row));
        }
        drafts
    }
}

/// Emitted only when at least one mapped column has a value.
fn explicit(mapping: &AnnotationMapping, row: &RawRow) -> Option<AnnotationDraft> {
    let data: Metadata = mapping
        .field_to_column
        .iter()
        .filter_map(|(field, column)| {
            row.text(column)
                .map(|text| (field.clone(), Value::String(text.to_string())))
        })
        .collect();
    (!data.is_empty()).then(|| AnnotationDraft {
        row_index: row.index,
        annotation_type: mapping.annotation_type.clone(),
        data,
    })
}

fn thread(column: &str, row: &RawRow) -> AnnotationDraft {
    let thread_id = row.text(column);
    let mut data = Metadata::new();
    data.insert(
        "thread_id".to_string(),
        thread_id.map_or(Value::Null, |t| Value::String(t.to_string())),
    );
    data.insert(
        "confidence".to_string(),
        if thread_id.is_some() {
            Value::from(1.0)
        } else {
            Value::Null
        },
    );
    data.insert("source".to_string(), Value::from(THREAD_IMPORT_SOURCE));
    data.insert("notes".to_string(), Value::from(THREAD_IMPORT_NOTES));
    AnnotationDraft {
        row_index: row.index,
        annotation_type: THREAD_ANNOTATION_TYPE.to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use annot_ingest::{ReadOptions, parse};
    use serde_json::json;

    use super::*;

    fn rows(csv: &str) -> (Vec<String>, Vec<RawRow>) {
        let data = parse(csv.as_bytes(), &ReadOptions::default()).unwrap();
        let columns = data.columns().to_vec();
        (columns, data.rows.into_iter().map(Result::unwrap).collect())
    }

    #[test]
    fn test_thread_convention() {
        let (columns, rows) = rows("text,thread\na,t1\nb,\n");
        let deriver = AnnotationDeriver::new(None, &columns, "thread");
        assert_eq!(deriver.thread_column(), Some("thread"));

        let first = &deriver.derive(&rows[0])[0];
        assert_eq!(first.annotation_type, "thread");
        assert_eq!(first.data["thread_id"], json!("t1"));
        assert_eq!(first.data["confidence"], json!(1.0));
        assert_eq!(first.data["source"], json!("import"));

        let second = &deriver.derive(&rows[1])[0];
        assert_eq!(second.data["thread_id"], Value::Null);
        assert_eq!(second.data["confidence"], Value::Null);
    }

    #[test]
    fn test_no_thread_column_no_annotations() {
        let (columns, rows) = rows("text\na\n");
        let deriver = AnnotationDeriver::new(None, &columns, "thread");
        assert_eq!(deriver.thread_column(), None);
        assert!(deriver.derive(&rows[0]).is_empty());
    }

    #[test]
    fn test_explicit_mapping_needs_a_value() {
        let (columns, rows) = rows("text,label,why\na,pos,\nb,,\n");
        let mapping = AnnotationMapping {
            annotation_type: "sentiment".to_string(),
            field_to_column: BTreeMap::from([
                ("label".to_string(), "label".to_string()),
                ("reason".to_string(), "why".to_string()),
            ]),
        };
        let deriver = AnnotationDeriver::new(Some(&mapping), &columns, "thread");

        let drafts = deriver.derive(&rows[0]);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].data, Metadata::from([("label".to_string(), json!("pos"))]));
        assert!(deriver.derive(&rows[1]).is_empty());
    }

    #[test]
    fn test_explicit_thread_mapping_replaces_convention() {
        let (columns, rows) = rows("text,thread\na,t9\n");
        let mapping = AnnotationMapping {
            annotation_type: "thread".to_string(),
            field_to_column: BTreeMap::from([("thread_id".to_string(), "thread".to_string())]),
        };
        let deriver = AnnotationDeriver::new(Some(&mapping), &columns, "thread");

        assert_eq!(deriver.thread_column(), None);
        let drafts = deriver.derive(&rows[0]);
        assert_eq!(drafts.len(), 1);

        let bound = drafts[0].clone().bind(ItemId::new(5), Some(UserId::new(2)));
        assert_eq!(bound.as_thread().unwrap().thread_id().as_deref(), Some("t9"));
        assert_eq!(bound.created_by, Some(UserId::new(2)));
    }
}
