//! Run-level and row-level error types.

use annot_ingest::IngestError;
use annot_map::MappingValidationError;
use annot_model::{ContainerId, ModelError};
use annot_transform::CoercionError;
use thiserror::Error;

use crate::store::StoreError;

/// Fatal errors: the run stops and the container, if created, is marked failed.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload cannot be read as delimited text.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] IngestError),

    /// Required fields cannot be satisfied by the declared mapping.
    #[error("mapping validation failed: {0}")]
    MappingValidation(#[from] MappingValidationError),

    /// `data_type` names no known item type.
    #[error("unknown item type '{data_type}' (known: {})", .known.join(", "))]
    UnknownItemType {
        data_type: String,
        known: Vec<String>,
    },

    /// Configuration rejected or an illegal status transition.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Container bookkeeping failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A batch commit failed. Earlier batches stay committed.
    #[error("commit failed for container {container_id} after {committed_rows} committed rows: {source}")]
    Commit {
        container_id: ContainerId,
        committed_rows: usize,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// Errors caused by the request itself rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_)
                | Self::MappingValidation(_)
                | Self::UnknownItemType { .. }
                | Self::Model(ModelError::InvalidConfiguration(_) | ModelError::EmptyMappingField(_))
        )
    }
}

/// Why a single row produced no record.
#[derive(Debug, Error)]
pub enum RowErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field '{field}': {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },

    #[error("failed to store item: {0}")]
    Insert(#[source] StoreError),
}

impl RowErrorKind {
    /// Short label for logs. Carries no cell content.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FieldCount { .. } => "field_count",
            Self::Coercion { .. } => "coercion",
            Self::Insert(_) => "insert",
        }
    }

    /// Target field of a coercion failure.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Coercion { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// A row-scoped failure. The row is skipped and the run continues.
#[derive(Debug, Error)]
#[error("Error processing row {index}: {kind}")]
pub struct RowError {
    /// Zero-based data row index.
    pub index: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(index: usize, kind: RowErrorKind) -> Self {
        Self { index, kind }
    }
}

#[cfg(test)]
mod tests {
    use annot_model::FieldType;

    use super::*;

    #[test]
    fn test_row_error_message() {
        let err = RowError::new(
            4,
            RowErrorKind::Coercion {
                field: "turn_id".to_string(),
                source: CoercionError {
                    expected: FieldType::Number,
                    value: "'abc'".to_string(),
                },
            },
        );
        assert_eq!(
            err.to_string(),
            "Error processing row 4: field 'turn_id': cannot convert 'abc' to number"
        );
    }

    #[test]
    fn test_row_error_label_omits_cell_value() {
        let kind = RowErrorKind::Coercion {
            field: "turn_id".to_string(),
            source: CoercionError {
                expected: FieldType::Number,
                value: "'secret-token'".to_string(),
            },
        };
        assert_eq!(kind.label(), "coercion");
        assert_eq!(kind.field(), Some("turn_id"));
        assert!(!kind.label().contains("secret"));

        let count = RowErrorKind::FieldCount { expected: 3, found: 2 };
        assert_eq!(count.label(), "field_count");
        assert_eq!(count.field(), None);
    }

    #[test]
    fn test_unknown_item_type_lists_known() {
        let err = ImportError::UnknownItemType {
            data_type: "tweet".to_string(),
            known: vec!["chat_message".to_string(), "generic".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown item type 'tweet' (known: chat_message, generic)"
        );
        assert!(err.is_client_error());
    }
}
