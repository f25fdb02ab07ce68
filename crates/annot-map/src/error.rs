//! Error types for mapping resolution.

use thiserror::Error;

use crate::types::ColumnHint;

/// The declared mapping cannot satisfy the item type's required fields.
///
/// Fatal to the whole import: no row is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.missing_fields, .duplicate_targets))]
pub struct MappingValidationError {
    /// Required fields with neither a present source column nor a default.
    pub missing_fields: Vec<String>,
    /// Target fields declared by more than one mapping.
    pub duplicate_targets: Vec<String>,
    /// Closest present column for missing fields, when one is close enough.
    pub hints: Vec<ColumnHint>,
}

impl MappingValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing_fields.is_empty() && self.duplicate_targets.is_empty()
    }
}

fn describe(missing: &[String], duplicates: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing required fields: {}", missing.join(", ")));
    }
    if !duplicates.is_empty() {
        parts.push(format!(
            "Target fields mapped more than once: {}",
            duplicates.join(", ")
        ));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lists_fields() {
        let err = MappingValidationError {
            missing_fields: vec!["content".to_string(), "turn_id".to_string()],
            duplicate_targets: vec!["user_id".to_string()],
            hints: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: content, turn_id; Target fields mapped more than once: user_id"
        );
    }
}
