use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::ContainerId;

/// Number of errors and warnings included in a transport report.
pub const MAX_REPORTED_ISSUES: usize = 20;

/// Lifecycle status of an import run and of the container it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Created,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Failed
        )
    }

    pub fn can_transition_to(&self, next: ImportStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Processing | Self::Failed)
                | (
                    Self::Processing,
                    Self::Completed | Self::CompletedWithErrors | Self::Failed
                )
        )
    }

    /// Returns the next status or an error if the move is not allowed.
    pub fn transition(self, next: ImportStatus) -> Result<ImportStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters stored on the container once a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total_rows: usize,
    pub processed_rows: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Result of a finished import run.
///
/// `errors` and `warnings` hold at most the engine's retention cap; the
/// `*_count` fields are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub container_id: ContainerId,
    pub status: ImportStatus,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ImportOutcome {
    pub fn stats(&self) -> ImportStats {
        ImportStats {
            total_rows: self.total_rows,
            processed_rows: self.processed_rows,
            error_count: self.error_count,
            warning_count: self.warning_count,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Transport shape with issue lists truncated to `limit`.
    pub fn to_report(&self, limit: usize) -> ImportReport {
        ImportReport {
            id: self.container_id.to_string(),
            status: self.status,
            progress: 1.0,
            total_rows: self.total_rows,
            processed_rows: self.processed_rows,
            errors: self.errors.iter().take(limit).cloned().collect(),
            warnings: self.warnings.iter().take(limit).cloned().collect(),
        }
    }
}

/// Serialized import result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub id: String,
    pub status: ImportStatus,
    pub progress: f64,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl From<&ImportOutcome> for ImportReport {
    fn from(outcome: &ImportOutcome) -> Self {
        outcome.to_report(MAX_REPORTED_ISSUES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_final() {
        for terminal in [
            ImportStatus::Completed,
            ImportStatus::CompletedWithErrors,
            ImportStatus::Failed,
        ] {
            assert!(terminal.is_terminal());
            assert!(terminal.transition(ImportStatus::Processing).is_err());
            assert!(terminal.transition(ImportStatus::Failed).is_err());
        }
    }

    #[test]
    fn happy_path_transitions() {
        let status = ImportStatus::Created
            .transition(ImportStatus::Processing)
            .unwrap()
            .transition(ImportStatus::CompletedWithErrors)
            .unwrap();
        assert_eq!(status, ImportStatus::CompletedWithErrors);
        assert!(ImportStatus::Created.transition(ImportStatus::Completed).is_err());
    }

    #[test]
    fn report_truncates_issue_lists() {
        let outcome = ImportOutcome {
            container_id: ContainerId::new(9),
            status: ImportStatus::CompletedWithErrors,
            total_rows: 30,
            processed_rows: 5,
            errors: (0..25).map(|i| format!("e{i}")).collect(),
            warnings: vec!["w".into()],
            error_count: 25,
            warning_count: 1,
        };
        let report = ImportReport::from(&outcome);
        assert_eq!(report.id, "9");
        assert_eq!(report.errors.len(), MAX_REPORTED_ISSUES);
        assert_eq!(report.warnings, vec!["w".to_string()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "completed_with_errors");
        assert_eq!(json["progress"], 1.0);
    }
}
