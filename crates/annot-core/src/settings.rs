//! Engine settings, read from the `[engine]` table of the settings file.

use std::path::{Path, PathBuf};

use annot_ingest::ReadOptions;
use annot_map::{AutoMapRules, DuplicatePolicy};
use annot_model::MAX_REPORTED_ISSUES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

/// Tunables of the import engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Records inserted between commits.
    pub batch_size: usize,
    /// Errors and warnings included in the transport report.
    pub max_reported_issues: usize,
    /// Errors and warnings kept in memory per run; counts stay exact beyond it.
    pub issue_retention: usize,
    /// Cell text treated as an empty cell.
    pub empty_marker: String,
    /// Column that triggers implicit thread annotations.
    pub thread_column: String,
    pub content_aliases: Vec<String>,
    pub well_known_columns: Vec<String>,
    pub duplicate_targets: DuplicatePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let rules = AutoMapRules::default();
        Self {
            batch_size: 100,
            max_reported_issues: MAX_REPORTED_ISSUES,
            issue_retention: 1000,
            empty_marker: String::new(),
            thread_column: "thread".to_string(),
            content_aliases: rules.content_aliases,
            well_known_columns: rules.well_known_columns,
            duplicate_targets: rules.duplicate_policy,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    engine: EngineSettings,
}

impl EngineSettings {
    /// Parses the `[engine]` table; other tables are ignored.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(raw).map_err(|source| SettingsError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        file.engine.validate()?;
        Ok(file.engine)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.batch_size == 0 {
            return Err(SettingsError::Invalid {
                key: "batch_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.issue_retention < self.max_reported_issues {
            return Err(SettingsError::Invalid {
                key: "issue_retention",
                message: format!(
                    "must be at least max_reported_issues ({})",
                    self.max_reported_issues
                ),
            });
        }
        if self.thread_column.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "thread_column",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn auto_map_rules(&self) -> AutoMapRules {
        AutoMapRules {
            content_aliases: self.content_aliases.clone(),
            well_known_columns: self.well_known_columns.clone(),
            duplicate_policy: self.duplicate_targets,
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions::default().with_empty_marker(self.empty_marker.clone())
    }
}
