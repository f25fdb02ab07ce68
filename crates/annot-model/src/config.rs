//! Per-import configuration as submitted alongside the CSV payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::ids::{ProjectId, UserId};

/// Kind of import requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    #[default]
    Generic,
    Chat,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Chat => "chat",
        }
    }
}

/// Declared correspondence between a source column and a target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Column name in the uploaded CSV.
    pub source_field: String,
    /// Semantic field on the item (`content` or a metadata key).
    pub target_field: String,
    /// Used when the source column is absent or the cell is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Optional transform expression applied to the resolved value.
    #[serde(
        default,
        alias = "transform_expression",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<String>,
}

impl FieldMapping {
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            default_value: None,
            transform: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_transform(mut self, expression: impl Into<String>) -> Self {
        self.transform = Some(expression.into());
        self
    }

    /// True when a non-null default can stand in for a missing column.
    pub fn has_default(&self) -> bool {
        self.default_value.as_ref().is_some_and(|v| !v.is_null())
    }
}

/// Explicit mapping from CSV columns to the data of one annotation per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMapping {
    #[serde(alias = "type")]
    pub annotation_type: String,
    /// Annotation data field -> source column.
    #[serde(alias = "data", default)]
    pub field_to_column: BTreeMap<String, String>,
}

/// Configuration of one import run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfiguration {
    /// Project that will own the new container.
    pub project_id: ProjectId,
    /// Name of the container created for this import.
    pub container_name: String,
    #[serde(default)]
    pub import_type: ImportKind,
    /// Item type every imported record gets (e.g. `chat_message`).
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub field_mapping: Vec<FieldMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_mapping: Option<AnnotationMapping>,
    /// User the container and derived annotations are attributed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_by: Option<UserId>,
}

fn default_data_type() -> String {
    "generic".to_string()
}

impl ImportConfiguration {
    pub fn new(
        project_id: ProjectId,
        container_name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            container_name: container_name.into(),
            import_type: ImportKind::default(),
            data_type: data_type.into(),
            field_mapping: Vec::new(),
            annotation_mapping: None,
            imported_by: None,
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mapping.push(mapping);
        self
    }

    pub fn with_annotation_mapping(mut self, mapping: AnnotationMapping) -> Self {
        self.annotation_mapping = Some(mapping);
        self
    }

    pub fn with_imported_by(mut self, user: UserId) -> Self {
        self.imported_by = Some(user);
        self
    }

    /// Parses and structurally validates a JSON-encoded configuration.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects mappings with blank source or target names.
    pub fn validate(&self) -> Result<()> {
        for mapping in &self.field_mapping {
            if mapping.source_field.trim().is_empty() {
                return Err(ModelError::EmptyMappingField("source_field"));
            }
            if mapping.target_field.trim().is_empty() {
                return Err(ModelError::EmptyMappingField("target_field"));
            }
        }
        Ok(())
    }
}
