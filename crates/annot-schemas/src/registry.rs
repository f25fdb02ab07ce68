use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use annot_model::{FieldSchema, ItemTypeSchema, ProjectTypeSchema};
use serde::Deserialize;

use crate::builtin::{builtin_item_types, builtin_project_types};
use crate::error::SchemaError;

/// Table of known item and project types.
///
/// Built once at startup and handed to the import engine; nothing mutates
/// it while imports run.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    item_types: BTreeMap<String, ItemTypeSchema>,
    project_types: BTreeMap<String, ProjectTypeSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    item_types: BTreeMap<String, ItemTypeDef>,
    #[serde(default)]
    project_types: BTreeMap<String, ProjectTypeDef>,
}

#[derive(Debug, Deserialize)]
struct ItemTypeDef {
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct ProjectTypeDef {
    #[serde(default)]
    description: String,
    #[serde(default)]
    data_item_types: Vec<String>,
    #[serde(default)]
    annotation_types: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `chat_message`, `generic` and
    /// `imported_data` item types and their project types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for schema in builtin_item_types() {
            registry.item_types.insert(schema.name.clone(), schema);
        }
        for schema in builtin_project_types() {
            registry.project_types.insert(schema.name.clone(), schema);
        }
        registry
    }

    /// Adds or replaces an item type after validating its field list.
    pub fn with_item_type(mut self, schema: ItemTypeSchema) -> Result<Self, SchemaError> {
        validate_fields(&schema.name, &schema.fields)?;
        self.item_types.insert(schema.name.clone(), schema);
        Ok(self)
    }

    pub fn with_project_type(mut self, schema: ProjectTypeSchema) -> Result<Self, SchemaError> {
        validate_fields(&schema.name, &schema.fields)?;
        self.project_types.insert(schema.name.clone(), schema);
        Ok(self)
    }

    /// Built-ins extended (or overridden by name) with the definitions in `raw`.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, SchemaError> {
        let file: SchemaFile = toml::from_str(raw).map_err(|source| SchemaError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        let mut registry = Self::builtin();
        for (name, def) in file.item_types {
            registry = registry.with_item_type(ItemTypeSchema {
                name,
                description: def.description,
                fields: def.fields,
            })?;
        }
        for (name, def) in file.project_types {
            registry = registry.with_project_type(ProjectTypeSchema {
                name,
                description: def.description,
                data_item_types: def.data_item_types,
                annotation_types: def.annotation_types,
                fields: def.fields,
            })?;
        }
        tracing::debug!(
            path = %origin.display(),
            item_types = registry.item_types.len(),
            project_types = registry.project_types.len(),
            "loaded schema registry"
        );
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        Self::from_toml_str(&raw, path)
    }

    pub fn item_type(&self, name: &str) -> Option<&ItemTypeSchema> {
        self.item_types.get(name)
    }

    pub fn project_type(&self, name: &str) -> Option<&ProjectTypeSchema> {
        self.project_types.get(name)
    }

    pub fn item_types(&self) -> impl Iterator<Item = &ItemTypeSchema> {
        self.item_types.values()
    }

    pub fn project_types(&self) -> impl Iterator<Item = &ProjectTypeSchema> {
        self.project_types.values()
    }

    /// Unknown project types accept any item type.
    pub fn project_type_supports(&self, project_type: &str, data_type: &str) -> bool {
        self.project_type(project_type)
            .is_none_or(|schema| schema.supports_item_type(data_type))
    }
}

fn validate_fields(schema_name: &str, fields: &[FieldSchema]) -> Result<(), SchemaError> {
    if schema_name.trim().is_empty() {
        return Err(SchemaError::invalid(schema_name, "name is empty"));
    }
    let mut seen = BTreeSet::new();
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(SchemaError::invalid(schema_name, "field with empty name"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::invalid(
                schema_name,
                format!("duplicate field '{}'", field.name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use annot_model::{FieldSchema, FieldType};

    use super::*;

    #[test]
    fn builtin_chat_message_requires_three_fields() {
        let registry = SchemaRegistry::builtin();
        let chat = registry.item_type("chat_message").unwrap();
        assert_eq!(chat.required_fields(), vec!["content", "user_id", "turn_id"]);
        assert!(registry.item_type("generic").unwrap().required_fields().is_empty());
    }

    #[test]
    fn project_type_support() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.project_type_supports("chat_disentanglement", "chat_message"));
        assert!(!registry.project_type_supports("chat_disentanglement", "generic"));
        assert!(registry.project_type_supports("unregistered", "generic"));
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let schema = ItemTypeSchema::new("dup", "")
            .with_field(FieldSchema::new("a", FieldType::String))
            .with_field(FieldSchema::new("a", FieldType::Number));
        let err = SchemaRegistry::empty().with_item_type(schema).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }
}
