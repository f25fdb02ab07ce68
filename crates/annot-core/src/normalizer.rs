//! Row normalization: one raw row in, one record (or a row error) out.

use annot_ingest::RawRow;
use annot_map::ResolvedMapping;
use annot_model::{
    ContainerId, FieldMapping, FieldType, ItemKind, ItemTypeSchema, Metadata, NormalizedRecord,
};
use annot_transform::{CompiledTransform, coerce};
use serde_json::Value;

use crate::error::{RowError, RowErrorKind};

/// A normalized row and the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub record: NormalizedRecord,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct ContentPlan {
    source: String,
    default: Option<Value>,
}

#[derive(Debug, Clone)]
struct FieldPlan {
    target: String,
    source: String,
    default: Option<Value>,
    transform: Option<CompiledTransform>,
    field_type: Option<FieldType>,
    strict: bool,
}

/// Per-import normalization plan, built once from the resolved mapping.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    container_id: ContainerId,
    item_kind: ItemKind,
    content: Option<ContentPlan>,
    fields: Vec<FieldPlan>,
}

impl RowNormalizer {
    /// Builds the plan and compiles every transform.
    ///
    /// A transform that does not compile is dropped; the returned warnings
    /// say which.
    pub fn new(
        container_id: ContainerId,
        schema: &ItemTypeSchema,
        resolved: &ResolvedMapping,
    ) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        let content = resolved.content.as_ref().map(|mapping| {
            if mapping.transform.is_some() {
                warnings.push(
                    "Transform on 'content' ignored: content is imported verbatim".to_string(),
                );
            }
            ContentPlan {
                source: mapping.source_field.clone(),
                default: mapping.default_value.clone().filter(|v| !v.is_null()),
            }
        });

        let fields = resolved
            .fields
            .iter()
            .map(|(target, mapping)| {
                let transform = compile_transform(target, mapping, &mut warnings);
                let declared = schema.field(target);
                FieldPlan {
                    target: target.clone(),
                    source: mapping.source_field.clone(),
                    default: mapping.default_value.clone().filter(|v| !v.is_null()),
                    transform,
                    field_type: declared.map(|f| f.field_type),
                    strict: declared.is_some_and(|f| f.strict),
                }
            })
            .collect();

        let normalizer = Self {
            container_id,
            item_kind: ItemKind::parse(&schema.name),
            content,
            fields,
        };
        (normalizer, warnings)
    }

    /// Normalizes one row.
    ///
    /// Empty content, failed transforms and failed coercions of non-strict
    /// fields are warnings. A failed coercion of a strict field is a row error.
    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedRow, RowError> {
        let mut warnings = Vec::new();
        let content = self.content(row, &mut warnings);

        let mut metadata = Metadata::new();
        for field in &self.fields {
            let value = match row.text(&field.source) {
                Some(text) => Value::String(text.to_string()),
                None => match &field.default {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };

            let value = match &field.transform {
                Some(transform) => match transform.apply(&value) {
                    Ok(transformed) => transformed,
                    Err(err) => {
                        warnings.push(format!(
                            "Row {}: transform for '{}' failed: {err}; keeping original value",
                            row.index, field.target
                        ));
                        value
                    }
                },
                None => value,
            };
            if value.is_null() {
                continue;
            }

            let value = match field.field_type {
                Some(field_type) => match coerce(value.clone(), field_type) {
                    Ok(coerced) => coerced,
                    Err(source) if field.strict => {
                        return Err(RowError::new(
                            row.index,
                            RowErrorKind::Coercion {
                                field: field.target.clone(),
                                source,
                            },
                        ));
                    }
                    Err(err) => {
                        warnings.push(format!(
                            "Row {}: field '{}': {err}; keeping raw value",
                            row.index, field.target
                        ));
                        value
                    }
                },
                None => value,
            };

            metadata.insert(field.target.clone(), value);
        }

        Ok(NormalizedRow {
            record: NormalizedRecord {
                container_id: self.container_id,
                content,
                item_type: self.item_kind.clone(),
                metadata,
            },
            warnings,
        })
    }

    fn content(&self, row: &RawRow, warnings: &mut Vec<String>) -> String {
        if let Some(plan) = &self.content {
            if let Some(text) = row.text(&plan.source) {
                return text.to_string();
            }
            if !row.has_column(&plan.source)
                && let Some(default) = &plan.default
            {
                return match default {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
        }
        warnings.push(format!("Row {}: Empty content value", row.index));
        String::new()
    }
}

fn compile_transform(
    target: &str,
    mapping: &FieldMapping,
    warnings: &mut Vec<String>,
) -> Option<CompiledTransform> {
    let expression = mapping.transform.as_deref()?.trim();
    if expression.is_empty() {
        return None;
    }
    match CompiledTransform::compile(expression) {
        Ok(transform) => Some(transform),
        Err(err) => {
            tracing::warn!(field = %target, error = %err, "Transform did not compile");
            warnings.push(format!("Transform for field '{target}' ignored: {err}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use annot_ingest::{ReadOptions, parse};
    use annot_map::{AutoMapRules, resolve};
    use annot_model::FieldSchema;
    use serde_json::json;

    use super::*;

    fn plan(
        csv: &str,
        schema: &ItemTypeSchema,
        mappings: &[FieldMapping],
    ) -> (RowNormalizer, Vec<String>, Vec<RawRow>) {
        let data = parse(csv.as_bytes(), &ReadOptions::default()).unwrap();
        let resolved = resolve(data.columns(), mappings, &[], &AutoMapRules::default()).unwrap();
        let (normalizer, warnings) = RowNormalizer::new(ContainerId::new(1), schema, &resolved);
        let rows = data.rows.into_iter().map(Result::unwrap).collect();
        (normalizer, warnings, rows)
    }

    #[test]
    fn test_defaults_and_omitted_fields() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![
            FieldMapping::new("body", "content"),
            FieldMapping::new("lang", "language").with_default("en"),
            FieldMapping::new("note", "note"),
        ];
        let (normalizer, _, rows) = plan("body,lang,note\nhello,,\n", &schema, &mappings);

        let row = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(row.record.content, "hello");
        assert_eq!(row.record.metadata.get("language"), Some(&json!("en")));
        assert!(!row.record.metadata.contains_key("note"));
        assert!(row.warnings.is_empty());
    }

    #[test]
    fn test_empty_content_warns() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![FieldMapping::new("body", "content")];
        let (normalizer, _, rows) = plan("body,x\n,1\n", &schema, &mappings);

        let row = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(row.record.content, "");
        assert_eq!(row.warnings, ["Row 0: Empty content value"]);
    }

    #[test]
    fn test_content_default_ignores_empty_cell() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![FieldMapping::new("body", "content").with_default("n/a")];
        let (normalizer, _, rows) = plan("body,x\n,1\n", &schema, &mappings);

        let row = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(row.record.content, "");
        assert_eq!(row.warnings, ["Row 0: Empty content value"]);
    }

    #[test]
    fn test_transform_failure_keeps_original() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![
            FieldMapping::new("body", "content"),
            FieldMapping::new("score", "score").with_transform("toNumber(value) * 10"),
        ];
        let (normalizer, _, rows) = plan("body,score\na,n/a\nb,2\n", &schema, &mappings);

        let first = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(first.record.metadata["score"], json!("n/a"));
        assert_eq!(first.warnings.len(), 1);
        assert!(first.warnings[0].starts_with("Row 0: transform for 'score' failed"));

        let second = normalizer.normalize(&rows[1]).unwrap();
        assert_eq!(second.record.metadata["score"], json!(20));
    }

    #[test]
    fn test_bad_transform_is_dropped_with_warning() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![FieldMapping::new("a", "a").with_transform("exec(value)")];
        let (normalizer, warnings, rows) = plan("a\nx\n", &schema, &mappings);

        assert_eq!(
            warnings,
            ["Transform for field 'a' ignored: unknown function 'exec'"]
        );
        let row = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(row.record.metadata["a"], json!("x"));
    }

    #[test]
    fn test_coercion_warning_and_strict_error() {
        let schema = ItemTypeSchema::new("survey", "")
            .with_field(FieldSchema::new("age", FieldType::Number))
            .with_field(FieldSchema::new("score", FieldType::Number).strict());
        let mappings = vec![
            FieldMapping::new("text", "content"),
            FieldMapping::new("age", "age"),
            FieldMapping::new("score", "score"),
        ];
        let (normalizer, _, rows) =
            plan("text,age,score\nok,old,5\nbad,30,high\n", &schema, &mappings);

        let first = normalizer.normalize(&rows[0]).unwrap();
        assert_eq!(first.record.metadata["age"], json!("old"));
        assert_eq!(first.record.metadata["score"], json!(5));
        assert_eq!(
            first.warnings,
            ["Row 0: field 'age': cannot convert 'old' to number; keeping raw value"]
        );

        let err = normalizer.normalize(&rows[1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error processing row 1: field 'score': cannot convert 'high' to number"
        );
    }

    #[test]
    fn test_transform_returning_null_omits_field() {
        let schema = ItemTypeSchema::new("generic", "");
        let mappings = vec![
            FieldMapping::new("c", "content"),
            FieldMapping::new("v", "v").with_transform("value == '-' ? null : value"),
        ];
        let (normalizer, _, rows) = plan("c,v\na,-\n", &schema, &mappings);

        let row = normalizer.normalize(&rows[0]).unwrap();
        assert!(!row.record.metadata.contains_key("v"));
    }
}
