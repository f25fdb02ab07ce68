//! Resolution of declared field mappings against the columns of one file.

use std::collections::{BTreeMap, BTreeSet};

use annot_model::FieldMapping;

use crate::error::MappingValidationError;
use crate::types::{
    AutoMapRules, CONTENT_FIELD, ColumnHint, DuplicatePolicy, MappingOrigin, ResolvedMapping,
};
use crate::utils::closest_column;

/// Resolves `mappings` against `columns` and checks `required` fields.
///
/// Convention-based entries are added before the required check, so a
/// required field may be satisfied by a well-known column or content alias.
/// Declared mappings always take precedence over conventions.
pub fn resolve(
    columns: &[String],
    mappings: &[FieldMapping],
    required: &[&str],
    rules: &AutoMapRules,
) -> Result<ResolvedMapping, MappingValidationError> {
    let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();

    let mut table: BTreeMap<String, FieldMapping> = BTreeMap::new();
    let mut origins: BTreeMap<String, MappingOrigin> = BTreeMap::new();
    let mut duplicates: BTreeSet<String> = BTreeSet::new();

    for mapping in mappings {
        let target = mapping.target_field.trim().to_string();
        if let Some(previous) = table.get(&target) {
            match rules.duplicate_policy {
                DuplicatePolicy::Reject => {
                    duplicates.insert(target);
                    continue;
                }
                DuplicatePolicy::LastWins => {
                    tracing::warn!(
                        target_field = %target,
                        replaced = %previous.source_field,
                        source_field = %mapping.source_field,
                        "Duplicate target mapping, keeping the last one"
                    );
                }
            }
        }
        origins.insert(target.clone(), MappingOrigin::Declared);
        table.insert(target, mapping.clone());
    }

    // Columns read by a declared mapping.
    let mut claimed: BTreeSet<String> = table
        .values()
        .filter(|m| present.contains(m.source_field.as_str()))
        .map(|m| m.source_field.clone())
        .collect();

    apply_content_alias(&present, &mut claimed, &mut table, &mut origins, rules);
    apply_well_known(&present, &mut claimed, &mut table, &mut origins, rules);

    let mut missing = Vec::new();
    let mut hints = Vec::new();
    for field in required {
        let satisfied = table
            .get(*field)
            .is_some_and(|m| present.contains(m.source_field.as_str()) || m.has_default());
        if satisfied {
            continue;
        }
        missing.push((*field).to_string());

        let declared_source = table.get(*field).map(|m| m.source_field.clone());
        let lookup = declared_source.as_deref().unwrap_or(*field);
        let unclaimed = columns
            .iter()
            .map(String::as_str)
            .filter(|c| !claimed.contains(*c));
        if let Some(suggestion) = closest_column(lookup, unclaimed) {
            hints.push(ColumnHint {
                field: (*field).to_string(),
                declared_source,
                suggestion: suggestion.to_string(),
            });
        }
    }

    if !missing.is_empty() || !duplicates.is_empty() {
        let err = MappingValidationError {
            missing_fields: missing,
            duplicate_targets: duplicates.into_iter().collect(),
            hints,
        };
        tracing::warn!(
            missing = ?err.missing_fields,
            duplicates = ?err.duplicate_targets,
            "Mapping validation failed"
        );
        return Err(err);
    }

    let content = table.remove(CONTENT_FIELD);
    let unmapped_columns = columns
        .iter()
        .filter(|c| !claimed.contains(c.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    let resolved = ResolvedMapping {
        content,
        fields: table,
        origins,
        unmapped_columns,
    };
    tracing::debug!(
        content_source = resolved.content_source(),
        fields = resolved.fields.len(),
        auto_mapped = resolved.auto_mapped().count(),
        "Resolved field mapping"
    );
    Ok(resolved)
}

/// Picks the first unclaimed content alias when `content` has no usable column.
fn apply_content_alias(
    present: &BTreeSet<&str>,
    claimed: &mut BTreeSet<String>,
    table: &mut BTreeMap<String, FieldMapping>,
    origins: &mut BTreeMap<String, MappingOrigin>,
    rules: &AutoMapRules,
) {
    let Some(alias) = rules
        .content_aliases
        .iter()
        .find(|alias| present.contains(alias.as_str()) && !claimed.contains(*alias))
    else {
        return;
    };

    match table.get_mut(CONTENT_FIELD) {
        None => {
            table.insert(
                CONTENT_FIELD.to_string(),
                FieldMapping::new(alias.clone(), CONTENT_FIELD),
            );
            origins.insert(CONTENT_FIELD.to_string(), MappingOrigin::ContentAlias);
        }
        // A declared column that is absent only yields to the alias when a
        // default keeps the mapping valid on its own.
        Some(mapping)
            if !present.contains(mapping.source_field.as_str()) && mapping.has_default() =>
        {
            tracing::info!(
                declared = %mapping.source_field,
                alias = %alias,
                "Content column not found, reading content from alias"
            );
            mapping.source_field = alias.clone();
            origins.insert(CONTENT_FIELD.to_string(), MappingOrigin::Redirected);
        }
        Some(_) => return,
    }
    claimed.insert(alias.clone());
}

fn apply_well_known(
    present: &BTreeSet<&str>,
    claimed: &mut BTreeSet<String>,
    table: &mut BTreeMap<String, FieldMapping>,
    origins: &mut BTreeMap<String, MappingOrigin>,
    rules: &AutoMapRules,
) {
    for column in &rules.well_known_columns {
        if !present.contains(column.as_str())
            || claimed.contains(column)
            || table.contains_key(column)
        {
            continue;
        }
        table.insert(
            column.clone(),
            FieldMapping::new(column.clone(), column.clone()),
        );
        origins.insert(column.clone(), MappingOrigin::WellKnown);
        claimed.insert(column.clone());
    }
}
