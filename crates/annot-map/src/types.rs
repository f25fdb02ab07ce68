//! Types produced and consumed by the mapping resolver.

use std::collections::BTreeMap;

use annot_model::FieldMapping;
use serde::{Deserialize, Serialize};

/// Target field that holds the item text.
pub const CONTENT_FIELD: &str = "content";

/// How to treat two mappings that declare the same target field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail validation and list the duplicated targets.
    #[default]
    Reject,
    /// Keep the mapping declared last.
    LastWins,
}

/// Column-name conventions applied when the declared mapping leaves gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMapRules {
    /// Columns that may stand in as the `content` source, in priority order.
    pub content_aliases: Vec<String>,
    /// Columns mapped onto a metadata field of the same name when present.
    pub well_known_columns: Vec<String>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for AutoMapRules {
    fn default() -> Self {
        Self {
            content_aliases: vec!["turn_text".to_string()],
            well_known_columns: ["turn_id", "user_id", "reply_to_turn", "timestamp"]
                .into_iter()
                .map(String::from)
                .collect(),
            duplicate_policy: DuplicatePolicy::Reject,
        }
    }
}

/// Why a mapping entry exists in the resolved table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingOrigin {
    Declared,
    /// Content alias picked up by convention.
    ContentAlias,
    /// Declared content mapping whose column was absent, pointed at an alias.
    Redirected,
    WellKnown,
}

impl MappingOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::ContentAlias => "content_alias",
            Self::Redirected => "redirected",
            Self::WellKnown => "well_known",
        }
    }
}

/// Suggestion attached to a missing required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHint {
    pub field: String,
    /// Column the mapping named, if the field was mapped at all.
    pub declared_source: Option<String>,
    /// Closest present column.
    pub suggestion: String,
}

/// Finalized mapping table for one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    /// Content mapping, if any. Transforms on it are ignored.
    pub content: Option<FieldMapping>,
    /// Metadata target field -> mapping, in target order.
    pub fields: BTreeMap<String, FieldMapping>,
    /// Origin of every entry, keyed by target field.
    pub origins: BTreeMap<String, MappingOrigin>,
    /// Source columns no mapping reads.
    pub unmapped_columns: Vec<String>,
}

impl ResolvedMapping {
    /// Column the `content` field is read from.
    pub fn content_source(&self) -> Option<&str> {
        self.content.as_ref().map(|m| m.source_field.as_str())
    }

    pub fn origin(&self, target: &str) -> Option<MappingOrigin> {
        self.origins.get(target).copied()
    }

    /// Entries added by convention rather than declared by the caller.
    pub fn auto_mapped(&self) -> impl Iterator<Item = (&str, MappingOrigin)> {
        self.origins
            .iter()
            .filter(|(_, origin)| **origin != MappingOrigin::Declared)
            .map(|(target, origin)| (target.as_str(), *origin))
    }

    /// Every mapping, content first.
    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.content.iter().chain(self.fields.values())
    }
}
