//! Integration tests for mapping resolution.

use annot_map::{AutoMapRules, DuplicatePolicy, MappingOrigin, resolve};
use annot_model::FieldMapping;

const CHAT_REQUIRED: [&str; 3] = ["content", "user_id", "turn_id"];

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_chat_columns_resolve_with_content_mapping_only() {
    let cols = columns(&["user_id", "turn_id", "turn_text", "reply_to_turn"]);
    let mappings = vec![FieldMapping::new("turn_text", "content")];

    let resolved = resolve(&cols, &mappings, &CHAT_REQUIRED, &AutoMapRules::default()).unwrap();

    assert_eq!(resolved.content_source(), Some("turn_text"));
    let targets: Vec<_> = resolved.fields.keys().map(String::as_str).collect();
    assert_eq!(targets, ["reply_to_turn", "turn_id", "user_id"]);
    assert_eq!(resolved.origin("user_id"), Some(MappingOrigin::WellKnown));
    assert!(resolved.unmapped_columns.is_empty());
}

#[test]
fn test_content_alias_without_any_mapping() {
    let cols = columns(&["user_id", "turn_id", "turn_text"]);
    let resolved = resolve(&cols, &[], &CHAT_REQUIRED, &AutoMapRules::default()).unwrap();

    assert_eq!(resolved.content_source(), Some("turn_text"));
    assert_eq!(resolved.origin("content"), Some(MappingOrigin::ContentAlias));
}

#[test]
fn test_renamed_text_column_is_missing_content() {
    let cols = columns(&["user_id", "turn_id", "text", "reply_to_turn"]);

    let err = resolve(&cols, &[], &CHAT_REQUIRED, &AutoMapRules::default()).unwrap_err();

    assert_eq!(err.missing_fields, ["content"]);
    assert!(err.duplicate_targets.is_empty());
    assert!(err.to_string().contains("content"));
}

#[test]
fn test_missing_declared_column_gets_hint() {
    let cols = columns(&["user_id", "turn_id", "turn_txt"]);
    let mappings = vec![FieldMapping::new("turn_text", "content")];

    let err = resolve(&cols, &mappings, &CHAT_REQUIRED, &AutoMapRules::default()).unwrap_err();

    assert_eq!(err.missing_fields, ["content"]);
    assert_eq!(err.hints.len(), 1);
    assert_eq!(err.hints[0].declared_source.as_deref(), Some("turn_text"));
    assert_eq!(err.hints[0].suggestion, "turn_txt");
}

#[test]
fn test_default_satisfies_required_field() {
    let cols = columns(&["turn_text", "turn_id"]);
    let mappings = vec![FieldMapping::new("author", "user_id").with_default("anonymous")];

    let resolved = resolve(&cols, &mappings, &CHAT_REQUIRED, &AutoMapRules::default()).unwrap();
    assert!(resolved.fields["user_id"].has_default());
}

#[test]
fn test_null_default_does_not_satisfy() {
    let cols = columns(&["turn_text", "turn_id"]);
    let mut mapping = FieldMapping::new("author", "user_id");
    mapping.default_value = Some(serde_json::Value::Null);

    let err = resolve(&cols, &[mapping], &CHAT_REQUIRED, &AutoMapRules::default()).unwrap_err();
    assert_eq!(err.missing_fields, ["user_id"]);
}

#[test]
fn test_duplicate_targets_rejected_by_default() {
    let cols = columns(&["a", "b"]);
    let mappings = vec![
        FieldMapping::new("a", "title"),
        FieldMapping::new("b", "title"),
    ];

    let err = resolve(&cols, &mappings, &[], &AutoMapRules::default()).unwrap_err();
    assert_eq!(err.duplicate_targets, ["title"]);
    assert!(err.missing_fields.is_empty());
}

#[test]
fn test_duplicate_targets_last_wins() {
    let cols = columns(&["a", "b"]);
    let mappings = vec![
        FieldMapping::new("a", "title"),
        FieldMapping::new("b", "title"),
    ];
    let rules = AutoMapRules {
        duplicate_policy: DuplicatePolicy::LastWins,
        ..AutoMapRules::default()
    };

    let resolved = resolve(&cols, &mappings, &[], &rules).unwrap();
    assert_eq!(resolved.fields["title"].source_field, "b");
    assert_eq!(resolved.unmapped_columns, ["a"]);
}

#[test]
fn test_all_missing_fields_listed() {
    let err = resolve(&columns(&["x"]), &[], &CHAT_REQUIRED, &AutoMapRules::default()).unwrap_err();
    assert_eq!(err.missing_fields, ["content", "user_id", "turn_id"]);
}
