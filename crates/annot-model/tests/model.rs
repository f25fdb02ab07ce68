//! Tests for annot-model types.

use annot_model::{
    ContainerId, FieldMapping, ImportConfiguration, ImportOutcome, ImportReport, ImportStatus,
    ItemKind, ProjectId,
};

#[test]
fn configuration_builder_matches_json() {
    let built = ImportConfiguration::new(ProjectId::new(1), "chat", "chat_message")
        .with_mapping(FieldMapping::new("turn_text", "content"))
        .with_mapping(FieldMapping::new("platform", "platform").with_default("slack"));
    let json = serde_json::to_string(&built).expect("serialize config");
    let parsed = ImportConfiguration::from_json(&json).expect("parse config");
    assert_eq!(parsed, built);
    assert_eq!(ItemKind::parse(&parsed.data_type), ItemKind::ChatMessage);
}

#[test]
fn report_serializes_transport_fields() {
    let outcome = ImportOutcome {
        container_id: ContainerId::new(4),
        status: ImportStatus::Completed,
        total_rows: 5,
        processed_rows: 5,
        errors: vec![],
        warnings: vec![],
        error_count: 0,
        warning_count: 0,
    };
    let report = ImportReport::from(&outcome);
    let json = serde_json::to_value(&report).expect("serialize report");
    let keys: Vec<&str> = json
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    for key in [
        "id",
        "status",
        "progress",
        "total_rows",
        "processed_rows",
        "errors",
        "warnings",
    ] {
        assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(json["status"], "completed");
}
