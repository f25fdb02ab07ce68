use std::io::Write;
use std::path::Path;

use annot_model::FieldType;
use annot_schemas::{SchemaError, SchemaRegistry};
use tempfile::NamedTempFile;

const SCHEMAS: &str = r#"
[engine]
batch_size = 10

[item_types.survey_response]
description = "Free-text survey answer"

[[item_types.survey_response.fields]]
name = "content"
type = "string"
required = true

[[item_types.survey_response.fields]]
name = "score"
type = "number"
strict = true

[project_types.survey]
description = "Survey coding"
data_item_types = ["survey_response"]
annotation_types = ["code"]
"#;

#[test]
fn loads_item_and_project_types_from_toml() {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{SCHEMAS}").expect("write schemas");

    let registry = SchemaRegistry::load(file.path()).expect("load registry");
    let survey = registry.item_type("survey_response").expect("survey type");
    assert_eq!(survey.required_fields(), vec!["content"]);
    let score = survey.field("score").expect("score field");
    assert_eq!(score.field_type, FieldType::Number);
    assert!(score.strict);

    assert!(registry.project_type_supports("survey", "survey_response"));
    // Built-ins survive alongside file definitions.
    assert!(registry.item_type("chat_message").is_some());
}

#[test]
fn file_definitions_override_builtins_by_name() {
    let raw = r#"
[item_types.chat_message]
description = "Relaxed chat"

[[item_types.chat_message.fields]]
name = "content"
required = true
"#;
    let registry = SchemaRegistry::from_toml_str(raw, Path::new("inline.toml")).expect("parse");
    let chat = registry.item_type("chat_message").expect("chat type");
    assert_eq!(chat.required_fields(), vec!["content"]);
}

#[test]
fn reports_toml_errors_with_path() {
    let err = SchemaRegistry::from_toml_str("[item_types.x\n", Path::new("bad.toml")).unwrap_err();
    assert!(matches!(err, SchemaError::Toml { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn missing_file_is_io_error() {
    let err = SchemaRegistry::load(Path::new("/nonexistent/schemas.toml")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}
