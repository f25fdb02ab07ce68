//! Schemas available without any configuration file.

use annot_model::{FieldSchema, FieldType, ItemTypeSchema, ProjectTypeSchema};

pub fn builtin_item_types() -> Vec<ItemTypeSchema> {
    vec![
        ItemTypeSchema::new("chat_message", "One turn of a chat conversation")
            .with_field(
                FieldSchema::new("content", FieldType::String)
                    .required()
                    .with_description("Message text"),
            )
            .with_field(
                FieldSchema::new("user_id", FieldType::String)
                    .required()
                    .with_description("Author of the turn"),
            )
            .with_field(
                FieldSchema::new("turn_id", FieldType::String)
                    .required()
                    .with_description("Identifier of the turn within the conversation"),
            )
            .with_field(
                FieldSchema::new("reply_to_turn", FieldType::String)
                    .with_description("Turn this message replies to"),
            )
            .with_field(FieldSchema::new("timestamp", FieldType::Date)),
        ItemTypeSchema::new("generic", "Generic imported item"),
        ItemTypeSchema::new("imported_data", "Imported record with optional descriptive fields")
            .with_field(FieldSchema::new("title", FieldType::String))
            .with_field(FieldSchema::new("category", FieldType::String))
            .with_field(FieldSchema::new("tags", FieldType::Object))
            .with_field(FieldSchema::new("source", FieldType::String)),
    ]
}

pub fn builtin_project_types() -> Vec<ProjectTypeSchema> {
    vec![
        ProjectTypeSchema {
            name: "chat_disentanglement".to_string(),
            description: "Annotate chat messages to identify conversation threads".to_string(),
            data_item_types: vec!["chat_message".to_string()],
            annotation_types: vec!["thread".to_string()],
            fields: vec![
                FieldSchema::new("platform", FieldType::String)
                    .with_description("Chat platform source (Discord, Slack, etc.)"),
            ],
        },
        ProjectTypeSchema {
            name: "generic".to_string(),
            description: "Generic annotation project".to_string(),
            data_item_types: vec!["generic".to_string(), "imported_data".to_string()],
            annotation_types: vec!["annotation".to_string()],
            fields: Vec::new(),
        },
    ]
}
