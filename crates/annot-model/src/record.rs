//! Normalized records and derived annotations.
//!
//! All item types share one record shape. The `item_type` discriminant
//! selects which typed view applies to the `metadata` payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ids::{AnnotationId, ContainerId, ItemId, UserId};

pub type Metadata = BTreeMap<String, Value>;

/// Discriminant of an imported item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    ChatMessage,
    ImportedData,
    Generic,
    Custom(String),
}

impl ItemKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "chat_message" => Self::ChatMessage,
            "imported_data" => Self::ImportedData,
            "generic" | "" => Self::Generic,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ChatMessage => "chat_message",
            Self::ImportedData => "imported_data",
            Self::Generic => "generic",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One row after normalization, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub container_id: ContainerId,
    pub content: String,
    #[serde(rename = "type")]
    pub item_type: ItemKind,
    #[serde(rename = "meta_data")]
    pub metadata: Metadata,
}

impl NormalizedRecord {
    /// Metadata value rendered as a string; numbers and booleans are stringified.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata.get(key).and_then(value_to_string)
    }

    pub fn as_chat_message(&self) -> Option<ChatMessageView<'_>> {
        matches!(self.item_type, ItemKind::ChatMessage).then_some(ChatMessageView { record: self })
    }

    pub fn as_imported_data(&self) -> Option<ImportedDataView<'_>> {
        matches!(self.item_type, ItemKind::ImportedData | ItemKind::Generic)
            .then_some(ImportedDataView { record: self })
    }
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Accessors for `chat_message` items.
#[derive(Debug, Clone, Copy)]
pub struct ChatMessageView<'a> {
    record: &'a NormalizedRecord,
}

impl<'a> ChatMessageView<'a> {
    pub fn text(&self) -> &'a str {
        &self.record.content
    }

    pub fn turn_id(&self) -> Option<String> {
        self.record.metadata_str("turn_id")
    }

    pub fn user_id(&self) -> String {
        self.record
            .metadata_str("user_id")
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn reply_to_turn(&self) -> Option<String> {
        self.record.metadata_str("reply_to_turn")
    }

    pub fn timestamp(&self) -> Option<String> {
        self.record.metadata_str("timestamp")
    }
}

/// Accessors for generic and `imported_data` items.
#[derive(Debug, Clone, Copy)]
pub struct ImportedDataView<'a> {
    record: &'a NormalizedRecord,
}

impl<'a> ImportedDataView<'a> {
    pub fn title(&self) -> Option<String> {
        self.record.metadata_str("title")
    }

    pub fn category(&self) -> Option<String> {
        self.record.metadata_str("category")
    }

    pub fn tags(&self) -> Option<&'a Value> {
        self.record.metadata.get("tags").filter(|v| !v.is_null())
    }

    pub fn source(&self) -> Option<String> {
        self.record.metadata_str("source")
    }
}

/// Annotation created by the import itself, linked to a persisted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedAnnotation {
    pub item_id: ItemId,
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub data: Metadata,
    pub created_by: Option<UserId>,
}

impl DerivedAnnotation {
    pub fn as_thread(&self) -> Option<ThreadAnnotationView<'_>> {
        (self.annotation_type == THREAD_ANNOTATION_TYPE).then_some(ThreadAnnotationView { annotation: self })
    }
}

pub const THREAD_ANNOTATION_TYPE: &str = "thread";

/// Accessors for `thread` annotations.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAnnotationView<'a> {
    annotation: &'a DerivedAnnotation,
}

impl<'a> ThreadAnnotationView<'a> {
    /// `None` when the source cell was empty.
    pub fn thread_id(&self) -> Option<String> {
        self.annotation.data.get("thread_id").and_then(value_to_string)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.annotation.data.get("confidence").and_then(Value::as_f64)
    }

    pub fn notes(&self) -> Option<&'a str> {
        self.annotation.data.get("notes").and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&'a str> {
        self.annotation.data.get("source").and_then(Value::as_str)
    }
}

/// A record after the store assigned its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub record: NormalizedRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnnotation {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub annotation: DerivedAnnotation,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chat_record() -> NormalizedRecord {
        let mut metadata = Metadata::new();
        metadata.insert("turn_id".into(), json!("t-1"));
        metadata.insert("reply_to_turn".into(), json!(3));
        NormalizedRecord {
            container_id: ContainerId::new(1),
            content: "hello".into(),
            item_type: ItemKind::ChatMessage,
            metadata,
        }
    }

    #[test]
    fn item_kind_round_trips_through_strings() {
        assert_eq!(ItemKind::parse("chat_message"), ItemKind::ChatMessage);
        assert_eq!(ItemKind::parse("survey"), ItemKind::Custom("survey".into()));
        let json = serde_json::to_string(&ItemKind::Custom("survey".into())).unwrap();
        assert_eq!(json, "\"survey\"");
    }

    #[test]
    fn chat_view_reads_metadata() {
        let record = chat_record();
        let view = record.as_chat_message().unwrap();
        assert_eq!(view.text(), "hello");
        assert_eq!(view.turn_id().as_deref(), Some("t-1"));
        assert_eq!(view.reply_to_turn().as_deref(), Some("3"));
        assert_eq!(view.user_id(), "unknown");
        assert!(view.timestamp().is_none());
        assert!(record.as_imported_data().is_none());
    }

    #[test]
    fn thread_view_handles_null_thread() {
        let mut data = Metadata::new();
        data.insert("thread_id".into(), Value::Null);
        data.insert("confidence".into(), Value::Null);
        let annotation = DerivedAnnotation {
            item_id: ItemId::new(1),
            annotation_type: THREAD_ANNOTATION_TYPE.into(),
            data,
            created_by: None,
        };
        let view = annotation.as_thread().unwrap();
        assert!(view.thread_id().is_none());
        assert!(view.confidence().is_none());
    }

    #[test]
    fn record_serializes_with_store_field_names() {
        let value = serde_json::to_value(chat_record()).unwrap();
        assert_eq!(value["type"], "chat_message");
        assert_eq!(value["meta_data"]["turn_id"], "t-1");
    }
}
