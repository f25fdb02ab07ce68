//! Conversion of resolved metadata values to their declared field type.

use annot_model::FieldType;
use serde_json::Value;

use crate::error::CoercionError;
use crate::expr::{display_value, number_value};
use crate::normalization::boolean::parse_bool;
use crate::normalization::datetime::{from_unix_seconds, normalize_datetime};
use crate::normalization::numeric::parse_numeric;

/// Converts `value` to `field_type`.
///
/// `null` passes through for every type. Strings are parsed; values that
/// already have the target JSON type are returned unchanged, except dates,
/// which are normalized to ISO 8601.
pub fn coerce(value: Value, field_type: FieldType) -> Result<Value, CoercionError> {
    if value.is_null() || has_type(&value, field_type) {
        return Ok(value);
    }
    convert(&value, field_type).ok_or_else(|| CoercionError {
        expected: field_type,
        value: render(&value),
    })
}

fn has_type(value: &Value, field_type: FieldType) -> bool {
    matches!(
        (field_type, value),
        (FieldType::String, Value::String(_))
            | (FieldType::Number, Value::Number(_))
            | (FieldType::Boolean, Value::Bool(_))
            | (FieldType::Array, Value::Array(_))
            | (FieldType::Object, Value::Object(_))
    )
}

fn convert(value: &Value, field_type: FieldType) -> Option<Value> {
    match (field_type, value) {
        (FieldType::String, other) => Some(Value::String(display_value(other))),
        (FieldType::Number, Value::String(s)) => parse_numeric(s)
            .filter(|f| f.is_finite())
            .and_then(|f| number_value(f).ok()),
        (FieldType::Boolean, Value::String(s)) => parse_bool(s).map(Value::Bool),
        (FieldType::Boolean, Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            _ => None,
        },
        (FieldType::Date, Value::String(s)) => normalize_datetime(s).map(Value::String),
        (FieldType::Date, Value::Number(n)) => {
            n.as_i64().and_then(from_unix_seconds).map(Value::String)
        }
        (FieldType::Array, Value::String(s)) => Some(parse_array(s)),
        (FieldType::Object, Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(Value::is_object),
        _ => None,
    }
}

/// A JSON array literal, or a comma-separated list of trimmed non-empty items.
fn parse_array(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('[')
        && let Ok(parsed @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed)
    {
        return parsed;
    }
    Value::Array(
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}
