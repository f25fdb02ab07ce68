//! Allow-listed functions callable from transform expressions.

use serde_json::Value;

use super::Expr;
use super::eval::{display, number_value, to_number, truthy, type_name};
use crate::error::{TransformCompileError, TransformRuntimeError};
use crate::normalization::boolean::parse_bool;
use crate::normalization::numeric::parse_numeric;

/// Every function an expression may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Trim,
    ToLower,
    ToUpper,
    ToNumber,
    ToString,
    ToBool,
    Len,
    Replace,
    Substring,
    Concat,
    Coalesce,
    Contains,
    StartsWith,
    EndsWith,
    Round,
    Abs,
    Min,
    Max,
    MapValue,
}

impl Function {
    pub const ALL: [Function; 19] = [
        Self::Trim,
        Self::ToLower,
        Self::ToUpper,
        Self::ToNumber,
        Self::ToString,
        Self::ToBool,
        Self::Len,
        Self::Replace,
        Self::Substring,
        Self::Concat,
        Self::Coalesce,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Round,
        Self::Abs,
        Self::Min,
        Self::Max,
        Self::MapValue,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::ToLower => "toLower",
            Self::ToUpper => "toUpper",
            Self::ToNumber => "toNumber",
            Self::ToString => "toString",
            Self::ToBool => "toBool",
            Self::Len => "len",
            Self::Replace => "replace",
            Self::Substring => "substring",
            Self::Concat => "concat",
            Self::Coalesce => "coalesce",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Round => "round",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::MapValue => "mapValue",
        }
    }

    /// Accepted argument counts as `(min, max)`; `None` means unbounded.
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Self::Trim
            | Self::ToLower
            | Self::ToUpper
            | Self::ToNumber
            | Self::ToString
            | Self::ToBool
            | Self::Len
            | Self::Abs => (1, Some(1)),
            Self::Contains | Self::StartsWith | Self::EndsWith => (2, Some(2)),
            Self::Replace => (3, Some(3)),
            Self::Substring | Self::MapValue => (2, Some(3)),
            Self::Round => (1, Some(2)),
            Self::Concat | Self::Coalesce => (1, None),
            Self::Min | Self::Max => (2, None),
        }
    }

    pub(crate) fn check_arity(&self, found: usize) -> Result<(), TransformCompileError> {
        let (min, max) = self.arity();
        if found >= min && max.is_none_or(|max| found <= max) {
            return Ok(());
        }
        let expected = match max {
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        Err(TransformCompileError::Arity {
            function: self.name(),
            expected,
            found,
        })
    }

    /// Shape checks that can be decided before any input is seen.
    pub(crate) fn check_args(&self, args: &[Expr]) -> Result<(), TransformCompileError> {
        if *self == Self::MapValue && !matches!(args.get(1), Some(Expr::Map(_))) {
            return Err(TransformCompileError::Syntax(
                "mapValue() expects a map literal as its second argument".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn call(&self, args: &[Value]) -> Result<Value, TransformRuntimeError> {
        let name = self.name();
        match self {
            Self::Trim => map_text(&args[0], |s| s.trim().to_string()),
            Self::ToLower => map_text(&args[0], str::to_lowercase),
            Self::ToUpper => map_text(&args[0], str::to_uppercase),
            Self::ToNumber => match &args[0] {
                Value::Number(_) => Ok(args[0].clone()),
                Value::String(s) => parse_numeric(s)
                    .filter(|f| f.is_finite())
                    .ok_or_else(|| invalid(name, format!("'{s}' is not a number")))
                    .and_then(number_value),
                Value::Bool(b) => Ok(Value::from(u8::from(*b))),
                other => Err(invalid(name, format!("cannot convert {}", type_name(other)))),
            },
            Self::ToString => Ok(Value::String(display(&args[0]))),
            Self::ToBool => match &args[0] {
                Value::Bool(_) => Ok(args[0].clone()),
                Value::String(s) => parse_bool(s)
                    .map(Value::Bool)
                    .ok_or_else(|| invalid(name, format!("'{s}' is not a boolean"))),
                other => Ok(Value::Bool(truthy(other))),
            },
            Self::Len => {
                let len = match &args[0] {
                    Value::Null => 0,
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    other => display(other).chars().count(),
                };
                Ok(Value::from(len))
            }
            Self::Replace => {
                let text = display(&args[0]);
                let from = display(&args[1]);
                if from.is_empty() {
                    return Err(invalid(name, "search text is empty".to_string()));
                }
                Ok(Value::String(text.replace(&from, &display(&args[2]))))
            }
            Self::Substring => {
                let text = display(&args[0]);
                let count = text.chars().count();
                let start = index_arg(&args[1], name)?.min(count);
                let end = match args.get(2) {
                    Some(end) => index_arg(end, name)?.clamp(start, count),
                    None => count,
                };
                Ok(Value::String(
                    text.chars().skip(start).take(end - start).collect(),
                ))
            }
            Self::Concat => Ok(Value::String(args.iter().map(display).collect())),
            Self::Coalesce => Ok(args
                .iter()
                .find(|v| !v.is_null() && v.as_str() != Some(""))
                .cloned()
                .unwrap_or(Value::Null)),
            Self::Contains => Ok(Value::Bool(display(&args[0]).contains(&display(&args[1])))),
            Self::StartsWith => Ok(Value::Bool(
                display(&args[0]).starts_with(&display(&args[1])),
            )),
            Self::EndsWith => Ok(Value::Bool(display(&args[0]).ends_with(&display(&args[1])))),
            Self::Round => {
                let value = to_number(&args[0], "round()")?;
                let digits = match args.get(1) {
                    Some(d) => index_arg(d, name)?.min(12),
                    None => 0,
                };
                let factor = 10f64.powi(digits as i32);
                number_value((value * factor).round() / factor)
            }
            Self::Abs => number_value(to_number(&args[0], "abs()")?.abs()),
            Self::Min | Self::Max => {
                let mut best: Option<f64> = None;
                for arg in args {
                    let n = to_number(arg, if *self == Self::Min { "min()" } else { "max()" })?;
                    best = Some(match best {
                        None => n,
                        Some(b) if *self == Self::Min => b.min(n),
                        Some(b) => b.max(n),
                    });
                }
                best.map_or(Ok(Value::Null), number_value)
            }
            Self::MapValue => {
                let Value::Object(table) = &args[1] else {
                    return Err(invalid(name, "second argument is not a map".to_string()));
                };
                let key = display(&args[0]);
                match table.get(&key) {
                    Some(mapped) => Ok(mapped.clone()),
                    None => Ok(args.get(2).cloned().unwrap_or_else(|| args[0].clone())),
                }
            }
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies a string function; `null` passes through untouched.
fn map_text(value: &Value, f: impl Fn(&str) -> String) -> Result<Value, TransformRuntimeError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(f(s))),
        other => Ok(Value::String(f(&display(other)))),
    }
}

fn index_arg(value: &Value, function: &'static str) -> Result<usize, TransformRuntimeError> {
    let n = to_number(value, function)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(invalid(function, format!("{n} is not a non-negative integer")));
    }
    Ok(n as usize)
}

fn invalid(function: &'static str, message: String) -> TransformRuntimeError {
    TransformRuntimeError::InvalidArgument { function, message }
}
