//! Tree-walking evaluator over JSON values.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{BinaryOp, Expr, UnaryOp};
use crate::error::TransformRuntimeError;
use crate::normalization::numeric::parse_numeric;

pub(crate) fn evaluate(expr: &Expr, input: &Value) -> Result<Value, TransformRuntimeError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Input => Ok(input.clone()),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, input)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Negate => number_value(-to_number(&value, "negation")?),
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = evaluate(left, input)?;
            let rhs = evaluate(right, input)?;
            binary(*op, &lhs, &rhs)
        }
        Expr::And(left, right) => {
            let result = truthy(&evaluate(left, input)?) && truthy(&evaluate(right, input)?);
            Ok(Value::Bool(result))
        }
        Expr::Or(left, right) => {
            let result = truthy(&evaluate(left, input)?) || truthy(&evaluate(right, input)?);
            Ok(Value::Bool(result))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(&evaluate(condition, input)?) {
                evaluate(then, input)
            } else {
                evaluate(otherwise, input)
            }
        }
        Expr::Map(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, input)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, input))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(&values)
        }
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, TransformRuntimeError> {
    match op {
        BinaryOp::Add => {
            if lhs.is_string() || rhs.is_string() {
                return Ok(Value::String(format!("{}{}", display(lhs), display(rhs))));
            }
            number_value(to_number(lhs, "'+'")? + to_number(rhs, "'+'")?)
        }
        BinaryOp::Subtract => number_value(to_number(lhs, "'-'")? - to_number(rhs, "'-'")?),
        BinaryOp::Multiply => number_value(to_number(lhs, "'*'")? * to_number(rhs, "'*'")?),
        BinaryOp::Divide => {
            let divisor = to_number(rhs, "'/'")?;
            if divisor == 0.0 {
                return Err(TransformRuntimeError::DivisionByZero);
            }
            number_value(to_number(lhs, "'/'")? / divisor)
        }
        BinaryOp::Remainder => {
            let divisor = to_number(rhs, "'%'")?;
            if divisor == 0.0 {
                return Err(TransformRuntimeError::DivisionByZero);
            }
            number_value(to_number(lhs, "'%'")? % divisor)
        }
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(lhs, rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_eq(lhs, rhs))),
        BinaryOp::Lt => compare(lhs, rhs).map(|o| Value::Bool(o == Ordering::Less)),
        BinaryOp::Le => compare(lhs, rhs).map(|o| Value::Bool(o != Ordering::Greater)),
        BinaryOp::Gt => compare(lhs, rhs).map(|o| Value::Bool(o == Ordering::Greater)),
        BinaryOp::Ge => compare(lhs, rhs).map(|o| Value::Bool(o != Ordering::Less)),
    }
}

/// Equality that treats a numeric string and the same number as equal.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(_), Value::String(s)) | (Value::String(s), Value::Number(_)) => {
            let number = lhs.as_f64().or_else(|| rhs.as_f64());
            parse_numeric(s).is_some_and(|parsed| Some(parsed) == number)
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering, TransformRuntimeError> {
    if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    let a = to_number(lhs, "comparison")?;
    let b = to_number(rhs, "comparison")?;
    a.partial_cmp(&b).ok_or(TransformRuntimeError::NonFinite)
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text form used for concatenation and string functions. `null` renders empty.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn to_number(value: &Value, operation: &'static str) -> Result<f64, TransformRuntimeError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(TransformRuntimeError::NonFinite),
        Value::String(s) => parse_numeric(s)
            .filter(|f| f.is_finite())
            .ok_or(TransformRuntimeError::TypeMismatch {
                operation,
                found: "non-numeric string",
            }),
        other => Err(TransformRuntimeError::TypeMismatch {
            operation,
            found: type_name(other),
        }),
    }
}

/// Wraps a float as JSON, using an integer when the value is integral.
pub(crate) fn number_value(value: f64) -> Result<Value, TransformRuntimeError> {
    if !value.is_finite() {
        return Err(TransformRuntimeError::NonFinite);
    }
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Ok(Value::from(value as i64));
    }
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or(TransformRuntimeError::NonFinite)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
