//! Error types for transform compilation, evaluation and coercion.

use annot_model::FieldType;
use thiserror::Error;

/// An expression that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformCompileError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid number literal '{literal}'")]
    InvalidNumber { literal: String },

    #[error("unknown identifier '{0}' (only 'value' refers to the input)")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function {function}() expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: String,
        found: usize,
    },

    #[error("expression nesting exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("syntax error: {0}")]
    Syntax(String),
}

/// A compiled expression failed on one input value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformRuntimeError {
    #[error("cannot apply {operation} to {found}")]
    TypeMismatch {
        operation: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression produced a non-finite number")]
    NonFinite,

    #[error("{function}(): {message}")]
    InvalidArgument {
        function: &'static str,
        message: String,
    },
}

/// A value that does not fit the declared metadata field type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value} to {expected}")]
pub struct CoercionError {
    pub expected: FieldType,
    /// Rendering of the rejected value.
    pub value: String,
}
