//! Compiled transform expressions.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{TransformCompileError, TransformRuntimeError};
use crate::expr::{self, Expr};

/// A transform expression parsed once and applied to many values.
///
/// Compilation is pure: compiling the same source twice yields transforms
/// that agree on every input.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTransform {
    source: String,
    expr: Expr,
}

impl CompiledTransform {
    pub fn compile(expression: &str) -> Result<Self, TransformCompileError> {
        let expr = expr::parse(expression)?;
        Ok(Self {
            source: expression.trim().to_string(),
            expr,
        })
    }

    /// Evaluates the expression with `value` bound to `input`.
    pub fn apply(&self, input: &Value) -> Result<Value, TransformRuntimeError> {
        expr::evaluate(&self.expr, input)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for CompiledTransform {
    type Err = TransformCompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for CompiledTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
