//! Closed expression language for per-field transforms.
//!
//! An expression sees exactly one input, bound to `value`. There is no
//! assignment, no access to other fields and no I/O; function calls are
//! limited to the [`Function`] registry.

mod eval;
mod functions;
mod lexer;
mod parser;

use serde_json::Value;

pub use functions::Function;

pub(crate) use eval::{display as display_value, evaluate, number_value};
pub(crate) use parser::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Input,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Map(Vec<(String, Expr)>),
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}
