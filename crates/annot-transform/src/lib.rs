#![deny(unsafe_code)]

//! Value transforms for annotation imports.
//!
//! - [`CompiledTransform`]: per-field expressions in a closed grammar, compiled
//!   once per import and applied to each row's value
//! - [`coerce`]: conversion of metadata values to the schema's declared type
//! - [`normalization`]: parsers for numeric, boolean and date cell text

pub mod coerce;
pub mod error;
mod expr;
pub mod normalization;
pub mod transform;

pub use coerce::coerce;
pub use error::{CoercionError, TransformCompileError, TransformRuntimeError};
pub use expr::Function;
pub use transform::CompiledTransform;
