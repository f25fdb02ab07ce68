#![deny(unsafe_code)]

//! Schema registry for the annotation import engine.
//!
//! The registry is an explicit value: construct it with
//! [`SchemaRegistry::builtin`] or [`SchemaRegistry::load`] at startup and
//! pass it to the engine.

mod builtin;
mod error;
mod registry;

pub use builtin::{builtin_item_types, builtin_project_types};
pub use error::SchemaError;
pub use registry::SchemaRegistry;
