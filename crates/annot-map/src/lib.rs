#![deny(unsafe_code)]

//! Field mapping resolution.
//!
//! Validates a declared source-column -> target-field mapping against the
//! columns actually present in a file and the item type's required fields,
//! filling gaps from column-name conventions.

pub mod error;
pub mod resolver;
pub mod types;
pub mod utils;

pub use error::MappingValidationError;
pub use resolver::resolve;
pub use types::{
    AutoMapRules, CONTENT_FIELD, ColumnHint, DuplicatePolicy, MappingOrigin, ResolvedMapping,
};
