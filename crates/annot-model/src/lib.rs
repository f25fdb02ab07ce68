#![deny(unsafe_code)]

//! Data model for the annotation import engine.
//!
//! # Module Organization
//!
//! - [`config`]: per-import configuration (field mappings, annotation mapping)
//! - [`record`]: normalized records, derived annotations and typed views
//! - [`outcome`]: import status state machine and run outcome
//! - [`schema`]: item and project type schemas

pub mod config;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod schema;

pub use config::{AnnotationMapping, FieldMapping, ImportConfiguration, ImportKind};
pub use error::{ModelError, Result};
pub use ids::{AnnotationId, ContainerId, ItemId, ProjectId, UserId};
pub use outcome::{ImportOutcome, ImportReport, ImportStats, ImportStatus, MAX_REPORTED_ISSUES};
pub use record::{
    ChatMessageView, DerivedAnnotation, ImportedDataView, ItemKind, Metadata, NormalizedRecord,
    StoredAnnotation, StoredItem, THREAD_ANNOTATION_TYPE, ThreadAnnotationView,
};
pub use schema::{FieldSchema, FieldType, ItemTypeSchema, ProjectTypeSchema};
