//! CSV import engine for annotation items.
//!
//! # Module Organization
//!
//! - [`engine`]: the import run and its dry-run counterpart
//! - [`normalizer`]: raw row to normalized record
//! - [`annotations`]: annotations derived from rows
//! - [`store`]: record store contract plus in-memory and JSON-lines stores
//! - [`settings`]: engine settings loaded from TOML
//! - [`issues`]: bounded error and warning lists

pub mod annotations;
pub mod engine;
pub mod error;
pub mod issues;
pub mod normalizer;
pub mod settings;
pub mod store;

pub use annotations::{AnnotationDeriver, AnnotationDraft};
pub use engine::{ImportEngine, ImportPlan, ImportProgress, NO_DATA_WARNING};
pub use error::{ImportError, RowError, RowErrorKind};
pub use issues::IssueLog;
pub use normalizer::{NormalizedRow, RowNormalizer};
pub use settings::{EngineSettings, SettingsError};
pub use store::{ContainerRecord, JsonlStore, MemoryStore, NewContainer, RecordStore, StoreError};
