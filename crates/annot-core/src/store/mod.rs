//! Record store contract consumed by the import engine.
//!
//! The engine only needs container bookkeeping, single-record inserts with
//! immediate identifier assignment, and a commit boundary. Stores serialize
//! their own writes; the engine assumes per-record atomicity only.

mod jsonl;
mod memory;

use std::path::PathBuf;

use annot_model::{
    AnnotationId, ContainerId, DerivedAnnotation, ImportStats, ImportStatus, ItemId, Metadata,
    ModelError, NormalizedRecord, ProjectId, UserId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jsonl::{ANNOTATIONS_FILE, CONTAINERS_FILE, ITEMS_FILE, JsonlStore};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize store entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("container {0} does not exist")]
    UnknownContainer(ContainerId),

    #[error("item {0} does not exist or is not committed")]
    UnknownItem(ItemId),

    #[error(transparent)]
    Status(#[from] ModelError),

    /// Failure reported by a store backend outside this crate.
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Container to allocate for a new import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContainer {
    pub project_id: ProjectId,
    pub name: String,
    pub created_by: Option<UserId>,
    pub meta_data: Metadata,
}

/// A container as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: ImportStatus,
    pub created_by: Option<UserId>,
    pub meta_data: Metadata,
}

impl ContainerRecord {
    pub(crate) fn new(id: ContainerId, container: NewContainer) -> Self {
        Self {
            id,
            project_id: container.project_id,
            name: container.name,
            status: ImportStatus::Created,
            created_by: container.created_by,
            meta_data: container.meta_data,
        }
    }

    /// Moves to `status`, rejecting transitions the run state machine forbids.
    pub(crate) fn set_status(&mut self, status: ImportStatus) -> Result<(), StoreError> {
        if self.status != status {
            self.status = self.status.transition(status)?;
        }
        Ok(())
    }

    pub(crate) fn record_stats(&mut self, stats: ImportStats) -> Result<(), StoreError> {
        self.meta_data
            .insert("stats".to_string(), serde_json::to_value(stats)?);
        Ok(())
    }

    pub(crate) fn record_failure(&mut self, message: &str) {
        self.meta_data
            .insert("error".to_string(), serde_json::Value::from(message));
    }
}

/// Storage capability consumed by the import engine.
///
/// Identifiers are assigned at insert time. Inserted entries become durable
/// at the next [`commit`](RecordStore::commit); a failed commit leaves
/// earlier commits in place.
pub trait RecordStore {
    fn create_container(&mut self, container: NewContainer) -> Result<ContainerId, StoreError>;

    fn set_status(&mut self, id: ContainerId, status: ImportStatus) -> Result<(), StoreError>;

    fn insert_record(&mut self, record: NormalizedRecord) -> Result<ItemId, StoreError>;

    /// The referenced item must already be committed.
    fn insert_annotation(
        &mut self,
        annotation: DerivedAnnotation,
    ) -> Result<AnnotationId, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    /// Moves the container to a terminal status and stores the run counters.
    fn finish_container(
        &mut self,
        id: ContainerId,
        status: ImportStatus,
        stats: ImportStats,
    ) -> Result<(), StoreError>;

    /// Marks the container failed and records `message` in its metadata.
    fn fail_container(&mut self, id: ContainerId, message: &str) -> Result<(), StoreError>;
}
