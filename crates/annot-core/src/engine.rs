//! The import run: parse, resolve, normalize, commit, annotate.

use annot_ingest::{TabularData, parse};
use annot_map::{ResolvedMapping, resolve};
use annot_model::{
    ContainerId, ImportConfiguration, ImportOutcome, ImportStatus, ItemId, ItemTypeSchema,
    Metadata,
};
use annot_schemas::SchemaRegistry;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::annotations::{AnnotationDeriver, AnnotationDraft};
use crate::error::{ImportError, RowError, RowErrorKind};
use crate::issues::IssueLog;
use crate::normalizer::RowNormalizer;
use crate::settings::EngineSettings;
use crate::store::{NewContainer, RecordStore};

pub const NO_DATA_WARNING: &str = "CSV file has no data";

/// Progress after a batch commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub processed_rows: usize,
    pub total_rows: usize,
}

/// What a run would do, without touching a store.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub malformed_rows: usize,
    pub mapping: ResolvedMapping,
    /// Column driving implicit thread annotations, if any.
    pub thread_column: Option<String>,
    pub warnings: Vec<String>,
}

/// Runs imports against a schema registry with fixed settings.
///
/// Runs are sequential and synchronous. This is a sync type meant to be
/// driven via `spawn_blocking` from async contexts.
#[derive(Debug, Clone)]
pub struct ImportEngine {
    registry: SchemaRegistry,
    settings: EngineSettings,
}

impl ImportEngine {
    pub fn new(registry: SchemaRegistry, settings: EngineSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Parses the file and resolves the mapping only.
    pub fn check(
        &self,
        bytes: &[u8],
        config: &ImportConfiguration,
    ) -> Result<ImportPlan, ImportError> {
        config.validate()?;
        let schema = self.item_schema(&config.data_type)?;
        let data = parse(bytes, &self.settings.read_options())?;
        let mapping = self.resolve(&data, config, schema)?;

        let (_, mut warnings) = RowNormalizer::new(ContainerId::new(0), schema, &mapping);
        let deriver = AnnotationDeriver::new(
            config.annotation_mapping.as_ref(),
            data.columns(),
            &self.settings.thread_column,
        );
        if data.is_empty() {
            warnings.push(NO_DATA_WARNING.to_string());
        }

        Ok(ImportPlan {
            columns: data.columns().to_vec(),
            total_rows: data.row_count(),
            malformed_rows: data.rows.iter().filter(|r| r.is_err()).count(),
            mapping,
            thread_column: deriver.thread_column().map(String::from),
            warnings,
        })
    }

    pub fn run<S: RecordStore + ?Sized>(
        &self,
        file_name: &str,
        bytes: &[u8],
        config: &ImportConfiguration,
        store: &mut S,
    ) -> Result<ImportOutcome, ImportError> {
        self.run_with_progress(file_name, bytes, config, store, |_| {})
    }

    /// Runs one import, calling `on_progress` after every batch commit.
    ///
    /// Fatal conditions return an error and leave the container `failed`.
    /// Batches committed before a fatal commit failure are not rolled back.
    pub fn run_with_progress<S, F>(
        &self,
        file_name: &str,
        bytes: &[u8],
        config: &ImportConfiguration,
        store: &mut S,
        mut on_progress: F,
    ) -> Result<ImportOutcome, ImportError>
    where
        S: RecordStore + ?Sized,
        F: FnMut(ImportProgress),
    {
        config.validate()?;
        let schema = self.item_schema(&config.data_type)?;

        let span = tracing::info_span!(
            "import",
            file = %file_name,
            data_type = %config.data_type,
            container_id = tracing::field::Empty,
        );
        let _guard = span.enter();

        let container_id =
            store.create_container(container_for(config, file_name, bytes))?;
        span.record("container_id", container_id.get());
        if let Err(err) = store.set_status(container_id, ImportStatus::Processing) {
            return Err(fail(store, container_id, err.into()));
        }
        tracing::info!(bytes = bytes.len(), "Import started");

        let data = match parse(bytes, &self.settings.read_options()) {
            Ok(data) => data,
            Err(err) => return Err(fail(store, container_id, err.into())),
        };
        let mapping = match self.resolve(&data, config, schema) {
            Ok(mapping) => mapping,
            Err(err) => return Err(fail(store, container_id, err)),
        };

        let mut run = Run::new(container_id, &self.settings, data.row_count());
        let (normalizer, transform_warnings) = RowNormalizer::new(container_id, schema, &mapping);
        run.warnings.extend(transform_warnings);

        let deriver = AnnotationDeriver::new(
            config.annotation_mapping.as_ref(),
            data.columns(),
            &self.settings.thread_column,
        );
        if let Some(column) = deriver.thread_column() {
            run.warnings.push(format!(
                "Found '{column}' column - will create initial thread annotations"
            ));
        }

        if data.is_empty() {
            run.warnings.push(NO_DATA_WARNING);
        }

        for row in &data.rows {
            let row = match row {
                Ok(row) => row,
                Err(malformed) => {
                    run.row_error(RowError::new(
                        malformed.index,
                        RowErrorKind::FieldCount {
                            expected: malformed.expected,
                            found: malformed.found,
                        },
                    ));
                    continue;
                }
            };

            let normalized = match normalizer.normalize(row) {
                Ok(normalized) => normalized,
                Err(err) => {
                    run.row_error(err);
                    continue;
                }
            };
            let item_id = match store.insert_record(normalized.record) {
                Ok(id) => id,
                Err(err) => {
                    run.row_error(RowError::new(row.index, RowErrorKind::Insert(err)));
                    continue;
                }
            };
            run.warnings.extend(normalized.warnings);
            run.processed_rows += 1;
            run.pending_rows += 1;
            run.pending_annotations.extend(
                deriver
                    .derive(row)
                    .into_iter()
                    .map(|draft| (item_id, draft)),
            );

            if run.pending_rows >= self.settings.batch_size {
                if let Err(err) = run.flush(store, config) {
                    return Err(fail(store, container_id, err));
                }
                on_progress(run.progress());
            }
        }

        if run.pending_rows > 0 {
            if let Err(err) = run.flush(store, config) {
                return Err(fail(store, container_id, err));
            }
            on_progress(run.progress());
        }

        let outcome = run.finish();
        if let Err(err) = store.finish_container(container_id, outcome.status, outcome.stats()) {
            return Err(fail(store, container_id, err.into()));
        }
        tracing::info!(
            status = %outcome.status,
            total_rows = outcome.total_rows,
            processed_rows = outcome.processed_rows,
            errors = outcome.error_count,
            warnings = outcome.warning_count,
            "Import finished"
        );
        Ok(outcome)
    }

    fn item_schema(&self, data_type: &str) -> Result<&ItemTypeSchema, ImportError> {
        self.registry
            .item_type(data_type)
            .ok_or_else(|| ImportError::UnknownItemType {
                data_type: data_type.to_string(),
                known: self.registry.item_types().map(|t| t.name.clone()).collect(),
            })
    }

    fn resolve(
        &self,
        data: &TabularData,
        config: &ImportConfiguration,
        schema: &ItemTypeSchema,
    ) -> Result<ResolvedMapping, ImportError> {
        let required = schema.required_fields();
        let mapping = resolve(
            data.columns(),
            &config.field_mapping,
            &required,
            &self.settings.auto_map_rules(),
        )?;
        for (target, origin) in mapping.auto_mapped() {
            tracing::debug!(target_field = target, ?origin, "Auto-mapped field");
        }
        Ok(mapping)
    }
}

/// Mutable state of one run.
struct Run {
    container_id: ContainerId,
    total_rows: usize,
    processed_rows: usize,
    committed_rows: usize,
    pending_rows: usize,
    pending_annotations: Vec<(ItemId, AnnotationDraft)>,
    errors: IssueLog,
    warnings: IssueLog,
}

impl Run {
    fn new(container_id: ContainerId, settings: &EngineSettings, total_rows: usize) -> Self {
        Self {
            container_id,
            total_rows,
            processed_rows: 0,
            committed_rows: 0,
            pending_rows: 0,
            pending_annotations: Vec::new(),
            errors: IssueLog::with_retention(settings.issue_retention),
            warnings: IssueLog::with_retention(settings.issue_retention),
        }
    }

    fn row_error(&mut self, err: RowError) {
        tracing::debug!(
            row = err.index,
            kind = err.kind.label(),
            field = err.kind.field(),
            "Row skipped"
        );
        self.errors.push(err.to_string());
    }

    fn progress(&self) -> ImportProgress {
        ImportProgress {
            processed_rows: self.committed_rows,
            total_rows: self.total_rows,
        }
    }

    /// Commits pending records, then creates and commits their annotations.
    fn flush<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        config: &ImportConfiguration,
    ) -> Result<(), ImportError> {
        self.commit(store)?;
        self.committed_rows += self.pending_rows;
        tracing::debug!(
            batch_rows = self.pending_rows,
            committed_rows = self.committed_rows,
            "Batch committed"
        );
        self.pending_rows = 0;

        if self.pending_annotations.is_empty() {
            return Ok(());
        }
        for (item_id, draft) in std::mem::take(&mut self.pending_annotations) {
            let row_index = draft.row_index;
            let annotation_type = draft.annotation_type.clone();
            if let Err(err) = store.insert_annotation(draft.bind(item_id, config.imported_by)) {
                tracing::warn!(row = row_index, error = %err, "Annotation not created");
                self.warnings.push(format!(
                    "Row {row_index}: failed to create {annotation_type} annotation: {err}"
                ));
            }
        }
        self.commit(store)
    }

    fn commit<S: RecordStore + ?Sized>(&mut self, store: &mut S) -> Result<(), ImportError> {
        store.commit().map_err(|source| ImportError::Commit {
            container_id: self.container_id,
            committed_rows: self.committed_rows,
            source,
        })
    }

    fn finish(self) -> ImportOutcome {
        let status = if self.errors.is_empty() {
            ImportStatus::Completed
        } else {
            ImportStatus::CompletedWithErrors
        };
        ImportOutcome {
            container_id: self.container_id,
            status,
            total_rows: self.total_rows,
            processed_rows: self.processed_rows,
            error_count: self.errors.total(),
            warning_count: self.warnings.total(),
            errors: self.errors.into_messages(),
            warnings: self.warnings.into_messages(),
        }
    }
}

/// Marks the container failed and hands back the fatal error.
fn fail<S: RecordStore + ?Sized>(store: &mut S, id: ContainerId, err: ImportError) -> ImportError {
    tracing::error!(error = %err, "Import failed");
    if let Err(store_err) = store.fail_container(id, &err.to_string()) {
        tracing::error!(error = %store_err, "Could not mark container as failed");
    }
    err
}

fn container_for(config: &ImportConfiguration, file_name: &str, bytes: &[u8]) -> NewContainer {
    let mut meta = Metadata::new();
    meta.insert("import_type".to_string(), Value::from(config.import_type.as_str()));
    meta.insert("data_type".to_string(), Value::from(config.data_type.as_str()));
    meta.insert("original_filename".to_string(), Value::from(file_name));
    meta.insert(
        "imported_by".to_string(),
        config.imported_by.map_or(Value::Null, |u| Value::from(u.get())),
    );
    meta.insert(
        "field_mapping".to_string(),
        serde_json::to_value(&config.field_mapping).unwrap_or(Value::Null),
    );
    meta.insert(
        "source_sha256".to_string(),
        Value::from(hex::encode(Sha256::digest(bytes))),
    );
    NewContainer {
        project_id: config.project_id,
        name: config.container_name.clone(),
        created_by: config.imported_by,
        meta_data: meta,
    }
}
