use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, info_span, trace};

use annot_core::{EngineSettings, ImportEngine, ImportPlan, JsonlStore};
use annot_model::{
    FieldMapping, ImportConfiguration, ImportKind, ImportOutcome, ProjectId, UserId,
};
use annot_schemas::SchemaRegistry;

use crate::cli::{CheckArgs, ConfigArgs, EngineArgs, ImportArgs, ImportTypeArg};
use crate::logging::redact_value;
use crate::summary::schemas_table;

const DEFAULT_PROJECT: u64 = 1;
const DEFAULT_DATA_TYPE: &str = "generic";

/// Builds the engine from the optional settings and schema files.
pub fn load_engine(args: &EngineArgs) -> Result<ImportEngine> {
    let settings = match &args.settings {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("load settings {}", path.display()))?,
        None => EngineSettings::default(),
    };
    let registry = load_registry(args)?;
    Ok(ImportEngine::new(registry, settings))
}

fn load_registry(args: &EngineArgs) -> Result<SchemaRegistry> {
    match &args.schemas {
        Some(path) => {
            SchemaRegistry::load(path).with_context(|| format!("load schemas {}", path.display()))
        }
        None => Ok(SchemaRegistry::builtin()),
    }
}

/// Parses `SOURCE=TARGET`.
pub fn parse_mapping(raw: &str) -> Result<FieldMapping> {
    let (source, target) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid mapping '{raw}': expected SOURCE=TARGET"))?;
    let (source, target) = (source.trim(), target.trim());
    if source.is_empty() || target.is_empty() {
        bail!("invalid mapping '{raw}': source and target must not be empty");
    }
    Ok(FieldMapping::new(source, target))
}

/// Merges the JSON configuration file (if any) with command-line flags.
///
/// Flags override scalar settings; `--map` entries are appended.
pub fn build_config(args: &ConfigArgs, file: &Path) -> Result<ImportConfiguration> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            ImportConfiguration::from_json(&raw)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => ImportConfiguration::new(
            ProjectId::new(DEFAULT_PROJECT),
            default_container_name(file),
            DEFAULT_DATA_TYPE,
        ),
    };

    if let Some(project) = args.project {
        config.project_id = ProjectId::new(project);
    }
    if let Some(name) = &args.name {
        config.container_name = name.clone();
    }
    if let Some(data_type) = &args.data_type {
        config.data_type = data_type.clone();
    }
    if let Some(kind) = args.import_type {
        config.import_type = match kind {
            ImportTypeArg::Generic => ImportKind::Generic,
            ImportTypeArg::Chat => ImportKind::Chat,
        };
    }
    if let Some(user) = args.imported_by {
        config.imported_by = Some(UserId::new(user));
    }
    for raw in &args.mappings {
        config.field_mapping.push(parse_mapping(raw)?);
    }
    config.validate()?;
    Ok(config)
}

fn default_container_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import".to_string())
}

fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

/// A finished import and how many issues the report should list.
#[derive(Debug)]
pub struct ImportSummary {
    pub outcome: ImportOutcome,
    pub report_limit: usize,
}

pub fn run_import(args: &ImportArgs) -> Result<ImportSummary> {
    let engine = load_engine(&args.engine)?;
    let config = build_config(&args.config, &args.file)?;
    let bytes =
        std::fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let file_name = file_name(&args.file);

    let span = info_span!("cli_import", file = %file_name, store = %args.store.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mut store = JsonlStore::open(&args.store)
        .with_context(|| format!("open store {}", args.store.display()))?;
    let bar = progress_bar(args.no_progress)?;
    let result = engine.run_with_progress(&file_name, &bytes, &config, &mut store, |progress| {
        bar.set_length(progress.total_rows as u64);
        bar.set_position(progress.processed_rows as u64);
    });
    bar.finish_and_clear();
    let outcome = result.with_context(|| format!("import {file_name}"))?;

    log_issues(&outcome);
    info!(
        container_id = %outcome.container_id,
        duration_ms = start.elapsed().as_millis(),
        "Import command finished"
    );
    Ok(ImportSummary {
        outcome,
        report_limit: engine.settings().max_reported_issues,
    })
}

pub fn run_check(args: &CheckArgs) -> Result<ImportPlan> {
    let engine = load_engine(&args.engine)?;
    let config = build_config(&args.config, &args.file)?;
    let bytes =
        std::fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let plan = engine
        .check(&bytes, &config)
        .with_context(|| format!("check {}", args.file.display()))?;
    debug!(
        columns = plan.columns.len(),
        rows = plan.total_rows,
        malformed = plan.malformed_rows,
        "Check finished"
    );
    Ok(plan)
}

pub fn run_schemas(args: &EngineArgs) -> Result<()> {
    let registry = load_registry(args)?;
    println!("{}", schemas_table(&registry));
    Ok(())
}

/// Row-level issues can quote cell values, so they are redacted unless
/// `--log-data` was given.
fn log_issues(outcome: &ImportOutcome) {
    for error in &outcome.errors {
        debug!(issue = redact_value(error), "Row error");
    }
    for warning in &outcome.warnings {
        trace!(issue = redact_value(warning), "Row warning");
    }
}

fn progress_bar(hidden: bool) -> Result<ProgressBar> {
    if hidden || !io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
            .context("progress bar template")?
            .progress_chars("=> "),
    );
    Ok(bar)
}
