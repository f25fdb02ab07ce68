//! CLI argument definitions for the annotation importer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "annot-import",
    version,
    about = "Import CSV files as annotation items",
    long_about = "Import CSV files as annotation items.\n\n\
                  Validates column mappings against the item type schema, normalizes\n\
                  every row and commits records in batches to a local store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values to appear in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a CSV file into a new container.
    Import(ImportArgs),

    /// Parse a CSV file and resolve its mapping without importing.
    Check(CheckArgs),

    /// List the known item types and their fields.
    Schemas(EngineArgs),
}

/// Where engine settings and extra schemas come from.
#[derive(Args, Clone, Default)]
pub struct EngineArgs {
    /// Engine settings file (TOML, `[engine]` table).
    #[arg(long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Additional item and project type definitions (TOML).
    #[arg(long = "schemas", value_name = "PATH")]
    pub schemas: Option<PathBuf>,
}

/// Per-import configuration, from a JSON file and/or flags.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Import configuration (JSON). Flags below extend or override it.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Owning project.
    #[arg(long = "project", value_name = "ID")]
    pub project: Option<u64>,

    /// Container name (default: the file stem).
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Item type of the imported records.
    #[arg(long = "data-type", value_name = "TYPE")]
    pub data_type: Option<String>,

    #[arg(long = "import-type", value_enum)]
    pub import_type: Option<ImportTypeArg>,

    /// Field mapping as SOURCE=TARGET. Repeatable.
    #[arg(long = "map", value_name = "SOURCE=TARGET")]
    pub mappings: Vec<String>,

    /// User the import is attributed to.
    #[arg(long = "imported-by", value_name = "USER")]
    pub imported_by: Option<u64>,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// CSV file to import.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Store directory (created if missing).
    #[arg(long = "store", value_name = "DIR", default_value = "annot-store")]
    pub store: PathBuf,

    /// Print the import report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// CSV file to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ImportTypeArg {
    Generic,
    Chat,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
