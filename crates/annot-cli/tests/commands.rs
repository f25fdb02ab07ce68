//! Command-level tests driving the CLI entry points against temp files.

use std::fs;

use clap::Parser;
use tempfile::TempDir;

use annot_cli::cli::{Cli, Command};
use annot_cli::commands::{build_config, parse_mapping, run_check, run_import};
use annot_model::{ImportKind, ImportStatus, ProjectId, UserId};

const CHAT_CSV: &str = "\
turn_id,user_id,turn_text,thread
1,alice,Hello,t1
2,bob,Hi,t1
3,carol,,t2
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["annot-import"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

#[test]
fn test_parse_mapping() {
    let mapping = parse_mapping("text = content").unwrap();
    assert_eq!(mapping.source_field, "text");
    assert_eq!(mapping.target_field, "content");

    assert!(parse_mapping("content").is_err());
    assert!(parse_mapping("=content").is_err());
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write(
        &dir,
        "config.json",
        r#"{"project_id": 3, "container_name": "from-file", "data_type": "chat_message",
            "field_mapping": [{"source_field": "turn_text", "target_field": "content"}]}"#,
    );
    let csv = write(&dir, "chat.csv", CHAT_CSV);
    let Command::Import(args) = parse(&[
        "import",
        csv.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--name",
        "override",
        "--import-type",
        "chat",
        "--map",
        "thread=thread_label",
        "--imported-by",
        "9",
    ]) else {
        panic!("expected import command");
    };

    let config = build_config(&args.config, &args.file).unwrap();
    assert_eq!(config.project_id, ProjectId::new(3));
    assert_eq!(config.container_name, "override");
    assert_eq!(config.data_type, "chat_message");
    assert_eq!(config.import_type, ImportKind::Chat);
    assert_eq!(config.imported_by, Some(UserId::new(9)));
    assert_eq!(config.field_mapping.len(), 2);
    assert_eq!(config.field_mapping[1].target_field, "thread_label");
}

#[test]
fn test_container_name_defaults_to_file_stem() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "weekly_dump.csv", CHAT_CSV);
    let Command::Check(args) = parse(&["check", csv.to_str().unwrap()]) else {
        panic!("expected check command");
    };
    let config = build_config(&args.config, &args.file).unwrap();
    assert_eq!(config.container_name, "weekly_dump");
    assert_eq!(config.data_type, "generic");
}

#[test]
fn test_import_into_store_directory() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "chat.csv", CHAT_CSV);
    let store = dir.path().join("store");
    let Command::Import(args) = parse(&[
        "import",
        csv.to_str().unwrap(),
        "--data-type",
        "chat_message",
        "--store",
        store.to_str().unwrap(),
        "--no-progress",
    ]) else {
        panic!("expected import command");
    };

    let summary = run_import(&args).unwrap();
    let outcome = summary.outcome;
    assert_eq!(outcome.status, ImportStatus::Completed);
    assert_eq!(outcome.processed_rows, 3);
    assert_eq!(summary.report_limit, 20);
    assert!(
        outcome
            .warnings
            .iter()
            .any(|w| w == "Row 2: Empty content value")
    );
    assert!(store.join("items.jsonl").exists());
    assert!(store.join("containers.json").exists());
}

#[test]
fn test_import_with_settings_file() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "chat.csv", CHAT_CSV);
    let settings = write(
        &dir,
        "settings.toml",
        "[engine]\nmax_reported_issues = 5\nthread_column = \"conversation\"\n",
    );
    let Command::Import(args) = parse(&[
        "import",
        csv.to_str().unwrap(),
        "--settings",
        settings.to_str().unwrap(),
        "--store",
        dir.path().join("store").to_str().unwrap(),
        "--no-progress",
    ]) else {
        panic!("expected import command");
    };

    let summary = run_import(&args).unwrap();
    assert_eq!(summary.report_limit, 5);
    assert!(
        !summary
            .outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("Found 'thread' column"))
    );
}

#[test]
fn test_import_missing_content_is_fatal() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "renamed.csv", "turn_id,user_id,text\n1,alice,hi\n");
    let Command::Import(args) = parse(&[
        "import",
        csv.to_str().unwrap(),
        "--data-type",
        "chat_message",
        "--store",
        dir.path().join("store").to_str().unwrap(),
        "--no-progress",
    ]) else {
        panic!("expected import command");
    };

    let err = run_import(&args).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.starts_with("import renamed.csv"), "{message}");
    assert!(message.contains("Missing required fields: content"), "{message}");
}

#[test]
fn test_check_reports_mapping() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "chat.csv", CHAT_CSV);
    let Command::Check(args) = parse(&[
        "check",
        csv.to_str().unwrap(),
        "--data-type",
        "chat_message",
    ]) else {
        panic!("expected check command");
    };

    let plan = run_check(&args).unwrap();
    assert_eq!(plan.total_rows, 3);
    assert_eq!(plan.thread_column.as_deref(), Some("thread"));
    assert_eq!(plan.mapping.content_source(), Some("turn_text"));
    assert!(plan.mapping.fields.contains_key("user_id"));
}
