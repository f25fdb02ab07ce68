use std::fs;

use annot_core::store::{ANNOTATIONS_FILE, CONTAINERS_FILE, ITEMS_FILE};
use annot_core::{ContainerRecord, EngineSettings, ImportEngine, JsonlStore};
use annot_model::{ImportConfiguration, ImportStatus, ProjectId, StoredAnnotation, StoredItem};
use annot_schemas::SchemaRegistry;
use tempfile::TempDir;

const CSV: &str = "turn_text,thread\nhello,t1\nworld,t1\n";

fn read_lines<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Vec<T> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_import_writes_line_files() {
    let dir = TempDir::new().unwrap();
    let engine = ImportEngine::new(SchemaRegistry::builtin(), EngineSettings::default());
    let config = ImportConfiguration::new(ProjectId::new(4), "disk", "generic");

    let outcome = {
        let mut store = JsonlStore::open(dir.path()).unwrap();
        engine
            .run("disk.csv", CSV.as_bytes(), &config, &mut store)
            .unwrap()
    };
    assert_eq!(outcome.status, ImportStatus::Completed);

    let items: Vec<StoredItem> = read_lines(&dir.path().join(ITEMS_FILE));
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].record.content, "world");

    let annotations: Vec<StoredAnnotation> = read_lines(&dir.path().join(ANNOTATIONS_FILE));
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].annotation.item_id, items[0].id);

    let containers: Vec<ContainerRecord> = serde_json::from_str(
        &fs::read_to_string(dir.path().join(CONTAINERS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].status, ImportStatus::Completed);
    assert_eq!(containers[0].project_id, ProjectId::new(4));
}

#[test]
fn test_reopen_continues_identifiers() {
    let dir = TempDir::new().unwrap();
    let engine = ImportEngine::new(SchemaRegistry::builtin(), EngineSettings::default());
    let config = ImportConfiguration::new(ProjectId::new(1), "again", "generic");

    let first = {
        let mut store = JsonlStore::open(dir.path()).unwrap();
        engine.run("a.csv", CSV.as_bytes(), &config, &mut store).unwrap()
    };
    let mut store = JsonlStore::open(dir.path()).unwrap();
    let second = engine
        .run("b.csv", CSV.as_bytes(), &config, &mut store)
        .unwrap();

    assert_ne!(first.container_id, second.container_id);
    assert_eq!(
        store.container(first.container_id).unwrap().status,
        ImportStatus::Completed
    );
    drop(store);

    let items: Vec<StoredItem> = read_lines(&dir.path().join(ITEMS_FILE));
    let ids: Vec<u64> = items.iter().map(|i| i.id.get()).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
}
