//! Store writing newline-delimited JSON files into a directory.
//!
//! Layout:
//! - `containers.json`: every container, rewritten atomically on each change
//! - `items.jsonl`: one [`StoredItem`] per line
//! - `annotations.jsonl`: one [`StoredAnnotation`] per line

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use annot_model::{
    AnnotationId, ContainerId, DerivedAnnotation, ImportStats, ImportStatus, ItemId,
    NormalizedRecord, StoredAnnotation, StoredItem,
};
use serde::Serialize;

use super::{ContainerRecord, NewContainer, RecordStore, StoreError};

pub const CONTAINERS_FILE: &str = "containers.json";
pub const ITEMS_FILE: &str = "items.jsonl";
pub const ANNOTATIONS_FILE: &str = "annotations.jsonl";

/// File-backed store. [`commit`](RecordStore::commit) flushes and syncs the
/// line files.
#[derive(Debug)]
pub struct JsonlStore {
    dir: PathBuf,
    containers: BTreeMap<ContainerId, ContainerRecord>,
    items: BufWriter<File>,
    annotations: BufWriter<File>,
    /// Items written by a completed commit.
    committed_items: BTreeSet<ItemId>,
    pending_items: Vec<ItemId>,
    next_item: u64,
    next_annotation: u64,
}

impl JsonlStore {
    /// Opens `dir`, creating it if needed and continuing after existing entries.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io("create directory", &dir, e))?;

        let containers = load_containers(&dir.join(CONTAINERS_FILE))?;
        let items_path = dir.join(ITEMS_FILE);
        let annotations_path = dir.join(ANNOTATIONS_FILE);
        let item_ids = scan_ids(&items_path)?;
        let next_annotation = scan_ids(&annotations_path)?.last().copied().unwrap_or(0);

        tracing::debug!(
            dir = %dir.display(),
            containers = containers.len(),
            items = item_ids.len(),
            "Opened JSONL store"
        );

        Ok(Self {
            items: open_append(&items_path)?,
            annotations: open_append(&annotations_path)?,
            next_item: item_ids.last().copied().unwrap_or(0),
            committed_items: item_ids.into_iter().map(ItemId::new).collect(),
            pending_items: Vec::new(),
            next_annotation,
            containers,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn container(&self, id: ContainerId) -> Option<&ContainerRecord> {
        self.containers.get(&id)
    }

    fn container_mut(&mut self, id: ContainerId) -> Result<&mut ContainerRecord, StoreError> {
        self.containers
            .get_mut(&id)
            .ok_or(StoreError::UnknownContainer(id))
    }

    /// Writes `containers.json` through a temp file and rename.
    fn save_containers(&self) -> Result<(), StoreError> {
        let path = self.dir.join(CONTAINERS_FILE);
        let temp_path = path.with_extension("json.tmp");
        let records: Vec<&ContainerRecord> = self.containers.values().collect();
        let bytes = serde_json::to_vec_pretty(&records)?;

        let mut file =
            File::create(&temp_path).map_err(|e| StoreError::io("create", &temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| StoreError::io("write", &temp_path, e))?;
        file.sync_all()
            .map_err(|e| StoreError::io("sync", &temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::io("rename", &path, e))?;
        Ok(())
    }
}

impl RecordStore for JsonlStore {
    fn create_container(&mut self, container: NewContainer) -> Result<ContainerId, StoreError> {
        let next = self.containers.keys().last().map_or(0, |id| id.get()) + 1;
        let id = ContainerId::new(next);
        self.containers
            .insert(id, ContainerRecord::new(id, container));
        self.save_containers()?;
        Ok(id)
    }

    fn set_status(&mut self, id: ContainerId, status: ImportStatus) -> Result<(), StoreError> {
        self.container_mut(id)?.set_status(status)?;
        self.save_containers()
    }

    fn insert_record(&mut self, record: NormalizedRecord) -> Result<ItemId, StoreError> {
        if !self.containers.contains_key(&record.container_id) {
            return Err(StoreError::UnknownContainer(record.container_id));
        }
        let id = ItemId::new(self.next_item + 1);
        let path = self.dir.join(ITEMS_FILE);
        write_line(&mut self.items, &StoredItem { id, record }, &path)?;
        self.next_item += 1;
        self.pending_items.push(id);
        Ok(id)
    }

    fn insert_annotation(
        &mut self,
        annotation: DerivedAnnotation,
    ) -> Result<AnnotationId, StoreError> {
        if !self.committed_items.contains(&annotation.item_id) {
            return Err(StoreError::UnknownItem(annotation.item_id));
        }
        let id = AnnotationId::new(self.next_annotation + 1);
        let path = self.dir.join(ANNOTATIONS_FILE);
        write_line(&mut self.annotations, &StoredAnnotation { id, annotation }, &path)?;
        self.next_annotation += 1;
        Ok(id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        for (writer, name) in [
            (&mut self.items, ITEMS_FILE),
            (&mut self.annotations, ANNOTATIONS_FILE),
        ] {
            let path = self.dir.join(name);
            writer
                .flush()
                .map_err(|e| StoreError::io("flush", &path, e))?;
            writer
                .get_ref()
                .sync_data()
                .map_err(|e| StoreError::io("sync", &path, e))?;
        }
        self.committed_items.extend(self.pending_items.drain(..));
        Ok(())
    }

    fn finish_container(
        &mut self,
        id: ContainerId,
        status: ImportStatus,
        stats: ImportStats,
    ) -> Result<(), StoreError> {
        let container = self.container_mut(id)?;
        container.set_status(status)?;
        container.record_stats(stats)?;
        self.save_containers()
    }

    fn fail_container(&mut self, id: ContainerId, message: &str) -> Result<(), StoreError> {
        let container = self.container_mut(id)?;
        container.set_status(ImportStatus::Failed)?;
        container.record_failure(message);
        self.save_containers()
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>, StoreError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io("open", path, e))?;
    Ok(BufWriter::new(file))
}

fn write_line<T: Serialize>(
    writer: &mut BufWriter<File>,
    entry: &T,
    path: &Path,
) -> Result<(), StoreError> {
    serde_json::to_writer(&mut *writer, entry)?;
    writer
        .write_all(b"\n")
        .map_err(|e| StoreError::io("write", path, e))
}

fn load_containers(path: &Path) -> Result<BTreeMap<ContainerId, ContainerRecord>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let file = File::open(path).map_err(|e| StoreError::io("open", path, e))?;
    let records: Vec<ContainerRecord> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records.into_iter().map(|r| (r.id, r)).collect())
}

#[derive(serde::Deserialize)]
struct IdOnly {
    id: u64,
}

/// Identifiers found in a line file, sorted ascending.
fn scan_ids(path: &Path) -> Result<Vec<u64>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| StoreError::io("open", path, e))?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| StoreError::io("read", path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: IdOnly = serde_json::from_str(&line)?;
        ids.push(entry.id);
    }
    ids.sort_unstable();
    Ok(ids)
}
