//! In-process store.

use std::collections::{BTreeMap, BTreeSet};

use annot_model::{
    AnnotationId, ContainerId, DerivedAnnotation, ImportStats, ImportStatus, ItemId,
    NormalizedRecord, StoredAnnotation, StoredItem,
};

use super::{ContainerRecord, NewContainer, RecordStore, StoreError};

/// Store keeping everything in memory.
///
/// Uncommitted inserts are invisible to queries. Pending entries are
/// dropped by [`rollback`](MemoryStore::rollback).
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: BTreeMap<ContainerId, ContainerRecord>,
    items: Vec<StoredItem>,
    committed_items: BTreeSet<ItemId>,
    annotations: Vec<StoredAnnotation>,
    pending_items: Vec<StoredItem>,
    pending_annotations: Vec<StoredAnnotation>,
    next_container: u64,
    next_item: u64,
    next_annotation: u64,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self, id: ContainerId) -> Option<&ContainerRecord> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.containers.values()
    }

    /// Committed items of a container, in insertion order.
    pub fn records_in(&self, container: ContainerId) -> Vec<&StoredItem> {
        self.items
            .iter()
            .filter(|item| item.record.container_id == container)
            .collect()
    }

    /// Committed annotations on items of a container.
    pub fn annotations_in(&self, container: ContainerId) -> Vec<&StoredAnnotation> {
        let items = self
            .records_in(container)
            .into_iter()
            .map(|item| item.id)
            .collect::<BTreeSet<_>>();
        self.annotations
            .iter()
            .filter(|a| items.contains(&a.annotation.item_id))
            .collect()
    }

    /// Items grouped by the `thread_id` of their thread annotation.
    ///
    /// Items whose thread annotation has no `thread_id` belong to no group.
    pub fn thread_groups(&self, container: ContainerId) -> BTreeMap<String, Vec<ItemId>> {
        let mut groups: BTreeMap<String, Vec<ItemId>> = BTreeMap::new();
        for stored in self.annotations_in(container) {
            let Some(thread) = stored.annotation.as_thread() else {
                continue;
            };
            if let Some(thread_id) = thread.thread_id().filter(|t| !t.is_empty()) {
                groups
                    .entry(thread_id)
                    .or_default()
                    .push(stored.annotation.item_id);
            }
        }
        groups
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn pending_count(&self) -> usize {
        self.pending_items.len() + self.pending_annotations.len()
    }

    /// Drops every uncommitted insert.
    pub fn rollback(&mut self) {
        self.pending_items.clear();
        self.pending_annotations.clear();
    }

    fn container_mut(&mut self, id: ContainerId) -> Result<&mut ContainerRecord, StoreError> {
        self.containers
            .get_mut(&id)
            .ok_or(StoreError::UnknownContainer(id))
    }
}

impl RecordStore for MemoryStore {
    fn create_container(&mut self, container: NewContainer) -> Result<ContainerId, StoreError> {
        self.next_container += 1;
        let id = ContainerId::new(self.next_container);
        self.containers
            .insert(id, ContainerRecord::new(id, container));
        Ok(id)
    }

    fn set_status(&mut self, id: ContainerId, status: ImportStatus) -> Result<(), StoreError> {
        self.container_mut(id)?.set_status(status)
    }

    fn insert_record(&mut self, record: NormalizedRecord) -> Result<ItemId, StoreError> {
        if !self.containers.contains_key(&record.container_id) {
            return Err(StoreError::UnknownContainer(record.container_id));
        }
        self.next_item += 1;
        let id = ItemId::new(self.next_item);
        self.pending_items.push(StoredItem { id, record });
        Ok(id)
    }

    fn insert_annotation(
        &mut self,
        annotation: DerivedAnnotation,
    ) -> Result<AnnotationId, StoreError> {
        if !self.committed_items.contains(&annotation.item_id) {
            return Err(StoreError::UnknownItem(annotation.item_id));
        }
        self.next_annotation += 1;
        let id = AnnotationId::new(self.next_annotation);
        self.pending_annotations
            .push(StoredAnnotation { id, annotation });
        Ok(id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.committed_items
            .extend(self.pending_items.iter().map(|item| item.id));
        self.items.append(&mut self.pending_items);
        self.annotations.append(&mut self.pending_annotations);
        self.commits += 1;
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
        container.record_stats(stats)
    }

    fn fail_container(&mut self, id: ContainerId, message: &str) -> Result<(), StoreError> {
        let container = self.container_mut(id)?;
        container.set_status(ImportStatus::Failed)?;
        container.record_failure(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use annot_model::{ItemKind, Metadata, ProjectId, THREAD_ANNOTATION_TYPE};
    use serde_json::json;

    use super::*;

    fn container(store: &mut MemoryStore) -> ContainerId {
        store
            .create_container(NewContainer {
                project_id: ProjectId::new(1),
                name: "c".to_string(),
                created_by: None,
                meta_data: Metadata::new(),
            })
            .unwrap()
    }

    fn record(container_id: ContainerId, content: &str) -> NormalizedRecord {
        NormalizedRecord {
            container_id,
            content: content.to_string(),
            item_type: ItemKind::ChatMessage,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_pending_until_commit() {
        let mut store = MemoryStore::new();
        let id = container(&mut store);
        store.insert_record(record(id, "a")).unwrap();

        assert!(store.records_in(id).is_empty());
        store.commit().unwrap();
        assert_eq!(store.records_in(id).len(), 1);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_annotation_requires_committed_item() {
        let mut store = MemoryStore::new();
        let id = container(&mut store);
        let item = store.insert_record(record(id, "a")).unwrap();
        let annotation = DerivedAnnotation {
            item_id: item,
            annotation_type: THREAD_ANNOTATION_TYPE.to_string(),
            data: [("thread_id".to_string(), json!("t1"))].into_iter().collect(),
            created_by: None,
        };

        assert!(matches!(
            store.insert_annotation(annotation.clone()),
            Err(StoreError::UnknownItem(_))
        ));
        store.commit().unwrap();
        store.insert_annotation(annotation).unwrap();
        store.commit().unwrap();

        let groups = store.thread_groups(id);
        assert_eq!(groups["t1"], vec![item]);
    }

    #[test]
    fn test_rolled_back_item_cannot_be_annotated() {
        let mut store = MemoryStore::new();
        let id = container(&mut store);
        let kept = store.insert_record(record(id, "a")).unwrap();
        store.commit().unwrap();
        let dropped = store.insert_record(record(id, "b")).unwrap();
        store.rollback();

        let annotate = |item_id| DerivedAnnotation {
            item_id,
            annotation_type: THREAD_ANNOTATION_TYPE.to_string(),
            data: Default::default(),
            created_by: None,
        };
        assert!(matches!(
            store.insert_annotation(annotate(dropped)),
            Err(StoreError::UnknownItem(item)) if item == dropped
        ));
        store.insert_annotation(annotate(kept)).unwrap();
    }

    #[test]
    fn test_rollback_discards_pending() {
        let mut store = MemoryStore::new();
        let id = container(&mut store);
        store.insert_record(record(id, "a")).unwrap();
        store.rollback();
        store.commit().unwrap();
        assert!(store.records_in(id).is_empty());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut store = MemoryStore::new();
        let id = container(&mut store);
        store.fail_container(id, "boom").unwrap();

        let record = store.container(id).unwrap();
        assert_eq!(record.status, ImportStatus::Failed);
        assert_eq!(record.meta_data["error"], json!("boom"));
        assert!(store.set_status(id, ImportStatus::Processing).is_err());
    }
}
