use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::pagination::{Page, PageRequest};
use super::repo::{RecordStore, StoreError};
use super::repo_types::{now_seconds, NewRecord, OwnerId, Record, RecordId, RecordType, RecordUpdate};

/// Process-local record store, used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<RwLock<HashMap<RecordId, Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.inner.read().await.get(id).cloned()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError> {
        let mut map = self.inner.write().await;
        let mut id = RecordId::generate();
        while map.contains_key(&id) {
            id = RecordId::generate();
        }
        let stored = record.into_record(id.clone());
        map.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_by_id(
        &self,
        id: &RecordId,
        update: RecordUpdate,
    ) -> Result<Record, StoreError> {
        let mut map = self.inner.write().await;
        let record = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if record.owner_id != update.owner_id {
            return Err(StoreError::OwnerMismatch {
                id: id.clone(),
                owner: update.owner_id,
            });
        }
        record.apply(update, now_seconds());
        Ok(record.clone())
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list_by_owner_and_type(
        &self,
        owner: &OwnerId,
        record_type: RecordType,
        page: PageRequest,
    ) -> Result<Page<Record>, StoreError> {
        let map = self.inner.read().await;
        let mut matching: Vec<&Record> = map
            .values()
            .filter(|r| &r.owner_id == owner && r.record_type == record_type)
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let rows = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.fetch_limit() as usize)
            .cloned()
            .collect();
        Ok(Page::from_overfetch(rows, page))
    }
}
