use std::sync::Arc;

use tracing::{debug, info};

use super::dto::{
    CreateRecordRequest, DeleteRecordRequest, DeleteRecordResponse, GetRecordsRequest,
    GetRecordsResponse, PingRequest, PingResponse, RecordMessage, RecordResponse,
    UpdateRecordRequest, WireRecordType,
};
use super::pagination::PageRequest;
use super::repo::RecordStore;
use super::repo_types::{
    now_seconds, truncate_to_seconds, NewRecord, OwnerId, RecordId, RecordUpdate,
};
use crate::errors::ServiceError;

pub const PONG: &str = "Pong";

/// Stateless request handler over an injected record store.
#[derive(Clone)]
pub struct RecordsService {
    store: Arc<dyn RecordStore>,
    page_size: u32,
}

impl RecordsService {
    pub fn new(store: Arc<dyn RecordStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    pub async fn create(&self, req: CreateRecordRequest) -> Result<RecordResponse, ServiceError> {
        let owner_id = OwnerId::parse(&req.owner_id)?;
        let record_type = WireRecordType::resolve(req.record_type.as_ref())?;

        let record = self
            .store
            .insert(NewRecord {
                owner_id,
                record_type,
                title: req.title,
                description: req.description,
                amount: req.amount,
                date: req.date,
                created_at: now_seconds(),
            })
            .await?;

        info!(record_id = %record.id, owner_id = %record.owner_id, %record_type, "record created");
        Ok(RecordResponse {
            success: true,
            record: record.into(),
            message: "record created".into(),
        })
    }

    pub async fn update(&self, req: UpdateRecordRequest) -> Result<RecordResponse, ServiceError> {
        let id = RecordId::parse(&req.id)?;
        let owner_id = OwnerId::parse(&req.owner_id)?;
        let record_type = WireRecordType::resolve(req.record_type.as_ref())?;
        let created_at = req
            .created_at
            .map(truncate_to_seconds)
            .ok_or_else(|| ServiceError::InvalidArgument("createdAt is required".into()))?;
        // The store stamps updatedAt with the current second; a later createdAt
        // would leave the record updated before it was created.
        if created_at > now_seconds() {
            return Err(ServiceError::InvalidArgument(format!(
                "createdAt must not be in the future, got {created_at}"
            )));
        }

        let record = self
            .store
            .update_by_id(
                &id,
                RecordUpdate {
                    owner_id,
                    record_type,
                    title: req.title,
                    description: req.description,
                    amount: req.amount,
                    date: req.date,
                    created_at,
                },
            )
            .await?;

        info!(record_id = %record.id, owner_id = %record.owner_id, "record updated");
        Ok(RecordResponse {
            success: true,
            record: record.into(),
            message: "record updated".into(),
        })
    }

    pub async fn delete(
        &self,
        req: DeleteRecordRequest,
    ) -> Result<DeleteRecordResponse, ServiceError> {
        let id = RecordId::parse(&req.id)?;
        self.store.delete_by_id(&id).await?;

        info!(record_id = %id, "record deleted");
        Ok(DeleteRecordResponse {
            success: true,
            message: "record deleted".into(),
        })
    }

    pub async fn get_records(
        &self,
        req: GetRecordsRequest,
    ) -> Result<GetRecordsResponse, ServiceError> {
        let owner_id = OwnerId::parse(&req.owner_id)?;
        let record_type = WireRecordType::resolve(req.record_type.as_ref())?;
        let page = u32::try_from(req.page).map_err(|_| {
            ServiceError::InvalidArgument(format!(
                "page out of range: expected 0..={}, got {}",
                u32::MAX,
                req.page
            ))
        })?;

        let page = self
            .store
            .list_by_owner_and_type(&owner_id, record_type, PageRequest::new(page, self.page_size))
            .await?;

        debug!(
            %owner_id,
            %record_type,
            count = page.items.len(),
            next_page = ?page.next_page,
            "records listed"
        );
        Ok(GetRecordsResponse {
            success: true,
            records: page.items.into_iter().map(RecordMessage::from).collect(),
            next_page: page.next_page,
            message: String::new(),
        })
    }

    pub fn ping(&self, req: PingRequest) -> PingResponse {
        PingResponse {
            message: req.message,
            response: PONG.to_string(),
        }
    }
}
