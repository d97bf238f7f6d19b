use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{
    CreateRecordRequest, DeleteRecordRequest, DeleteRecordResponse, GetRecordsRequest,
    GetRecordsResponse, PingRequest, PingResponse, RecordResponse, UpdateRecordRequest,
};
use crate::{errors::ServiceError, state::AppState};

pub fn rpc_routes() -> Router<AppState> {
    Router::new()
        .route("/RecordsService/Create", post(create))
        .route("/RecordsService/Update", post(update))
        .route("/RecordsService/Delete", post(delete))
        .route("/RecordsService/GetRecords", post(get_records))
        .route("/RecordsService/Ping", post(ping))
}

#[instrument(skip(state, req), fields(owner_id = %req.owner_id))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<Json<RecordResponse>, ServiceError> {
    Ok(Json(state.records.create(req).await?))
}

#[instrument(skip(state, req), fields(record_id = %req.id, owner_id = %req.owner_id))]
pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<UpdateRecordRequest>,
) -> Result<Json<RecordResponse>, ServiceError> {
    Ok(Json(state.records.update(req).await?))
}

#[instrument(skip(state, req), fields(record_id = %req.id))]
pub async fn delete(
    State(state): State<AppState>,
    Json(req): Json<DeleteRecordRequest>,
) -> Result<Json<DeleteRecordResponse>, ServiceError> {
    Ok(Json(state.records.delete(req).await?))
}

#[instrument(skip(state, req), fields(owner_id = %req.owner_id, page = req.page))]
pub async fn get_records(
    State(state): State<AppState>,
    Json(req): Json<GetRecordsRequest>,
) -> Result<Json<GetRecordsResponse>, ServiceError> {
    Ok(Json(state.records.get_records(req).await?))
}

#[instrument(skip_all)]
pub async fn ping(State(state): State<AppState>, Json(req): Json<PingRequest>) -> Json<PingResponse> {
    Json(state.records.ping(req))
}
