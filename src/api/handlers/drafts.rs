use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::domain::records::{Draft, DraftSummary};
use crate::infrastructure::stores::DraftStore;
use crate::state::AppState;

/// Request body for saving a form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub property_address: String,
    pub form_data: serde_json::Value,
}

/// Response from a delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub removed: bool,
}

/// List draft summaries, most recently updated first
///
/// GET /api/drafts
pub async fn list_drafts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DraftSummary>>, ApiError> {
    let store = DraftStore::new(state.store.clone());
    let summaries = store.list().await?;
    Ok(Json(summaries))
}

/// Fetch a full draft for editing
///
/// GET /api/drafts/:id
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Draft>, ApiError> {
    let store = DraftStore::new(state.store.clone());
    let draft = store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Draft not found: {}", id)))?;
    Ok(Json(draft))
}

/// Save a form, updating in place when its address resolves to an
/// existing draft's place id
///
/// POST /api/drafts
pub async fn save_draft(
    State(state): State<AppState>,
    Json(req): Json<SaveDraftRequest>,
) -> Result<(StatusCode, Json<Draft>), ApiError> {
    if req.property_address.trim().is_empty() {
        return Err(ApiError::bad_request("Property address cannot be empty"));
    }

    let place_id = state
        .geocoder
        .resolve_place_id(&req.property_address)
        .await?;

    let store = DraftStore::new(state.store.clone());
    let draft = store
        .upsert(req.property_address, place_id, req.form_data)
        .await?;

    Ok((StatusCode::CREATED, Json(draft)))
}

/// Delete a draft; deleting an unknown id succeeds
///
/// DELETE /api/drafts/:id
pub async fn delete_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let store = DraftStore::new(state.store.clone());
    let removed = store.delete_by_id(&id).await?;
    Ok(Json(DeleteResponse { removed }))
}
