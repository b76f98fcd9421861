use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::domain::records::HistoryRecord;
use crate::infrastructure::stores::HistoryStore;
use crate::state::AppState;

use super::drafts::DeleteResponse;

/// List generated-report snapshots, most recent first
///
/// GET /api/history
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let store = HistoryStore::new(state.store.clone());
    let records = store.list().await?;
    Ok(Json(records))
}

/// Delete a snapshot; deleting an unknown id succeeds
///
/// DELETE /api/history/:id
pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let store = HistoryStore::new(state.store.clone());
    let removed = store.delete_by_id(&id).await?;
    Ok(Json(DeleteResponse { removed }))
}
