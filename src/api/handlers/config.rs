use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::domain::config::{AiConfig, CommentaryCard, ImageOption};
use crate::infrastructure::stores::{ConfigStore, OptionCollection};
use crate::state::AppState;

fn collection_from_slug(slug: &str) -> Result<OptionCollection, ApiError> {
    OptionCollection::from_slug(slug)
        .ok_or_else(|| ApiError::not_found(format!("Unknown configuration collection: {slug}")))
}

/// Read a card-shaped configuration collection
///
/// GET /api/config/:collection
pub async fn get_cards(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CommentaryCard>>, ApiError> {
    let collection = collection_from_slug(&slug)?;
    let store = ConfigStore::new(state.store.clone());
    Ok(Json(store.cards(collection).await?))
}

/// Replace a card-shaped configuration collection in full
///
/// PUT /api/config/:collection
pub async fn put_cards(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(cards): Json<Vec<CommentaryCard>>,
) -> Result<Json<Vec<CommentaryCard>>, ApiError> {
    let collection = collection_from_slug(&slug)?;
    let store = ConfigStore::new(state.store.clone());
    store.save_cards(collection, &cards).await?;
    Ok(Json(cards))
}

/// Read the image placeholder definitions
///
/// GET /api/config/image-options
pub async fn get_image_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageOption>>, ApiError> {
    let store = ConfigStore::new(state.store.clone());
    Ok(Json(store.image_options().await?))
}

/// Replace the image placeholder definitions in full
///
/// PUT /api/config/image-options
pub async fn put_image_options(
    State(state): State<AppState>,
    Json(options): Json<Vec<ImageOption>>,
) -> Result<Json<Vec<ImageOption>>, ApiError> {
    let store = ConfigStore::new(state.store.clone());
    store.save_image_options(&options).await?;
    Ok(Json(options))
}

/// Read the assist-model parameters
///
/// GET /api/config/ai
pub async fn get_ai_config(State(state): State<AppState>) -> Result<Json<AiConfig>, ApiError> {
    let store = ConfigStore::new(state.store.clone());
    Ok(Json(store.ai_config().await?))
}

/// Replace the assist-model parameters; the next assist call re-reads
/// them, so no cache invalidation is involved
///
/// PUT /api/config/ai
pub async fn put_ai_config(
    State(state): State<AppState>,
    Json(config): Json<AiConfig>,
) -> Result<Json<AiConfig>, ApiError> {
    let store = ConfigStore::new(state.store.clone());
    store.save_ai_config(&config).await?;
    Ok(Json(config))
}
