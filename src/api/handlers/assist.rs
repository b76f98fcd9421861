use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::assist::prompts::library;
use crate::infrastructure::stores::ConfigStore;
use crate::state::AppState;

/// Request body for drafting a commentary section
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryRequest {
    pub property_address: String,
    pub section: String,
    #[serde(default)]
    pub details: String,
}

/// Request body for rewriting existing text
#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub text: String,
    pub instruction: String,
}

/// Generated text response
#[derive(Debug, Serialize)]
pub struct AssistResponse {
    pub text: String,
}

/// Draft a commentary section for the report
///
/// POST /api/assist/commentary
pub async fn draft_commentary(
    State(state): State<AppState>,
    Json(req): Json<CommentaryRequest>,
) -> Result<Json<AssistResponse>, ApiError> {
    let config = ConfigStore::new(state.store.clone()).ai_config().await?;

    let template = library::commentary_draft();
    let prompt = template.render(&HashMap::from([
        ("address".to_string(), req.property_address),
        ("section".to_string(), req.section),
        ("details".to_string(), req.details),
    ]));

    let text = state
        .assist
        .generate(&config, &template.system, &prompt)
        .await?;
    Ok(Json(AssistResponse { text }))
}

/// Rewrite text under an instruction
///
/// POST /api/assist/rewrite
pub async fn rewrite(
    State(state): State<AppState>,
    Json(req): Json<RewriteRequest>,
) -> Result<Json<AssistResponse>, ApiError> {
    let config = ConfigStore::new(state.store.clone()).ai_config().await?;

    let template = library::rewrite_text();
    let prompt = template.render(&HashMap::from([
        ("text".to_string(), req.text),
        ("instruction".to_string(), req.instruction),
    ]));

    let text = state
        .assist
        .generate(&config, &template.system, &prompt)
        .await?;
    Ok(Json(AssistResponse { text }))
}
