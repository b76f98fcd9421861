use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::domain::config::{normalize_tag, ImageOption};
use crate::domain::records::HistoryRecord;
use crate::infrastructure::stores::{ConfigStore, HistoryStore, TemplateRepository};
use crate::render::image::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::render::{self, Binding, ImageBinding, Schema};
use crate::state::AppState;

/// One image to embed: which placeholder tag it fills and the stored blob
/// name, with optional pixel dimensions overriding configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAssignment {
    pub placeholder: String,
    pub name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Request body for report generation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub template_name: String,
    pub property_address: String,
    pub form_data: serde_json::Value,
    #[serde(default)]
    pub images: Vec<ImageAssignment>,
}

/// Response from report generation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportResponse {
    pub file_name: String,
    pub url: String,
    pub data_url: String,
    pub replaced_count: usize,
}

/// Generate a report: resolve placeholders, render the template, persist
/// the output and append a history snapshot
///
/// POST /api/reports
pub async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<(StatusCode, Json<GenerateReportResponse>), ApiError> {
    let config_store = ConfigStore::new(state.store.clone());
    let templates = TemplateRepository::new(state.store.clone());

    let image_options = config_store.image_options().await?;
    let mut resolved = render::resolve(&req.form_data, &Schema::standard(), &image_options);

    let template_bytes = templates.read(&req.template_name).await?;

    // Stage image blobs to temp files for the attempt sequence. The
    // directory is removed on success and failure alike.
    let staging = tempfile::tempdir()
        .map_err(|e| ApiError::internal_server_error(format!("Staging failed: {}", e)))?;

    for (i, assignment) in req.images.iter().enumerate() {
        let bytes = templates.read_image(&assignment.name).await?;
        let ext = assignment
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("png");
        let path = staging.path().join(format!("stage_{i}.{ext}"));
        std::fs::write(&path, &bytes)
            .map_err(|e| ApiError::internal_server_error(format!("Staging failed: {}", e)))?;

        let tag = normalize_tag(&assignment.placeholder);
        let (width, height) = image_dimensions(assignment, &tag, &image_options);
        resolved
            .bindings
            .insert(tag, Binding::Image(ImageBinding { path, width, height }));
    }

    let outcome = render::render(&template_bytes, &resolved.bindings, &resolved.image_tags);

    if let Err(e) = staging.close() {
        tracing::warn!(error = %e, "staged image cleanup failed");
    }

    let rendered = outcome?;

    let (file_name, url) = templates.save_report(&rendered.bytes).await?;

    let history = HistoryStore::new(state.store.clone());
    history
        .append(HistoryRecord::new(
            req.property_address,
            req.form_data,
            rendered.replaced_count > 0,
            rendered.images_embedded > 0,
        ))
        .await?;

    let data_url = rendered.data_uri();
    Ok((
        StatusCode::CREATED,
        Json(GenerateReportResponse {
            file_name,
            url,
            data_url,
            replaced_count: rendered.replaced_count,
        }),
    ))
}

/// Request dimensions win, then the placeholder's configured size, then
/// the default.
fn image_dimensions(
    assignment: &ImageAssignment,
    tag: &str,
    options: &[ImageOption],
) -> (u32, u32) {
    let configured = options.iter().find(|o| normalize_tag(&o.placeholder) == tag);
    let width = assignment
        .width
        .or(configured.map(|o| o.width))
        .unwrap_or(DEFAULT_WIDTH);
    let height = assignment
        .height
        .or(configured.map(|o| o.height))
        .unwrap_or(DEFAULT_HEIGHT);
    (width, height)
}
