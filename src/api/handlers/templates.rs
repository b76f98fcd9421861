use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::infrastructure::stores::templates::TemplateEntry;
use crate::infrastructure::stores::TemplateRepository;
use crate::state::AppState;

/// Request body for a template upload. `data` is either raw base64 or a
/// full `data:` URI.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTemplateRequest {
    pub file_name: String,
    pub data: String,
}

/// Request body for an image upload: a `data:` URI carrying the content
/// type the stored blob keeps.
#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    pub data: String,
}

/// Response from an image upload
#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub name: String,
    pub url: String,
}

/// List stored templates
///
/// GET /api/templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateEntry>>, ApiError> {
    let repo = TemplateRepository::new(state.store.clone());
    let entries = repo.list().await?;
    Ok(Json(entries))
}

/// Upload a template under its file name
///
/// POST /api/templates
pub async fn upload_template(
    State(state): State<AppState>,
    Json(req): Json<UploadTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateEntry>), ApiError> {
    let (_, bytes) = decode_data(&req.data)?;
    let repo = TemplateRepository::new(state.store.clone());
    let entry = repo.upload(&req.file_name, &bytes).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Delete a template by name; absence is not an error
///
/// DELETE /api/templates/:name
pub async fn delete_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = TemplateRepository::new(state.store.clone());
    repo.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image blob; the stored name is server-generated
///
/// POST /api/images
pub async fn upload_image(
    State(state): State<AppState>,
    Json(req): Json<UploadImageRequest>,
) -> Result<(StatusCode, Json<UploadImageResponse>), ApiError> {
    let (content_type, bytes) = decode_data(&req.data)?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    let repo = TemplateRepository::new(state.store.clone());
    let (name, url) = repo.upload_image(&bytes, &content_type).await?;
    Ok((StatusCode::CREATED, Json(UploadImageResponse { name, url })))
}

/// Decodes an upload body: a `data:<mime>;base64,<payload>` URI or bare
/// base64. Returns the declared content type when present.
fn decode_data(data: &str) -> Result<(Option<String>, Vec<u8>), ApiError> {
    let (content_type, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| ApiError::bad_request("Malformed data URI"))?;
            (Some(header.to_string()), payload)
        }
        None => (None, data),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 payload: {}", e)))?;

    Ok((content_type, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_bare_base64() {
        let (ct, bytes) = decode_data("aGVsbG8=").unwrap();
        assert!(ct.is_none());
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn decode_data_uri_with_content_type() {
        let (ct, bytes) = decode_data("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ct.as_deref(), Some("image/png"));
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn malformed_data_uri_is_rejected() {
        assert!(decode_data("data:image/png,not-base64-section").is_err());
    }
}
