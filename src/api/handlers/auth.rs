use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::auth::jwt::create_token;
use crate::auth::password::admin_password_valid;

/// Request body for admin login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Response from successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Login with the admin password
///
/// POST /api/auth/login
pub async fn login(Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let valid = admin_password_valid(&req.password).map_err(|e| {
        ApiError::internal_server_error(format!("Password verification failed: {}", e))
    })?;

    if !valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-key".to_string());
    let token = create_token(&secret)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(Json(LoginResponse { token }))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
