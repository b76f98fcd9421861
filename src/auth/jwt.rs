// JWT session token creation and verification
// Handles the admin session with 8-hour expiry

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Subject of every issued token; the service has a single admin user.
pub const ADMIN_SUBJECT: &str = "admin";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject
    pub sub: String,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates an admin session token
///
/// # Token Properties
/// - Expires after 8 hours
/// - Signed with HS256 algorithm
///
/// # Example
/// ```
/// use propval_api::auth::jwt::create_token;
///
/// let token = create_token("your-secret-key").expect("valid token");
/// assert!(!token.is_empty());
/// ```
pub fn create_token(secret: &str) -> Result<String, String> {
    let expiry = Utc::now() + Duration::hours(8);
    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies a session token and returns its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
