// Password hashing utilities
// Uses bcrypt for the admin password check

use bcrypt::{hash, verify, DEFAULT_COST};

/// Hashes a password using bcrypt
///
/// Used by operators to produce a value for `ADMIN_PASSWORD_HASH`.
#[allow(dead_code)]
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

/// Checks a login attempt against the configured admin credential.
///
/// `ADMIN_PASSWORD_HASH` (bcrypt) is the supported configuration; when it
/// is unset the service falls back to a plain `ADMIN_PASSWORD` comparison
/// for local development.
pub fn admin_password_valid(password: &str) -> Result<bool, String> {
    if let Ok(hashed) = std::env::var("ADMIN_PASSWORD_HASH") {
        if !hashed.is_empty() {
            return verify_password(password, &hashed);
        }
    }

    match std::env::var("ADMIN_PASSWORD") {
        Ok(plain) if !plain.is_empty() => Ok(password == plain),
        _ => Err("no admin credential configured".to_string()),
    }
}
