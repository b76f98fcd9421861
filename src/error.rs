use thiserror::Error;

/// Errors that can occur across the report service
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the `NotFound` kind. Stores use this to convert a missing
    /// backing document into a safe default instead of surfacing the error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ExternalService(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
