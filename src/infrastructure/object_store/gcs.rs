use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Error, Result};

use super::ObjectStore;

/// Google Cloud Storage JSON API base URL.
const GCS_API_BASE: &str = "https://storage.googleapis.com/storage/v1/b";

/// Upload endpoint base URL.
const GCS_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1/b";

/// GCE metadata server token endpoint.
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// GCS error response format.
#[derive(Debug, Deserialize)]
struct GcsError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GcsError,
}

/// One object entry in a list response.
#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Object store backed by the Google Cloud Storage JSON API.
///
/// The access token comes from `GCS_ACCESS_TOKEN` when set, otherwise from
/// the GCE metadata server. Tokens are fetched per operation; the metadata
/// server caches them on its side.
pub struct GcsObjectStore {
    client: reqwest::Client,
    bucket: String,
}

impl GcsObjectStore {
    /// Creates a store over `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket: bucket.into(),
        }
    }

    /// Creates a store with a custom HTTP client. Useful for testing.
    #[allow(dead_code)]
    pub fn with_client(client: reqwest::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var("GCS_ACCESS_TOKEN") {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ExternalService(
                "no storage credentials: set GCS_ACCESS_TOKEN or run on GCE".to_string(),
            ));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.access_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::ExternalService("invalid access token".to_string()))?,
        );
        Ok(headers)
    }

    /// Maps a non-success storage response to an error, extracting the
    /// structured message when the body parses as a GCS error.
    async fn response_error(path: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::NOT_FOUND {
            return Error::NotFound(format!("object not found: {path}"));
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Error::ExternalService(format!("storage error for {path}: {status}: {message}"))
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let headers = self.auth_headers().await?;
        let url = format!(
            "{}/{}/o?uploadType=media&name={}",
            GCS_UPLOAD_BASE,
            self.bucket,
            percent_encode(path)
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::response_error(path, response).await);
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let headers = self.auth_headers().await?;
        let url = format!(
            "{}/{}/o/{}?alt=media",
            GCS_API_BASE,
            self.bucket,
            percent_encode(path)
        );

        let response = self.client.get(&url).headers(headers).send().await?;

        if !response.status().is_success() {
            return Err(Self::response_error(path, response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let headers = self.auth_headers().await?;
        let url = format!(
            "{}/{}/o?prefix={}",
            GCS_API_BASE,
            self.bucket,
            percent_encode(prefix)
        );

        let response = self.client.get(&url).headers(headers).send().await?;

        if !response.status().is_success() {
            return Err(Self::response_error(prefix, response).await);
        }

        let listing: ListResponse = response.json().await?;
        Ok(listing.items.into_iter().map(|o| o.name).collect())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let headers = self.auth_headers().await?;
        let url = format!(
            "{}/{}/o/{}",
            GCS_API_BASE,
            self.bucket,
            percent_encode(path)
        );

        let response = self.client.delete(&url).headers(headers).send().await?;

        // Deleting a missing object is a no-op so callers can use delete
        // for cleanup without checking existence first.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path, "delete of missing object, ignoring");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(Self::response_error(path, response).await);
        }

        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, path)
    }
}

/// Percent-encodes an object name for use as a single URL path segment.
/// The JSON API requires `/` inside object names to be encoded as `%2F`.
fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
