use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Google Geocoding API endpoint.
const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    place_id: String,
}

/// Resolves property addresses to stable `place_id` keys.
///
/// The place id is the drafts collection's dedupe key, so resolution must
/// be stable for a given address even without a working geocoding backend:
/// with no API key, or when geocoding returns zero results, a deterministic
/// UUIDv5 of the normalized address is used instead.
pub struct Geocoder {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl Geocoder {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Resolves an address to a place id.
    ///
    /// Transport and HTTP failures surface as `ExternalService`; only the
    /// zero-result and no-key cases fall back locally.
    pub async fn resolve_place_id(&self, address: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(local_place_id(address));
        };

        let response = self
            .client
            .get(GEOCODE_URL)
            .query(&[("address", address), ("key", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "geocoding failed with status {}",
                response.status()
            )));
        }

        let body: GeocodeResponse = response.json().await?;

        match body.results.into_iter().next() {
            Some(result) => Ok(result.place_id),
            None => {
                tracing::warn!(
                    address,
                    status = %body.status,
                    "geocoding returned no results, using local place id"
                );
                Ok(local_place_id(address))
            }
        }
    }
}

/// Deterministic place id for an address: UUIDv5 over the normalized
/// (lowercased, whitespace-collapsed) address string.
fn local_place_id(address: &str) -> String {
    let normalized = address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, normalized.as_bytes());
    format!("local-{}", id.simple())
}
