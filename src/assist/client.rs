use serde::Deserialize;
use serde_json::json;

use crate::domain::config::AiConfig;
use crate::error::{Error, Result};

/// Gemini generative-language API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini error response format.
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Non-streaming client for the Gemini generateContent endpoint.
///
/// Generation parameters come from the persisted AI configuration on every
/// call, so a config write takes effect on the next request without any
/// cache invalidation.
pub struct AssistClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl AssistClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Submits a prompt and returns the generated text.
    pub async fn generate(
        &self,
        config: &AiConfig,
        system: &str,
        prompt: &str,
    ) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(Error::ExternalService(
                "assist model not configured: set GEMINI_API_KEY".to_string(),
            ));
        };

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "generationConfig": {
                "temperature": config.temperature,
                "topP": config.top_p,
                "topK": config.top_k,
                "maxOutputTokens": config.max_output_tokens,
            }
        });

        let url = format!(
            "{GEMINI_API_BASE}/{}:generateContent?key={api_key}",
            config.model
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(Error::ExternalService(format!(
                "assist model failed ({status}): {message}"
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::ExternalService(
                "assist model returned no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_is_external_service_error() {
        let client = AssistClient::new(None);
        let err = client
            .generate(&AiConfig::default(), "system", "prompt")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ExternalService(_)));
    }

    #[test]
    fn candidate_text_parses_from_response_shape() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "Drafted " }, { "text": "commentary." }], "role": "model" }
            }]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();

        assert_eq!(text, "Drafted commentary.");
    }
}
