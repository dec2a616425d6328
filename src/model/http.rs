//! model::http
//!
//! HTTP text generation client.
//!
//! # Design
//!
//! Speaks a small JSON protocol against a configurable base URL:
//!
//! ```text
//! POST {api_base}/generate
//! { "modelId": "...", "prompt": "...", "maxTokens": 2000, "temperature": 0.1 }
//! -> { "outputText": "..." }
//! ```
//!
//! The client returns the completion verbatim; structured-fix recovery
//! lives in [`model::fix`](super::fix).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{GenerationError, GenerationRequest, TextGenerator};

/// HTTP text generation client.
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the generation service
    api_base: String,
    /// Model identifier passed through to the service
    model_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    model_id: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    output_text: String,
}

impl HttpTextGenerator {
    /// Create a client for `model_id` behind `api_base`.
    pub fn new(api_base: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/generate", self.api_base.trim_end_matches('/'));
        let body = GenerateRequest {
            model_id: &self.model_id,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        Ok(body.output_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_camel_case() {
        let body = GenerateRequest {
            model_id: "model-1",
            prompt: "p",
            max_tokens: 700,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["modelId"], "model-1");
        assert_eq!(json["maxTokens"], 700);
        assert_eq!(json["temperature"], 0.3);
    }

    #[test]
    fn response_defaults_to_empty_text() {
        let body: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.output_text, "");
    }
}
