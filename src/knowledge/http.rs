//! knowledge::http
//!
//! HTTP knowledge retrieval client.
//!
//! # Design
//!
//! Speaks a small JSON protocol against a configurable base URL:
//!
//! ```text
//! POST {api_base}/retrieve
//! { "knowledgeBaseId": "...", "queryText": "...", "maxResults": 5 }
//! -> { "results": [ { "text": "...", "score": 0.87, "source": "..." } ] }
//! ```
//!
//! The client performs no relevance filtering; callers apply
//! [`filter_passages`](super::filter_passages) so the cutoff stays in
//! one tested place.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{KnowledgeBase, Passage, RetrievalError, RetrievalQuery};

/// HTTP knowledge retrieval client.
#[derive(Debug, Clone)]
pub struct HttpKnowledgeBase {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the retrieval service
    api_base: String,
    /// Knowledge base to query
    knowledge_base_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    knowledge_base_id: &'a str,
    query_text: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    results: Vec<Passage>,
}

impl HttpKnowledgeBase {
    /// Create a client for `knowledge_base_id` behind `api_base`.
    pub fn new(api_base: impl Into<String>, knowledge_base_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            knowledge_base_id: knowledge_base_id.into(),
        }
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Passage>, RetrievalError> {
        let url = format!("{}/retrieve", self.api_base.trim_end_matches('/'));
        let request = RetrieveRequest {
            knowledge_base_id: &self.knowledge_base_id,
            query_text: &query.query_text,
            max_results: query.max_results,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_camel_case() {
        let request = RetrieveRequest {
            knowledge_base_id: "kb-123",
            query_text: "q",
            max_results: 5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["knowledgeBaseId"], "kb-123");
        assert_eq!(json["queryText"], "q");
        assert_eq!(json["maxResults"], 5);
    }

    #[test]
    fn response_defaults_to_empty_results() {
        let body: RetrieveResponse = serde_json::from_str("{}").unwrap();
        assert!(body.results.is_empty());
    }
}
