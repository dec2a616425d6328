//! model::traits
//!
//! Text generation trait definition.
//!
//! # Design
//!
//! The `TextGenerator` trait abstracts the external reasoning service.
//! It deals in plain text: one prompt in, one completion out. Whether
//! the completion happens to be well-formed JSON is the caller's
//! problem, handled by the [`fix`](super::fix) normalization functions
//! rather than inside the client.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors from text generation.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The service returned an error response.
    #[error("generation API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Network or connection error.
    #[error("generation network error: {0}")]
    NetworkError(String),

    /// The response body was not in the expected shape.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Completion budget in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl GenerationRequest {
    /// Request tuned for per-finding fix generation: generous budget,
    /// near-deterministic sampling.
    pub fn for_fix(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 2000,
            temperature: 0.1,
        }
    }

    /// Request tuned for whole-scan patch planning.
    pub fn for_plan(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 700,
            temperature: 0.3,
        }
    }
}

/// The external reasoning service.
///
/// Implementations must be `Send + Sync` to allow use across async
/// tasks.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt.
    ///
    /// # Errors
    ///
    /// - `ApiError` when the service answers with an error status
    /// - `NetworkError` when it cannot be reached
    /// - `InvalidResponse` when the body cannot be decoded
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
