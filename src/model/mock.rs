//! model::mock
//!
//! Mock text generator for deterministic testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{GenerationError, GenerationRequest, TextGenerator};

/// Mock text generator.
///
/// Responses are served from a queue; once the queue is empty the last
/// configured response repeats. Thread-safe via internal
/// `Arc<Mutex<...>>`; clones share state. Prompts are recorded for
/// test verification.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    inner: Arc<Mutex<MockTextGeneratorInner>>,
}

#[derive(Debug, Default)]
struct MockTextGeneratorInner {
    queue: VecDeque<Result<String, GenerationError>>,
    repeat: Option<Result<String, GenerationError>>,
    prompts: Vec<String>,
}

impl MockTextGenerator {
    /// Generator that always returns `text`.
    pub fn always(text: impl Into<String>) -> Self {
        let generator = Self::default();
        generator.inner.lock().unwrap().repeat = Some(Ok(text.into()));
        generator
    }

    /// Generator that always fails with `error`.
    pub fn failing(error: GenerationError) -> Self {
        let generator = Self::default();
        generator.inner.lock().unwrap().repeat = Some(Err(error));
        generator
    }

    /// Generator serving `responses` in order, then repeating the last.
    pub fn with_responses(responses: Vec<Result<String, GenerationError>>) -> Self {
        let generator = Self::default();
        {
            let mut inner = generator.inner.lock().unwrap();
            inner.repeat = responses.last().cloned();
            inner.queue = responses.into();
        }
        generator
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.lock().unwrap().prompts.clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.prompts.push(request.prompt.clone());
        if let Some(response) = inner.queue.pop_front() {
            return response;
        }
        inner
            .repeat
            .clone()
            .unwrap_or_else(|| Err(GenerationError::NetworkError("mock exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_repeats() {
        let generator = MockTextGenerator::always("out");
        let req = GenerationRequest::for_fix("p");
        assert_eq!(generator.generate(&req).await.unwrap(), "out");
        assert_eq!(generator.generate(&req).await.unwrap(), "out");
        assert_eq!(generator.prompts(), vec!["p", "p"]);
    }

    #[tokio::test]
    async fn queue_drains_in_order_then_repeats() {
        let generator = MockTextGenerator::with_responses(vec![
            Ok("first".into()),
            Err(GenerationError::NetworkError("blip".into())),
            Ok("last".into()),
        ]);
        let req = GenerationRequest::for_fix("p");
        assert_eq!(generator.generate(&req).await.unwrap(), "first");
        assert!(generator.generate(&req).await.is_err());
        assert_eq!(generator.generate(&req).await.unwrap(), "last");
        assert_eq!(generator.generate(&req).await.unwrap(), "last");
    }

    #[tokio::test]
    async fn empty_mock_fails() {
        let generator = MockTextGenerator::default();
        let req = GenerationRequest::for_fix("p");
        assert!(generator.generate(&req).await.is_err());
    }
}
