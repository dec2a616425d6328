//! knowledge::mock
//!
//! Mock knowledge base for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{KnowledgeBase, Passage, RetrievalError, RetrievalQuery};

/// Mock knowledge base.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// state. Records queries for test verification.
#[derive(Debug, Clone, Default)]
pub struct MockKnowledgeBase {
    inner: Arc<Mutex<MockKnowledgeBaseInner>>,
}

#[derive(Debug, Default)]
struct MockKnowledgeBaseInner {
    passages: Vec<Passage>,
    fail: Option<RetrievalError>,
    queries: Vec<RetrievalQuery>,
}

impl MockKnowledgeBase {
    /// Knowledge base that returns no passages.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Knowledge base returning the given passages on every query.
    pub fn with_passages(passages: Vec<Passage>) -> Self {
        let kb = Self::default();
        kb.inner.lock().unwrap().passages = passages;
        kb
    }

    /// Make every query fail with the given error.
    pub fn failing(error: RetrievalError) -> Self {
        let kb = Self::default();
        kb.inner.lock().unwrap().fail = Some(error);
        kb
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<RetrievalQuery> {
        self.inner.lock().unwrap().queries.clone()
    }
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Passage>, RetrievalError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(query.clone());
        if let Some(err) = &inner.fail {
            return Err(err.clone());
        }
        Ok(inner.passages.clone())
    }
}
