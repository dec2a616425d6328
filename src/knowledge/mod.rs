//! knowledge
//!
//! Retrieval of remediation context from an external knowledge base.

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpKnowledgeBase;
pub use mock::MockKnowledgeBase;
pub use traits::{
    filter_passages, KnowledgeBase, Passage, RetrievalError, RetrievalQuery, MAX_PASSAGES,
    RELEVANCE_FLOOR,
};
