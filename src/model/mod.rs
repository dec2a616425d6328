//! model
//!
//! The external reasoning service: generation client, structured fix
//! records, and response normalization.

pub mod fix;
pub mod http;
pub mod mock;
pub mod traits;

pub use fix::{
    classify_response, recover_fix, FixOutcome, FixRecord, DEFAULT_CONFIDENCE,
    DEFAULT_EXPLANATION, FALLBACK_EXPLANATION,
};
pub use http::HttpTextGenerator;
pub use mock::MockTextGenerator;
pub use traits::{GenerationError, GenerationRequest, TextGenerator};
