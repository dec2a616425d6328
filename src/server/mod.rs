//! server
//!
//! HTTP API surface and asynchronous stage triggering.
//!
//! The server is thin: route handlers shape requests and responses and
//! delegate to the pipeline components held in [`AppState`]. Stage work
//! triggered by a route runs in the background through the
//! [`StageInvoker`], so `POST /scan` and `POST /apply-patches` answer
//! immediately.

pub mod invoker;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::pipeline::ApprovalGate;
use crate::store::BlobStore;

pub use invoker::{InvokeError, LocalInvoker, MockInvoker, StageInvoker, StagePayload};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Blob store holding scan documents.
    pub store: Arc<dyn BlobStore>,
    /// Asynchronous stage dispatcher.
    pub invoker: Arc<dyn StageInvoker>,
    /// Approval gate (runs inline; it is a single read-modify-write).
    pub gate: Arc<ApprovalGate>,
}

impl AppState {
    /// Assemble state from its collaborator handles.
    pub fn new(store: Arc<dyn BlobStore>, invoker: Arc<dyn StageInvoker>) -> Self {
        let gate = Arc::new(ApprovalGate::new(Arc::clone(&store)));
        Self {
            store,
            invoker,
            gate,
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scan", post(routes::trigger_scan))
        .route("/scan/:scan_id", get(routes::get_scan))
        .route("/approve-finding", post(routes::approve_finding))
        .route("/reject-finding", post(routes::reject_finding))
        .route("/apply-patches", post(routes::apply_patches))
        .route("/health", get(routes::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
