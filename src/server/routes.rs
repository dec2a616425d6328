//! server::routes
//!
//! HTTP entry points for the pipeline.
//!
//! | Route                 | Success                              | Failure |
//! |-----------------------|--------------------------------------|---------|
//! | `POST /scan`          | `{scan_id, status: "processing"}`    | 500 on trigger failure |
//! | `GET /scan/{scan_id}` | full scan document                   | 202 while pending, 500 on storage error |
//! | `POST /approve-finding` | `{status: "success"}`              | 404 if scan unknown |
//! | `POST /reject-finding`  | `{status: "success"}`              | 404 if scan unknown |
//! | `POST /apply-patches` | `{status: "initiated"}`              | 500 if target unconfigured |
//! | `GET /health`         | `{status: "healthy"}`                | - |

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::invoker::StagePayload;
use super::AppState;
use crate::core::document::parse_document;
use crate::core::types::ScanId;
use crate::pipeline::{ApprovalError, GateAction};

/// Error body returned by every failing route.
fn error_body(status: StatusCode, message: String) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "error": message })))
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub scan_id: Option<ScanId>,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Serialize)]
pub struct ScanAccepted {
    pub scan_id: ScanId,
    pub status: String,
    pub message: String,
}

/// `POST /scan` - allocate a scan id and trigger the pipeline.
pub async fn trigger_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanAccepted>, (StatusCode, Json<serde_json::Value>)> {
    if request.repo_url.trim().is_empty() {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "repo_url is required".to_string(),
        ));
    }

    let scan_id = request.scan_id.unwrap_or_else(ScanId::generate);
    let payload = StagePayload::Scan {
        scan_id: scan_id.clone(),
        repo_url: request.repo_url.clone(),
        branch: request.branch.clone(),
    };

    match state.invoker.invoke(payload).await {
        Ok(()) => Ok(Json(ScanAccepted {
            scan_id: scan_id.clone(),
            status: "processing".to_string(),
            message: format!(
                "Security scan of {} (branch {}) started",
                request.repo_url, request.branch
            ),
        })),
        Err(e) => Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Scanner error: {e}"),
        )),
    }
}

/// `GET /scan/{scan_id}` - read back the persisted document.
///
/// Answers 202 while the scanner has not yet written the document.
pub async fn get_scan(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    let scan_id = ScanId::new(scan_id)
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e.to_string()))?;

    match state.store.get(&scan_id.result_key()).await {
        Ok(Some(body)) => {
            let document = parse_document(&body).map_err(|e| {
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("stored document is invalid: {e}"),
                )
            })?;
            let value = serde_json::to_value(document).map_err(|e| {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;
            Ok((StatusCode::OK, Json(value)))
        }
        Ok(None) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "scan_id": scan_id.as_str(),
                "status": "processing",
                "message": "Scan results not ready yet",
            })),
        )),
        Err(e) => Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct GateRequest {
    pub scan_id: ScanId,
    pub finding_id: String,
}

/// `POST /approve-finding`
pub async fn approve_finding(
    state: State<AppState>,
    request: Json<GateRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    gate(state, request, GateAction::Approve).await
}

/// `POST /reject-finding`
pub async fn reject_finding(
    state: State<AppState>,
    request: Json<GateRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    gate(state, request, GateAction::Reject).await
}

async fn gate(
    State(state): State<AppState>,
    Json(request): Json<GateRequest>,
    action: GateAction,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state
        .gate
        .apply(&request.scan_id, &request.finding_id, action)
        .await
    {
        // An unmatched finding id is still a success (silent no-op).
        Ok(_) => Ok(Json(json!({ "status": "success" }))),
        Err(ApprovalError::ScanNotFound { scan_id }) => Err(error_body(
            StatusCode::NOT_FOUND,
            format!("no scan document found for {scan_id}"),
        )),
        Err(e) => Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Approval error: {e}"),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyPatchesRequest {
    pub scan_id: ScanId,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// `POST /apply-patches` - trigger patch application.
///
/// The deployment target is the request's `repo_url`, falling back to
/// the stored document's. With neither available the route answers
/// 500: the deployment target is unconfigured.
pub async fn apply_patches(
    State(state): State<AppState>,
    Json(request): Json<ApplyPatchesRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let repo_url = match request.repo_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => url,
        None => {
            let stored = state
                .store
                .get(&request.scan_id.result_key())
                .await
                .map_err(|e| {
                    error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                })?;
            let body = stored.ok_or_else(|| {
                error_body(
                    StatusCode::NOT_FOUND,
                    format!("no scan document found for {}", request.scan_id),
                )
            })?;
            let document = parse_document(&body).map_err(|e| {
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("stored document is invalid: {e}"),
                )
            })?;
            document.repo_url
        }
    };

    if repo_url.trim().is_empty() {
        return Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "deployment target not configured".to_string(),
        ));
    }

    let payload = StagePayload::Deploy {
        scan_id: request.scan_id.clone(),
        repo_url,
        branch: request.branch,
    };
    match state.invoker.invoke(payload).await {
        Ok(()) => Ok(Json(json!({
            "status": "initiated",
            "scan_id": request.scan_id.as_str(),
        }))),
        Err(e) => Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Deployment error: {e}"),
        )),
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
