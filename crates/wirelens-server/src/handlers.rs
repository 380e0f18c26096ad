use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use wirelens_contracts::{ContextId, RelayError};
use wirelens_engine::{adapt_description, run_inspection, CompletionOptions};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    #[serde(rename = "roomId")]
    pub room_id: ContextId,
}

#[derive(Debug, Deserialize)]
pub struct ClearCacheRequest {
    #[serde(rename = "roomId")]
    pub room_id: ContextId,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub base_description: String,
    pub disability_info: String,
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn analyze_handler(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    // Credential check comes before any I/O; an unauthenticated
    // caller must not trigger a metadata fetch.
    let Some(bearer) = bearer_token(&headers) else {
        return error_response(&RelayError::Unauthenticated);
    };

    let (file_name, bytes) = match subject_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return error_response(&err),
    };

    info!(room = params.room_id, file = %file_name, "inspection request");
    let options = CompletionOptions::deterministic(
        &state.config.inspection_model,
        state.config.inspection_max_tokens,
    );
    let result = run_inspection(
        &state.cache,
        state.gateway.as_ref(),
        &options,
        &state.config.staging_dir,
        params.room_id,
        &bearer,
        &file_name,
        &bytes,
    )
    .await;

    match result {
        Ok(verdict) => Json(verdict).into_response(),
        Err(err) => {
            warn!(room = params.room_id, error = %err, "inspection failed");
            error_response(&err)
        }
    }
}

pub(crate) async fn clear_cache_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ClearCacheRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    if let Err(err) = require_admin_key(&state, &headers) {
        return error_response(&err);
    }
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(&RelayError::bad_request(rejection.body_text()));
        }
    };
    state.cache.invalidate(request.room_id).await;
    Json(json!({
        "message": format!("Cache for room {} cleared successfully", request.room_id),
    }))
    .into_response()
}

pub(crate) async fn generate_description_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<DescriptionRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    if let Err(err) = require_admin_key(&state, &headers) {
        return error_response(&err);
    }
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(&RelayError::bad_request(rejection.body_text()));
        }
    };
    let options = CompletionOptions::sampled(&state.config.description_model, 0.5);
    match adapt_description(
        state.gateway.as_ref(),
        &options,
        &request.base_description,
        &request.disability_info,
    )
    .await
    {
        Ok(description) => Json(json!({"description": description})).into_response(),
        Err(err) => {
            warn!(error = %err, "description adaptation failed");
            error_response(&err)
        }
    }
}

/// Pulls the forwardable token out of the Authorization header.
/// Accepts both `Bearer <token>` and a raw token.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("authorization")?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn require_admin_key(state: &AppState, headers: &HeaderMap) -> Result<(), RelayError> {
    let supplied = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if supplied.is_empty() || supplied != state.config.admin_api_key {
        return Err(RelayError::Unauthenticated);
    }
    Ok(())
}

/// Reads the `file` field of the multipart upload.
async fn subject_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), RelayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| RelayError::bad_request(format!("unreadable multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload.jpg".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| RelayError::bad_request(format!("unreadable upload: {err}")))?;
        if bytes.is_empty() {
            return Err(RelayError::bad_request("empty subject image upload"));
        }
        return Ok((file_name, bytes.to_vec()));
    }
    Err(RelayError::bad_request("missing `file` multipart field"))
}

fn error_response(err: &RelayError) -> Response {
    let (status, code) = match err {
        RelayError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        RelayError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        RelayError::AssetUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "asset_unavailable")
        }
        RelayError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
        RelayError::UpstreamRejected { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            "upstream_rejected",
        ),
        RelayError::InferenceService(_) => (StatusCode::BAD_GATEWAY, "inference_service"),
        RelayError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
    };
    (
        status,
        Json(json!({"error": {"code": code, "message": err.to_string()}})),
    )
        .into_response()
}
