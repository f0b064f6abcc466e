//! PointSync API Module
//! REST API server for document upload/download and backup restore

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;

use crate::engine::auth::ApiKeys;
use crate::engine::store::{sanitize_filename, DocumentStore, StoreError};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<DocumentStore>,
    pub auth: Arc<ApiKeys>,
    pub static_dir: PathBuf,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_data,
        download_data,
        list_backups,
        restore_backup,
    ),
    tags(
        (name = "sync", description = "Document upload and download"),
        (name = "backups", description = "Backup snapshot operations"),
    )
)]
pub struct ApiDoc;

/// API failure envelope. Every error surfaces as `{status: "error", message}`
/// with the matching HTTP status; nothing here crashes the process.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key verification failed")]
    AuthFailure,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::AuthFailure => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (code, body).into_response()
    }
}

pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files =
        ServeDir::new(&state.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/upload", post(upload_data))
        .route("/api/download", get(download_data))
        .route("/api/backup", get(list_backups))
        .route("/api/restore/{filename}", post(restore_backup))
        .route("/api/health", get(health_check))
        .route("/api/info", get(server_info))
        .route("/api/{*rest}", any(api_fallback))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authorize(state: &ApiState, headers: &HeaderMap) -> Result<(), ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if state.auth.verify(auth_header) {
        Ok(())
    } else {
        Err(ApiError::AuthFailure)
    }
}

/// The original client treats `null`, `{}`, `[]` and `""` all as "nothing to
/// store"; keep rejecting them so an empty sync cannot wipe the document.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body = Value,
    responses(
        (status = 200, description = "Document stored", body = Value),
        (status = 400, description = "Missing or empty payload"),
        (status = 401, description = "API key verification failed"),
    ),
    tag = "sync"
)]
async fn upload_data(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    let document: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("no data received".to_string()))?;
    if is_empty_payload(&document) {
        return Err(ApiError::BadRequest("no data received".to_string()));
    }

    let timestamp = state.store.store(&document).map_err(|e| {
        error!("upload failed: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(json!({
        "status": "success",
        "message": "data uploaded",
        "timestamp": timestamp,
    })))
}

#[utoipa::path(
    get,
    path = "/api/download",
    responses(
        (status = 200, description = "Current document", body = Value),
        (status = 401, description = "API key verification failed"),
    ),
    tag = "sync"
)]
async fn download_data(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    let data = state.store.fetch().map_err(|e| {
        error!("download failed: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(json!({
        "status": "success",
        "data": data,
    })))
}

#[utoipa::path(
    get,
    path = "/api/backup",
    responses(
        (status = 200, description = "Backup snapshots, most recent first", body = Value),
        (status = 401, description = "API key verification failed"),
    ),
    tag = "backups"
)]
async fn list_backups(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    let backups = state.store.list_backups().map_err(|e| {
        error!("listing backups failed: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    info!("returning {} backup(s)", backups.len());
    Ok(Json(json!({
        "status": "success",
        "backups": backups,
    })))
}

#[utoipa::path(
    post,
    path = "/api/restore/{filename}",
    params(
        ("filename" = String, Path, description = "Backup snapshot filename"),
    ),
    responses(
        (status = 200, description = "Snapshot contents", body = Value),
        (status = 400, description = "Snapshot is not valid JSON"),
        (status = 401, description = "API key verification failed"),
        (status = 404, description = "Snapshot not found"),
    ),
    tag = "backups"
)]
async fn restore_backup(
    State(state): State<ApiState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    match state.store.restore(&filename) {
        Ok(data) => {
            let name = sanitize_filename(&filename).unwrap_or(&filename);
            Ok(Json(json!({
                "status": "success",
                "data": data,
                "filename": name,
            })))
        }
        Err(StoreError::BackupNotFound(_)) => {
            Err(ApiError::NotFound("backup file does not exist".to_string()))
        }
        Err(StoreError::Json(e)) => Err(ApiError::BadRequest(format!(
            "backup file is not valid JSON: {}",
            e
        ))),
        Err(e) => {
            error!("restore failed: {}", e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn server_info() -> Json<Value> {
    Json(json!({
        "name": "PointSync",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Cloud sync service for the points system",
        "endpoints": {
            "index": "/",
            "upload": "/api/upload",
            "download": "/api/download",
            "backup": "/api/backup",
            "restore": "/api/restore/{filename}",
            "health": "/api/health",
            "info": "/api/info",
        },
    }))
}

async fn api_fallback() -> ApiError {
    ApiError::NotFound("API endpoint does not exist".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_detection() {
        assert!(is_empty_payload(&json!(null)));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!("")));

        assert!(!is_empty_payload(&json!({"points": 0})));
        assert!(!is_empty_payload(&json!([1])));
        assert!(!is_empty_payload(&json!(0)));
        assert!(!is_empty_payload(&json!(false)));
    }
}
