//! File HTTP Routes
//!
//! Upload, info and download. Every handler hands the request to the
//! access control engine on the blocking pool; the routes themselves only
//! translate HTTP into engine inputs and engine outcomes into responses.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{engine_failure, join_failure, request_failure, ApiFailure, RequestError};
use super::state::AppState;
use crate::access::{EngineError, FileRecord, UploadCandidate};

/// Header carrying a file password on retrieval
pub const FILE_PASSWORD_HEADER: &str = "x-file-password";

/// File routes with shared state
pub fn file_routes(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/upload", post(upload_handler).layer(body_limit))
        .route("/:id", get(info_handler))
        .route("/:id/download", get(download_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

/// Public view of a record; never carries the password hash or storage reference
///
/// The owner id is only shown to the owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoResponse {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub is_public: bool,
    pub has_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub available_from: Option<String>,
    pub available_to: Option<String>,
    pub created_at: String,
    pub checksum: String,
}

impl FileInfoResponse {
    pub fn new(record: &FileRecord, reveal_owner: bool) -> Self {
        Self {
            id: record.id().to_string(),
            file_name: record.file_name().to_string(),
            content_type: record.content_type().to_string(),
            size: record.size(),
            is_public: record.visibility().is_public(),
            has_password: record.has_password(),
            owner_id: record
                .owner_id()
                .filter(|_| reveal_owner)
                .map(|id| id.to_string()),
            available_from: record.available_from().map(|t| t.to_rfc3339()),
            available_to: record.available_to().map(|t| t.to_rfc3339()),
            created_at: record.created_at().to_rfc3339(),
            checksum: record.checksum().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordQuery {
    #[serde(default)]
    pub password: Option<String>,
}

// ==================
// Request Parsing
// ==================

/// Bearer credential, if an `Authorization` header is present at all
///
/// A header without the `Bearer` scheme is passed through unchanged so the
/// verifier rejects it rather than it being mistaken for no credential.
fn bearer_credential(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let value = value.to_str().unwrap_or_default().trim();
    Some(value.strip_prefix("Bearer ").unwrap_or(value).trim().to_string())
}

/// File password from the header, else the query string
fn file_password(headers: &HeaderMap, query: PasswordQuery) -> Option<String> {
    headers
        .get(FILE_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.password)
        .filter(|p| !p.is_empty())
}

fn parse_id(raw: &str) -> Result<Uuid, ApiFailure> {
    // An id we could never have issued cannot name a record
    Uuid::parse_str(raw).map_err(|_| engine_failure(EngineError::NotFound(Uuid::nil())))
}

/// Only an empty password field is absent; any other value goes to the validator as sent
fn password_field(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

fn parse_flag(name: &str, value: &str) -> Result<Option<bool>, RequestError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(RequestError::BadRequest(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

fn parse_instant(name: &str, value: &str) -> Result<Option<DateTime<Utc>>, RequestError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    DateTime::parse_from_rfc3339(value)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|_| RequestError::BadRequest(format!("{} must be an RFC 3339 timestamp", name)))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> RequestError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RequestError::PayloadTooLarge
    } else {
        RequestError::BadRequest(err.body_text())
    }
}

/// Collect the upload form into a candidate
///
/// Blank flag and timestamp fields count as absent, as does an empty
/// password; unknown fields are ignored.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadCandidate, RequestError> {
    let mut candidate = UploadCandidate::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                candidate.file_name = field.file_name().map(str::to_string);
                candidate.content_type = field.content_type().map(str::to_string);
                candidate.payload = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "password" => {
                candidate.password = password_field(field.text().await.map_err(multipart_error)?);
            }
            "isPublic" => {
                let text = field.text().await.map_err(multipart_error)?;
                candidate.is_public = parse_flag("isPublic", &text)?;
            }
            "availableFrom" => {
                let text = field.text().await.map_err(multipart_error)?;
                candidate.available_from = parse_instant("availableFrom", &text)?;
            }
            "availableTo" => {
                let text = field.text().await.map_err(multipart_error)?;
                candidate.available_to = parse_instant("availableTo", &text)?;
            }
            _ => {}
        }
    }

    Ok(candidate)
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileInfoResponse>), ApiFailure> {
    let credential = bearer_credential(&headers);
    let candidate = read_upload_form(multipart).await.map_err(request_failure)?;

    let record = tokio::task::spawn_blocking(move || {
        state.engine.upload(candidate, credential.as_deref())
    })
    .await
    .map_err(join_failure)?
    .map_err(engine_failure)?;

    // Any owner on a fresh record is the caller who just uploaded it
    Ok((StatusCode::CREATED, Json(FileInfoResponse::new(&record, true))))
}

async fn info_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Query(query): Query<PasswordQuery>,
    headers: HeaderMap,
) -> Result<Json<FileInfoResponse>, ApiFailure> {
    let id = parse_id(&raw_id)?;
    let credential = bearer_credential(&headers);
    let password = file_password(&headers, query);

    let authorized = tokio::task::spawn_blocking(move || {
        state
            .engine
            .authorize_viewer(&id, credential.as_deref(), password.as_deref())
    })
    .await
    .map_err(join_failure)?
    .map_err(engine_failure)?;

    Ok(Json(FileInfoResponse::new(
        &authorized.record,
        authorized.viewer_is_owner(),
    )))
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Query(query): Query<PasswordQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap, Bytes), ApiFailure> {
    let id = parse_id(&raw_id)?;
    let credential = bearer_credential(&headers);
    let password = file_password(&headers, query);

    let file = tokio::task::spawn_blocking(move || {
        state
            .engine
            .retrieve(&id, credential.as_deref(), password.as_deref())
    })
    .await
    .map_err(join_failure)?
    .map_err(engine_failure)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(file.record.content_type())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Ok(disposition) = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        header_safe(file.record.file_name())
    )) {
        response_headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((StatusCode::OK, response_headers, Bytes::from(file.data)))
}

/// Restrict a file name to what a quoted header parameter can carry
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
