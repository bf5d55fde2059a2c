//! Handlers for `/employees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/employees` | Newest first |
//! | `POST`   | `/employees` | Multipart profile + optional `photo`; 409 on duplicate code |
//! | `GET`    | `/employees/:id` | 404 if not found |
//! | `PUT`    | `/employees/:id` | Multipart; only supplied fields change |
//! | `DELETE` | `/employees/:id` | Requires `?confirm=<identity code>` |
//! | `POST`   | `/employees/:id/face-encoding` | Body: `{"faceEncoding": ...}` |
//!
//! Profile fields accept both their current names and the older ones:
//! `identityCode`/`employeeId`, `category`/`specialty`, `region`/`city`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use facegate_core::{oracle::RecognitionOracle, subject::Subject};
use facegate_service::{AccessStore, Enrolled, EnrollmentForm, SubjectUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{AppState, error::ApiError, form::FormData};

const IDENTITY_CODE: &[&str] = &["identityCode", "employeeId"];
const NAME: &[&str] = &["name"];
const CATEGORY: &[&str] = &["category", "specialty"];
const REGION: &[&str] = &["region", "city"];
const BIRTH_DATE: &[&str] = &["birthDate"];
const IS_ACTIVE: &[&str] = &["isActive"];
const PHOTO: &str = "photo";

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /employees`
pub async fn list<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  Ok(Json(state.service.list_subjects().await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /employees`
pub async fn create<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let mut form = FormData::collect(multipart, &[PHOTO]).await?;
  let enrollment = EnrollmentForm {
    identity_code: form.text(IDENTITY_CODE).unwrap_or_default(),
    name:          form.text(NAME).unwrap_or_default(),
    category:      form.text(CATEGORY).unwrap_or_default(),
    region:        form.text(REGION).unwrap_or_default(),
    birth_date:    form.text(BIRTH_DATE).unwrap_or_default(),
    photo:         form.file(PHOTO),
  };
  let enrolled = state.service.enroll(enrollment).await?;
  Ok((StatusCode::CREATED, Json(enrolled)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /employees/:id`
pub async fn get_one<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  Ok(Json(state.service.get_subject(id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /employees/:id`
pub async fn update<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<Json<Enrolled>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let mut form = FormData::collect(multipart, &[PHOTO]).await?;
  let update = SubjectUpdate {
    identity_code: form.text(IDENTITY_CODE),
    name:          form.text(NAME),
    category:      form.text(CATEGORY),
    region:        form.text(REGION),
    birth_date:    form.text(BIRTH_DATE),
    is_active:     form.flag(IS_ACTIVE)?,
    photo:         form.file(PHOTO),
  };
  Ok(Json(state.service.update_subject(id, update).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
  pub message:        String,
  pub detached_scans: u64,
}

/// `DELETE /employees/:id?confirm=<identity code>`
pub async fn delete_one<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let deleted = state.service.delete_subject(id, params.confirm.as_deref()).await?;
  Ok(Json(DeleteResponse {
    message:        "Employee permanently deleted successfully".into(),
    detached_scans: deleted.detached_scans,
  }))
}

// ─── Face encoding ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingBody {
  #[serde(default)]
  pub face_encoding: Value,
}

#[derive(Debug, Serialize)]
pub struct EncodingResponse {
  pub message:  String,
  #[serde(rename = "employee")]
  pub subject:  Subject,
}

/// `POST /employees/:id/face-encoding`, body `{"faceEncoding": <blob>}`
///
/// Stores the encoding verbatim; the oracle is not consulted.
pub async fn set_encoding<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<EncodingBody>,
) -> Result<Json<EncodingResponse>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let raw = match body.face_encoding {
    Value::Null => String::new(),
    Value::String(s) => s,
    other => other.to_string(),
  };
  let subject = state.service.set_encoding(id, raw).await?;
  Ok(Json(EncodingResponse {
    message: "Face encoding updated successfully".into(),
    subject,
  }))
}
