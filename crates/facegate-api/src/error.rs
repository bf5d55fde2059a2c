//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use facegate_core::Error;
use facegate_service::TRY_AGAIN;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The oracle failed; the attempt was still recorded under `scan_id`.
  #[error("recognition unavailable for scan {scan_id}")]
  Unavailable { scan_id: Uuid },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<Error> for ApiError {
  fn from(err: Error) -> Self {
    match err {
      Error::Validation(m) => Self::BadRequest(m),
      Error::ConfirmationMismatch(_) => Self::BadRequest(
        "deletion must be confirmed with ?confirm=<identity code>".into(),
      ),
      Error::DuplicateIdentity(code) => {
        Self::Conflict(format!("identity code {code:?} already exists"))
      }
      Error::SubjectNotFound(id) => Self::NotFound(format!("employee {id} not found")),
      Error::ScanNotFound(id) => Self::NotFound(format!("scan {id} not found")),
      Error::OracleUnavailable { attempt_id, .. } => Self::Unavailable { scan_id: attempt_id },
      Error::Storage(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Unavailable { scan_id } => (
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": "Face recognition failed", "message": TRY_AGAIN, "scanId": scan_id }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed in storage");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
