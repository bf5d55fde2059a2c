//! Handlers for `/scan` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/scan/recognize` | Multipart `image` + optional `location`; 503 on oracle failure |
//! | `GET`    | `/scan/history` | `?page&limit&type=matched\|unmatched\|error` |
//! | `GET`    | `/scan/history/:id` | 404 if not found |
//! | `DELETE` | `/scan/history` | `?olderThan=<hours>` or `?allFailed=true` |
//! | `GET`    | `/scan/stats` | |

use std::{str::FromStr as _, sync::Arc};

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
};
use facegate_core::{
  oracle::RecognitionOracle,
  scan::{ResolvedScan, ScanOutcome},
  store::{HistoryPage, HistoryQuery},
};
use facegate_service::{
  AccessStore, DEFAULT_PAGE_SIZE, PurgeMode, ScanRequest, ScanStats, Verdict,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, client::Client, error::ApiError, form::FormData};

const IMAGE: &str = "image";

// ─── Recognize ───────────────────────────────────────────────────────────────

/// `POST /scan/recognize`
pub async fn recognize<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Client(mut client): Client,
  multipart: Multipart,
) -> Result<Json<Verdict>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let mut form = FormData::collect(multipart, &[IMAGE]).await?;
  let image = form
    .file(IMAGE)
    .ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;
  client.location = form.text(&["location"]).filter(|l| !l.trim().is_empty());

  let verdict = state.service.verify(ScanRequest { image, client }).await?;
  Ok(Json(verdict))
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub page:    Option<u32>,
  pub limit:   Option<u32>,
  #[serde(rename = "type")]
  pub outcome: Option<String>,
}

/// Accept the current outcome names and the older `success`/`failed`.
fn parse_outcome(raw: &str) -> Result<ScanOutcome, ApiError> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "success" => Ok(ScanOutcome::Matched),
    "failed" => Ok(ScanOutcome::Unmatched),
    other => ScanOutcome::from_str(other)
      .map_err(|_| ApiError::BadRequest(format!("unknown scan type {raw:?}"))),
  }
}

/// `GET /scan/history[?page=&limit=&type=]`
pub async fn history<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let outcome = params
    .outcome
    .as_deref()
    .filter(|t| !t.is_empty())
    .map(parse_outcome)
    .transpose()?;
  let query = HistoryQuery {
    page:      params.page.unwrap_or(1),
    page_size: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    outcome,
  };
  Ok(Json(state.service.history(query).await?))
}

/// `GET /scan/history/:id`
pub async fn get_one<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedScan>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  Ok(Json(state.service.get_scan(id).await?))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /scan/stats`
pub async fn stats<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
) -> Result<Json<ScanStats>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  Ok(Json(state.service.stats().await?))
}

// ─── Purge ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeParams {
  pub older_than: Option<u32>,
  pub all_failed: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
  pub success:       bool,
  pub deleted_count: u64,
  pub message:       String,
}

/// `DELETE /scan/history[?olderThan=<hours>|allFailed=true]`
///
/// Without parameters, removes unmatched and error rows older than the
/// configured retention window. Matched rows are never removed.
pub async fn purge<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
  Query(params): Query<PurgeParams>,
) -> Result<Json<PurgeResponse>, ApiError>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let mode = match params {
    PurgeParams { all_failed: Some(true), .. } => PurgeMode::AllUnmatchedAndErrors,
    PurgeParams { older_than: Some(hours), .. } => PurgeMode::OlderThan(hours),
    _ => PurgeMode::default(),
  };
  let summary = state.service.purge(mode).await?;
  Ok(Json(PurgeResponse {
    success:       true,
    deleted_count: summary.removed,
    message:       format!("Successfully cleared {} old scan records", summary.removed),
  }))
}
