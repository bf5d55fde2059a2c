//! `GET /health`: liveness probe.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use facegate_core::oracle::RecognitionOracle;
use facegate_service::AccessStore;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
  pub status:         &'static str,
  pub timestamp:      DateTime<Utc>,
  pub uptime_seconds: u64,
}

/// `GET /health`
pub async fn handler<S, O>(State(state): State<Arc<AppState<S, O>>>) -> Json<Health>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  Json(Health {
    status:         "ok",
    timestamp:      Utc::now(),
    uptime_seconds: state.started.elapsed().as_secs(),
  })
}
