//! Real-time fanout of verification outcomes.
//!
//! Publication is fire-and-forget: a publisher never waits for observers, and
//! a failed publish never affects the attempt that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  scan::{ScanAttempt, ScanOutcome},
  subject::Subject,
};

/// Event name used on the wire for completed verification attempts.
pub const SCAN_RESULT_EVENT: &str = "scanResult";

/// Pushed to observers once per recorded verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
  #[serde(rename = "scanId")]
  pub attempt_id:    Uuid,
  #[serde(rename = "type")]
  pub outcome:       ScanOutcome,
  #[serde(rename = "employee")]
  pub subject:       Option<Subject>,
  pub confidence:    Option<f64>,
  pub timestamp:     DateTime<Utc>,
  #[serde(rename = "ipAddress")]
  pub client_origin: Option<String>,
}

impl ScanEvent {
  pub fn from_attempt(attempt: &ScanAttempt, subject: Option<Subject>) -> Self {
    Self {
      attempt_id: attempt.attempt_id,
      outcome: attempt.outcome,
      subject,
      confidence: attempt.confidence,
      timestamp: attempt.scanned_at,
      client_origin: attempt.client.origin.clone(),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
  #[error("no observers are subscribed")]
  NoObservers,
  #[error("fanout channel closed")]
  Closed,
}

/// A best-effort, non-blocking publisher.
pub trait Notifier: Send + Sync {
  /// Hand `event` to every current observer and return how many there were.
  /// Must not block.
  fn publish(&self, event: ScanEvent) -> Result<usize, PublishError>;
}
