//! Scan attempts: the append-only audit trail of verification requests.
//!
//! Every verification request produces exactly one attempt, whatever the
//! oracle said. The subject reference is a weak back-pointer: deleting the
//! subject nulls it but never removes the attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::subject::Subject;

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// How a verification attempt ended. `Error` is an infrastructure failure and
/// is kept distinct from a confident non-match.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanOutcome {
  #[serde(alias = "success")]
  Matched,
  #[serde(alias = "failed")]
  Unmatched,
  Error,
}

impl ScanOutcome {
  pub fn grants_access(self) -> bool { matches!(self, Self::Matched) }
}

// ─── Client metadata ─────────────────────────────────────────────────────────

/// Where a scan came from, as reported by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
  /// Network origin (peer address).
  #[serde(rename = "ipAddress")]
  pub origin:   Option<String>,
  #[serde(rename = "userAgent")]
  pub agent:    Option<String>,
  /// Free-text location supplied by the capturing station.
  pub location: Option<String>,
}

// ─── Attempt ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAttempt {
  #[serde(rename = "scanId")]
  pub attempt_id: Uuid,
  #[serde(rename = "scanType")]
  pub outcome:    ScanOutcome,
  #[serde(rename = "employeeId")]
  pub subject_id: Option<Uuid>,
  /// In `[0, 1]` when the oracle supplied one; never invented.
  pub confidence: Option<f64>,
  #[serde(rename = "imagePath")]
  pub image_ref:  Option<String>,
  #[serde(flatten)]
  pub client:     ClientInfo,
  pub notes:      Option<String>,
  pub scanned_at: DateTime<Utc>,
}

/// An attempt joined with the subject it still references, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScan {
  #[serde(flatten)]
  pub attempt: ScanAttempt,
  #[serde(rename = "employee")]
  pub subject: Option<Subject>,
}

/// Audit note for an oracle match naming a subject the registry does not
/// hold, whether it never existed or was deleted before the row was written.
pub fn unknown_subject_note(subject_ref: &str) -> String {
  format!("oracle matched unknown subject {subject_ref:?}")
}

// ─── NewScanAttempt ──────────────────────────────────────────────────────────

/// Input to [`crate::store::AuditTrail::append_scan`].
///
/// Built through the outcome-specific constructors so that a subject
/// reference can only ever accompany a `matched` outcome.
#[derive(Debug, Clone)]
pub struct NewScanAttempt {
  outcome:    ScanOutcome,
  subject_id: Option<Uuid>,
  confidence: Option<f64>,
  notes:      Option<String>,
  pub image_ref: Option<String>,
  pub client:    ClientInfo,
}

impl NewScanAttempt {
  pub fn matched(subject_id: Uuid, confidence: Option<f64>) -> Self {
    Self {
      outcome: ScanOutcome::Matched,
      subject_id: Some(subject_id),
      confidence,
      notes: None,
      image_ref: None,
      client: ClientInfo::default(),
    }
  }

  pub fn unmatched(confidence: Option<f64>, notes: impl Into<String>) -> Self {
    Self {
      outcome: ScanOutcome::Unmatched,
      subject_id: None,
      confidence,
      notes: Some(notes.into()),
      image_ref: None,
      client: ClientInfo::default(),
    }
  }

  /// An infrastructure failure: no subject and no confidence, ever.
  pub fn error(cause: impl Into<String>) -> Self {
    Self {
      outcome: ScanOutcome::Error,
      subject_id: None,
      confidence: None,
      notes: Some(cause.into()),
      image_ref: None,
      client: ClientInfo::default(),
    }
  }

  pub fn with_image(mut self, image_ref: Option<String>) -> Self {
    self.image_ref = image_ref;
    self
  }

  pub fn with_client(mut self, client: ClientInfo) -> Self {
    self.client = client;
    self
  }

  pub fn outcome(&self) -> ScanOutcome { self.outcome }

  pub fn subject_id(&self) -> Option<Uuid> { self.subject_id }

  pub fn confidence(&self) -> Option<f64> { self.confidence }

  pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }

  /// Materialise the row the store will persist.
  pub fn into_attempt(self, attempt_id: Uuid, scanned_at: DateTime<Utc>) -> ScanAttempt {
    ScanAttempt {
      attempt_id,
      outcome: self.outcome,
      subject_id: self.subject_id,
      confidence: self.confidence,
      image_ref: self.image_ref,
      client: self.client,
      notes: self.notes,
      scanned_at,
    }
  }
}
