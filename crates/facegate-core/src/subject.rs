//! Subject — an enrollable person.
//!
//! The identity code is assigned outside the system (a badge or employee
//! number) and never changes once written. The biometric reference is an
//! opaque blob produced by the oracle; nothing in this workspace interprets it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Encoding ────────────────────────────────────────────────────────────────

/// An oracle-defined biometric feature vector, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEncoding(String);

impl FaceEncoding {
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }

  pub fn is_empty(&self) -> bool { self.0.trim().is_empty() }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub subject_id:    Uuid,
  /// Externally-assigned unique code. Immutable after creation.
  pub identity_code: String,
  pub name:          String,
  /// Role or specialty label.
  pub category:      String,
  /// Locale or city label.
  pub region:        String,
  pub birth_date:    NaiveDate,
  /// `None` when enrolled without a usable photo; such subjects are never
  /// matched.
  #[serde(rename = "faceEncoding")]
  pub encoding:      Option<FaceEncoding>,
  /// Path relative to the configured image directory.
  #[serde(rename = "imagePath")]
  pub image_ref:     Option<String>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
  /// Server-assigned; never moves backwards.
  pub updated_at:    DateTime<Utc>,
}

impl Subject {
  pub fn has_encoding(&self) -> bool { self.encoding.is_some() }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::SubjectRegistry::insert_subject`].
/// Identifier and timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub identity_code: String,
  pub name:          String,
  pub category:      String,
  pub region:        String,
  pub birth_date:    NaiveDate,
  pub encoding:      Option<FaceEncoding>,
  pub image_ref:     Option<String>,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
  pub name:       Option<String>,
  pub category:   Option<String>,
  pub region:     Option<String>,
  pub birth_date: Option<NaiveDate>,
  pub is_active:  Option<bool>,
  /// `Some(None)` clears the stored encoding.
  pub encoding:   Option<Option<FaceEncoding>>,
  pub image_ref:  Option<String>,
}


/// What a hard delete removed, returned so callers can clean up files.
#[derive(Debug, Clone)]
pub struct DeletedSubject {
  pub subject:        Subject,
  /// Number of audit rows whose subject reference was nulled.
  pub detached_scans: u64,
}
