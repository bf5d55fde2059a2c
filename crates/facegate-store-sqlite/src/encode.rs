//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals chronological
//! order. Calendar dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use facegate_core::{
  scan::{ClientInfo, ResolvedScan, ScanAttempt, ScanOutcome},
  subject::{FaceEncoding, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The store's clock, truncated to the stored precision so values read back
/// compare equal to values written.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── ScanOutcome ──────────────────────────────────────────────────────────────

pub fn encode_outcome(o: ScanOutcome) -> &'static str {
  match o {
    ScanOutcome::Matched => "matched",
    ScanOutcome::Unmatched => "unmatched",
    ScanOutcome::Error => "error",
  }
}

pub fn decode_outcome(s: &str) -> Result<ScanOutcome> {
  ScanOutcome::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown scan outcome: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubject::from_row`].
pub const SUBJECT_COLUMNS: &str = "subject_id, identity_code, name, category, \
   region, birth_date, face_encoding, image_ref, is_active, created_at, \
   updated_at";

/// Column list matching [`RawScan::from_row`], for a query that aliases
/// `scans` as `sc` and left-joins `subjects` as `s`.
pub const SCAN_JOIN_COLUMNS: &str = "sc.attempt_id, sc.outcome, sc.subject_id, \
   sc.confidence, sc.image_ref, sc.client_origin, sc.client_agent, \
   sc.location, sc.notes, sc.scanned_at, s.subject_id, s.identity_code, \
   s.name, s.category, s.region, s.birth_date, s.face_encoding, s.image_ref, \
   s.is_active, s.created_at, s.updated_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:    String,
  pub identity_code: String,
  pub name:          String,
  pub category:      String,
  pub region:        String,
  pub birth_date:    String,
  pub face_encoding: Option<String>,
  pub image_ref:     Option<String>,
  pub is_active:     bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawSubject {
  /// Read the eleven subject columns starting at `at`.
  pub fn from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:    row.get(at)?,
      identity_code: row.get(at + 1)?,
      name:          row.get(at + 2)?,
      category:      row.get(at + 3)?,
      region:        row.get(at + 4)?,
      birth_date:    row.get(at + 5)?,
      face_encoding: row.get(at + 6)?,
      image_ref:     row.get(at + 7)?,
      is_active:     row.get(at + 8)?,
      created_at:    row.get(at + 9)?,
      updated_at:    row.get(at + 10)?,
    })
  }

  /// Like [`Self::from_row`], but yields `None` when the columns come from
  /// an unmatched `LEFT JOIN`.
  pub fn from_joined_row(
    row: &rusqlite::Row<'_>,
    at: usize,
  ) -> rusqlite::Result<Option<Self>> {
    let id: Option<String> = row.get(at)?;
    if id.is_none() {
      return Ok(None);
    }
    Self::from_row(row, at).map(Some)
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:    decode_uuid(&self.subject_id)?,
      identity_code: self.identity_code,
      name:          self.name,
      category:      self.category,
      region:        self.region,
      birth_date:    decode_date(&self.birth_date)?,
      encoding:      self.face_encoding.map(FaceEncoding::new),
      image_ref:     self.image_ref,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `scans` row, optionally joined with its subject.
pub struct RawScan {
  pub attempt_id:    String,
  pub outcome:       String,
  pub subject_id:    Option<String>,
  pub confidence:    Option<f64>,
  pub image_ref:     Option<String>,
  pub client_origin: Option<String>,
  pub client_agent:  Option<String>,
  pub location:      Option<String>,
  pub notes:         Option<String>,
  pub scanned_at:    String,
  pub subject:       Option<RawSubject>,
}

impl RawScan {
  /// Read a row produced by a `SELECT` of [`SCAN_JOIN_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attempt_id:    row.get(0)?,
      outcome:       row.get(1)?,
      subject_id:    row.get(2)?,
      confidence:    row.get(3)?,
      image_ref:     row.get(4)?,
      client_origin: row.get(5)?,
      client_agent:  row.get(6)?,
      location:      row.get(7)?,
      notes:         row.get(8)?,
      scanned_at:    row.get(9)?,
      subject:       RawSubject::from_joined_row(row, 10)?,
    })
  }

  pub fn into_resolved(self) -> Result<ResolvedScan> {
    let attempt = ScanAttempt {
      attempt_id: decode_uuid(&self.attempt_id)?,
      outcome:    decode_outcome(&self.outcome)?,
      subject_id: self.subject_id.as_deref().map(decode_uuid).transpose()?,
      confidence: self.confidence,
      image_ref:  self.image_ref,
      client:     ClientInfo {
        origin:   self.client_origin,
        agent:    self.client_agent,
        location: self.location,
      },
      notes:      self.notes,
      scanned_at: decode_dt(&self.scanned_at)?,
    };
    let subject = self.subject.map(RawSubject::into_subject).transpose()?;
    Ok(ResolvedScan { attempt, subject })
  }
}
