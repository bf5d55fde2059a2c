//! Storage traits for the subject registry and the audit trail, plus their
//! query types.
//!
//! Both traits are implemented by storage backends (e.g.
//! `facegate-store-sqlite`). Orchestrators depend on these abstractions, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  error::StoreError,
  scan::{NewScanAttempt, ResolvedScan, ScanAttempt, ScanOutcome},
  subject::{DeletedSubject, FaceEncoding, NewSubject, Subject, SubjectPatch},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AuditTrail::history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
  /// 1-based page number.
  pub page:      u32,
  pub page_size: u32,
  pub outcome:   Option<ScanOutcome>,
}

impl HistoryQuery {
  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
  }
}

/// One page of the audit trail, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
  #[serde(rename = "scans")]
  pub rows:         Vec<ResolvedScan>,
  pub total_count:  u64,
  pub total_pages:  u64,
  pub current_page: u32,
}

/// Raw counters over the audit trail. Rates are derived by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounts {
  pub total:     u64,
  /// Attempts at or after the `since` bound passed to [`AuditTrail::counts`].
  pub since:     u64,
  pub matched:   u64,
  pub unmatched: u64,
  pub errors:    u64,
}

/// Which audit rows a purge may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeFilter {
  /// Only rows strictly older than this instant; `None` means any age.
  pub before:          Option<DateTime<Utc>>,
  /// Whether `matched` rows are eligible. Retention policy keeps this `false`.
  pub include_matched: bool,
}

/// What a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
  pub removed:    u64,
  /// Stored-image references of the removed rows, for file cleanup.
  pub image_refs: Vec<String>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for a backend that implements both stores.
pub trait StoreBackend: Send + Sync {
  type Error: StoreError;
}

/// Durable store of enrollable subjects.
///
/// The identity code is unique at the storage level; an insert that loses a
/// race must fail with an error whose
/// [`StoreError::duplicate_identity`] returns the code.
pub trait SubjectRegistry: StoreBackend {
  /// Persist a new subject. The store assigns id and timestamps.
  fn insert_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Retrieve a subject by its external identity code.
  fn find_by_identity<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// All subjects, newest first.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Apply `patch` and bump `updated_at`. Returns `None` if not found.
  fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Overwrite (or clear) the stored encoding only.
  fn set_encoding(
    &self,
    id: Uuid,
    encoding: Option<FaceEncoding>,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_ {
    self.update_subject(id, SubjectPatch {
      encoding: Some(encoding),
      ..SubjectPatch::default()
    })
  }

  /// Remove the subject and null every audit reference to it, atomically.
  /// Returns `None` if not found.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DeletedSubject>, Self::Error>> + Send + '_;
}

/// Append-only log of verification attempts.
pub trait AuditTrail: StoreBackend {
  /// Persist one attempt. The store assigns id and timestamp. A subject
  /// reference to a subject deleted in the meantime is stored as `NULL`.
  fn append_scan(
    &self,
    input: NewScanAttempt,
  ) -> impl Future<Output = Result<ScanAttempt, Self::Error>> + Send + '_;

  /// One attempt joined with its subject. Returns `None` if not found.
  fn get_scan(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ResolvedScan>, Self::Error>> + Send + '_;

  /// One page of attempts, newest first, joined with their subjects.
  fn history<'a>(
    &'a self,
    query: &'a HistoryQuery,
  ) -> impl Future<Output = Result<HistoryPage, Self::Error>> + Send + 'a;

  /// Count attempts by outcome, plus those at or after `since`.
  fn counts(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<ScanCounts, Self::Error>> + Send + '_;

  /// Delete every row selected by `filter`.
  fn purge(
    &self,
    filter: PurgeFilter,
  ) -> impl Future<Output = Result<PurgeReport, Self::Error>> + Send + '_;
}
