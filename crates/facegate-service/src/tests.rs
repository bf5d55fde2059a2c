//! Orchestrator tests against an in-memory SQLite store, a scripted oracle,
//! and a temporary image directory.

use std::{
  collections::VecDeque,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use super::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use facegate_core::{
  Error,
  notify::{PublishError, ScanEvent},
  oracle::{EncodeOutcome, FailureReason, OracleFailure, RecognizeOutcome},
  scan::{
    ClientInfo, NewScanAttempt, ResolvedScan, ScanAttempt, ScanOutcome,
    unknown_subject_note,
  },
  store::{
    HistoryPage, HistoryQuery, PurgeFilter, PurgeReport, ScanCounts, StoreBackend,
  },
  subject::{DeletedSubject, FaceEncoding, NewSubject, Subject, SubjectPatch},
};
use facegate_store_sqlite::SqliteStore;
use futures::StreamExt as _;
use tempfile::TempDir;
use uuid::Uuid;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0];
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// Answers from a queue; an empty queue behaves like an unreachable oracle.
#[derive(Default)]
struct ScriptedOracle {
  encodes:    Mutex<VecDeque<EncodeOutcome>>,
  recognizes: Mutex<VecDeque<RecognizeOutcome>>,
  calls:      AtomicUsize,
}

impl ScriptedOracle {
  fn encode_next(&self, outcome: EncodeOutcome) {
    self.encodes.lock().unwrap().push_back(outcome);
  }

  fn recognize_next(&self, outcome: RecognizeOutcome) {
    self.recognizes.lock().unwrap().push_back(outcome);
  }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl RecognitionOracle for ScriptedOracle {
  async fn encode(&self, _image: Bytes) -> EncodeOutcome {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let next = self.encodes.lock().unwrap().pop_front();
    next.unwrap_or_else(|| EncodeOutcome::Failed(OracleFailure::unavailable("unscripted")))
  }

  async fn recognize(&self, _image: Bytes) -> RecognizeOutcome {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let next = self.recognizes.lock().unwrap().pop_front();
    next.unwrap_or_else(|| RecognizeOutcome::Failed(OracleFailure::unavailable("unscripted")))
  }
}

/// Never answers.
struct StalledOracle;

impl RecognitionOracle for StalledOracle {
  async fn encode(&self, _image: Bytes) -> EncodeOutcome {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    EncodeOutcome::Failed(OracleFailure::unavailable("stalled"))
  }

  async fn recognize(&self, _image: Bytes) -> RecognizeOutcome {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    RecognizeOutcome::Failed(OracleFailure::unavailable("stalled"))
  }
}

/// A fanout whose channel has gone away.
struct ClosedNotifier;

impl Notifier for ClosedNotifier {
  fn publish(&self, _event: ScanEvent) -> Result<usize, PublishError> {
    Err(PublishError::Closed)
  }
}

type StoreResult<T> = std::result::Result<T, facegate_store_sqlite::Error>;

/// SQLite underneath, with registry faults injected on request.
struct FaultyStore {
  inner:            SqliteStore,
  /// `find_by_identity` fails for this code.
  unreadable_code:  Option<&'static str>,
  /// Deleted just before the next scan row is appended.
  delete_on_append: Mutex<Option<Uuid>>,
}

impl StoreBackend for FaultyStore {
  type Error = facegate_store_sqlite::Error;
}

impl SubjectRegistry for FaultyStore {
  async fn insert_subject(&self, input: NewSubject) -> StoreResult<Subject> {
    self.inner.insert_subject(input).await
  }

  async fn get_subject(&self, id: Uuid) -> StoreResult<Option<Subject>> {
    self.inner.get_subject(id).await
  }

  async fn find_by_identity(&self, code: &str) -> StoreResult<Option<Subject>> {
    if self.unreadable_code == Some(code) {
      return Err(facegate_store_sqlite::Error::Decode("registry unreadable".into()));
    }
    self.inner.find_by_identity(code).await
  }

  async fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
    self.inner.list_subjects().await
  }

  async fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> StoreResult<Option<Subject>> {
    self.inner.update_subject(id, patch).await
  }

  async fn delete_subject(&self, id: Uuid) -> StoreResult<Option<DeletedSubject>> {
    self.inner.delete_subject(id).await
  }
}

impl AuditTrail for FaultyStore {
  async fn append_scan(&self, input: NewScanAttempt) -> StoreResult<ScanAttempt> {
    let doomed = self.delete_on_append.lock().unwrap().take();
    if let Some(id) = doomed {
      self.inner.delete_subject(id).await?;
    }
    self.inner.append_scan(input).await
  }

  async fn get_scan(&self, id: Uuid) -> StoreResult<Option<ResolvedScan>> {
    self.inner.get_scan(id).await
  }

  async fn history(&self, query: &HistoryQuery) -> StoreResult<HistoryPage> {
    self.inner.history(query).await
  }

  async fn counts(&self, since: DateTime<Utc>) -> StoreResult<ScanCounts> {
    self.inner.counts(since).await
  }

  async fn purge(&self, filter: PurgeFilter) -> StoreResult<PurgeReport> {
    self.inner.purge(filter).await
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

type Service = AccessService<SqliteStore, ScriptedOracle, Broadcaster>;

async fn service_with<O, N>(oracle: O, notifier: N) -> (AccessService<SqliteStore, O, N>, TempDir)
where
  O: RecognitionOracle + 'static,
  N: Notifier + 'static,
{
  let dir = tempfile::tempdir().unwrap();
  let store = SqliteStore::open_in_memory().await.unwrap();
  let svc = AccessService::new(
    Arc::new(store),
    Arc::new(oracle),
    Arc::new(notifier),
    ImageStore::new(dir.path()),
    Policy::default(),
  );
  (svc, dir)
}

async fn faulty_service(
  unreadable_code: Option<&'static str>,
) -> (AccessService<FaultyStore, ScriptedOracle, Broadcaster>, TempDir) {
  let dir = tempfile::tempdir().unwrap();
  let store = FaultyStore {
    inner: SqliteStore::open_in_memory().await.unwrap(),
    unreadable_code,
    delete_on_append: Mutex::new(None),
  };
  let svc = AccessService::new(
    Arc::new(store),
    Arc::new(ScriptedOracle::default()),
    Arc::new(Broadcaster::new(4)),
    ImageStore::new(dir.path()),
    Policy::default(),
  );
  (svc, dir)
}

async fn service() -> (Service, TempDir) {
  service_with(ScriptedOracle::default(), Broadcaster::new(16)).await
}

fn oracle(svc: &Service) -> &ScriptedOracle { &svc.oracle }

fn form(code: &str, name: &str) -> EnrollmentForm {
  EnrollmentForm {
    identity_code: code.into(),
    name:          name.into(),
    category:      "Engineering".into(),
    region:        "Lisbon".into(),
    birth_date:    "1990-04-12".into(),
    photo:         None,
  }
}

fn scan(image: &'static [u8]) -> ScanRequest {
  ScanRequest {
    image:  Bytes::from_static(image),
    client: ClientInfo {
      origin:   Some("10.1.2.3".into()),
      agent:    Some("kiosk/1.0".into()),
      location: Some("front door".into()),
    },
  }
}

fn matched(subject_ref: &str, confidence: f64) -> RecognizeOutcome {
  RecognizeOutcome::Matched { subject_ref: subject_ref.into(), confidence: Some(confidence) }
}

async fn enrolled(svc: &Service, code: &str, name: &str) -> Subject {
  oracle(svc).encode_next(EncodeOutcome::Encoded(FaceEncoding::new("[0.1,0.2]")));
  let mut f = form(code, name);
  f.photo = Some(Bytes::from_static(JPEG));
  svc.enroll(f).await.unwrap().subject
}

async fn all_scans(svc: &Service) -> Vec<ResolvedScan> {
  svc
    .history(HistoryQuery { page: 1, page_size: MAX_PAGE_SIZE, outcome: None })
    .await
    .unwrap()
    .rows
}

// ─── Verification ────────────────────────────────────────────────────────────

#[tokio::test]
async fn match_by_identity_code_grants_access_and_publishes() {
  let (svc, _dir) = service().await;
  let ada = enrolled(&svc, "EMP001", "Ada").await;
  let mut events = Box::pin(svc.notifier().subscribe_stream());

  oracle(&svc).recognize_next(matched("EMP001", 0.93));
  let verdict = svc.verify(scan(JPEG)).await.unwrap();

  assert!(verdict.recognized);
  assert_eq!(verdict.message, "Welcome, Ada!");
  assert_eq!(verdict.confidence, Some(0.93));
  assert_eq!(verdict.subject.as_ref().map(|s| s.subject_id), Some(ada.subject_id));

  let event = events.next().await.unwrap();
  assert_eq!(event.attempt_id, verdict.attempt_id);
  assert_eq!(event.outcome, ScanOutcome::Matched);
  assert_eq!(event.client_origin.as_deref(), Some("10.1.2.3"));

  let row = svc.get_scan(verdict.attempt_id).await.unwrap();
  assert_eq!(row.attempt.outcome, ScanOutcome::Matched);
  assert_eq!(row.attempt.subject_id, Some(ada.subject_id));
  assert_eq!(row.attempt.client.location.as_deref(), Some("front door"));
  let image = row.attempt.image_ref.expect("scan image stored");
  assert!(svc.images().resolve(&image).unwrap().exists());
}

#[tokio::test]
async fn match_by_registry_id_resolves_too() {
  let (svc, _dir) = service().await;
  let ada = enrolled(&svc, "EMP001", "Ada").await;

  oracle(&svc).recognize_next(matched(&ada.subject_id.to_string(), 0.8));
  let verdict = svc.verify(scan(JPEG)).await.unwrap();
  assert!(verdict.recognized);
}

#[tokio::test]
async fn non_match_is_denied_with_confidence_kept() {
  let (svc, _dir) = service().await;
  oracle(&svc).recognize_next(RecognizeOutcome::NotMatched { confidence: Some(0.41) });

  let verdict = svc.verify(scan(PNG)).await.unwrap();
  assert!(!verdict.recognized);
  assert!(verdict.subject.is_none());
  assert_eq!(verdict.confidence, Some(0.41));
  assert!(verdict.message.contains("Access denied"));

  let row = svc.get_scan(verdict.attempt_id).await.unwrap();
  assert_eq!(row.attempt.outcome, ScanOutcome::Unmatched);
  assert_eq!(row.attempt.notes.as_deref(), Some("no match"));
}

#[tokio::test]
async fn oracle_failure_is_recorded_as_error_not_denial() {
  let (svc, _dir) = service().await;
  oracle(&svc).recognize_next(RecognizeOutcome::Failed(OracleFailure::unavailable(
    "/recognize timed out after 30s",
  )));

  let err = svc.verify(scan(JPEG)).await.unwrap_err();
  let Error::OracleUnavailable { attempt_id, reason } = err else {
    panic!("expected OracleUnavailable");
  };
  assert_eq!(reason, FailureReason::Unavailable);
  assert!(Error::OracleUnavailable { attempt_id, reason }.is_retryable());

  let row = svc.get_scan(attempt_id).await.unwrap();
  assert_eq!(row.attempt.outcome, ScanOutcome::Error);
  assert!(row.attempt.subject_id.is_none());
  assert!(row.attempt.confidence.is_none());
  assert!(row.attempt.notes.unwrap().contains("timed out"));
  assert_eq!(oracle(&svc).calls(), 1, "never retried");
}

#[tokio::test]
async fn match_to_unknown_subject_is_unmatched_with_note() {
  let (svc, _dir) = service().await;
  oracle(&svc).recognize_next(matched("GHOST", 0.99));

  let verdict = svc.verify(scan(JPEG)).await.unwrap();
  assert!(!verdict.recognized);
  let row = svc.get_scan(verdict.attempt_id).await.unwrap();
  assert_eq!(row.attempt.outcome, ScanOutcome::Unmatched);
  assert!(row.attempt.subject_id.is_none());
  assert!(row.attempt.notes.unwrap().contains("GHOST"));
}

#[tokio::test]
async fn match_to_inactive_subject_is_denied() {
  let (svc, _dir) = service().await;
  let ada = enrolled(&svc, "EMP001", "Ada").await;
  svc
    .update_subject(ada.subject_id, SubjectUpdate { is_active: Some(false), ..Default::default() })
    .await
    .unwrap();

  oracle(&svc).recognize_next(matched("EMP001", 0.9));
  let verdict = svc.verify(scan(JPEG)).await.unwrap();
  assert!(!verdict.recognized);
  let row = svc.get_scan(verdict.attempt_id).await.unwrap();
  assert_eq!(row.attempt.notes.as_deref(), Some("subject inactive"));
}

#[tokio::test]
async fn match_to_subject_deleted_mid_attempt_is_recorded_unmatched() {
  let (svc, _dir) = faulty_service(None).await;
  let ada = svc.enroll(form("EMP001", "Ada")).await.unwrap().subject;
  *svc.store().delete_on_append.lock().unwrap() = Some(ada.subject_id);
  svc.oracle.recognize_next(matched("EMP001", 0.9));

  let verdict = svc.verify(scan(JPEG)).await.unwrap();
  assert!(!verdict.recognized);
  assert!(verdict.subject.is_none());
  assert!(verdict.message.contains("Access denied"));
  assert_eq!(verdict.confidence, Some(0.9));

  let row = svc.get_scan(verdict.attempt_id).await.unwrap();
  assert_eq!(row.attempt.outcome, ScanOutcome::Unmatched);
  assert!(row.attempt.subject_id.is_none());
  assert_eq!(
    row.attempt.notes,
    Some(unknown_subject_note(&ada.subject_id.to_string()))
  );
  assert_eq!(svc.stats().await.unwrap().matched, 0);
}

#[tokio::test]
async fn failed_subject_lookup_still_records_the_attempt() {
  let (svc, _dir) = faulty_service(Some("EMP404")).await;
  svc.oracle.recognize_next(matched("EMP404", 0.9));

  let err = svc.verify(scan(JPEG)).await.unwrap_err();
  assert!(matches!(err, Error::Storage(_)), "{err:?}");

  let rows = svc
    .history(HistoryQuery { page: 1, page_size: 10, outcome: None })
    .await
    .unwrap()
    .rows;
  assert_eq!(rows.len(), 1);
  let row = &rows[0].attempt;
  assert_eq!(row.outcome, ScanOutcome::Error);
  assert!(row.subject_id.is_none());
  assert!(row.confidence.is_none());
  assert!(row.notes.as_deref().unwrap().starts_with("subject lookup failed"));
}

#[tokio::test]
async fn invalid_image_is_rejected_before_the_oracle() {
  let (svc, _dir) = service().await;

  let err = svc.verify(scan(b"not an image at all")).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  let err = svc.verify(scan(b"")).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  assert_eq!(oracle(&svc).calls(), 0);
  assert!(all_scans(&svc).await.is_empty());
}

#[tokio::test]
async fn abandoning_before_the_oracle_answers_writes_nothing() {
  let (svc, _dir) = service_with(StalledOracle, Broadcaster::new(4)).await;

  let attempt = tokio::time::timeout(Duration::from_millis(50), svc.verify(scan(JPEG))).await;
  assert!(attempt.is_err(), "call should still be waiting on the oracle");

  let counts = svc.stats().await.unwrap();
  assert_eq!(counts.total, 0);
}

#[tokio::test]
async fn closed_fanout_does_not_fail_the_attempt() {
  let (svc, _dir) = service_with(ScriptedOracle::default(), ClosedNotifier).await;
  svc
    .oracle
    .recognize_next(RecognizeOutcome::NotMatched { confidence: None });

  let verdict = svc.verify(scan(JPEG)).await.unwrap();
  assert!(svc.get_scan(verdict.attempt_id).await.is_ok());
}

#[tokio::test]
async fn every_attempt_is_one_row() {
  let (svc, _dir) = service().await;
  enrolled(&svc, "EMP001", "Ada").await;
  oracle(&svc).recognize_next(matched("EMP001", 0.9));
  oracle(&svc).recognize_next(RecognizeOutcome::NotMatched { confidence: None });
  oracle(&svc).recognize_next(RecognizeOutcome::Failed(OracleFailure::new(
    FailureReason::BadResponse,
    "garbage",
  )));

  svc.verify(scan(JPEG)).await.unwrap();
  svc.verify(scan(JPEG)).await.unwrap();
  svc.verify(scan(JPEG)).await.unwrap_err();

  let stats = svc.stats().await.unwrap();
  assert_eq!((stats.total, stats.today), (3, 3));
  assert_eq!((stats.matched, stats.unmatched, stats.errors), (1, 1, 1));
  assert_eq!(stats.success_rate_percent, 33.33);
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_identity_is_rejected_and_first_survives() {
  let (svc, _dir) = service().await;
  let first = svc.enroll(form("EMP001", "Ada")).await.unwrap().subject;

  let err = svc.enroll(form("EMP001", "Grace")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateIdentity(code) if code == "EMP001"));

  let kept = svc.get_subject(first.subject_id).await.unwrap();
  assert_eq!(kept.name, "Ada");
  assert_eq!(svc.list_subjects().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unencodable_photo_enrolls_without_encoding() {
  let (svc, _dir) = service().await;
  oracle(&svc).encode_next(EncodeOutcome::Failed(OracleFailure::new(
    FailureReason::NoFace,
    "no face detected",
  )));
  let mut f = form("EMP002", "Grace");
  f.photo = Some(Bytes::from_static(PNG));

  let enrolled = svc.enroll(f).await.unwrap();
  assert!(enrolled.subject.encoding.is_none());
  assert!(enrolled.warning.unwrap().contains("no face"));
  let image = enrolled.subject.image_ref.unwrap();
  assert!(svc.images().resolve(&image).unwrap().exists());
}

#[tokio::test]
async fn enrollment_requires_every_profile_field() {
  let (svc, _dir) = service().await;
  for blank in [
    EnrollmentForm { name: "  ".into(), ..form("EMP003", "x") },
    EnrollmentForm { identity_code: String::new(), ..form("EMP003", "x") },
    EnrollmentForm { birth_date: "12/04/1990".into(), ..form("EMP003", "x") },
  ] {
    assert!(matches!(svc.enroll(blank).await, Err(Error::Validation(_))));
  }
  assert_eq!(oracle(&svc).calls(), 0);
}

#[tokio::test]
async fn reenrollment_keeps_encoding_when_new_photo_fails() {
  let (svc, _dir) = service().await;
  let ada = enrolled(&svc, "EMP001", "Ada").await;
  let old_image = ada.image_ref.clone().unwrap();

  // No photo: profile only.
  let updated = svc
    .update_subject(ada.subject_id, SubjectUpdate {
      region: Some("Porto".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .subject;
  assert_eq!(updated.region, "Porto");
  assert_eq!(updated.encoding, ada.encoding);
  assert_eq!(updated.image_ref, ada.image_ref);

  // New photo the oracle cannot encode: image replaced, encoding kept.
  oracle(&svc).encode_next(EncodeOutcome::Failed(OracleFailure::unavailable("down")));
  let updated = svc
    .update_subject(ada.subject_id, SubjectUpdate {
      photo: Some(Bytes::from_static(PNG)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(updated.warning.is_some());
  assert_eq!(updated.subject.encoding, ada.encoding);
  assert_ne!(updated.subject.image_ref.as_deref(), Some(old_image.as_str()));
  assert!(!svc.images().resolve(&old_image).unwrap().exists());
  assert!(updated.subject.updated_at >= ada.updated_at);
}

#[tokio::test]
async fn identity_code_is_immutable() {
  let (svc, _dir) = service().await;
  let ada = svc.enroll(form("EMP001", "Ada")).await.unwrap().subject;
  let err = svc
    .update_subject(ada.subject_id, SubjectUpdate {
      identity_code: Some("EMP999".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn set_encoding_bypasses_the_oracle() {
  let (svc, _dir) = service().await;
  let ada = svc.enroll(form("EMP001", "Ada")).await.unwrap().subject;

  assert!(matches!(
    svc.set_encoding(ada.subject_id, "   ".into()).await,
    Err(Error::Validation(_))
  ));
  let s = svc.set_encoding(ada.subject_id, "[1,2,3]".into()).await.unwrap();
  assert_eq!(s.encoding, Some(FaceEncoding::new("[1,2,3]")));
  assert_eq!(oracle(&svc).calls(), 0);
}

#[tokio::test]
async fn delete_needs_confirmation_and_detaches_history() {
  let (svc, _dir) = service().await;
  let ada = enrolled(&svc, "EMP001", "Ada").await;
  let photo = ada.image_ref.clone().unwrap();
  for _ in 0..2 {
    oracle(&svc).recognize_next(matched("EMP001", 0.9));
    svc.verify(scan(JPEG)).await.unwrap();
  }

  for confirm in [None, Some("EMP002")] {
    let err = svc.delete_subject(ada.subject_id, confirm).await.unwrap_err();
    assert!(matches!(err, Error::ConfirmationMismatch(_)));
  }

  let deleted = svc.delete_subject(ada.subject_id, Some("EMP001")).await.unwrap();
  assert_eq!(deleted.detached_scans, 2);
  assert!(!svc.images().resolve(&photo).unwrap().exists());
  assert!(matches!(
    svc.get_subject(ada.subject_id).await,
    Err(Error::SubjectNotFound(_))
  ));

  let rows = all_scans(&svc).await;
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|r| r.subject.is_none() && r.attempt.subject_id.is_none()));
  assert!(rows.iter().all(|r| r.attempt.outcome == ScanOutcome::Matched));
}

// ─── History & retention ─────────────────────────────────────────────────────

#[tokio::test]
async fn history_normalises_paging() {
  let (svc, _dir) = service().await;
  for _ in 0..3 {
    oracle(&svc).recognize_next(RecognizeOutcome::NotMatched { confidence: None });
    svc.verify(scan(JPEG)).await.unwrap();
  }

  let page = svc
    .history(HistoryQuery { page: 0, page_size: 0, outcome: None })
    .await
    .unwrap();
  assert_eq!(page.current_page, 1);
  assert_eq!(page.rows.len(), 1);
  assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn purge_never_touches_matched_rows() {
  let (svc, _dir) = service().await;
  enrolled(&svc, "EMP001", "Ada").await;
  oracle(&svc).recognize_next(matched("EMP001", 0.9));
  oracle(&svc).recognize_next(RecognizeOutcome::NotMatched { confidence: None });
  oracle(&svc).recognize_next(RecognizeOutcome::Failed(OracleFailure::unavailable("x")));
  svc.verify(scan(JPEG)).await.unwrap();
  let denied = svc.verify(scan(JPEG)).await.unwrap();
  svc.verify(scan(JPEG)).await.unwrap_err();
  let denied_image = svc.get_scan(denied.attempt_id).await.unwrap().attempt.image_ref.unwrap();

  // Everything is fresh, so age-bound purges find nothing.
  assert_eq!(svc.purge(PurgeMode::RetentionWindow).await.unwrap().removed, 0);
  assert_eq!(svc.purge(PurgeMode::OlderThan(1)).await.unwrap().removed, 0);

  let summary = svc.purge(PurgeMode::AllUnmatchedAndErrors).await.unwrap();
  assert_eq!(summary.removed, 2);
  assert!(summary.cutoff.is_none());
  assert!(!svc.images().resolve(&denied_image).unwrap().exists());

  let stats = svc.stats().await.unwrap();
  assert_eq!((stats.total, stats.matched), (1, 1));
  assert_eq!(stats.success_rate_percent, 100.0);
}
