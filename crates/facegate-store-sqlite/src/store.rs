//! [`SqliteStore`] — the SQLite implementation of [`SubjectRegistry`] and
//! [`AuditTrail`].

use std::path::Path;

use chrono::{DateTime, Utc};
use facegate_core::{
  scan::{NewScanAttempt, ResolvedScan, ScanAttempt, ScanOutcome, unknown_subject_note},
  store::{
    AuditTrail, HistoryPage, HistoryQuery, PurgeFilter, PurgeReport, ScanCounts,
    StoreBackend, SubjectRegistry,
  },
  subject::{DeletedSubject, NewSubject, Subject, SubjectPatch},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use crate::{
  encode::{
    encode_date, encode_dt, encode_outcome, encode_uuid, now, RawScan, RawSubject,
    SCAN_JOIN_COLUMNS, SUBJECT_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subject registry and audit trail backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn backdate_scan(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE scans SET scanned_at = ?2 WHERE attempt_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn select_subject(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawSubject>> {
  conn
    .query_row(
      &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
      rusqlite::params![id_str],
      |row| RawSubject::from_row(row, 0),
    )
    .optional()
}

/// Shared `WHERE` clause for purges: `?1` is the cutoff (or `NULL` for any
/// age), `?2` whether matched rows are eligible.
const PURGE_WHERE: &str =
  "(?1 IS NULL OR scanned_at < ?1) AND (?2 OR outcome != 'matched')";

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl StoreBackend for SqliteStore {
  type Error = Error;
}

impl SubjectRegistry for SqliteStore {
  async fn insert_subject(&self, input: NewSubject) -> Result<Subject> {
    let at = now();
    let subject = Subject {
      subject_id:    Uuid::new_v4(),
      identity_code: input.identity_code,
      name:          input.name,
      category:      input.category,
      region:        input.region,
      birth_date:    input.birth_date,
      encoding:      input.encoding,
      image_ref:     input.image_ref,
      is_active:     true,
      created_at:    at,
      updated_at:    at,
    };

    let id_str    = encode_uuid(subject.subject_id);
    let code      = subject.identity_code.clone();
    let name      = subject.name.clone();
    let category  = subject.category.clone();
    let region    = subject.region.clone();
    let birth_str = encode_date(subject.birth_date);
    let encoding  = subject.encoding.clone().map(|e| e.into_inner());
    let image_ref = subject.image_ref.clone();
    let at_str    = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO subjects (
             subject_id, identity_code, name, category, region, birth_date,
             face_encoding, image_ref, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
          rusqlite::params![
            id_str, code, name, category, region, birth_str, encoding,
            image_ref, at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateIdentity(subject.identity_code));
    }
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| Ok(select_subject(conn, &id_str)?))
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn find_by_identity(&self, code: &str) -> Result<Option<Subject>> {
    let code = code.to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE identity_code = ?1"
              ),
              rusqlite::params![code],
              |row| RawSubject::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], |row| RawSubject::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(
    &self,
    id:    Uuid,
    patch: SubjectPatch,
  ) -> Result<Option<Subject>> {
    let id_str        = encode_uuid(id);
    let birth_str     = patch.birth_date.map(encode_date);
    let set_encoding  = patch.encoding.is_some();
    let encoding      = patch.encoding.flatten().map(|e| e.into_inner());
    let at_str        = encode_dt(now());

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // `MAX` keeps updated_at monotonic even if the wall clock steps back.
        let changed = tx.execute(
          "UPDATE subjects SET
             name          = COALESCE(?2, name),
             category      = COALESCE(?3, category),
             region        = COALESCE(?4, region),
             birth_date    = COALESCE(?5, birth_date),
             is_active     = COALESCE(?6, is_active),
             face_encoding = CASE WHEN ?7 THEN ?8 ELSE face_encoding END,
             image_ref     = COALESCE(?9, image_ref),
             updated_at    = MAX(updated_at, ?10)
           WHERE subject_id = ?1",
          rusqlite::params![
            id_str,
            patch.name,
            patch.category,
            patch.region,
            birth_str,
            patch.is_active,
            set_encoding,
            encoding,
            patch.image_ref,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = select_subject(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn delete_subject(&self, id: Uuid) -> Result<Option<DeletedSubject>> {
    let id_str = encode_uuid(id);

    let deleted: Option<(RawSubject, usize)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = select_subject(&tx, &id_str)? else {
          return Ok(None);
        };
        let detached = tx.execute(
          "UPDATE scans SET subject_id = NULL WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(Some((raw, detached)))
      })
      .await?;

    let Some((raw, detached)) = deleted else {
      return Ok(None);
    };
    let subject = raw.into_subject()?;
    debug!(
      subject_id = %subject.subject_id,
      detached,
      "deleted subject and detached its scans"
    );
    Ok(Some(DeletedSubject { subject, detached_scans: detached as u64 }))
  }
}

impl AuditTrail for SqliteStore {
  async fn append_scan(&self, input: NewScanAttempt) -> Result<ScanAttempt> {
    let attempt = input.into_attempt(Uuid::new_v4(), now());

    let id_str      = encode_uuid(attempt.attempt_id);
    let outcome_str = encode_outcome(attempt.outcome);
    let subject_str = attempt.subject_id.map(encode_uuid);
    let confidence  = attempt.confidence;
    let image_ref   = attempt.image_ref.clone();
    let origin      = attempt.client.origin.clone();
    let agent       = attempt.client.agent.clone();
    let location    = attempt.client.location.clone();
    let notes       = attempt.notes.clone();
    let at_str      = encode_dt(attempt.scanned_at);
    let vanished_note = subject_str.as_deref().map(unknown_subject_note);

    // A match whose subject was deleted after it was resolved is stored as
    // `unmatched`; a `matched` row always references a live subject.
    let vanished: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let present = match &subject_str {
          Some(id) => tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM subjects WHERE subject_id = ?1)",
            rusqlite::params![id],
            |row| row.get::<_, bool>(0),
          )?,
          None => true,
        };
        let (outcome_str, subject_str, notes) = if present {
          (outcome_str, subject_str, notes)
        } else {
          (encode_outcome(ScanOutcome::Unmatched), None, vanished_note)
        };
        tx.execute(
          "INSERT INTO scans (
             attempt_id, outcome, subject_id, confidence, image_ref,
             client_origin, client_agent, location, notes, scanned_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, outcome_str, subject_str, confidence, image_ref, origin,
            agent, location, notes, at_str,
          ],
        )?;
        tx.commit()?;
        Ok(!present)
      })
      .await?;

    if !vanished {
      return Ok(attempt);
    }
    debug!(
      attempt_id = %attempt.attempt_id,
      subject_id = ?attempt.subject_id,
      "matched subject vanished before the scan was recorded"
    );
    Ok(ScanAttempt {
      outcome: ScanOutcome::Unmatched,
      subject_id: None,
      notes: attempt.subject_id.map(|id| unknown_subject_note(&encode_uuid(id))),
      ..attempt
    })
  }

  async fn get_scan(&self, id: Uuid) -> Result<Option<ResolvedScan>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawScan> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SCAN_JOIN_COLUMNS}
                 FROM scans sc
                 LEFT JOIN subjects s ON s.subject_id = sc.subject_id
                 WHERE sc.attempt_id = ?1"
              ),
              rusqlite::params![id_str],
              RawScan::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawScan::into_resolved).transpose()
  }

  async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage> {
    let outcome_str = query.outcome.map(encode_outcome);
    let limit_val   = i64::from(query.page_size.max(1));
    let offset_val  = query.offset() as i64;

    let (total, raws): (i64, Vec<RawScan>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM scans WHERE ?1 IS NULL OR outcome = ?1",
          rusqlite::params![outcome_str],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {SCAN_JOIN_COLUMNS}
           FROM scans sc
           LEFT JOIN subjects s ON s.subject_id = sc.subject_id
           WHERE ?1 IS NULL OR sc.outcome = ?1
           ORDER BY sc.scanned_at DESC, sc.rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![outcome_str, limit_val, offset_val],
            RawScan::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let rows = raws
      .into_iter()
      .map(RawScan::into_resolved)
      .collect::<Result<Vec<_>>>()?;

    let total_count = total as u64;
    Ok(HistoryPage {
      rows,
      total_count,
      total_pages: total_count.div_ceil(limit_val as u64),
      current_page: query.page,
    })
  }

  async fn counts(&self, since: DateTime<Utc>) -> Result<ScanCounts> {
    let since_str = encode_dt(since);

    let (total, recent, matched, unmatched, errors): (i64, i64, i64, i64, i64) =
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT
               COUNT(*),
               COALESCE(SUM(scanned_at >= ?1), 0),
               COALESCE(SUM(outcome = 'matched'), 0),
               COALESCE(SUM(outcome = 'unmatched'), 0),
               COALESCE(SUM(outcome = 'error'), 0)
             FROM scans",
            rusqlite::params![since_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
          )?)
        })
        .await?;

    Ok(ScanCounts {
      total:     total as u64,
      since:     recent as u64,
      matched:   matched as u64,
      unmatched: unmatched as u64,
      errors:    errors as u64,
    })
  }

  async fn purge(&self, filter: PurgeFilter) -> Result<PurgeReport> {
    let before_str      = filter.before.map(encode_dt);
    let include_matched = filter.include_matched;

    let (removed, image_refs): (usize, Vec<String>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let refs = {
          let mut stmt = tx.prepare(&format!(
            "SELECT image_ref FROM scans
             WHERE {PURGE_WHERE} AND image_ref IS NOT NULL"
          ))?;
          stmt
            .query_map(rusqlite::params![before_str, include_matched], |row| {
              row.get(0)
            })?
            .collect::<rusqlite::Result<Vec<String>>>()?
        };
        let removed = tx.execute(
          &format!("DELETE FROM scans WHERE {PURGE_WHERE}"),
          rusqlite::params![before_str, include_matched],
        )?;
        tx.commit()?;
        Ok((removed, refs))
      })
      .await?;

    Ok(PurgeReport { removed: removed as u64, image_refs })
  }
}
