//! Read-side aggregates over the audit trail, plus retention purges.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use facegate_core::{
  Error, Result,
  notify::Notifier,
  oracle::RecognitionOracle,
  scan::ResolvedScan,
  store::{HistoryPage, HistoryQuery, PurgeFilter, ScanCounts},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AccessService, AccessStore};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Counters over the whole audit trail, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanStats {
  #[serde(rename = "totalScans")]
  pub total:                u64,
  /// Attempts since local midnight.
  #[serde(rename = "todayScans")]
  pub today:                u64,
  #[serde(rename = "successScans")]
  pub matched:              u64,
  #[serde(rename = "failedScans")]
  pub unmatched:            u64,
  #[serde(rename = "errorScans")]
  pub errors:               u64,
  /// `matched / total` as a percentage rounded to two places; `0` when empty.
  #[serde(rename = "successRate")]
  pub success_rate_percent: f64,
}

impl ScanStats {
  pub fn from_counts(counts: ScanCounts) -> Self {
    let success_rate_percent = if counts.total == 0 {
      0.0
    } else {
      let pct = counts.matched as f64 / counts.total as f64 * 100.0;
      (pct * 100.0).round() / 100.0
    };
    Self {
      total: counts.total,
      today: counts.since,
      matched: counts.matched,
      unmatched: counts.unmatched,
      errors: counts.errors,
      success_rate_percent,
    }
  }
}

/// Which non-matched rows a purge removes. `matched` rows are never purged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurgeMode {
  /// Every `unmatched` and `error` row, whatever its age.
  AllUnmatchedAndErrors,
  /// Non-matched rows older than this many hours.
  OlderThan(u32),
  /// Non-matched rows older than the configured retention window.
  #[default]
  RetentionWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
  pub removed: u64,
  /// Rows at or after this instant were kept; `None` for an age-blind purge.
  pub cutoff:  Option<DateTime<Utc>>,
}

/// The most recent local midnight, in UTC.
fn local_midnight(now: DateTime<Local>) -> DateTime<Utc> {
  let naive = now.date_naive().and_time(NaiveTime::MIN);
  naive
    .and_local_timezone(Local)
    .earliest()
    .map_or_else(|| naive.and_utc(), |t| t.with_timezone(&Utc))
}

impl<S, O, N> AccessService<S, O, N>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
  N: Notifier + 'static,
{
  pub async fn stats(&self) -> Result<ScanStats> {
    let since = local_midnight(Local::now());
    let counts = self.store.counts(since).await.map_err(Error::from_store)?;
    Ok(ScanStats::from_counts(counts))
  }

  /// One page of the audit trail, newest first. Page numbers below 1 are
  /// read as 1 and page sizes are clamped to `1..=MAX_PAGE_SIZE`.
  pub async fn history(&self, query: HistoryQuery) -> Result<HistoryPage> {
    let query = HistoryQuery {
      page:      query.page.max(1),
      page_size: query.page_size.clamp(1, MAX_PAGE_SIZE),
      outcome:   query.outcome,
    };
    self.store.history(&query).await.map_err(Error::from_store)
  }

  pub async fn get_scan(&self, id: Uuid) -> Result<ResolvedScan> {
    self
      .store
      .get_scan(id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::ScanNotFound(id))
  }

  /// Delete non-matched audit rows selected by `mode`, along with their
  /// stored images.
  pub async fn purge(&self, mode: PurgeMode) -> Result<PurgeSummary> {
    let hours = match mode {
      PurgeMode::AllUnmatchedAndErrors => None,
      PurgeMode::OlderThan(h) => Some(h),
      PurgeMode::RetentionWindow => Some(self.policy.retention.default_window_hours),
    };
    let cutoff = hours.map(|h| Utc::now() - Duration::hours(i64::from(h)));
    let filter = PurgeFilter { before: cutoff, include_matched: false };

    let report = self.store.purge(filter).await.map_err(Error::from_store)?;
    for image_ref in &report.image_refs {
      self.images.discard(image_ref).await;
    }
    tracing::info!(?mode, removed = report.removed, ?cutoff, "scan history purged");
    Ok(PurgeSummary { removed: report.removed, cutoff })
  }
}
