//! Verification: one captured image in, one audit row and one event out.
//!
//! An attempt moves through
//! `Capturing → AwaitingOracle → Recording | ErrorRecording → Notified`.
//! Everything up to and including the oracle call runs on the caller's task,
//! so a caller that goes away before the oracle answers leaves no trace.
//! Recording and notification run on a detached task and always complete
//! once the oracle has answered.

use bytes::Bytes;
use facegate_core::{
  Error, Result,
  image::ImageFormat,
  notify::{Notifier, PublishError, ScanEvent},
  oracle::{OracleFailure, RecognitionOracle, RecognizeOutcome},
  scan::{ClientInfo, NewScanAttempt, unknown_subject_note},
  subject::Subject,
};
use serde::Serialize;
use strum::Display;
use uuid::Uuid;

use crate::{
  AccessService, AccessStore,
  images::{ImageKind, check_image},
};

/// Shown to the client when the oracle could not answer.
pub const TRY_AGAIN: &str =
  "Unable to process face recognition at this time. Please try again.";

const DENIED: &str = "You are not an employee here. Access denied.";

#[derive(Debug, Clone, Copy, Display)]
#[strum(serialize_all = "snake_case")]
enum Phase {
  Capturing,
  AwaitingOracle,
  Recording,
  ErrorRecording,
  Notified,
}

/// A captured image plus where it came from.
#[derive(Debug, Clone)]
pub struct ScanRequest {
  pub image:  Bytes,
  pub client: ClientInfo,
}

/// What the capturing station is told.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
  /// True only for a `matched` attempt.
  pub recognized: bool,
  #[serde(rename = "employee")]
  pub subject:    Option<Subject>,
  pub confidence: Option<f64>,
  #[serde(rename = "scanId")]
  pub attempt_id: Uuid,
  pub message:    String,
}

/// Why an attempt was recorded as `error`.
enum Fault {
  Oracle(OracleFailure),
  /// The oracle answered but the registry could not be read.
  Lookup(Error),
}

/// An oracle answer checked against the registry, ready to be written.
struct Classified {
  draft:   NewScanAttempt,
  subject: Option<Subject>,
  fault:   Option<Fault>,
}

impl<S, O, N> AccessService<S, O, N>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
  N: Notifier + 'static,
{
  /// Run one verification attempt.
  ///
  /// Invalid input fails with [`Error::Validation`] before the oracle is
  /// called and records nothing. An oracle failure is recorded as an `error`
  /// attempt and then surfaced as [`Error::OracleUnavailable`]. A registry
  /// failure while resolving a match is likewise recorded as `error` before
  /// it is returned.
  pub async fn verify(&self, request: ScanRequest) -> Result<Verdict> {
    tracing::debug!(phase = %Phase::Capturing, bytes = request.image.len());
    let format =
      check_image(&request.image, self.policy.limits.max_scan_bytes, "scan")?;

    tracing::debug!(phase = %Phase::AwaitingOracle);
    let outcome = self.oracle.recognize(request.image.clone()).await;

    let this = self.clone();
    tokio::spawn(async move { this.record(outcome, request, format).await })
      .await
      .map_err(|e| Error::Storage(Box::new(e)))?
  }

  async fn record(
    &self,
    outcome: RecognizeOutcome,
    request: ScanRequest,
    format: ImageFormat,
  ) -> Result<Verdict> {
    let Classified { draft, subject, fault } = self.classify(outcome).await;
    let phase = if fault.is_some() { Phase::ErrorRecording } else { Phase::Recording };
    tracing::debug!(%phase, outcome = %draft.outcome());

    let image_ref = match self.images.save(ImageKind::Scan, format, &request.image).await {
      Ok(r) => Some(r),
      Err(e) => {
        tracing::warn!(error = %e, "scan image not stored; recording attempt without it");
        None
      }
    };

    let draft = draft.with_image(image_ref.clone()).with_client(request.client);
    let attempt = match self.store.append_scan(draft).await {
      Ok(a) => a,
      Err(e) => {
        if let Some(r) = image_ref {
          self.images.discard(&r).await;
        }
        return Err(Error::from_store(e));
      }
    };
    // The store demotes a match whose subject was deleted after lookup.
    let subject = subject.filter(|_| attempt.subject_id.is_some());

    match self.notifier.publish(ScanEvent::from_attempt(&attempt, subject.clone())) {
      Ok(observers) => tracing::debug!(phase = %Phase::Notified, observers),
      Err(PublishError::NoObservers) => tracing::debug!(phase = %Phase::Notified, observers = 0),
      Err(e) => tracing::warn!(error = %e, "scan result not published"),
    }

    tracing::info!(
      attempt_id = %attempt.attempt_id,
      outcome = %attempt.outcome,
      subject_id = ?attempt.subject_id,
      confidence = ?attempt.confidence,
      origin = ?attempt.client.origin,
      "scan recorded"
    );

    match fault {
      Some(Fault::Oracle(failure)) => {
        return Err(Error::OracleUnavailable {
          attempt_id: attempt.attempt_id,
          reason:     failure.reason,
        });
      }
      Some(Fault::Lookup(e)) => return Err(e),
      None => {}
    }

    let recognized = attempt.outcome.grants_access();
    let message = match &subject {
      Some(s) if recognized => format!("Welcome, {}!", s.name),
      _ => DENIED.to_owned(),
    };
    Ok(Verdict {
      recognized,
      subject,
      confidence: attempt.confidence,
      attempt_id: attempt.attempt_id,
      message,
    })
  }

  async fn classify(&self, outcome: RecognizeOutcome) -> Classified {
    match outcome {
      RecognizeOutcome::Failed(failure) => {
        tracing::warn!(%failure, "oracle failed during verification");
        Classified {
          draft:   NewScanAttempt::error(failure.to_string()),
          subject: None,
          fault:   Some(Fault::Oracle(failure)),
        }
      }
      RecognizeOutcome::NotMatched { confidence } => Classified {
        draft:   NewScanAttempt::unmatched(confidence, "no match"),
        subject: None,
        fault:   None,
      },
      RecognizeOutcome::Matched { subject_ref, confidence } => {
        match self.resolve_subject(&subject_ref).await {
          Err(e) => {
            tracing::error!(%subject_ref, error = %e, "subject lookup failed after oracle match");
            Classified {
              draft:   NewScanAttempt::error(format!("subject lookup failed: {e}")),
              subject: None,
              fault:   Some(Fault::Lookup(e)),
            }
          }
          Ok(Some(s)) if s.is_active => Classified {
            draft:   NewScanAttempt::matched(s.subject_id, confidence),
            subject: Some(s),
            fault:   None,
          },
          Ok(Some(s)) => {
            tracing::info!(subject_id = %s.subject_id, "oracle matched an inactive subject");
            Classified {
              draft:   NewScanAttempt::unmatched(confidence, "subject inactive"),
              subject: None,
              fault:   None,
            }
          }
          Ok(None) => {
            tracing::warn!(%subject_ref, "oracle matched a subject the registry does not know");
            Classified {
              draft:   NewScanAttempt::unmatched(confidence, unknown_subject_note(&subject_ref)),
              subject: None,
              fault:   None,
            }
          }
        }
      }
    }
  }

  /// The oracle may name a subject by registry id or by identity code.
  async fn resolve_subject(&self, subject_ref: &str) -> Result<Option<Subject>> {
    if let Ok(id) = Uuid::parse_str(subject_ref) {
      let found = self.store.get_subject(id).await.map_err(Error::from_store)?;
      if found.is_some() {
        return Ok(found);
      }
    }
    self
      .store
      .find_by_identity(subject_ref)
      .await
      .map_err(Error::from_store)
  }
}
