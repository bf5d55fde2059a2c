//! The recognition oracle contract.
//!
//! The oracle is an external service that owns the biometric model. This
//! crate only fixes the shape of its answers: every call resolves to a tagged
//! outcome, and transport trouble is folded into [`OracleFailure`] rather than
//! surfacing as an error the caller might confuse with a non-match.

use std::{fmt, future::Future};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::subject::FaceEncoding;

// ─── Failure ─────────────────────────────────────────────────────────────────

/// Why an oracle call produced no usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
  /// Timeout, connection failure, or a server-side error status.
  Unavailable,
  /// The image was processed but contained no usable face.
  NoFace,
  /// The oracle answered with something that does not fit the contract.
  BadResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleFailure {
  pub reason: FailureReason,
  /// Short human-readable cause, suitable for audit notes and logs.
  pub detail: String,
}

impl OracleFailure {
  pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
    Self { reason, detail: detail.into() }
  }

  pub fn unavailable(detail: impl Into<String>) -> Self {
    Self::new(FailureReason::Unavailable, detail)
  }
}

impl fmt::Display for OracleFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.reason, self.detail)
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`RecognitionOracle::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeOutcome {
  Encoded(FaceEncoding),
  Failed(OracleFailure),
}

/// Result of [`RecognitionOracle::recognize`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizeOutcome {
  /// The oracle claims the face belongs to `subject_ref`. The claim still has
  /// to be checked against the registry.
  Matched {
    subject_ref: String,
    confidence:  Option<f64>,
  },
  NotMatched {
    confidence: Option<f64>,
  },
  Failed(OracleFailure),
}

/// Keep a reported score only when it is a real probability.
pub fn sanitize_confidence(raw: Option<f64>) -> Option<f64> {
  raw.filter(|c| c.is_finite() && (0.0..=1.0).contains(c))
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the external recognizer/encoder.
///
/// Implementations are stateless proxies: no retries, no caching. Both calls
/// must be bounded by a timeout and must never panic on a bad answer.
pub trait RecognitionOracle: Send + Sync {
  /// Derive an encoding for the single face in `image`.
  fn encode(
    &self,
    image: Bytes,
  ) -> impl Future<Output = EncodeOutcome> + Send + '_;

  /// Look `image` up against the oracle's enrolled encodings.
  fn recognize(
    &self,
    image: Bytes,
  ) -> impl Future<Output = RecognizeOutcome> + Send + '_;
}
