//! Error types for `facegate-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::oracle::FailureReason;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad input, rejected before any external call.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("identity code {0:?} is already enrolled")]
  DuplicateIdentity(String),

  /// The oracle could not be reached or answered garbage. The attempt has
  /// already been recorded with outcome `error`.
  #[error("recognition service unavailable ({reason}); attempt {attempt_id} recorded")]
  OracleUnavailable {
    attempt_id: Uuid,
    reason:     FailureReason,
  },

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("scan attempt not found: {0}")]
  ScanNotFound(Uuid),

  #[error("delete of subject {0} requires a matching confirmation token")]
  ConfirmationMismatch(Uuid),

  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Translate a backend error, lifting uniqueness violations into
  /// [`Error::DuplicateIdentity`].
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.duplicate_identity() {
      Some(code) => Self::DuplicateIdentity(code.to_owned()),
      None => Self::Storage(Box::new(err)),
    }
  }

  /// Whether the caller may simply try the same request again.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::OracleUnavailable { .. })
  }
}

/// Classification hook implemented by storage backend errors.
///
/// Orchestrators never see backend-specific error types; they only need to
/// know whether a write lost the identity-code uniqueness race.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The colliding identity code, when this error is a uniqueness violation
  /// on the subject registry.
  fn duplicate_identity(&self) -> Option<&str>;
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
