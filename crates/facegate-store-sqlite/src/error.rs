//! Error type for `facegate-store-sqlite`.

use facegate_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain.
  #[error("corrupt column value: {0}")]
  Decode(String),

  /// The `UNIQUE (identity_code)` constraint rejected an insert.
  #[error("identity code {0:?} already exists")]
  DuplicateIdentity(String),
}

impl StoreError for Error {
  fn duplicate_identity(&self) -> Option<&str> {
    match self {
      Self::DuplicateIdentity(code) => Some(code),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
