//! Error type for `facegate-oracle`.
//!
//! Only client construction can fail; call failures are outcomes, not errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid oracle base url {0:?}")]
  BaseUrl(String),

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
