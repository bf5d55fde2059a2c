//! HTTP client for the external recognition oracle.
//!
//! [`HttpOracle`] implements [`facegate_core::oracle::RecognitionOracle`]
//! against the oracle's `POST /encode` and `POST /recognize` endpoints. Every
//! transport problem is folded into a tagged failure outcome; nothing here
//! retries.

mod client;
mod wire;

pub mod error;

pub use client::{HttpOracle, OracleConfig};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
