//! Async HTTP client for the recognition oracle.

use std::time::Duration;

use bytes::Bytes;
use facegate_core::{
  image::ImageFormat,
  oracle::{
    EncodeOutcome, FailureReason, OracleFailure, RecognitionOracle,
    RecognizeOutcome,
  },
};
use reqwest::{
  Client, StatusCode,
  multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
  Error, Result,
  wire::{EncodeBody, RecognizeBody},
};

/// Connection settings for the oracle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
  pub base_url:     String,
  pub timeout_secs: u64,
}

impl Default for OracleConfig {
  fn default() -> Self {
    Self { base_url: "http://localhost:8000".into(), timeout_secs: 30 }
  }
}

impl OracleConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// [`RecognitionOracle`] backed by the oracle's multipart HTTP endpoints.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpOracle {
  client:   Client,
  base_url: String,
  timeout:  Duration,
}

impl HttpOracle {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let base_url = base_url.into();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
      return Err(Error::BaseUrl(base_url));
    }
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_owned(),
      timeout,
    })
  }

  pub fn from_config(config: &OracleConfig) -> Result<Self> {
    Self::new(config.base_url.clone(), config.timeout())
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  /// Wrap `image` as the single `file` field the oracle expects.
  fn form(image: Bytes) -> reqwest::Result<Form> {
    let format = ImageFormat::sniff(&image);
    let name = format!("capture.{}", format.map_or("bin", ImageFormat::extension));
    let mut part = Part::bytes(image.to_vec()).file_name(name);
    if let Some(f) = format {
      part = part.mime_str(f.media_type())?;
    }
    Ok(Form::new().part("file", part))
  }

  /// POST `image` to `path` and decode the JSON body of a success response.
  /// Any other status is classified by `on_status`.
  async fn post_image<T: DeserializeOwned>(
    &self,
    path: &str,
    image: Bytes,
    on_status: impl FnOnce(StatusCode) -> OracleFailure,
  ) -> std::result::Result<T, OracleFailure> {
    let form = Self::form(image).map_err(|e| self.transport_failure(path, e))?;
    let resp = self
      .client
      .post(self.url(path))
      .multipart(form)
      .send()
      .await
      .map_err(|e| self.transport_failure(path, e))?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(path, %status, "oracle rejected request");
      return Err(on_status(status));
    }

    let body = resp.bytes().await.map_err(|e| self.transport_failure(path, e))?;
    serde_json::from_slice(&body).map_err(|e| {
      tracing::warn!(path, error = %e, "oracle sent an unparseable body");
      OracleFailure::new(FailureReason::BadResponse, format!("invalid JSON from {path}: {e}"))
    })
  }

  fn transport_failure(&self, path: &str, err: reqwest::Error) -> OracleFailure {
    let detail = if err.is_timeout() {
      format!("{path} timed out after {}s", self.timeout.as_secs_f32())
    } else if err.is_connect() {
      format!("could not connect to oracle at {}", self.base_url)
    } else {
      format!("{path} failed: {err}")
    };
    tracing::warn!(path, error = %err, "oracle call failed");
    OracleFailure::unavailable(detail)
  }
}

impl RecognitionOracle for HttpOracle {
  async fn encode(&self, image: Bytes) -> EncodeOutcome {
    let body = self
      .post_image::<EncodeBody>("/encode", image, |status| match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
          OracleFailure::new(FailureReason::NoFace, "no face detected")
        }
        other => OracleFailure::unavailable(format!("/encode returned {other}")),
      })
      .await;
    match body {
      Ok(body) => body.into_outcome(),
      Err(failure) => EncodeOutcome::Failed(failure),
    }
  }

  async fn recognize(&self, image: Bytes) -> RecognizeOutcome {
    let body = self
      .post_image::<RecognizeBody>("/recognize", image, |status| {
        OracleFailure::unavailable(format!("/recognize returned {status}"))
      })
      .await;
    match body {
      Ok(body) => body.into_outcome(),
      Err(failure) => RecognizeOutcome::Failed(failure),
    }
  }
}
