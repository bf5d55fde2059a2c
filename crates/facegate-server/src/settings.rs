//! Server configuration: an optional TOML file overlaid by `FACEGATE_*`
//! environment variables. Nested keys use `__`, e.g.
//! `FACEGATE_ORACLE__BASE_URL=http://oracle:8000`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use facegate_oracle::OracleConfig;
use facegate_service::{Limits, Policy, Retention};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Root directory for scan captures and enrollment photos.
  pub image_dir:  PathBuf,
  pub oracle:     OracleConfig,
  pub limits:     Limits,
  pub retention:  Retention,
  pub events:     EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
  /// Events buffered per observer before a slow one starts skipping.
  pub capacity: usize,
}

impl Default for EventsConfig {
  fn default() -> Self { Self { capacity: 100 } }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       5000,
      store_path: PathBuf::from("facegate.db"),
      image_dir:  PathBuf::from("uploads"),
      oracle:     OracleConfig::default(),
      limits:     Limits::default(),
      retention:  Retention::default(),
      events:     EventsConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("FACEGATE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn policy(&self) -> Policy {
    Policy { limits: self.limits, retention: self.retention }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
