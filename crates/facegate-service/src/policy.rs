//! Tunable limits and retention defaults.

use serde::Deserialize;

const MIB: usize = 1024 * 1024;

/// Upload size ceilings, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
  pub max_scan_bytes:  usize,
  pub max_photo_bytes: usize,
}

impl Default for Limits {
  fn default() -> Self { Self { max_scan_bytes: 10 * MIB, max_photo_bytes: 5 * MIB } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Retention {
  /// Age, in hours, past which a default purge removes non-matched rows.
  pub default_window_hours: u32,
}

impl Default for Retention {
  fn default() -> Self { Self { default_window_hours: 24 } }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Policy {
  pub limits:    Limits,
  pub retention: Retention,
}
