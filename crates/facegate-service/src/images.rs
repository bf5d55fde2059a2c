//! On-disk storage for scan captures and enrollment photos.
//!
//! Image references are paths relative to the store root, e.g.
//! `scans/0b9c….jpg`. Only references produced by [`ImageStore::save`] are
//! ever resolved; anything that could escape the root is refused.

use std::{
  io,
  path::{Component, Path, PathBuf},
};

use facegate_core::{Error, Result, image::ImageFormat};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
  Scan,
  Subject,
}

impl ImageKind {
  fn dir(self) -> &'static str {
    match self {
      Self::Scan => "scans",
      Self::Subject => "subjects",
    }
  }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
  root: PathBuf,
}

impl ImageStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Write `bytes` under a fresh name and return its reference.
  pub async fn save(
    &self,
    kind: ImageKind,
    format: ImageFormat,
    bytes: &[u8],
  ) -> io::Result<String> {
    let dir = self.root.join(kind.dir());
    tokio::fs::create_dir_all(&dir).await?;
    let name = format!("{}.{}", Uuid::new_v4().simple(), format.extension());
    tokio::fs::write(dir.join(&name), bytes).await?;
    Ok(format!("{}/{name}", kind.dir()))
  }

  /// Map a stored reference back to a path under the root.
  pub fn resolve(&self, image_ref: &str) -> Option<PathBuf> {
    let rel = Path::new(image_ref);
    let safe = !image_ref.is_empty()
      && rel.components().all(|c| matches!(c, Component::Normal(_)));
    safe.then(|| self.root.join(rel))
  }

  /// Delete a stored image. A file that is already gone is not an error.
  pub async fn remove(&self, image_ref: &str) -> io::Result<bool> {
    let Some(path) = self.resolve(image_ref) else {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("refusing to remove {image_ref:?} outside the image store"),
      ));
    };
    match tokio::fs::remove_file(path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }

  /// Best-effort [`Self::remove`]; failures are logged, not returned.
  pub async fn discard(&self, image_ref: &str) {
    if let Err(e) = self.remove(image_ref).await {
      tracing::warn!(image_ref, error = %e, "failed to remove stored image");
    }
  }
}

/// Reject empty, oversized, or non-image uploads before any external call.
pub(crate) fn check_image(bytes: &[u8], limit: usize, what: &str) -> Result<ImageFormat> {
  if bytes.is_empty() {
    return Err(Error::Validation(format!("{what} image is empty")));
  }
  if bytes.len() > limit {
    return Err(Error::Validation(format!(
      "{what} image is {} bytes; the limit is {limit}",
      bytes.len()
    )));
  }
  ImageFormat::sniff(bytes).ok_or_else(|| {
    Error::Validation(format!(
      "{what} image must be JPEG, PNG, GIF, BMP, or WebP"
    ))
  })
}

pub(crate) fn storage(err: io::Error) -> Error { Error::Storage(Box::new(err)) }
