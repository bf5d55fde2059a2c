//! Buffering of `multipart/form-data` bodies.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::ApiError;

/// Text fields and file parts of one multipart body, keyed by field name.
#[derive(Debug, Default)]
pub struct FormData {
  text:  HashMap<String, String>,
  files: HashMap<String, Bytes>,
}

impl FormData {
  /// Buffer every field. Fields named in `file_fields` are kept as raw
  /// bytes whether or not the client sent a filename; all others are text.
  pub async fn collect(
    mut multipart: Multipart,
    file_fields: &[&str],
  ) -> Result<Self, ApiError> {
    let mut form = Self::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
      let Some(name) = field.name().map(str::to_owned) else {
        continue;
      };
      if file_fields.contains(&name.as_str()) {
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        form.files.insert(name, bytes);
      } else {
        let text = field.text().await.map_err(bad_multipart)?;
        form.text.insert(name, text);
      }
    }
    Ok(form)
  }

  /// The first present text field among `names`, which are aliases.
  pub fn text(&self, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| self.text.get(*n).cloned())
  }

  pub fn file(&mut self, name: &str) -> Option<Bytes> { self.files.remove(name) }

  pub fn flag(&self, names: &[&str]) -> Result<Option<bool>, ApiError> {
    self
      .text(names)
      .map(|v| match v.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ApiError::BadRequest(format!("{other:?} is not a boolean"))),
      })
      .transpose()
  }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
  ApiError::BadRequest(format!("malformed multipart body: {err}"))
}
