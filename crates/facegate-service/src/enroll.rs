//! Enrollment, re-enrollment, and removal of subjects.
//!
//! A photo that the oracle cannot encode never blocks enrollment: the subject
//! is stored without an encoding and the caller gets a warning instead.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate};
use facegate_core::{
  Error, Result,
  image::ImageFormat,
  notify::Notifier,
  oracle::{EncodeOutcome, RecognitionOracle},
  subject::{DeletedSubject, FaceEncoding, NewSubject, Subject, SubjectPatch},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AccessService, AccessStore,
  images::{ImageKind, check_image, storage},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A new subject's profile as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentForm {
  pub identity_code: String,
  pub name:          String,
  pub category:      String,
  pub region:        String,
  /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
  pub birth_date:    String,
  pub photo:         Option<Bytes>,
}

/// Fields to change on an existing subject. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
  /// Accepted only when it equals the stored code.
  pub identity_code: Option<String>,
  pub name:          Option<String>,
  pub category:      Option<String>,
  pub region:        Option<String>,
  pub birth_date:    Option<String>,
  pub is_active:     Option<bool>,
  pub photo:         Option<Bytes>,
}

/// The stored subject plus any non-fatal problem with its photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrolled {
  #[serde(flatten)]
  pub subject: Subject,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
}

/// A saved photo and what the oracle made of it.
struct Photo {
  image_ref: String,
  encoding:  Option<FaceEncoding>,
  warning:   Option<String>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn required(field: &str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(value.to_owned())
}

fn optional(field: &str, value: Option<&str>) -> Result<Option<String>> {
  value.map(|v| required(field, v)).transpose()
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
    .map_err(|_| {
      Error::Validation(format!("birth date {raw:?} is not a YYYY-MM-DD date"))
    })
}

impl EnrollmentForm {
  fn validate(&self) -> Result<NewSubject> {
    let birth_date = required("birth date", &self.birth_date)?;
    Ok(NewSubject {
      identity_code: required("identity code", &self.identity_code)?,
      name:          required("name", &self.name)?,
      category:      required("category", &self.category)?,
      region:        required("region", &self.region)?,
      birth_date:    parse_birth_date(&birth_date)?,
      encoding:      None,
      image_ref:     None,
    })
  }
}

impl SubjectUpdate {
  fn validate(&self, current: &Subject) -> Result<SubjectPatch> {
    if let Some(code) = &self.identity_code {
      if code.trim() != current.identity_code {
        return Err(Error::Validation("identity code cannot be changed".into()));
      }
    }
    let birth_date = optional("birth date", self.birth_date.as_deref())?
      .map(|raw| parse_birth_date(&raw))
      .transpose()?;
    Ok(SubjectPatch {
      name: optional("name", self.name.as_deref())?,
      category: optional("category", self.category.as_deref())?,
      region: optional("region", self.region.as_deref())?,
      birth_date,
      is_active: self.is_active,
      ..SubjectPatch::default()
    })
  }
}

/// A photo field that was left empty counts as no photo.
fn supplied(photo: Option<&Bytes>) -> Option<&Bytes> { photo.filter(|p| !p.is_empty()) }

// ─── Operations ──────────────────────────────────────────────────────────────

impl<S, O, N> AccessService<S, O, N>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
  N: Notifier + 'static,
{
  /// Validate, encode the photo if there is one, and store a new subject.
  pub async fn enroll(&self, form: EnrollmentForm) -> Result<Enrolled> {
    let mut input = form.validate()?;
    let photo = supplied(form.photo.as_ref())
      .map(|p| check_image(p, self.policy.limits.max_photo_bytes, "photo").map(|f| (p, f)))
      .transpose()?;

    // Fast path only; the unique constraint decides races.
    if self
      .store
      .find_by_identity(&input.identity_code)
      .await
      .map_err(Error::from_store)?
      .is_some()
    {
      return Err(Error::DuplicateIdentity(input.identity_code));
    }

    let mut warning = None;
    if let Some((bytes, format)) = photo {
      let saved = self.store_photo(bytes.clone(), format).await?;
      input.encoding = saved.encoding;
      input.image_ref = Some(saved.image_ref);
      warning = saved.warning;
    }

    let image_ref = input.image_ref.clone();
    match self.store.insert_subject(input).await {
      Ok(subject) => {
        tracing::info!(
          subject_id = %subject.subject_id,
          identity_code = %subject.identity_code,
          encoded = subject.has_encoding(),
          "subject enrolled"
        );
        Ok(Enrolled { subject, warning })
      }
      Err(e) => {
        if let Some(r) = image_ref {
          self.images.discard(&r).await;
        }
        Err(Error::from_store(e))
      }
    }
  }

  /// Re-enroll: apply profile changes and, when a new photo is supplied,
  /// replace the stored image. The previous encoding survives unless the new
  /// photo encodes successfully.
  pub async fn update_subject(&self, id: Uuid, update: SubjectUpdate) -> Result<Enrolled> {
    let current = self.get_subject(id).await?;
    let mut patch = update.validate(&current)?;
    let photo = supplied(update.photo.as_ref())
      .map(|p| check_image(p, self.policy.limits.max_photo_bytes, "photo").map(|f| (p, f)))
      .transpose()?;

    let mut warning = None;
    if let Some((bytes, format)) = photo {
      let saved = self.store_photo(bytes.clone(), format).await?;
      patch.encoding = saved.encoding.map(Some);
      patch.image_ref = Some(saved.image_ref);
      warning = saved.warning;
    }

    let new_ref = patch.image_ref.clone();
    let updated = self
      .store
      .update_subject(id, patch)
      .await
      .map_err(Error::from_store)
      .and_then(|s| s.ok_or(Error::SubjectNotFound(id)));
    let updated = match updated {
      Ok(s) => s,
      Err(e) => {
        if let Some(r) = &new_ref {
          self.images.discard(r).await;
        }
        return Err(e);
      }
    };

    if let (Some(new), Some(old)) = (&new_ref, &current.image_ref) {
      if new != old {
        self.images.discard(old).await;
      }
    }

    tracing::info!(
      subject_id = %id,
      photo_replaced = new_ref.is_some(),
      encoded = updated.has_encoding(),
      "subject updated"
    );
    Ok(Enrolled { subject: updated, warning })
  }

  /// Overwrite the stored encoding directly, bypassing the oracle.
  pub async fn set_encoding(&self, id: Uuid, raw: String) -> Result<Subject> {
    let encoding = FaceEncoding::new(raw);
    if encoding.is_empty() {
      return Err(Error::Validation("face encoding is required".into()));
    }
    let subject = self
      .store
      .set_encoding(id, Some(encoding))
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::SubjectNotFound(id))?;
    tracing::info!(subject_id = %id, "face encoding replaced");
    Ok(subject)
  }

  /// Hard delete. `confirm` must repeat the subject's identity code.
  pub async fn delete_subject(
    &self,
    id: Uuid,
    confirm: Option<&str>,
  ) -> Result<DeletedSubject> {
    let current = self.get_subject(id).await?;
    if confirm.map(str::trim) != Some(current.identity_code.as_str()) {
      return Err(Error::ConfirmationMismatch(id));
    }

    let deleted = self
      .store
      .delete_subject(id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::SubjectNotFound(id))?;
    if let Some(r) = &deleted.subject.image_ref {
      self.images.discard(r).await;
    }
    tracing::info!(
      subject_id = %id,
      detached_scans = deleted.detached_scans,
      "subject deleted"
    );
    Ok(deleted)
  }

  pub async fn get_subject(&self, id: Uuid) -> Result<Subject> {
    self
      .store
      .get_subject(id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::SubjectNotFound(id))
  }

  /// All subjects, newest first.
  pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
    self.store.list_subjects().await.map_err(Error::from_store)
  }

  /// Save the photo, then ask the oracle for an encoding. Oracle trouble is
  /// logged and downgraded to a warning.
  async fn store_photo(&self, bytes: Bytes, format: ImageFormat) -> Result<Photo> {
    let image_ref = self
      .images
      .save(ImageKind::Subject, format, &bytes)
      .await
      .map_err(storage)?;

    let (encoding, warning) = match self.oracle.encode(bytes).await {
      EncodeOutcome::Encoded(encoding) => (Some(encoding), None),
      EncodeOutcome::Failed(failure) => {
        tracing::warn!(%failure, %image_ref, "photo stored without a face encoding");
        let warning = format!("photo saved, but no face encoding was produced ({failure})");
        (None, Some(warning))
      }
    };
    Ok(Photo { image_ref, encoding, warning })
  }
}
