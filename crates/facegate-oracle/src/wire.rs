//! JSON bodies returned by the oracle, and their folding into core outcomes.

use facegate_core::{
  oracle::{
    EncodeOutcome, FailureReason, OracleFailure, RecognizeOutcome,
    sanitize_confidence,
  },
  subject::FaceEncoding,
};
use serde::Deserialize;
use serde_json::Value;

/// `POST /encode` → `{"success": bool, "face_encoding": <blob>|null}`
#[derive(Debug, Deserialize)]
pub struct EncodeBody {
  #[serde(default)]
  pub success:       bool,
  #[serde(default)]
  pub face_encoding: Option<Value>,
}

/// `POST /recognize` → `{"recognized": bool, "employeeId": <id>|null, "confidence": float|null}`
#[derive(Debug, Deserialize)]
pub struct RecognizeBody {
  #[serde(default)]
  pub recognized:  bool,
  #[serde(default, rename = "employeeId", alias = "subjectId")]
  pub subject_ref: Option<Value>,
  #[serde(default)]
  pub confidence:  Option<f64>,
}

/// Render an id or encoding the oracle sent as a JSON scalar into text,
/// without otherwise interpreting it.
fn scalar_text(value: Value) -> Result<Option<String>, OracleFailure> {
  match value {
    Value::Null => Ok(None),
    Value::String(s) if s.trim().is_empty() => Ok(None),
    Value::String(s) => Ok(Some(s)),
    Value::Number(n) => Ok(Some(n.to_string())),
    other @ (Value::Array(_) | Value::Object(_)) => Ok(Some(other.to_string())),
    Value::Bool(_) => Err(OracleFailure::new(
      FailureReason::BadResponse,
      "unexpected boolean where an identifier was expected",
    )),
  }
}

impl EncodeBody {
  pub fn into_outcome(self) -> EncodeOutcome {
    if !self.success {
      return EncodeOutcome::Failed(OracleFailure::new(
        FailureReason::NoFace,
        "oracle reported no usable face",
      ));
    }
    match self.face_encoding.map(scalar_text).transpose() {
      Ok(Some(Some(raw))) => EncodeOutcome::Encoded(FaceEncoding::new(raw)),
      Ok(_) => EncodeOutcome::Failed(OracleFailure::new(
        FailureReason::NoFace,
        "oracle returned an empty encoding",
      )),
      Err(failure) => EncodeOutcome::Failed(failure),
    }
  }
}

impl RecognizeBody {
  pub fn into_outcome(self) -> RecognizeOutcome {
    let confidence = sanitize_confidence(self.confidence);
    if !self.recognized {
      return RecognizeOutcome::NotMatched { confidence };
    }
    match self.subject_ref.map(scalar_text).transpose() {
      Ok(Some(Some(subject_ref))) => RecognizeOutcome::Matched { subject_ref, confidence },
      Ok(_) => RecognizeOutcome::Failed(OracleFailure::new(
        FailureReason::BadResponse,
        "match reported without a subject id",
      )),
      Err(failure) => RecognizeOutcome::Failed(failure),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn recognize(v: Value) -> RecognizeOutcome {
    serde_json::from_value::<RecognizeBody>(v).unwrap().into_outcome()
  }

  #[test]
  fn numeric_subject_ids_become_text() {
    assert_eq!(
      recognize(json!({"recognized": true, "employeeId": 42, "confidence": 0.83})),
      RecognizeOutcome::Matched { subject_ref: "42".into(), confidence: Some(0.83) }
    );
  }

  #[test]
  fn non_match_keeps_confidence_but_never_invents_one() {
    assert_eq!(
      recognize(json!({"recognized": false, "confidence": 0.31})),
      RecognizeOutcome::NotMatched { confidence: Some(0.31) }
    );
    assert_eq!(
      recognize(json!({"recognized": false})),
      RecognizeOutcome::NotMatched { confidence: None }
    );
  }

  #[test]
  fn match_without_id_is_a_bad_response() {
    let out = recognize(json!({"recognized": true, "employeeId": null}));
    assert!(matches!(
      out,
      RecognizeOutcome::Failed(OracleFailure { reason: FailureReason::BadResponse, .. })
    ));
  }

  #[test]
  fn encode_without_success_is_no_face() {
    let body: EncodeBody =
      serde_json::from_value(json!({"success": false, "face_encoding": null})).unwrap();
    assert!(matches!(
      body.into_outcome(),
      EncodeOutcome::Failed(OracleFailure { reason: FailureReason::NoFace, .. })
    ));
  }
}
