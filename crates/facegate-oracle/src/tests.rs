//! Client tests against a throwaway axum server standing in for the oracle.

use std::time::Duration;

use axum::{
  Json, Router,
  extract::Multipart,
  http::StatusCode,
  response::IntoResponse,
  routing::post,
};
use bytes::Bytes;
use facegate_core::{
  oracle::{
    EncodeOutcome, FailureReason, OracleFailure, RecognitionOracle,
    RecognizeOutcome,
  },
  subject::FaceEncoding,
};
use serde_json::json;
use tokio::net::TcpListener;

use crate::{Error, HttpOracle};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}")
}

fn oracle(base_url: &str) -> HttpOracle {
  HttpOracle::new(base_url, Duration::from_secs(5)).unwrap()
}

fn reason_of_encode(out: EncodeOutcome) -> FailureReason {
  match out {
    EncodeOutcome::Failed(OracleFailure { reason, .. }) => reason,
    other => panic!("expected failure, got {other:?}"),
  }
}

fn reason_of_recognize(out: RecognizeOutcome) -> FailureReason {
  match out {
    RecognizeOutcome::Failed(OracleFailure { reason, .. }) => reason,
    other => panic!("expected failure, got {other:?}"),
  }
}

/// Echo the upload back so tests can check the multipart contract.
async fn echo_upload(mut multipart: Multipart) -> impl IntoResponse {
  let field = multipart.next_field().await.unwrap().unwrap();
  let name = field.name().unwrap_or_default().to_owned();
  let mime = field.content_type().unwrap_or_default().to_owned();
  let len = field.bytes().await.unwrap().len();
  Json(json!({
    "success": true,
    "face_encoding": format!("{name}|{mime}|{len}"),
  }))
}

// ─── Encode ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn encode_sends_image_as_file_field() {
  let url = serve(Router::new().route("/encode", post(echo_upload))).await;
  let out = oracle(&url).encode(Bytes::from_static(JPEG)).await;
  assert_eq!(
    out,
    EncodeOutcome::Encoded(FaceEncoding::new(format!("file|image/jpeg|{}", JPEG.len())))
  );
}

#[tokio::test]
async fn encode_accepts_structured_encodings() {
  let router = Router::new().route(
    "/encode",
    post(|| async { Json(json!({"success": true, "face_encoding": [0.25, -0.5]})) }),
  );
  let url = serve(router).await;
  let out = oracle(&url).encode(Bytes::from_static(JPEG)).await;
  assert_eq!(out, EncodeOutcome::Encoded(FaceEncoding::new("[0.25,-0.5]")));
}

#[tokio::test]
async fn encode_bad_request_means_no_face() {
  let router = Router::new().route(
    "/encode",
    post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"error": "no face"}))) }),
  );
  let url = serve(router).await;
  let out = oracle(&url).encode(Bytes::from_static(JPEG)).await;
  assert_eq!(reason_of_encode(out), FailureReason::NoFace);
}

#[tokio::test]
async fn encode_server_error_means_unavailable() {
  let router = Router::new()
    .route("/encode", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
  let url = serve(router).await;
  let out = oracle(&url).encode(Bytes::from_static(JPEG)).await;
  assert_eq!(reason_of_encode(out), FailureReason::Unavailable);
}

// ─── Recognize ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn recognize_match_carries_subject_ref_and_confidence() {
  let router = Router::new().route(
    "/recognize",
    post(|| async {
      Json(json!({"recognized": true, "employeeId": "EMP001", "confidence": 0.91}))
    }),
  );
  let url = serve(router).await;
  let out = oracle(&url).recognize(Bytes::from_static(JPEG)).await;
  assert_eq!(
    out,
    RecognizeOutcome::Matched { subject_ref: "EMP001".into(), confidence: Some(0.91) }
  );
}

#[tokio::test]
async fn recognize_non_match() {
  let router = Router::new().route(
    "/recognize",
    post(|| async { Json(json!({"recognized": false, "confidence": 0.2})) }),
  );
  let url = serve(router).await;
  let out = oracle(&url).recognize(Bytes::from_static(JPEG)).await;
  assert_eq!(out, RecognizeOutcome::NotMatched { confidence: Some(0.2) });
}

#[tokio::test]
async fn recognize_garbage_body_is_bad_response() {
  let router =
    Router::new().route("/recognize", post(|| async { "definitely not json" }));
  let url = serve(router).await;
  let out = oracle(&url).recognize(Bytes::from_static(JPEG)).await;
  assert_eq!(reason_of_recognize(out), FailureReason::BadResponse);
}

#[tokio::test]
async fn recognize_times_out_as_unavailable() {
  let router = Router::new().route(
    "/recognize",
    post(|| async {
      tokio::time::sleep(Duration::from_secs(3)).await;
      Json(json!({"recognized": false}))
    }),
  );
  let url = serve(router).await;
  let client = HttpOracle::new(url, Duration::from_millis(200)).unwrap();
  let out = client.recognize(Bytes::from_static(JPEG)).await;
  assert_eq!(reason_of_recognize(out), FailureReason::Unavailable);
}

#[tokio::test]
async fn unreachable_oracle_is_unavailable() {
  // Reserve a port, then free it so nothing is listening there.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let out = oracle(&format!("http://{addr}"))
    .recognize(Bytes::from_static(JPEG))
    .await;
  assert_eq!(reason_of_recognize(out), FailureReason::Unavailable);
}

#[test]
fn base_url_must_be_http() {
  let err = HttpOracle::new("ftp://oracle", Duration::from_secs(1)).unwrap_err();
  assert!(matches!(err, Error::BaseUrl(_)));
}
