//! JSON REST API for facegate.
//!
//! Exposes an axum [`Router`] backed by an [`AccessService`]. TLS, auth, and
//! the listening socket are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", facegate_api::api_router(service))
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod form;
pub mod health;
pub mod scan;
pub mod subjects;

use std::{sync::Arc, time::Instant};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use facegate_core::oracle::RecognitionOracle;
use facegate_service::{AccessService, AccessStore};

pub use error::ApiError;

/// Room for multipart framing and text fields around the largest upload.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Shared state threaded through all handlers.
pub struct AppState<S, O> {
  pub service: AccessService<S, O>,
  pub started: Instant,
}

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, O>(service: AccessService<S, O>) -> Router<()>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let limits = service.policy().limits;
  let body_limit = limits.max_scan_bytes.max(limits.max_photo_bytes) + FORM_OVERHEAD;
  let state = Arc::new(AppState { service, started: Instant::now() });

  Router::new()
    // Verification & audit
    .route("/scan/recognize", post(scan::recognize::<S, O>))
    .route("/scan/history", get(scan::history::<S, O>).delete(scan::purge::<S, O>))
    .route("/scan/history/{id}", get(scan::get_one::<S, O>))
    .route("/scan/stats", get(scan::stats::<S, O>))
    // Enrollment
    .route("/employees", get(subjects::list::<S, O>).post(subjects::create::<S, O>))
    .route(
      "/employees/{id}",
      get(subjects::get_one::<S, O>)
        .put(subjects::update::<S, O>)
        .delete(subjects::delete_one::<S, O>),
    )
    .route("/employees/{id}/face-encoding", post(subjects::set_encoding::<S, O>))
    // Observers & liveness
    .route("/events", get(events::stream::<S, O>))
    .route("/health", get(health::handler::<S, O>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}
