//! `GET /events`: Server-Sent Events stream of scan results.
//!
//! Each recorded verification attempt is pushed as one `scanResult` event
//! whose data is the JSON-encoded [`facegate_core::notify::ScanEvent`].
//! Delivery is best-effort; there is no acknowledgement or replay.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use facegate_core::{notify::SCAN_RESULT_EVENT, oracle::RecognitionOracle};
use facegate_service::AccessStore;
use futures::stream::{Stream, StreamExt};

use crate::AppState;

/// `GET /events`
pub async fn stream<S, O>(
  State(state): State<Arc<AppState<S, O>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
{
  let notifier = state.service.notifier();
  let events = notifier.subscribe_stream().filter_map(|event| async move {
    match Event::default().event(SCAN_RESULT_EVENT).json_data(&event) {
      Ok(e) => Some(Ok(e)),
      Err(e) => {
        tracing::warn!(error = %e, "failed to encode scan event");
        None
      }
    }
  });
  tracing::debug!(observers = notifier.observer_count(), "event observer connected");

  Sse::new(events).keep_alive(
    KeepAlive::new()
      .interval(Duration::from_secs(15))
      .text("keep-alive"),
  )
}
