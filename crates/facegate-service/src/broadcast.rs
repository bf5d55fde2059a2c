//! In-process fanout of scan events over a tokio broadcast channel.

use facegate_core::notify::{Notifier, PublishError, ScanEvent};
use futures::stream::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// [`Notifier`] backed by a bounded broadcast channel.
///
/// Sending never blocks. An observer that falls more than `capacity` events
/// behind skips the oldest ones instead of slowing down publishers.
#[derive(Debug, Clone)]
pub struct Broadcaster {
  tx: broadcast::Sender<ScanEvent>,
}

impl Broadcaster {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    tracing::info!(capacity, "scan event broadcaster initialised");
    Self { tx }
  }

  pub fn observer_count(&self) -> usize { self.tx.receiver_count() }

  /// A stream of every event published from now on.
  pub fn subscribe_stream(&self) -> impl Stream<Item = ScanEvent> + Send + 'static + use<> {
    BroadcastStream::new(self.tx.subscribe()).filter_map(|result| async move {
      match result {
        Ok(event) => Some(event),
        Err(e) => {
          tracing::warn!(error = %e, "slow observer missed scan events");
          None
        }
      }
    })
  }
}

impl Default for Broadcaster {
  fn default() -> Self { Self::new(100) }
}

impl Notifier for Broadcaster {
  fn publish(&self, event: ScanEvent) -> Result<usize, PublishError> {
    self.tx.send(event).map_err(|_| PublishError::NoObservers)
  }
}
