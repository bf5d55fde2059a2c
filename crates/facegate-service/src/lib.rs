//! Orchestration layer for facegate.
//!
//! [`AccessService`] is the explicit context every operation runs against:
//! the registry/audit store, the recognition oracle, the event notifier, the
//! on-disk image store, and the operating policy. Transports (the HTTP API,
//! tests) build one and pass it down; there are no globals.

mod broadcast;
mod enroll;
mod images;
mod policy;
mod stats;
mod verify;

use std::sync::Arc;

use facegate_core::{
  notify::Notifier,
  oracle::RecognitionOracle,
  store::{AuditTrail, SubjectRegistry},
};

pub use broadcast::Broadcaster;
pub use enroll::{Enrolled, EnrollmentForm, SubjectUpdate};
pub use images::{ImageKind, ImageStore};
pub use policy::{Limits, Policy, Retention};
pub use stats::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PurgeMode, PurgeSummary, ScanStats};
pub use verify::{ScanRequest, TRY_AGAIN, Verdict};

/// A backend serving both the subject registry and the audit trail.
pub trait AccessStore: SubjectRegistry + AuditTrail + 'static {}

impl<T> AccessStore for T where T: SubjectRegistry + AuditTrail + 'static {}

/// Shared service context. Cheap to clone.
pub struct AccessService<S, O, N = Broadcaster> {
  store:    Arc<S>,
  oracle:   Arc<O>,
  notifier: Arc<N>,
  images:   ImageStore,
  policy:   Policy,
}

impl<S, O, N> Clone for AccessService<S, O, N> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      oracle:   Arc::clone(&self.oracle),
      notifier: Arc::clone(&self.notifier),
      images:   self.images.clone(),
      policy:   self.policy.clone(),
    }
  }
}

impl<S, O, N> AccessService<S, O, N>
where
  S: AccessStore,
  O: RecognitionOracle + 'static,
  N: Notifier + 'static,
{
  pub fn new(
    store: Arc<S>,
    oracle: Arc<O>,
    notifier: Arc<N>,
    images: ImageStore,
    policy: Policy,
  ) -> Self {
    Self { store, oracle, notifier, images, policy }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn notifier(&self) -> &Arc<N> { &self.notifier }

  pub fn images(&self) -> &ImageStore { &self.images }

  pub fn policy(&self) -> &Policy { &self.policy }
}

#[cfg(test)]
mod tests;
