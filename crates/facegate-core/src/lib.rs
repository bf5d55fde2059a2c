//! Domain types and seams for facegate, a face-verification gate.
//!
//! Subjects, scan attempts and the three traits the service is wired
//! through: the subject registry plus audit trail ([`store`]), the
//! recognition oracle ([`oracle`]) and the scan-event notifier
//! ([`notify`]). Nothing here knows about HTTP or SQLite.

pub mod error;
pub mod image;
pub mod notify;
pub mod oracle;
pub mod scan;
pub mod store;
pub mod subject;

pub use error::{Error, Result, StoreError};
