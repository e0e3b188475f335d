//! # Outbound Ports
//!
//! The native engine as this crate sees it: an opaque session that takes
//! JSON text in and hands JSON text back, one message at a time.
//!
//! A session is single-threaded and stateful. It is created, used and
//! dropped on one worker thread, so neither trait requires the session
//! itself to be `Send`. Dropping a session destroys it.

use std::time::Duration;

use crate::domain::QueryError;

/// One native light-client session.
pub trait NativeSession {
    /// Write one request. Fails when the session is unusable.
    fn send(&mut self, query: &str) -> Result<(), QueryError>;

    /// Wait up to `timeout` for the next pending message.
    ///
    /// `Ok(None)` means nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Option<String>, QueryError>;
}

/// Creates native sessions; shared by all workers.
pub trait SessionFactory: Send + Sync {
    /// Create a fresh, uninitialised session.
    fn create(&self) -> Result<Box<dyn NativeSession>, QueryError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "native"
    }
}
