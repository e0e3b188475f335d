//! # Adapters
//!
//! Session-side implementations: the correlation handle and lifecycle
//! over any `NativeSession`, the in-process mock engine, and (with the
//! `tonlibjson` feature) the dynamic binding to the real engine.

pub mod mock;
pub mod session;
#[cfg(feature = "tonlibjson")]
pub mod tonlibjson;

pub use mock::{MockEngine, SessionEvent};
pub use session::{ReinitReason, SessionHandle, SessionSettings, WorkerSession};
#[cfg(feature = "tonlibjson")]
pub use tonlibjson::{default_library_name, TonlibJsonFactory};
