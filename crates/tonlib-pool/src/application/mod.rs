//! # Application Module
//!
//! The worker pool, the typed operations each job runs on its worker's
//! session, and the client service implementing the inbound API.

pub mod operations;
pub mod pool;
pub mod service;

pub use pool::WorkerPool;
pub use service::TonlibClient;
