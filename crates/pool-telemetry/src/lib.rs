//! # Pool Telemetry
//!
//! Observability for the tonlib worker pool.
//!
//! ## Components
//!
//! - Structured logging via `tracing-subscriber` (pretty or JSON)
//! - Prometheus metrics for sessions and workers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pool_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Build the pool, serve requests...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TONLIB_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `TONLIB_JSON_LOGS` | `false` | JSON log lines |
//! | `TONLIB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `TONLIB_SERVICE_NAME` | `tonlib-pool` | Service name |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, EMPTY_POLLS, EXEC_TIMEOUTS, JOB_DURATION,
    JOB_PANICS, NOTIFICATIONS_DISCARDED, QUERIES_TOTAL, SESSION_REINITS, WORKERS_BUSY,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The log filter or another setting is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics_handle = register_metrics()?;

    let tracing_guard = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
