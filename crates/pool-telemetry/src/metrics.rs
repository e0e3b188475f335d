//! Prometheus metrics for the tonlib worker pool.
//!
//! All metrics follow the naming convention: `tonlib_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Queries executed against native sessions
    pub static ref QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("tonlib_session_queries_total", "Queries executed against native sessions"),
        &["request", "outcome"]  // outcome: ok/engine_error/timeout/failed
    ).expect("metric creation failed");

    /// Asynchronous notifications skipped while waiting for an answer
    pub static ref NOTIFICATIONS_DISCARDED: Counter = Counter::new(
        "tonlib_session_notifications_discarded_total",
        "Engine update notifications discarded by the correlation loop"
    ).expect("metric creation failed");

    /// Receive polls that returned nothing within the poll timeout
    pub static ref EMPTY_POLLS: Counter = Counter::new(
        "tonlib_session_empty_polls_total",
        "Receive polls that returned no message"
    ).expect("metric creation failed");

    /// Queries abandoned because the cumulative deadline ran out
    pub static ref EXEC_TIMEOUTS: Counter = Counter::new(
        "tonlib_session_exec_timeouts_total",
        "Queries abandoned after the cumulative exec deadline"
    ).expect("metric creation failed");

    /// Session reinitialisations by reason
    pub static ref SESSION_REINITS: CounterVec = CounterVec::new(
        Opts::new("tonlib_session_reinitializations_total", "Native session reinitialisations"),
        &["reason"]  // reason: load_threshold/poisoned
    ).expect("metric creation failed");

    // =========================================================================
    // POOL METRICS
    // =========================================================================

    /// Workers currently running a job
    pub static ref WORKERS_BUSY: Gauge = Gauge::new(
        "tonlib_pool_workers_busy",
        "Number of workers currently executing a job"
    ).expect("metric creation failed");

    /// Jobs that panicked inside a worker
    pub static ref JOB_PANICS: Counter = Counter::new(
        "tonlib_pool_job_panics_total",
        "Jobs that panicked inside a worker"
    ).expect("metric creation failed");

    /// Job execution time on the worker
    pub static ref JOB_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "tonlib_pool_job_duration_seconds",
            "Time a worker spent executing one job"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid bucket layout"))
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered by this call.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless: already registered collectors
/// are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Session
        Box::new(QUERIES_TOTAL.clone()),
        Box::new(NOTIFICATIONS_DISCARDED.clone()),
        Box::new(EMPTY_POLLS.clone()),
        Box::new(EXEC_TIMEOUTS.clone()),
        Box::new(SESSION_REINITS.clone()),
        // Pool
        Box::new(WORKERS_BUSY.clone()),
        Box::new(JOB_PANICS.clone()),
        Box::new(JOB_DURATION.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
