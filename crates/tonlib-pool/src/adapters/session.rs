//! # Session Handle and Lifecycle
//!
//! `SessionHandle` correlates one request with its answer on a native
//! session that has no request ids: send, then poll until the first
//! message that is not an asynchronous notification.
//!
//! `WorkerSession` owns one handle per worker and recycles it:
//!
//! ```text
//! Active --(load budget spent | poisoned)--> Reinitializing --> Active
//! ```
//!
//! The replacement is created and initialised before the old session is
//! dropped, so a failed reinitialisation leaves the worker on its previous
//! session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pool_telemetry::{
    log_query_event, log_worker_event, metric_inc, EMPTY_POLLS, EXEC_TIMEOUTS,
    NOTIFICATIONS_DISCARDED, QUERIES_TOTAL, SESSION_REINITS,
};

use crate::domain::{invariant_load_budget, QueryError, ThresholdReached};
use crate::ports::{NativeSession, SessionFactory};
use crate::protocol::{QueryBuilder, Request, Response};

/// Everything a worker needs to create and drive its sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Network configuration as the JSON string sent in `init`.
    pub network_json: String,
    /// Keystore directory.
    pub keystore: String,
    /// Engine log verbosity.
    pub verbosity: i32,
    /// Loads a session serves before it is recreated.
    pub load_threshold: u32,
    /// Upper bound on one receive poll.
    pub receive_timeout: Duration,
    /// Cumulative budget for one exchange.
    pub exec_deadline: Duration,
}

/// Why a session was replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReinitReason {
    /// The load budget was spent.
    LoadThreshold,
    /// An exchange was abandoned; a late answer may still be queued.
    Poisoned,
}

impl ReinitReason {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReinitReason::LoadThreshold => "load_threshold",
            ReinitReason::Poisoned => "poisoned",
        }
    }
}

/// Synchronous bridge over one native session.
pub struct SessionHandle {
    session: Box<dyn NativeSession>,
    worker: usize,
    receive_timeout: Duration,
    exec_deadline: Duration,
    poisoned: bool,
}

impl SessionHandle {
    /// Wrap a native session.
    pub fn new(
        session: Box<dyn NativeSession>,
        worker: usize,
        receive_timeout: Duration,
        exec_deadline: Duration,
    ) -> Self {
        Self {
            session,
            worker,
            receive_timeout,
            exec_deadline,
            poisoned: false,
        }
    }

    /// True once an exchange was abandoned or the transport failed.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Write one request without waiting.
    pub fn send(&mut self, request: &Request) -> Result<(), QueryError> {
        let text = request.to_json()?;
        self.session.send(&text).map_err(|e| {
            self.poisoned = true;
            e
        })
    }

    /// Wait up to `timeout` for the next message, parsed.
    ///
    /// A message that cannot be decoded poisons the session: the answer
    /// it stood in for may still be queued behind it.
    pub fn receive(&mut self, timeout: Duration) -> Result<Option<Response>, QueryError> {
        match self.session.receive(timeout) {
            Ok(Some(text)) => match Response::from_json(&text) {
                Ok(response) => Ok(Some(response)),
                Err(e) => {
                    self.poisoned = true;
                    Err(e)
                }
            },
            Ok(None) => Ok(None),
            Err(e) => {
                self.poisoned = true;
                Err(e)
            }
        }
    }

    /// Send `request` and return its answer.
    ///
    /// Notifications are discarded. Each poll waits at most the receive
    /// timeout and never past the cumulative deadline; when the deadline
    /// runs out the session is marked poisoned.
    pub fn exec(&mut self, request: &Request) -> Result<Response, QueryError> {
        let tag = request.tag();
        if let Err(e) = self.send(request) {
            metric_inc!(QUERIES_TOTAL, &[tag, "failed"]);
            return Err(e);
        }
        log_query_event!(trace, self.worker, tag, "Query sent");

        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.exec_deadline {
                self.poisoned = true;
                metric_inc!(EXEC_TIMEOUTS);
                metric_inc!(QUERIES_TOTAL, &[tag, "timeout"]);
                log_query_event!(
                    warn,
                    self.worker,
                    tag,
                    "No answer before deadline",
                    elapsed_ms = elapsed.as_millis() as u64
                );
                return Err(QueryError::Timeout {
                    request: tag,
                    waited: elapsed,
                });
            }

            let wait = self.receive_timeout.min(self.exec_deadline - elapsed);
            let response = match self.receive(wait) {
                Ok(Some(response)) => response,
                Ok(None) => {
                    metric_inc!(EMPTY_POLLS);
                    continue;
                }
                Err(e) => {
                    metric_inc!(QUERIES_TOTAL, &[tag, "failed"]);
                    log_query_event!(debug, self.worker, tag, "Receive failed", error = %e);
                    return Err(e);
                }
            };

            if response.is_notification() {
                metric_inc!(NOTIFICATIONS_DISCARDED);
                log_query_event!(
                    trace,
                    self.worker,
                    tag,
                    "Notification discarded",
                    kind = response.tag()
                );
                continue;
            }

            let outcome = match response {
                Response::Error(_) => "engine_error",
                _ => "ok",
            };
            metric_inc!(QUERIES_TOTAL, &[tag, outcome]);
            log_query_event!(
                trace,
                self.worker,
                tag,
                "Answer received",
                response = response.tag(),
                elapsed_ms = started.elapsed().as_millis() as u64
            );
            return Ok(response);
        }
    }
}

/// One worker's session and its lifecycle counters.
pub struct WorkerSession {
    worker: usize,
    factory: Arc<dyn SessionFactory>,
    settings: Arc<SessionSettings>,
    handle: SessionHandle,
    load_count: u32,
    generation: u64,
}

impl WorkerSession {
    /// Create and initialise the worker's first session.
    pub fn start(
        worker: usize,
        factory: Arc<dyn SessionFactory>,
        settings: Arc<SessionSettings>,
    ) -> Result<Self, QueryError> {
        let handle = bootstrap(worker, factory.as_ref(), &settings)?;
        log_worker_event!(debug, worker, "Session ready", factory = factory.name());
        Ok(Self {
            worker,
            factory,
            settings,
            handle,
            load_count: 0,
            generation: 0,
        })
    }

    /// Worker index.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Loads served by the current session.
    pub fn load_count(&self) -> u32 {
        self.load_count
    }

    /// Number of times the session has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when the current session must be replaced before reuse.
    pub fn is_poisoned(&self) -> bool {
        self.handle.is_poisoned()
    }

    /// Mark the current session unusable (e.g. after a job panicked
    /// mid-exchange).
    pub fn mark_poisoned(&mut self) {
        self.handle.poisoned = true;
    }

    /// Execute one request, applying lifecycle checks first.
    pub fn exec(&mut self, request: &Request) -> Result<Response, QueryError> {
        if self.handle.is_poisoned() {
            self.reinitialize(ReinitReason::Poisoned)?;
        }

        if request.is_load() {
            if let Err(signal) = invariant_load_budget(self.load_count, self.settings.load_threshold)
            {
                self.recycle(signal)?;
            }
            let response = self.handle.exec(request)?;
            self.load_count += 1;
            return Ok(response);
        }

        self.handle.exec(request)
    }

    /// Replace the session with a freshly initialised one.
    pub fn reinitialize(&mut self, reason: ReinitReason) -> Result<(), QueryError> {
        let fresh = bootstrap(self.worker, self.factory.as_ref(), &self.settings).map_err(|e| {
            log_worker_event!(
                error,
                self.worker,
                "Session reinitialisation failed",
                reason = reason.as_str(),
                error = %e
            );
            e
        })?;
        let previous = std::mem::replace(&mut self.handle, fresh);
        drop(previous);

        self.load_count = 0;
        self.generation += 1;
        metric_inc!(SESSION_REINITS, &[reason.as_str()]);
        log_worker_event!(
            info,
            self.worker,
            "Session reinitialised",
            reason = reason.as_str(),
            generation = self.generation
        );
        Ok(())
    }

    fn recycle(&mut self, signal: ThresholdReached) -> Result<(), QueryError> {
        log_worker_event!(
            debug,
            self.worker,
            "Load budget spent",
            load_count = signal.load_count,
            threshold = signal.threshold
        );
        self.reinitialize(ReinitReason::LoadThreshold)
    }
}

/// Create a session and run `init` plus `setLogVerbosityLevel` on it.
fn bootstrap(
    worker: usize,
    factory: &dyn SessionFactory,
    settings: &SessionSettings,
) -> Result<SessionHandle, QueryError> {
    let session = factory.create()?;
    let mut handle = SessionHandle::new(
        session,
        worker,
        settings.receive_timeout,
        settings.exec_deadline,
    );

    let init = QueryBuilder::init(settings.network_json.clone(), &settings.keystore);
    match handle.exec(&init) {
        Ok(Response::OptionsInfo(_)) | Ok(Response::Ok) => {}
        Ok(other) => {
            return Err(QueryError::SessionUnavailable(format!(
                "init answered with {}",
                other.mismatch(init.tag())
            )))
        }
        Err(e) => return Err(QueryError::SessionUnavailable(format!("init failed: {}", e))),
    }

    let verbosity = QueryBuilder::set_verbosity(settings.verbosity);
    match handle.exec(&verbosity)? {
        Response::Ok => Ok(handle),
        other => Err(other.mismatch(verbosity.tag())),
    }
}
