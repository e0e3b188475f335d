//! # Worker Pool
//!
//! A fixed set of named OS threads, each owning one `WorkerSession` for
//! its whole life. Jobs are closures over `&mut WorkerSession`, queued on
//! a shared channel and picked up by whichever worker is free; callers
//! await the result without blocking their own runtime.
//!
//! Two jobs on the same worker never overlap: a worker runs one job to
//! completion before taking the next.

use crossbeam_channel::{Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use uuid::Uuid;

use pool_telemetry::{
    log_worker_event, metric_inc, time_histogram, JOB_DURATION, JOB_PANICS, WORKERS_BUSY,
};

use crate::adapters::{SessionSettings, WorkerSession};
use crate::config::PoolConfig;
use crate::domain::QueryError;
use crate::ports::SessionFactory;

type Job = Box<dyn FnOnce(&mut WorkerSession) + Send + 'static>;

/// Fixed-size pool of session-owning workers.
///
/// Dropping the pool closes the queue and returns at once; workers finish
/// the jobs already queued, destroy their sessions and exit on their own.
/// `shutdown` does the same but blocks until every worker has exited, so
/// async callers should run it off the runtime (e.g. `spawn_blocking`).
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

impl WorkerPool {
    /// Spawn `config.workers` threads and wait until every session is
    /// initialised.
    ///
    /// If any worker fails to bring up its session, the others are shut
    /// down and the first error is returned.
    pub fn start(config: &PoolConfig, factory: Arc<dyn SessionFactory>) -> Result<Self, QueryError> {
        let settings = Arc::new(
            config
                .session_settings()
                .map_err(|e| QueryError::SessionUnavailable(e.to_string()))?,
        );
        let size = config.workers;

        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), QueryError>>(size);

        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(size),
            size,
        };

        for worker in 0..size {
            let receiver = receiver.clone();
            let factory = Arc::clone(&factory);
            let settings = Arc::clone(&settings);
            let ready = ready_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("tonlib-worker-{}", worker))
                .spawn(move || worker_loop(worker, receiver, factory, settings, ready))
                .map_err(|e| QueryError::SessionUnavailable(format!("spawn worker: {}", e)))?;
            pool.workers.push(handle);
        }
        drop(ready_tx);

        for _ in 0..size {
            match ready_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(QueryError::SessionUnavailable(
                        "worker exited during start".to_string(),
                    ))
                }
            }
        }

        tracing::info!(workers = size, factory = factory.name(), "Worker pool started");
        Ok(pool)
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` on the next free worker and await its result.
    ///
    /// A job that panics yields `WorkerLost`; the worker survives and
    /// replaces its session before the next job.
    pub async fn submit<F, T>(&self, job: F) -> Result<T, QueryError>
    where
        F: FnOnce(&mut WorkerSession) -> Result<T, QueryError> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(QueryError::PoolClosed)?;
        let (result_tx, result_rx) = oneshot::channel();

        let job: Job = Box::new(move |session: &mut WorkerSession| {
            let _ = result_tx.send(job(session));
        });
        sender.send(job).map_err(|_| QueryError::PoolClosed)?;

        result_rx.await.map_err(|_| QueryError::WorkerLost)?
    }

    /// Stop accepting jobs, let queued jobs finish, and join all workers.
    ///
    /// Blocks the calling thread until the queue has drained.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked outside a job");
            }
        }
        tracing::info!(workers = self.size, "Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue is enough for workers to wind down; the
        // threads are detached rather than joined.
        if self.sender.take().is_some() {
            self.workers.clear();
            tracing::debug!(workers = self.size, "Worker pool dropped, workers detached");
        }
    }
}

fn worker_loop(
    worker: usize,
    jobs: Receiver<Job>,
    factory: Arc<dyn SessionFactory>,
    settings: Arc<SessionSettings>,
    ready: Sender<Result<(), QueryError>>,
) {
    let mut session = match WorkerSession::start(worker, factory, settings) {
        Ok(session) => {
            let _ = ready.send(Ok(()));
            session
        }
        Err(e) => {
            log_worker_event!(error, worker, "Session start failed", error = %e);
            let _ = ready.send(Err(e));
            return;
        }
    };
    drop(ready);

    while let Ok(job) = jobs.recv() {
        let job_id = Uuid::new_v4();
        log_worker_event!(trace, worker, "Job started", job = %job_id);

        WORKERS_BUSY.inc();
        let outcome = {
            let _timer = time_histogram!(JOB_DURATION);
            catch_unwind(AssertUnwindSafe(|| job(&mut session)))
        };
        WORKERS_BUSY.dec();

        if outcome.is_err() {
            metric_inc!(JOB_PANICS);
            session.mark_poisoned();
            log_worker_event!(error, worker, "Job panicked", job = %job_id);
        }
    }

    log_worker_event!(debug, worker, "Worker stopped", generation = session.generation());
}
