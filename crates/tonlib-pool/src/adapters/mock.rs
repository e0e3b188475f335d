//! # Mock Engine
//!
//! In-process stand-in for the native engine, for tests and local runs.
//!
//! Sessions answer `init` and `setLogVerbosityLevel` themselves and pass
//! every other request to a handler closure. A handler returning `None`
//! leaves the request unanswered. Every session records what happens to
//! it in a shared event log.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{QueryError, SYNC_NOTIFICATION};
use crate::ports::{NativeSession, SessionFactory};

type Handler = dyn Fn(&Value) -> Option<Value> + Send + Sync;

/// Something that happened to a mock session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created.
    Created {
        /// Session id, in creation order from 0.
        session: u64,
    },
    /// A request was written; `request` is its `@type`.
    Sent {
        /// Session id.
        session: u64,
        /// Request `@type`.
        request: String,
    },
    /// A message was handed back; `response` is its `@type`.
    Delivered {
        /// Session id.
        session: u64,
        /// Response `@type`.
        response: String,
    },
    /// A session was dropped.
    Destroyed {
        /// Session id.
        session: u64,
    },
}

struct MockState {
    handler: Box<Handler>,
    events: Mutex<Vec<SessionEvent>>,
    next_session: AtomicU64,
    noise: AtomicUsize,
    fail_next_create: AtomicBool,
    init_error: Mutex<Option<(i32, String)>>,
    answer_delay: Mutex<Duration>,
    strays: Mutex<VecDeque<String>>,
}

impl MockState {
    fn record(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

/// Factory of mock sessions sharing one handler and event log.
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    /// Engine answering requests with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(MockState {
                handler: Box::new(handler),
                events: Mutex::new(Vec::new()),
                next_session: AtomicU64::new(0),
                noise: AtomicUsize::new(0),
                fail_next_create: AtomicBool::new(false),
                init_error: Mutex::new(None),
                answer_delay: Mutex::new(Duration::ZERO),
                strays: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Queue `count` `updateSyncState` notifications ahead of every answer.
    pub fn with_noise(self, count: usize) -> Self {
        self.state.noise.store(count, Ordering::SeqCst);
        self
    }

    /// Answer `init` with an engine error.
    pub fn with_init_error(self, code: i32, message: &str) -> Self {
        *self.state.init_error.lock() = Some((code, message.to_string()));
        self
    }

    /// Hold each answer back for `delay` inside `send`.
    pub fn with_answer_delay(self, delay: Duration) -> Self {
        *self.state.answer_delay.lock() = delay;
        self
    }

    /// Queue raw `message` text ahead of the next answer, once.
    pub fn push_stray(&self, message: &str) {
        self.state.strays.lock().push_back(message.to_string());
    }

    /// Make the next `create` call fail.
    pub fn fail_next_create(&self) {
        self.state.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.state.events.lock().clone()
    }

    /// Number of sessions created so far.
    pub fn created(&self) -> u64 {
        self.state.next_session.load(Ordering::SeqCst)
    }

    /// Requests of a given `@type` sent across all sessions.
    pub fn sent_count(&self, request: &str) -> usize {
        self.state
            .events
            .lock()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Sent { request: r, .. } if r == request))
            .count()
    }
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("created", &self.created())
            .finish()
    }
}

impl SessionFactory for MockEngine {
    fn create(&self) -> Result<Box<dyn NativeSession>, QueryError> {
        if self.state.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(QueryError::SessionUnavailable(
                "mock engine refused to create a session".to_string(),
            ));
        }
        let id = self.state.next_session.fetch_add(1, Ordering::SeqCst);
        self.state.record(SessionEvent::Created { session: id });
        Ok(Box::new(MockSession {
            id,
            state: Arc::clone(&self.state),
            pending: VecDeque::new(),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSession {
    id: u64,
    state: Arc<MockState>,
    pending: VecDeque<String>,
}

impl MockSession {
    fn answer(&self, request: &Value) -> Option<Value> {
        match request["@type"].as_str() {
            Some("init") => Some(match self.state.init_error.lock().as_ref() {
                Some((code, message)) => json!({"@type": "error", "code": code, "message": message}),
                None => json!({"@type": "options.info"}),
            }),
            Some("setLogVerbosityLevel") => Some(json!({"@type": "ok"})),
            _ => (self.state.handler)(request),
        }
    }
}

impl NativeSession for MockSession {
    fn send(&mut self, query: &str) -> Result<(), QueryError> {
        let request: Value = serde_json::from_str(query)?;
        let kind = request["@type"].as_str().unwrap_or_default().to_string();
        self.state.record(SessionEvent::Sent {
            session: self.id,
            request: kind,
        });

        let delay = *self.state.answer_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if let Some(answer) = self.answer(&request) {
            for _ in 0..self.state.noise.load(Ordering::SeqCst) {
                self.pending.push_back(
                    json!({"@type": SYNC_NOTIFICATION, "sync_state": {"@type": "syncStateInProgress"}})
                        .to_string(),
                );
            }
            self.pending.extend(self.state.strays.lock().drain(..));
            self.pending.push_back(answer.to_string());
        }
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<String>, QueryError> {
        match self.pending.pop_front() {
            Some(text) => {
                let kind = serde_json::from_str::<Value>(&text)
                    .ok()
                    .and_then(|v| v["@type"].as_str().map(str::to_string))
                    .unwrap_or_default();
                self.state.record(SessionEvent::Delivered {
                    session: self.id,
                    response: kind,
                });
                Ok(Some(text))
            }
            None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.state.record(SessionEvent::Destroyed { session: self.id });
    }
}
