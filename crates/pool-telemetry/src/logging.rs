//! Structured log helpers.
//!
//! Every pool log line carries the same core fields so that a log search for
//! one worker or one request kind returns a coherent trail:
//! - `worker`: worker index inside the pool
//! - `request`: the `@type` of the envelope being executed
//! - additional context fields

/// Log a worker-scoped event with the standard `worker` field.
#[macro_export]
macro_rules! log_worker_event {
    ($level:ident, $worker:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            worker = $worker,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a query-scoped event with the standard `worker` and `request` fields.
#[macro_export]
macro_rules! log_query_event {
    ($level:ident, $worker:expr, $request:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            worker = $worker,
            request = %$request,
            $($($field)*,)?
            $msg
        )
    };
}
