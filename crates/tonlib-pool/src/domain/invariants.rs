//! # Domain Invariants
//!
//! Limits and rules that must always hold for sessions and history walks.

use std::time::Duration;

use super::entities::RawTransaction;

/// Default number of workers (and therefore native sessions).
pub const DEFAULT_WORKERS: usize = 10;

/// Contract loads a single session may serve before it is recreated.
pub const DEFAULT_LOAD_THRESHOLD: u32 = 300;

/// Default upper bound on a single receive poll.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cumulative budget for one request/response exchange.
pub const DEFAULT_EXEC_DEADLINE: Duration = Duration::from_secs(60);

/// Default maximum number of transactions returned by a history walk.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 1000;

/// Tag of the asynchronous notification that never answers a query.
pub const SYNC_NOTIFICATION: &str = "updateSyncState";

/// Prefix shared by every asynchronous push from the engine.
pub const NOTIFICATION_PREFIX: &str = "update";

/// Internal signal raised when a session has served its share of loads.
///
/// Consumed by the session lifecycle; never reaches a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdReached {
    /// Loads served by the outgoing session.
    pub load_count: u32,
    /// Configured threshold.
    pub threshold: u32,
}

/// Invariant: a session serves at most `threshold` loads.
///
/// Returns the signal when the next load must be preceded by
/// reinitialisation.
pub fn invariant_load_budget(load_count: u32, threshold: u32) -> Result<(), ThresholdReached> {
    if load_count >= threshold {
        return Err(ThresholdReached {
            load_count,
            threshold,
        });
    }
    Ok(())
}

/// Invariant: a history page is strictly newest-first, above `to_lt`,
/// and no longer than `limit`.
pub fn invariant_history_page(transactions: &[RawTransaction], to_lt: i64, limit: usize) -> bool {
    transactions.len() <= limit
        && transactions.iter().all(|tx| tx.lt() > to_lt)
        && transactions.windows(2).all(|w| w[0].lt() > w[1].lt())
}
