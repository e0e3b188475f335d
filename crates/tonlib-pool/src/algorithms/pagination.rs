//! # Transaction Paginator
//!
//! Walks an account's history backward from a cursor, one
//! `raw.getTransactions` batch at a time, until a logical-time bound or
//! the result limit is reached.
//!
//! ## Termination
//!
//! - a transaction with `lt <= to_lt` (excluded)
//! - `limit` transactions collected
//! - a batch without `previous_transaction_id`, or one pointing at `lt == 0`
//! - an engine error batch (the prefix collected so far is returned)
//! - a cursor that does not move strictly backward

use tracing::{debug, warn};

use crate::domain::{
    QueryError, RawTransaction, RawTransactions, TransactionId, DEFAULT_TRANSACTION_LIMIT,
};

/// Supplies one batch of history starting at a transaction (inclusive).
pub trait TransactionSource {
    /// Fetch the batch whose newest entry is `from`.
    fn fetch(&mut self, from: TransactionId) -> Result<RawTransactions, QueryError>;
}

impl<F> TransactionSource for F
where
    F: FnMut(TransactionId) -> Result<RawTransactions, QueryError>,
{
    fn fetch(&mut self, from: TransactionId) -> Result<RawTransactions, QueryError> {
        self(from)
    }
}

/// Bounds of one history walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionPaginator {
    /// Exclusive lower bound on logical time.
    pub to_lt: i64,
    /// Maximum number of transactions returned.
    pub limit: usize,
}

impl Default for TransactionPaginator {
    fn default() -> Self {
        Self {
            to_lt: 0,
            limit: DEFAULT_TRANSACTION_LIMIT,
        }
    }
}

impl TransactionPaginator {
    /// Paginator with explicit bounds.
    pub fn new(to_lt: i64, limit: usize) -> Self {
        Self { to_lt, limit }
    }

    /// Walk backward from `from`, newest first.
    ///
    /// Engine errors end the walk with the prefix collected so far; any
    /// other error is returned.
    pub fn walk<S: TransactionSource>(
        &self,
        source: &mut S,
        from: TransactionId,
    ) -> Result<Vec<RawTransaction>, QueryError> {
        let mut collected: Vec<RawTransaction> = Vec::new();
        if self.limit == 0 || from.lt <= self.to_lt {
            return Ok(collected);
        }

        let mut cursor = from;
        let mut batches = 0usize;
        loop {
            let batch = match source.fetch(cursor) {
                Ok(batch) => batch,
                Err(e) if e.is_engine_error() => {
                    debug!(lt = cursor.lt, error = %e, "History walk stopped by engine error");
                    break;
                }
                Err(e) => return Err(e),
            };
            batches += 1;

            for tx in batch.transactions {
                if tx.lt() <= self.to_lt {
                    debug!(batches, collected = collected.len(), "History walk reached to_lt");
                    return Ok(collected);
                }
                if let Some(last) = collected.last() {
                    if tx.lt() >= last.lt() {
                        continue;
                    }
                }
                collected.push(tx);
                if collected.len() >= self.limit {
                    debug!(batches, "History walk reached limit");
                    return Ok(collected);
                }
            }

            match batch.previous_transaction_id {
                Some(next) if !next.is_origin() => {
                    if next.lt >= cursor.lt {
                        warn!(
                            cursor = cursor.lt,
                            next = next.lt,
                            "History cursor did not move backward"
                        );
                        break;
                    }
                    cursor = next;
                }
                _ => break,
            }
        }

        debug!(batches, collected = collected.len(), "History walk exhausted");
        Ok(collected)
    }
}
