//! # Response Envelopes
//!
//! The closed set of messages a native session may hand back. Anything
//! outside this set is rejected as `UnrecognizedResponse`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::wire::WireRunResult;
use crate::domain::{
    AccountState, EngineError, ExtendedAccountState, QueryError, QueryFees, QueryInfo,
    RawTransactions, RunResult, NOTIFICATION_PREFIX, SYNC_NOTIFICATION,
};

const EXTENDED_STATE_PREFIX: &str = "generic.accountState";

/// One message received from a native session.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// `error`
    Error(EngineError),
    /// `ok`
    Ok,
    /// `updateSyncState`, never an answer to a query.
    SyncState(Value),
    /// Any other `update*` push, never an answer to a query.
    Update(Value),
    /// `options.info`, the answer to `init`.
    OptionsInfo(Value),
    /// `raw.accountState`
    AccountState(AccountState),
    /// `raw.transactions`
    Transactions(RawTransactions),
    /// `generic.accountState*`
    ExtendedAccountState(ExtendedAccountState),
    /// `smc.info`
    SmcInfo {
        /// Session-local contract id.
        id: i64,
    },
    /// `smc.runResult` with the stack converted to domain values.
    RunResult(RunResult),
    /// `query.info`
    QueryInfo(QueryInfo),
    /// `query.fees`
    QueryFees(QueryFees),
}

impl Response {
    /// Parse one message.
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Classify an already parsed message by its `@type`.
    pub fn from_value(value: Value) -> Result<Self, QueryError> {
        let tag = match value.get("@type").and_then(Value::as_str) {
            Some(tag) => tag.to_string(),
            None => {
                return Err(QueryError::InvalidEnvelope(
                    "message has no @type".to_string(),
                ))
            }
        };

        let response = match tag.as_str() {
            "error" => Response::Error(decode(&tag, value)?),
            "ok" => Response::Ok,
            SYNC_NOTIFICATION => Response::SyncState(value),
            "options.info" => Response::OptionsInfo(value),
            "raw.accountState" => Response::AccountState(decode(&tag, value)?),
            "raw.transactions" => Response::Transactions(decode(&tag, value)?),
            "smc.info" => {
                let id = value.get("id").and_then(Value::as_i64).ok_or_else(|| {
                    QueryError::InvalidEnvelope("smc.info without numeric id".to_string())
                })?;
                Response::SmcInfo { id }
            }
            "smc.runResult" => {
                let wire: WireRunResult = decode(&tag, value)?;
                Response::RunResult(wire.into())
            }
            "query.info" => Response::QueryInfo(decode(&tag, value)?),
            "query.fees" => Response::QueryFees(decode(&tag, value)?),
            t if t.starts_with(EXTENDED_STATE_PREFIX) => {
                Response::ExtendedAccountState(ExtendedAccountState(value))
            }
            t if t.starts_with(NOTIFICATION_PREFIX) => Response::Update(value),
            _ => return Err(QueryError::UnrecognizedResponse(tag)),
        };
        Ok(response)
    }

    /// The `@type` this response arrived with (prefix for extended states).
    pub fn tag(&self) -> &str {
        match self {
            Response::Error(_) => "error",
            Response::Ok => "ok",
            Response::SyncState(_) => SYNC_NOTIFICATION,
            Response::Update(value) => value
                .get("@type")
                .and_then(Value::as_str)
                .unwrap_or(NOTIFICATION_PREFIX),
            Response::OptionsInfo(_) => "options.info",
            Response::AccountState(_) => "raw.accountState",
            Response::Transactions(_) => "raw.transactions",
            Response::ExtendedAccountState(state) => state.kind().unwrap_or(EXTENDED_STATE_PREFIX),
            Response::SmcInfo { .. } => "smc.info",
            Response::RunResult(_) => "smc.runResult",
            Response::QueryInfo(_) => "query.info",
            Response::QueryFees(_) => "query.fees",
        }
    }

    /// True for asynchronous notifications the correlation loop discards.
    pub fn is_notification(&self) -> bool {
        matches!(self, Response::SyncState(_) | Response::Update(_))
    }

    /// Error for a response that does not answer `request`.
    ///
    /// Engine errors keep their structured form.
    pub fn mismatch(self, request: &'static str) -> QueryError {
        match self {
            Response::Error(e) => QueryError::Protocol(e),
            other => QueryError::UnexpectedResponse {
                request,
                got: other.tag().to_string(),
            },
        }
    }
}

fn decode<T: DeserializeOwned>(tag: &str, value: Value) -> Result<T, QueryError> {
    serde_json::from_value(value)
        .map_err(|e| QueryError::InvalidEnvelope(format!("{}: {}", tag, e)))
}
