//! # Domain Errors
//!
//! Error types for the query layer.
//!
//! Engine errors travel as structured values (`Protocol`) so the Gateway can
//! render its own error body; validation errors are raised before anything is
//! dispatched to a native session.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Numeric codes for failures that do not originate in the engine.
pub mod codes {
    /// Address failed format or checksum validation.
    pub const MALFORMED_ADDRESS: i32 = 416;
    /// Binary cell payload could not be parsed.
    pub const MALFORMED_CELL: i32 = 400;
    /// Response did not arrive before the cumulative deadline.
    pub const TIMEOUT: i32 = 504;
    /// Engine answered with something this layer cannot interpret.
    pub const BAD_RESPONSE: i32 = 502;
    /// No usable native session or worker.
    pub const UNAVAILABLE: i32 = 503;
}

/// Error payload returned by the engine (`@type: "error"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    /// Engine error code.
    pub code: i32,
    /// Engine error message.
    pub message: String,
}

/// Query layer error types.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The native session answered with an error-tagged response.
    #[error("Engine error {}: {}", .0.code, .0.message)]
    Protocol(EngineError),

    /// The response carried an `@type` outside the known envelope set.
    #[error("Unrecognized response type `{0}`")]
    UnrecognizedResponse(String),

    /// The response kind is known but does not answer the request sent.
    #[error("Unexpected response to {request}: got `{got}`")]
    UnexpectedResponse {
        /// `@type` of the request that was sent
        request: &'static str,
        /// `@type` of the response that came back
        got: String,
    },

    /// The message is not a well-formed envelope.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// No matching response arrived within the cumulative deadline.
    #[error("No response to {request} within {waited:?}")]
    Timeout {
        /// `@type` of the request that was sent
        request: &'static str,
        /// Time spent waiting
        waited: Duration,
    },

    /// Address failed format or checksum validation.
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// Binary cell payload failed to parse.
    #[error("Malformed cell: {0}")]
    MalformedCell(String),

    /// The native session could not be created, initialised or written to.
    #[error("Native session unavailable: {0}")]
    SessionUnavailable(String),

    /// The pool has been shut down.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// The worker running the job dropped it without an answer.
    #[error("Worker lost while running the job")]
    WorkerLost,
}

impl QueryError {
    /// Stable numeric code for the Gateway error body.
    ///
    /// Engine errors keep the engine's own code.
    pub fn code(&self) -> i32 {
        match self {
            QueryError::Protocol(e) => e.code,
            QueryError::MalformedAddress(_) => codes::MALFORMED_ADDRESS,
            QueryError::MalformedCell(_) => codes::MALFORMED_CELL,
            QueryError::Timeout { .. } => codes::TIMEOUT,
            QueryError::UnrecognizedResponse(_)
            | QueryError::UnexpectedResponse { .. }
            | QueryError::InvalidEnvelope(_) => codes::BAD_RESPONSE,
            QueryError::SessionUnavailable(_) | QueryError::PoolClosed | QueryError::WorkerLost => {
                codes::UNAVAILABLE
            }
        }
    }

    /// True for errors reported by the engine itself.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, QueryError::Protocol(_))
    }

    /// True for input validation failures raised before dispatch.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QueryError::MalformedAddress(_) | QueryError::MalformedCell(_)
        )
    }
}

impl From<EngineError> for QueryError {
    fn from(e: EngineError) -> Self {
        QueryError::Protocol(e)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        QueryError::InvalidEnvelope(e.to_string())
    }
}
