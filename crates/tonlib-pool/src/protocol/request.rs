//! # Request Envelopes
//!
//! The closed set of queries this layer sends to a native session.

use serde::Serialize;
use serde_with::{base64::Base64, serde_as};

use super::wire::{AccountAddress, WireMethodId, WireStackEntry, WireTransactionId};
use crate::domain::QueryError;

/// `keyStoreTypeDirectory`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "@type", rename = "keyStoreTypeDirectory")]
pub struct KeyStoreType {
    /// Keystore directory path.
    pub directory: String,
}

/// `config`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "@type", rename = "config")]
pub struct EngineConfig {
    /// Network configuration, serialized as a JSON string.
    pub config: String,
    /// Network name; empty selects the one in `config`.
    pub blockchain_name: String,
    /// Always false: the engine does its own networking.
    pub use_callbacks_for_network: bool,
    /// Bypass the engine's on-disk cache.
    pub ignore_cache: bool,
}

/// `options`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "@type", rename = "options")]
pub struct InitOptions {
    /// Network configuration.
    pub config: EngineConfig,
    /// Keystore location.
    pub keystore_type: KeyStoreType,
}

/// One protocol request.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "@type")]
pub enum Request {
    /// Initialise a fresh session.
    #[serde(rename = "init")]
    Init {
        /// Session options.
        options: InitOptions,
    },

    /// Set the engine's log verbosity.
    #[serde(rename = "setLogVerbosityLevel")]
    SetLogVerbosityLevel {
        /// New level.
        new_verbosity_level: i32,
    },

    /// Read account state.
    #[serde(rename = "raw.getAccountState")]
    RawGetAccountState {
        /// Target account.
        account_address: AccountAddress,
    },

    /// Read one batch of history, starting at a transaction.
    #[serde(rename = "raw.getTransactions")]
    RawGetTransactions {
        /// Target account.
        account_address: AccountAddress,
        /// Newest transaction of the batch.
        from_transaction_id: WireTransactionId,
    },

    /// Read extended account state.
    #[serde(rename = "generic.getAccountState")]
    GenericGetAccountState {
        /// Target account.
        account_address: AccountAddress,
    },

    /// Load a contract into the session.
    #[serde(rename = "smc.load")]
    SmcLoad {
        /// Contract account.
        account_address: AccountAddress,
    },

    /// Run a get-method on a loaded contract.
    #[serde(rename = "smc.runGetMethod")]
    SmcRunGetMethod {
        /// Session-local contract id from `smc.load`.
        id: i64,
        /// Method to run.
        method: WireMethodId,
        /// Arguments.
        stack: Vec<WireStackEntry>,
    },

    /// Broadcast a serialized external message.
    #[serde(rename = "raw.sendMessage")]
    RawSendMessage {
        /// Message BOC.
        #[serde_as(as = "Base64")]
        body: Vec<u8>,
    },

    /// Prepare an external message for later send or fee estimation.
    #[serde(rename = "raw.createQuery")]
    RawCreateQuery {
        /// Destination account.
        destination: AccountAddress,
        /// StateInit code BOC, empty when deployed.
        #[serde_as(as = "Base64")]
        init_code: Vec<u8>,
        /// StateInit data BOC, empty when deployed.
        #[serde_as(as = "Base64")]
        init_data: Vec<u8>,
        /// Message body BOC.
        #[serde_as(as = "Base64")]
        body: Vec<u8>,
    },

    /// Build and broadcast an external message in one step.
    #[serde(rename = "raw.createAndSendMessage")]
    RawCreateAndSendMessage {
        /// Destination account.
        destination: AccountAddress,
        /// Serialized StateInit, empty when deployed.
        #[serde_as(as = "Base64")]
        initial_account_state: Vec<u8>,
        /// Message body BOC.
        #[serde_as(as = "Base64")]
        data: Vec<u8>,
    },

    /// Send a prepared query.
    #[serde(rename = "query.send")]
    QuerySend {
        /// Session-local query id.
        id: i64,
    },

    /// Estimate fees for a prepared query.
    #[serde(rename = "query.estimateFees")]
    QueryEstimateFees {
        /// Session-local query id.
        id: i64,
        /// Skip signature checking during emulation.
        ignore_chksig: bool,
    },
}

impl Request {
    /// The `@type` this request is sent with.
    pub fn tag(&self) -> &'static str {
        match self {
            Request::Init { .. } => "init",
            Request::SetLogVerbosityLevel { .. } => "setLogVerbosityLevel",
            Request::RawGetAccountState { .. } => "raw.getAccountState",
            Request::RawGetTransactions { .. } => "raw.getTransactions",
            Request::GenericGetAccountState { .. } => "generic.getAccountState",
            Request::SmcLoad { .. } => "smc.load",
            Request::SmcRunGetMethod { .. } => "smc.runGetMethod",
            Request::RawSendMessage { .. } => "raw.sendMessage",
            Request::RawCreateQuery { .. } => "raw.createQuery",
            Request::RawCreateAndSendMessage { .. } => "raw.createAndSendMessage",
            Request::QuerySend { .. } => "query.send",
            Request::QueryEstimateFees { .. } => "query.estimateFees",
        }
    }

    /// True for the `smc.load` request that counts against a session's
    /// load budget.
    pub fn is_load(&self) -> bool {
        matches!(self, Request::SmcLoad { .. })
    }

    /// Serialize to the JSON text handed to the native session.
    pub fn to_json(&self) -> Result<String, QueryError> {
        serde_json::to_string(self).map_err(|e| {
            QueryError::InvalidEnvelope(format!("cannot encode {}: {}", self.tag(), e))
        })
    }
}
