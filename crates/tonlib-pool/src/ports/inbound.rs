//! # Inbound Ports
//!
//! API trait defining what the Gateway can ask of the query layer.
//!
//! Addresses are accepted in raw or user-friendly form; message payloads
//! are serialized bags of cells. Both are validated before anything is
//! dispatched to a worker.

use async_trait::async_trait;

use crate::domain::{
    detect_address, pack_address, unpack_address, AccountState, DetectedAddress,
    ExtendedAccountState, MethodRef, QueryError, QueryFees, RawTransaction, RawTransactions,
    RunResult, StackEntry, WalletInformation,
};

/// Where a history walk starts and stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRange {
    /// Starting logical time; with `from_hash`, overrides the account's
    /// last transaction.
    pub from_lt: Option<i64>,
    /// Starting transaction hash, hex.
    pub from_hash: Option<String>,
    /// Exclusive lower bound on logical time.
    pub to_lt: i64,
    /// Maximum number of transactions.
    pub limit: usize,
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self {
            from_lt: None,
            from_hash: None,
            to_lt: 0,
            limit: crate::domain::DEFAULT_TRANSACTION_LIMIT,
        }
    }
}

/// Query layer API - inbound port.
#[async_trait]
pub trait TonQueryApi: Send + Sync {
    /// Raw account state.
    async fn get_account_state(&self, address: &str) -> Result<AccountState, QueryError>;

    /// Engine-specific extended account state.
    async fn get_extended_account_state(
        &self,
        address: &str,
    ) -> Result<ExtendedAccountState, QueryError>;

    /// Account state combined with wallet classification.
    async fn get_wallet_information(&self, address: &str)
        -> Result<WalletInformation, QueryError>;

    /// History walk, newest first.
    async fn get_transactions(
        &self,
        address: &str,
        range: HistoryRange,
    ) -> Result<Vec<RawTransaction>, QueryError>;

    /// One history batch starting at `(from_lt, from_hash)`, unchanged.
    async fn raw_get_transactions(
        &self,
        address: &str,
        from_lt: i64,
        from_hash: &str,
    ) -> Result<RawTransactions, QueryError>;

    /// Run a get-method on a contract.
    async fn run_get_method(
        &self,
        address: &str,
        method: MethodRef,
        stack: Vec<StackEntry>,
    ) -> Result<RunResult, QueryError>;

    /// Broadcast a serialized external message.
    async fn send_raw_message(&self, boc: &[u8]) -> Result<(), QueryError>;

    /// Prepare and send an external message.
    async fn create_and_send_query(
        &self,
        destination: &str,
        body: &[u8],
        init_code: Option<&[u8]>,
        init_data: Option<&[u8]>,
    ) -> Result<(), QueryError>;

    /// Build and send a message whose StateInit was prepared by the caller.
    async fn create_and_send_message(
        &self,
        destination: &str,
        body: &[u8],
        initial_account_state: Option<&[u8]>,
    ) -> Result<(), QueryError>;

    /// Estimate fees for an external message.
    async fn estimate_fees(
        &self,
        destination: &str,
        body: &[u8],
        init_code: Option<&[u8]>,
        init_data: Option<&[u8]>,
        ignore_chksig: bool,
    ) -> Result<QueryFees, QueryError>;

    /// Every representation of an address.
    fn detect_address(&self, address: &str) -> Result<DetectedAddress, QueryError> {
        detect_address(address)
    }

    /// Bounceable user-friendly form.
    fn pack_address(&self, address: &str) -> Result<String, QueryError> {
        pack_address(address)
    }

    /// Raw form.
    fn unpack_address(&self, address: &str) -> Result<String, QueryError> {
        unpack_address(address)
    }
}
