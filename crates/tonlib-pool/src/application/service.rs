//! # Tonlib Client Service
//!
//! Implements `TonQueryApi` on top of the worker pool.
//!
//! Inputs are validated on the caller's task before anything is queued:
//! addresses are parsed (raw or user-friendly, checksum verified) and
//! every binary payload must contain a readable root cell. Only then is a
//! job submitted, carrying owned copies of the validated values.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::algorithms::{parse_root, TransactionPaginator, WalletClassifier};
use crate::application::operations;
use crate::application::pool::WorkerPool;
use crate::config::PoolConfig;
use crate::domain::{
    AccountState, Address, ExtendedAccountState, MethodRef, QueryError, QueryFees,
    RawTransaction, RawTransactions, RunResult, StackEntry, TransactionId, WalletInformation,
};
use crate::ports::{HistoryRange, SessionFactory, TonQueryApi};

/// Query layer client - one pool of native sessions behind an async API.
pub struct TonlibClient {
    /// Worker pool.
    pool: WorkerPool,
    /// Wallet template registry, built once.
    classifier: Arc<WalletClassifier>,
}

impl TonlibClient {
    /// Start the worker pool and build the wallet registry.
    pub fn start(config: &PoolConfig, factory: Arc<dyn SessionFactory>) -> Result<Self, QueryError> {
        config
            .ensure_keystore()
            .map_err(|e| QueryError::SessionUnavailable(e.to_string()))?;
        let classifier = WalletClassifier::new()?;
        let pool = WorkerPool::start(config, factory)?;
        Ok(Self::with_pool(pool, Arc::new(classifier)))
    }

    /// Wrap an already running pool.
    pub fn with_pool(pool: WorkerPool, classifier: Arc<WalletClassifier>) -> Self {
        Self { pool, classifier }
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Stop the pool; later calls fail with `PoolClosed`.
    ///
    /// Blocks until queued jobs finish. Dropping the client instead closes
    /// the pool without waiting.
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

/// Parse a caller-supplied serialized cell bag, or fail with `MalformedCell`.
fn checked_boc(bytes: &[u8], what: &str) -> Result<Vec<u8>, QueryError> {
    parse_root(bytes).map_err(|e| match e {
        QueryError::MalformedCell(reason) => QueryError::MalformedCell(format!("{}: {}", what, reason)),
        other => other,
    })?;
    Ok(bytes.to_vec())
}

/// Optional payload: absent or empty stays empty, anything else must parse.
fn checked_optional_boc(bytes: Option<&[u8]>, what: &str) -> Result<Vec<u8>, QueryError> {
    match bytes {
        Some(bytes) if !bytes.is_empty() => checked_boc(bytes, what),
        _ => Ok(Vec::new()),
    }
}

fn history_start(range: &HistoryRange) -> Result<Option<TransactionId>, QueryError> {
    match (range.from_lt, range.from_hash.as_deref()) {
        (Some(lt), Some(hash)) => TransactionId::from_hex(lt, hash).map(Some),
        _ => Ok(None),
    }
}

#[async_trait]
impl TonQueryApi for TonlibClient {
    async fn get_account_state(&self, address: &str) -> Result<AccountState, QueryError> {
        let address = Address::parse(address)?;
        self.pool
            .submit(move |session| operations::account_state(session, &address))
            .await
    }

    async fn get_extended_account_state(
        &self,
        address: &str,
    ) -> Result<ExtendedAccountState, QueryError> {
        let address = Address::parse(address)?;
        self.pool
            .submit(move |session| operations::extended_account_state(session, &address))
            .await
    }

    async fn get_wallet_information(
        &self,
        address: &str,
    ) -> Result<WalletInformation, QueryError> {
        let state = self.get_account_state(address).await?;
        self.classifier.wallet_information(&state)
    }

    async fn get_transactions(
        &self,
        address: &str,
        range: HistoryRange,
    ) -> Result<Vec<RawTransaction>, QueryError> {
        let address = Address::parse(address)?;
        let from = history_start(&range)?;
        let paginator = TransactionPaginator::new(range.to_lt, range.limit);

        let transactions = self
            .pool
            .submit(move |session| operations::transactions(session, &address, from, paginator))
            .await?;
        debug!(
            address = %address,
            count = transactions.len(),
            limit = range.limit,
            "History walk finished"
        );
        Ok(transactions)
    }

    async fn raw_get_transactions(
        &self,
        address: &str,
        from_lt: i64,
        from_hash: &str,
    ) -> Result<RawTransactions, QueryError> {
        let address = Address::parse(address)?;
        let from = TransactionId::from_hex(from_lt, from_hash)?;
        self.pool
            .submit(move |session| operations::raw_transactions(session, &address, from))
            .await
    }

    async fn run_get_method(
        &self,
        address: &str,
        method: MethodRef,
        stack: Vec<StackEntry>,
    ) -> Result<RunResult, QueryError> {
        let address = Address::parse(address)?;
        self.pool
            .submit(move |session| operations::run_get_method(session, &address, &method, &stack))
            .await
    }

    async fn send_raw_message(&self, boc: &[u8]) -> Result<(), QueryError> {
        let boc = checked_boc(boc, "message")?;
        self.pool
            .submit(move |session| operations::send_message(session, &boc))
            .await
    }

    async fn create_and_send_query(
        &self,
        destination: &str,
        body: &[u8],
        init_code: Option<&[u8]>,
        init_data: Option<&[u8]>,
    ) -> Result<(), QueryError> {
        let destination = Address::parse(destination)?;
        let body = checked_boc(body, "body")?;
        let init_code = checked_optional_boc(init_code, "init_code")?;
        let init_data = checked_optional_boc(init_data, "init_data")?;
        self.pool
            .submit(move |session| {
                operations::create_and_send_query(session, &destination, &body, &init_code, &init_data)
            })
            .await
    }

    async fn create_and_send_message(
        &self,
        destination: &str,
        body: &[u8],
        initial_account_state: Option<&[u8]>,
    ) -> Result<(), QueryError> {
        let destination = Address::parse(destination)?;
        let body = checked_boc(body, "body")?;
        let state_init = checked_optional_boc(initial_account_state, "initial_account_state")?;
        self.pool
            .submit(move |session| {
                operations::create_and_send_message(session, &destination, &body, &state_init)
            })
            .await
    }

    async fn estimate_fees(
        &self,
        destination: &str,
        body: &[u8],
        init_code: Option<&[u8]>,
        init_data: Option<&[u8]>,
        ignore_chksig: bool,
    ) -> Result<QueryFees, QueryError> {
        let destination = Address::parse(destination)?;
        let body = checked_boc(body, "body")?;
        let init_code = checked_optional_boc(init_code, "init_code")?;
        let init_data = checked_optional_boc(init_data, "init_data")?;
        self.pool
            .submit(move |session| {
                operations::estimate_query_fees(
                    session,
                    &destination,
                    &body,
                    &init_code,
                    &init_data,
                    ignore_chksig,
                )
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockEngine;
    use crate::domain::AddressState;
    use serde_json::json;

    const RAW: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";
    // Single cell, 4 data bits.
    const TINY_BOC: &str = "b5ee9c7201010101000300000168";

    fn client(engine: &MockEngine) -> TonlibClient {
        TonlibClient::start(&PoolConfig::for_testing(), Arc::new(engine.clone())).unwrap()
    }

    fn state_engine() -> MockEngine {
        MockEngine::new(|request| match request["@type"].as_str() {
            Some("raw.getAccountState") => Some(json!({
                "@type": "raw.accountState",
                "balance": "-1",
                "code": "",
                "data": "",
                "frozen_hash": "",
                "sync_utime": 1_600_000_000
            })),
            Some("raw.sendMessage") => Some(json!({"@type": "ok"})),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_get_account_state_uninitialized() {
        let engine = state_engine();
        let client = client(&engine);
        let state = client.get_account_state(RAW).await.unwrap();
        assert_eq!(state.address_state(), AddressState::Uninitialized);
        assert_eq!(state.spendable_balance(), 0);
    }

    #[tokio::test]
    async fn test_wallet_information_for_unknown_code() {
        let engine = state_engine();
        let client = client(&engine);
        let info = client.get_wallet_information(RAW).await.unwrap();
        assert!(!info.wallet);
        assert_eq!(info.wallet_type, None);
        assert_eq!(info.account_state, AddressState::Uninitialized);
    }

    #[tokio::test]
    async fn test_malformed_address_fails_before_dispatch() {
        let engine = state_engine();
        let client = client(&engine);
        let err = client.get_account_state("0:zz").await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(engine.sent_count("raw.getAccountState"), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_fails_before_dispatch() {
        let engine = state_engine();
        let client = client(&engine);
        let err = client.send_raw_message(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, QueryError::MalformedCell(ref m) if m.starts_with("message")));
        assert_eq!(engine.sent_count("raw.sendMessage"), 0);

        let boc = hex::decode(TINY_BOC).unwrap();
        client.send_raw_message(&boc).await.unwrap();
        assert_eq!(engine.sent_count("raw.sendMessage"), 1);
    }

    #[tokio::test]
    async fn test_bad_history_hash_fails_before_dispatch() {
        let engine = state_engine();
        let client = client(&engine);
        let range = HistoryRange {
            from_lt: Some(10),
            from_hash: Some("abcd".into()),
            ..HistoryRange::default()
        };
        assert!(client.get_transactions(RAW, range).await.is_err());
        assert_eq!(engine.sent_count("raw.getAccountState"), 0);
    }

    #[tokio::test]
    async fn test_address_helpers() {
        let engine = state_engine();
        let client = client(&engine);
        let packed = client.pack_address(RAW).unwrap();
        assert_eq!(client.unpack_address(&packed).unwrap(), RAW);
        assert_eq!(client.detect_address(&packed).unwrap().raw_form, RAW);
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let engine = state_engine();
        let mut client = client(&engine);
        client.shutdown();
        let err = client.get_account_state(RAW).await.unwrap_err();
        assert!(matches!(err, QueryError::PoolClosed));
    }
}
