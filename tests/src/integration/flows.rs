//! # Query Flows
//!
//! Each Gateway-facing operation end to end: caller task → validation →
//! worker job → session exchange → typed result.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tonlib_pool::algorithms::wallet::WALLET_V3_CODE;
    use tonlib_pool::{
        AddressState, HistoryRange, MethodRef, MockEngine, QueryError, RawTransaction,
        StackEntry, TonQueryApi,
    };

    use crate::fixtures::{
        chain_answer, chain_engine, client, tiny_boc, v3_data_b64, tx_id, RAW_ADDRESS,
    };

    fn lts(txs: &[RawTransaction]) -> Vec<i64> {
        txs.iter().map(RawTransaction::lt).collect()
    }

    // =========================================================================
    // ACCOUNT STATE
    // =========================================================================

    #[tokio::test]
    async fn test_account_state_through_sync_noise() {
        let engine = MockEngine::new(|request| match request["@type"].as_str() {
            Some("raw.getAccountState") => Some(json!({
                "@type": "raw.accountState",
                "balance": "-1",
                "code": "",
                "data": "",
                "frozen_hash": "",
                "sync_utime": 0
            })),
            _ => None,
        })
        .with_noise(3);
        let client = client(&engine, 2, 300);

        let state = client.get_account_state(RAW_ADDRESS).await.unwrap();
        assert_eq!(state.address_state(), AddressState::Uninitialized);
        assert_eq!(state.address_state().as_str(), "uninitialized");
        assert_eq!(state.spendable_balance(), 0);
        assert!(state.last_transaction_id.is_none());
    }

    #[tokio::test]
    async fn test_account_state_accepts_friendly_address() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let friendly = client.pack_address(RAW_ADDRESS).unwrap();

        let state = client.get_account_state(&friendly).await.unwrap();
        assert_eq!(state.balance, 1_000_000_000);
        assert_eq!(state.last_transaction_id.map(|id| id.lt), Some(100));
    }

    #[tokio::test]
    async fn test_extended_account_state_is_opaque() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let state = client.get_extended_account_state(RAW_ADDRESS).await.unwrap();
        assert_eq!(state.kind(), Some("generic.accountStateUninited"));
    }

    #[tokio::test]
    async fn test_wallet_information_for_v3_wallet() {
        let data = v3_data_b64();
        let engine = MockEngine::new(move |request| match request["@type"].as_str() {
            Some("raw.getAccountState") => Some(json!({
                "@type": "raw.accountState",
                "balance": "2500000000",
                "code": WALLET_V3_CODE,
                "data": data,
                "last_transaction_id": tx_id(100),
                "frozen_hash": "",
                "sync_utime": 1_600_000_200
            })),
            _ => None,
        });
        let client = client(&engine, 1, 300);

        let info = client.get_wallet_information(RAW_ADDRESS).await.unwrap();
        assert!(info.wallet);
        assert_eq!(info.wallet_type.as_deref(), Some("v3 wallet"));
        assert_eq!(info.seqno, Some(5));
        assert_eq!(info.wallet_id, Some(0x29a9_a317));
        assert_eq!(info.balance, 2_500_000_000);
        assert_eq!(info.account_state, AddressState::Active);
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    #[tokio::test]
    async fn test_transactions_stop_at_limit() {
        let engine = chain_engine();
        let client = client(&engine, 2, 300);
        let range = HistoryRange {
            limit: 2,
            ..HistoryRange::default()
        };
        let txs = client.get_transactions(RAW_ADDRESS, range).await.unwrap();
        assert_eq!(lts(&txs), vec![100, 90]);
        assert_eq!(engine.sent_count("raw.getTransactions"), 1);
    }

    #[tokio::test]
    async fn test_transactions_stop_at_to_lt() {
        let engine = chain_engine();
        let client = client(&engine, 2, 300);
        let range = HistoryRange {
            to_lt: 85,
            ..HistoryRange::default()
        };
        let txs = client.get_transactions(RAW_ADDRESS, range).await.unwrap();
        assert_eq!(lts(&txs), vec![100, 90]);
    }

    #[tokio::test]
    async fn test_transactions_full_history() {
        let engine = chain_engine();
        let client = client(&engine, 2, 300);
        let txs = client
            .get_transactions(RAW_ADDRESS, HistoryRange::default())
            .await
            .unwrap();
        assert_eq!(lts(&txs), vec![100, 90, 80, 70, 60]);
        assert_eq!(engine.sent_count("raw.getTransactions"), 2);
    }

    #[tokio::test]
    async fn test_transactions_from_explicit_cursor() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let range = HistoryRange {
            from_lt: Some(70),
            from_hash: Some("00".repeat(32)),
            ..HistoryRange::default()
        };
        let txs = client.get_transactions(RAW_ADDRESS, range).await.unwrap();
        assert_eq!(lts(&txs), vec![70, 60]);
        assert_eq!(engine.sent_count("raw.getAccountState"), 0);
    }

    #[tokio::test]
    async fn test_raw_transactions_single_batch() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let batch = client
            .raw_get_transactions(RAW_ADDRESS, 100, &"00".repeat(32))
            .await
            .unwrap();
        assert_eq!(lts(&batch.transactions), vec![100, 90, 80]);
        assert_eq!(batch.previous_transaction_id.map(|id| id.lt), Some(70));
        assert_eq!(batch.transactions[0].details["fee"], json!("1000"));
    }

    #[tokio::test]
    async fn test_raw_transactions_engine_error_is_structured() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let err = client
            .raw_get_transactions(RAW_ADDRESS, 55, &"00".repeat(32))
            .await
            .unwrap_err();
        assert!(err.is_engine_error());
        assert_eq!(err.code(), 500);
    }

    // =========================================================================
    // GET-METHODS
    // =========================================================================

    #[tokio::test]
    async fn test_run_get_method_converts_stack() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let result = client
            .run_get_method(RAW_ADDRESS, MethodRef::from("seqno"), vec![StackEntry::number(7)])
            .await
            .unwrap();

        assert_eq!(result.gas_used, 649);
        assert_eq!(result.exit_code, 0);
        assert_eq!(
            result.stack,
            vec![
                StackEntry::Number("5".into()),
                StackEntry::Cell(tiny_boc()),
                StackEntry::Tuple(vec![StackEntry::Number("-1".into())]),
            ]
        );

        let rendered = serde_json::to_value(&result).unwrap();
        assert!(rendered.get("@type").is_none());
        assert_eq!(engine.sent_count("smc.load"), 1);
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    #[tokio::test]
    async fn test_send_raw_message() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        client.send_raw_message(&tiny_boc()).await.unwrap();
        assert_eq!(engine.sent_count("raw.sendMessage"), 1);
    }

    #[tokio::test]
    async fn test_create_and_send_query_runs_both_steps() {
        let engine = chain_engine();
        let client = client(&engine, 3, 300);
        client
            .create_and_send_query(RAW_ADDRESS, &tiny_boc(), None, Some(&[][..]))
            .await
            .unwrap();
        assert_eq!(engine.sent_count("raw.createQuery"), 1);
        assert_eq!(engine.sent_count("query.send"), 1);
    }

    #[tokio::test]
    async fn test_create_and_send_message() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let state_init = tiny_boc();
        client
            .create_and_send_message(RAW_ADDRESS, &tiny_boc(), Some(state_init.as_slice()))
            .await
            .unwrap();
        assert_eq!(engine.sent_count("raw.createAndSendMessage"), 1);
    }

    #[tokio::test]
    async fn test_estimate_fees() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let init = tiny_boc();
        let fees = client
            .estimate_fees(RAW_ADDRESS, &init, Some(init.as_slice()), Some(init.as_slice()), true)
            .await
            .unwrap();
        assert_eq!(fees.source_fees.total(), 4_010);
        assert!(fees.destination_fees.is_empty());
    }

    // =========================================================================
    // FAIL-FAST VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_malformed_inputs_never_reach_a_session() {
        let engine = chain_engine();
        let client = client(&engine, 1, 300);
        let before = engine.events().len();

        let mut corrupted = client.pack_address(RAW_ADDRESS).unwrap();
        corrupted.pop();
        corrupted.push(if corrupted.ends_with('A') { 'B' } else { 'A' });

        let bad_address = client.get_account_state(&corrupted).await.unwrap_err();
        assert!(matches!(bad_address, QueryError::MalformedAddress(_)));

        let bad_body = client
            .create_and_send_query(RAW_ADDRESS, b"not a boc", None, None)
            .await
            .unwrap_err();
        assert!(matches!(bad_body, QueryError::MalformedCell(_)));

        let bad_init = client
            .estimate_fees(RAW_ADDRESS, &tiny_boc(), Some(&[0xb5, 0xee][..]), None, true)
            .await
            .unwrap_err();
        assert!(matches!(bad_init, QueryError::MalformedCell(_)));

        assert_eq!(engine.events().len(), before);
    }

    #[tokio::test]
    async fn test_answers_follow_the_handler() {
        // Sanity check on the fixture itself.
        let answer = chain_answer(&json!({"@type": "smc.load"})).unwrap();
        assert_eq!(answer["id"], json!(1));
        assert!(chain_answer(&json!({"@type": "unknown"})).is_none());
    }
}
