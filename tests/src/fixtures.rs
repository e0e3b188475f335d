//! # Fixtures
//!
//! A scripted engine modelled on a small account with five transactions
//! and one deployed contract, plus sample serialized cells.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use tonlib_pool::{MockEngine, PoolConfig, TonlibClient};

/// Account used by every flow.
pub const RAW_ADDRESS: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";

/// 32 zero bytes, base64.
pub const ZERO_HASH_B64: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Single cell with 4 data bits.
pub const TINY_BOC_HEX: &str = "b5ee9c7201010101000300000168";

/// Wallet v3 data cell: seqno 5, wallet id 0x29a9a317.
pub const V3_DATA_BOC_HEX: &str = "b5ee9c7201010101000a0000100000000529a9a317";

/// Decoded `TINY_BOC_HEX`.
pub fn tiny_boc() -> Vec<u8> {
    hex::decode(TINY_BOC_HEX).unwrap_or_default()
}

/// `V3_DATA_BOC_HEX` as the engine would send it.
pub fn v3_data_b64() -> String {
    STANDARD.encode(hex::decode(V3_DATA_BOC_HEX).unwrap_or_default())
}

/// `internal.transactionId` at `lt`.
pub fn tx_id(lt: i64) -> Value {
    json!({"@type": "internal.transactionId", "lt": lt.to_string(), "hash": ZERO_HASH_B64})
}

/// `raw.transaction` at `lt`.
pub fn tx(lt: i64) -> Value {
    json!({
        "@type": "raw.transaction",
        "transaction_id": tx_id(lt),
        "utime": 1_600_000_000 + lt,
        "data": "",
        "fee": "1000",
        "storage_fee": "0",
        "other_fee": "1000",
        "in_msg": null,
        "out_msgs": []
    })
}

/// Answer for the scripted account, or `None` to stay silent.
pub fn chain_answer(request: &Value) -> Option<Value> {
    match request["@type"].as_str()? {
        "raw.getAccountState" => Some(json!({
            "@type": "raw.accountState",
            "balance": "1000000000",
            "code": "",
            "data": "",
            "last_transaction_id": tx_id(100),
            "frozen_hash": "",
            "sync_utime": 1_600_000_200
        })),
        "generic.getAccountState" => Some(json!({
            "@type": "generic.accountStateUninited",
            "account_state": {"@type": "uninited.accountState", "frozen_hash": ""}
        })),
        "raw.getTransactions" => {
            let from: i64 = request["from_transaction_id"]["lt"].as_str()?.parse().ok()?;
            Some(match from {
                100 => json!({
                    "@type": "raw.transactions",
                    "transactions": [tx(100), tx(90), tx(80)],
                    "previous_transaction_id": tx_id(70)
                }),
                70 => json!({
                    "@type": "raw.transactions",
                    "transactions": [tx(70), tx(60)],
                    "previous_transaction_id": tx_id(0)
                }),
                _ => json!({"@type": "error", "code": 500, "message": "LITE_SERVER_UNKNOWN: cannot load block"}),
            })
        }
        "smc.load" => Some(json!({"@type": "smc.info", "id": 1})),
        "smc.runGetMethod" => Some(json!({
            "@type": "smc.runResult",
            "gas_used": 649,
            "stack": [
                {"@type": "tvm.stackEntryNumber", "number": {"@type": "tvm.numberDecimal", "number": "5"}},
                {"@type": "tvm.stackEntryCell", "cell": {"@type": "tvm.cell", "bytes": STANDARD.encode(tiny_boc())}},
                {"@type": "tvm.stackEntryTuple", "tuple": {"@type": "tvm.tuple", "elements": [
                    {"@type": "tvm.stackEntryNumber", "number": {"@type": "tvm.numberDecimal", "number": "-1"}}
                ]}}
            ],
            "exit_code": 0
        })),
        "raw.createQuery" => Some(json!({
            "@type": "query.info",
            "id": "5",
            "valid_until": 1_600_000_260,
            "body_hash": ZERO_HASH_B64
        })),
        "query.estimateFees" => Some(json!({
            "@type": "query.fees",
            "source_fees": {"@type": "fees", "in_fwd_fee": 1_000, "storage_fee": 10, "gas_fee": 3_000, "fwd_fee": 0},
            "destination_fees": []
        })),
        "raw.sendMessage" | "raw.createAndSendMessage" | "query.send" => Some(json!({"@type": "ok"})),
        _ => None,
    }
}

/// Engine answering with `chain_answer`.
pub fn chain_engine() -> MockEngine {
    MockEngine::new(chain_answer)
}

/// Test pool configuration with an explicit size and load budget.
pub fn pool_config(workers: usize, load_threshold: u32) -> PoolConfig {
    PoolConfig {
        workers,
        load_threshold,
        receive_timeout: Duration::from_millis(20),
        exec_deadline: Duration::from_millis(300),
        ..PoolConfig::for_testing()
    }
}

/// Client over `engine`.
pub fn client(engine: &MockEngine, workers: usize, load_threshold: u32) -> TonlibClient {
    match TonlibClient::start(&pool_config(workers, load_threshold), Arc::new(engine.clone())) {
        Ok(client) => client,
        Err(e) => panic!("mock pool failed to start: {}", e),
    }
}
