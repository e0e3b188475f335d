//! # Domain Entities
//!
//! Account and transaction records as the engine reports them.
//!
//! The engine writes 64-bit integers as decimal strings and byte fields as
//! base64; the serde attributes below accept that dialect and write it back
//! unchanged, so records can be handed to the Gateway as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{base64::Base64, serde_as, DisplayFromStr, PickFirst};

use super::errors::QueryError;
use super::value_objects::StackEntry;

/// Identifier of one transaction: logical time plus transaction hash.
///
/// Ordered by `lt` only; ties are resolved inside the engine.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Logical time.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub lt: i64,
    /// Transaction hash.
    #[serde_as(as = "Base64")]
    pub hash: [u8; 32],
}

impl TransactionId {
    /// Create a transaction id.
    pub fn new(lt: i64, hash: [u8; 32]) -> Self {
        Self { lt, hash }
    }

    /// Build from a logical time and a hex encoded hash.
    pub fn from_hex(lt: i64, hash_hex: &str) -> Result<Self, QueryError> {
        let bytes = hex::decode(hash_hex.trim())
            .map_err(|e| QueryError::InvalidEnvelope(format!("transaction hash: {}", e)))?;
        let hash: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            QueryError::InvalidEnvelope(format!("transaction hash is {} bytes, expected 32", b.len()))
        })?;
        Ok(Self { lt, hash })
    }

    /// Hash as lowercase hex.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// True for the sentinel id the engine reports for an empty history.
    pub fn is_origin(&self) -> bool {
        self.lt == 0
    }
}

/// Lifecycle state of an account, derived from its code and frozen hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressState {
    /// No code and no frozen hash.
    Uninitialized,
    /// No code, but a frozen state hash.
    Frozen,
    /// Has code.
    Active,
}

impl AddressState {
    /// Derive the state from the raw code and frozen hash fields.
    pub fn derive(code: &[u8], frozen_hash: &[u8]) -> Self {
        match (code.is_empty(), frozen_hash.is_empty()) {
            (true, true) => AddressState::Uninitialized,
            (true, false) => AddressState::Frozen,
            (false, _) => AddressState::Active,
        }
    }

    /// Lowercase name as shown to Gateway clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressState::Uninitialized => "uninitialized",
            AddressState::Frozen => "frozen",
            AddressState::Active => "active",
        }
    }
}

/// Account state (`raw.accountState`).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Balance in nanotons; the engine reports `-1` for nonexistent accounts.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub balance: i64,
    /// Contract code BOC.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub code: Vec<u8>,
    /// Contract data BOC.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub data: Vec<u8>,
    /// Last transaction on the account.
    #[serde(default)]
    pub last_transaction_id: Option<TransactionId>,
    /// Hash of the frozen state, empty unless frozen.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub frozen_hash: Vec<u8>,
    /// Unix time of the block the state was read from.
    #[serde(default)]
    pub sync_utime: i64,
}

impl AccountState {
    /// Derived lifecycle state.
    pub fn address_state(&self) -> AddressState {
        AddressState::derive(&self.code, &self.frozen_hash)
    }

    /// Balance clamped at zero.
    pub fn spendable_balance(&self) -> i64 {
        self.balance.max(0)
    }

    /// Cursor for a history walk, if the account has any transactions.
    pub fn history_head(&self) -> Option<TransactionId> {
        self.last_transaction_id.filter(|id| !id.is_origin())
    }
}

/// Extended account state (`generic.accountState*`), kept opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtendedAccountState(pub Value);

impl ExtendedAccountState {
    /// The engine's `@type` for this state, e.g. `generic.accountStateWalletV3`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("@type").and_then(Value::as_str)
    }
}

/// One transaction (`raw.transaction`).
///
/// Only the id and time are interpreted; messages, fees and the rest of the
/// record are carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Transaction id.
    pub transaction_id: TransactionId,
    /// Unix time of the transaction.
    #[serde(default)]
    pub utime: i64,
    /// Remaining engine fields.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl RawTransaction {
    /// Logical time of the transaction.
    pub fn lt(&self) -> i64 {
        self.transaction_id.lt
    }
}

/// One batch of history (`raw.transactions`), newest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTransactions {
    /// Transactions in this batch.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    /// Cursor for the next (older) batch.
    #[serde(default)]
    pub previous_transaction_id: Option<TransactionId>,
}

/// Result of a get-method run with the stack in domain form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Gas consumed.
    pub gas_used: i64,
    /// Result stack.
    pub stack: Vec<StackEntry>,
    /// TVM exit code.
    pub exit_code: i32,
}

/// Prepared external message (`query.info`).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Session-local query id.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub id: i64,
    /// Expiry unix time.
    #[serde(default)]
    pub valid_until: i64,
    /// Hash of the message body.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub body_hash: Vec<u8>,
}

/// Fee components for one account.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fees {
    /// Inbound forwarding fee.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub in_fwd_fee: i64,
    /// Storage fee.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub storage_fee: i64,
    /// Computation fee.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub gas_fee: i64,
    /// Outbound forwarding fee.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub fwd_fee: i64,
}

impl Fees {
    /// Sum of all components.
    pub fn total(&self) -> i64 {
        self.in_fwd_fee + self.storage_fee + self.gas_fee + self.fwd_fee
    }
}

/// Fee estimate (`query.fees`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFees {
    /// Fees paid by the sender.
    #[serde(default)]
    pub source_fees: Fees,
    /// Fees paid along each destination.
    #[serde(default)]
    pub destination_fees: Vec<Fees>,
}

/// Account state combined with wallet classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInformation {
    /// Whether the code matches a known wallet template.
    pub wallet: bool,
    /// Template name, when recognised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_type: Option<String>,
    /// Sequence number, when recognised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seqno: Option<u32>,
    /// Wallet identifier (v3 template only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<u32>,
    /// Balance clamped at zero.
    pub balance: i64,
    /// Derived lifecycle state.
    pub account_state: AddressState,
    /// Last transaction on the account.
    pub last_transaction_id: Option<TransactionId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_address_state_derivation() {
        assert_eq!(AddressState::derive(b"", b""), AddressState::Uninitialized);
        assert_eq!(AddressState::derive(b"", b"\x01"), AddressState::Frozen);
        assert_eq!(AddressState::derive(b"\x01", b""), AddressState::Active);
        assert_eq!(AddressState::Uninitialized.as_str(), "uninitialized");
    }

    #[test]
    fn test_account_state_from_engine_json() {
        let state: AccountState = serde_json::from_value(json!({
            "@type": "raw.accountState",
            "balance": "-1",
            "code": "",
            "data": "",
            "last_transaction_id": {
                "@type": "internal.transactionId",
                "lt": "0",
                "hash": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
            },
            "frozen_hash": "",
            "sync_utime": 1600000000
        }))
        .unwrap();

        assert_eq!(state.address_state(), AddressState::Uninitialized);
        assert_eq!(state.spendable_balance(), 0);
        assert!(state.history_head().is_none());
    }

    #[test]
    fn test_transaction_id_hex() {
        let hex_hash = "ab".repeat(32);
        let id = TransactionId::from_hex(42, &hex_hash).unwrap();
        assert_eq!(id.hash, [0xab; 32]);
        assert_eq!(id.hash_hex(), hex_hash);
        assert!(TransactionId::from_hex(1, "abcd").is_err());
        assert!(TransactionId::from_hex(1, "zz").is_err());
    }

    #[test]
    fn test_transaction_id_accepts_numeric_lt() {
        let id: TransactionId = serde_json::from_value(json!({
            "lt": 100,
            "hash": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="
        }))
        .unwrap();
        assert_eq!(id.lt, 100);
        assert_eq!(id.hash, [1u8; 32]);

        let back = serde_json::to_value(id).unwrap();
        assert_eq!(back["lt"], json!("100"));
    }

    #[test]
    fn test_raw_transaction_keeps_details() {
        let tx: RawTransaction = serde_json::from_value(json!({
            "@type": "raw.transaction",
            "utime": 1700000000,
            "fee": "1000",
            "transaction_id": {"lt": "7", "hash": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="},
            "in_msg": {"source": "", "value": "5"}
        }))
        .unwrap();

        assert_eq!(tx.lt(), 7);
        assert_eq!(tx.details["fee"], json!("1000"));
        assert!(tx.details.contains_key("in_msg"));
    }

    #[test]
    fn test_fees_total() {
        let fees = Fees {
            in_fwd_fee: 1,
            storage_fee: 2,
            gas_fee: 3,
            fwd_fee: 4,
        };
        assert_eq!(fees.total(), 10);
    }
}
