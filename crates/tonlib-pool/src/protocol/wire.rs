//! # Wire Records
//!
//! Nested records shared by request and response envelopes, in the
//! engine's JSON dialect.

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, DisplayFromStr, PickFirst};

use crate::domain::{Address, RunResult, StackEntry, TransactionId};

/// `accountAddress`. Carries no `@type`; the engine infers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAddress {
    /// Address in raw form.
    pub account_address: String,
}

impl From<&Address> for AccountAddress {
    fn from(address: &Address) -> Self {
        Self {
            account_address: address.to_raw(),
        }
    }
}

/// `internal.transactionId`
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "internal.transactionId")]
pub struct WireTransactionId {
    /// Logical time, as a decimal string.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub lt: i64,
    /// Transaction hash.
    #[serde_as(as = "Base64")]
    pub hash: [u8; 32],
}

impl From<TransactionId> for WireTransactionId {
    fn from(id: TransactionId) -> Self {
        Self {
            lt: id.lt,
            hash: id.hash,
        }
    }
}

/// `smc.MethodId`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum WireMethodId {
    /// `smc.methodIdNumber`
    #[serde(rename = "smc.methodIdNumber")]
    Number {
        /// Method id.
        number: i32,
    },
    /// `smc.methodIdName`
    #[serde(rename = "smc.methodIdName")]
    Name {
        /// Method name.
        name: String,
    },
}

/// `tvm.slice`
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "tvm.slice")]
pub struct TvmSlice {
    /// Serialized BOC.
    #[serde_as(as = "Base64")]
    pub bytes: Vec<u8>,
}

/// `tvm.cell`
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "tvm.cell")]
pub struct TvmCell {
    /// Serialized BOC.
    #[serde_as(as = "Base64")]
    pub bytes: Vec<u8>,
}

/// `tvm.numberDecimal`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "tvm.numberDecimal")]
pub struct TvmNumber {
    /// Decimal digits.
    pub number: String,
}

/// `tvm.tuple`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "tvm.tuple")]
pub struct TvmTuple {
    /// Elements.
    #[serde(default)]
    pub elements: Vec<WireStackEntry>,
}

/// `tvm.list`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "tvm.list")]
pub struct TvmList {
    /// Elements.
    #[serde(default)]
    pub elements: Vec<WireStackEntry>,
}

/// `tvm.StackEntry`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum WireStackEntry {
    /// `tvm.stackEntrySlice`
    #[serde(rename = "tvm.stackEntrySlice")]
    Slice {
        /// Slice payload.
        slice: TvmSlice,
    },
    /// `tvm.stackEntryCell`
    #[serde(rename = "tvm.stackEntryCell")]
    Cell {
        /// Cell payload.
        cell: TvmCell,
    },
    /// `tvm.stackEntryNumber`
    #[serde(rename = "tvm.stackEntryNumber")]
    Number {
        /// Number payload.
        number: TvmNumber,
    },
    /// `tvm.stackEntryTuple`
    #[serde(rename = "tvm.stackEntryTuple")]
    Tuple {
        /// Tuple payload.
        tuple: TvmTuple,
    },
    /// `tvm.stackEntryList`
    #[serde(rename = "tvm.stackEntryList")]
    List {
        /// List payload.
        list: TvmList,
    },
    /// `tvm.stackEntryUnsupported`
    #[serde(rename = "tvm.stackEntryUnsupported")]
    Unsupported,
}

impl From<&StackEntry> for WireStackEntry {
    fn from(entry: &StackEntry) -> Self {
        match entry {
            StackEntry::Slice(bytes) => WireStackEntry::Slice {
                slice: TvmSlice {
                    bytes: bytes.clone(),
                },
            },
            StackEntry::Cell(bytes) => WireStackEntry::Cell {
                cell: TvmCell {
                    bytes: bytes.clone(),
                },
            },
            StackEntry::Number(number) => WireStackEntry::Number {
                number: TvmNumber {
                    number: number.clone(),
                },
            },
            StackEntry::Tuple(items) => WireStackEntry::Tuple {
                tuple: TvmTuple {
                    elements: items.iter().map(WireStackEntry::from).collect(),
                },
            },
            StackEntry::List(items) => WireStackEntry::List {
                list: TvmList {
                    elements: items.iter().map(WireStackEntry::from).collect(),
                },
            },
            StackEntry::Unsupported => WireStackEntry::Unsupported,
        }
    }
}

impl From<WireStackEntry> for StackEntry {
    fn from(entry: WireStackEntry) -> Self {
        match entry {
            WireStackEntry::Slice { slice } => StackEntry::Slice(slice.bytes),
            WireStackEntry::Cell { cell } => StackEntry::Cell(cell.bytes),
            WireStackEntry::Number { number } => StackEntry::Number(number.number),
            WireStackEntry::Tuple { tuple } => {
                StackEntry::Tuple(tuple.elements.into_iter().map(StackEntry::from).collect())
            }
            WireStackEntry::List { list } => {
                StackEntry::List(list.elements.into_iter().map(StackEntry::from).collect())
            }
            WireStackEntry::Unsupported => StackEntry::Unsupported,
        }
    }
}

/// `smc.runResult` as the engine sends it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WireRunResult {
    /// Gas consumed.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub gas_used: i64,
    /// Result stack, absent on some failures.
    #[serde(default)]
    pub stack: Option<Vec<WireStackEntry>>,
    /// TVM exit code.
    #[serde(default)]
    pub exit_code: i32,
}

impl From<WireRunResult> for RunResult {
    fn from(wire: WireRunResult) -> Self {
        RunResult {
            gas_used: wire.gas_used,
            stack: wire
                .stack
                .unwrap_or_default()
                .into_iter()
                .map(StackEntry::from)
                .collect(),
            exit_code: wire.exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_entry_wire_shape() {
        let wire = WireStackEntry::from(&StackEntry::number(42u32));
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({
                "@type": "tvm.stackEntryNumber",
                "number": {"@type": "tvm.numberDecimal", "number": "42"}
            })
        );
    }

    #[test]
    fn test_nested_stack_from_engine() {
        let wire: Vec<WireStackEntry> = serde_json::from_value(json!([
            {"@type": "tvm.stackEntryNumber", "number": {"@type": "tvm.numberDecimal", "number": "7"}},
            {"@type": "tvm.stackEntryTuple", "tuple": {"@type": "tvm.tuple", "elements": [
                {"@type": "tvm.stackEntryCell", "cell": {"@type": "tvm.cell", "bytes": "AQI="}},
                {"@type": "tvm.stackEntryUnsupported"}
            ]}}
        ]))
        .unwrap();

        let stack: Vec<StackEntry> = wire.into_iter().map(StackEntry::from).collect();
        assert_eq!(
            stack,
            vec![
                StackEntry::Number("7".into()),
                StackEntry::Tuple(vec![StackEntry::Cell(vec![1, 2]), StackEntry::Unsupported]),
            ]
        );
    }

    #[test]
    fn test_transaction_id_wire_shape() {
        let wire = WireTransactionId::from(TransactionId::new(100, [1; 32]));
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({
                "@type": "internal.transactionId",
                "lt": "100",
                "hash": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="
            })
        );
    }

    #[test]
    fn test_run_result_without_stack() {
        let wire: WireRunResult =
            serde_json::from_value(json!({"gas_used": 100, "exit_code": 11})).unwrap();
        let result = RunResult::from(wire);
        assert!(result.stack.is_empty());
        assert_eq!(result.exit_code, 11);
    }
}
