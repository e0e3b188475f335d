//! # Query Builder
//!
//! Pure construction of request envelopes from domain parameters.
//! Addresses are always sent in raw form.

use super::request::{EngineConfig, InitOptions, KeyStoreType, Request};
use super::wire::{AccountAddress, WireMethodId, WireStackEntry};
use crate::domain::{Address, MethodRef, StackEntry, TransactionId};

/// Builds one request per operation kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    /// `init` with a serialized network config and keystore directory.
    pub fn init(config_json: String, keystore: &str) -> Request {
        Request::Init {
            options: InitOptions {
                config: EngineConfig {
                    config: config_json,
                    blockchain_name: String::new(),
                    use_callbacks_for_network: false,
                    ignore_cache: false,
                },
                keystore_type: KeyStoreType {
                    directory: keystore.to_string(),
                },
            },
        }
    }

    /// `setLogVerbosityLevel`
    pub fn set_verbosity(level: i32) -> Request {
        Request::SetLogVerbosityLevel {
            new_verbosity_level: level,
        }
    }

    /// `raw.getAccountState`
    pub fn get_account_state(address: &Address) -> Request {
        Request::RawGetAccountState {
            account_address: address.into(),
        }
    }

    /// `generic.getAccountState`
    pub fn get_extended_account_state(address: &Address) -> Request {
        Request::GenericGetAccountState {
            account_address: address.into(),
        }
    }

    /// `raw.getTransactions` starting at `from` (inclusive).
    pub fn get_transactions(address: &Address, from: TransactionId) -> Request {
        Request::RawGetTransactions {
            account_address: address.into(),
            from_transaction_id: from.into(),
        }
    }

    /// `smc.load`
    pub fn load_contract(address: &Address) -> Request {
        Request::SmcLoad {
            account_address: address.into(),
        }
    }

    /// `smc.runGetMethod` on a contract id returned by `smc.load`.
    pub fn run_get_method(contract_id: i64, method: &MethodRef, stack: &[StackEntry]) -> Request {
        let method = match method {
            MethodRef::Number(number) => WireMethodId::Number { number: *number },
            MethodRef::Name(name) => WireMethodId::Name { name: name.clone() },
        };
        Request::SmcRunGetMethod {
            id: contract_id,
            method,
            stack: stack.iter().map(WireStackEntry::from).collect(),
        }
    }

    /// `raw.sendMessage`
    pub fn send_message(boc: &[u8]) -> Request {
        Request::RawSendMessage {
            body: boc.to_vec(),
        }
    }

    /// `raw.createQuery`; empty init code/data means the destination is
    /// already deployed.
    pub fn create_query(
        destination: &Address,
        body: &[u8],
        init_code: &[u8],
        init_data: &[u8],
    ) -> Request {
        Request::RawCreateQuery {
            destination: AccountAddress::from(destination),
            init_code: init_code.to_vec(),
            init_data: init_data.to_vec(),
            body: body.to_vec(),
        }
    }

    /// `raw.createAndSendMessage`
    pub fn create_and_send_message(
        destination: &Address,
        body: &[u8],
        initial_account_state: &[u8],
    ) -> Request {
        Request::RawCreateAndSendMessage {
            destination: AccountAddress::from(destination),
            initial_account_state: initial_account_state.to_vec(),
            data: body.to_vec(),
        }
    }

    /// `query.send`
    pub fn send_query(query_id: i64) -> Request {
        Request::QuerySend { id: query_id }
    }

    /// `query.estimateFees`
    pub fn estimate_fees(query_id: i64, ignore_chksig: bool) -> Request {
        Request::QueryEstimateFees {
            id: query_id,
            ignore_chksig,
        }
    }
}
