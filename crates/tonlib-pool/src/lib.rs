//! # Tonlib Pool
//!
//! Concurrency-bridging query layer over the TON light-client engine.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! The native engine exposes a blocking, stateful, single-threaded JSON
//! session with no request ids. This crate makes it poolable:
//! - a fixed set of worker threads, each owning one session for life
//! - send/receive correlation that discards sync notifications under a
//!   cumulative deadline
//! - session recycling after a bounded number of contract loads
//! - backward history pagination, address codecs, wallet classification
//!
//! ## Session Lifecycle
//!
//! | Trigger | Action |
//! |---------|--------|
//! | Worker start | create session, `init`, `setLogVerbosityLevel` |
//! | `load_threshold` loads served | recreate before the next `smc.load` |
//! | Exchange abandoned (deadline, panic) | recreate before the next request |
//! | Pool shutdown | drop session |
//!
//! ## Module Structure
//!
//! ```text
//! tonlib-pool/
//! ├── domain/          # Addresses, account and transaction records, errors
//! ├── protocol/        # Request/response envelopes and QueryBuilder
//! ├── algorithms/      # History pagination, BOC reader, wallet templates
//! ├── ports/           # API trait (inbound) + native session traits (outbound)
//! ├── adapters/        # Session handle and lifecycle, mock engine, tonlibjson
//! ├── application/     # WorkerPool, session operations, TonlibClient
//! └── config.rs        # PoolConfig, NetworkConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod protocol;

// Re-exports
pub use adapters::{MockEngine, SessionEvent, SessionHandle, SessionSettings, WorkerSession};
#[cfg(feature = "tonlibjson")]
pub use adapters::TonlibJsonFactory;
pub use algorithms::{parse_root, Classification, TransactionPaginator, WalletClassifier};
pub use application::{TonlibClient, WorkerPool};
pub use config::{ConfigError, NetworkConfig, PoolConfig};
pub use domain::{
    detect_address, pack_address, unpack_address, AccountState, Address, AddressState,
    DetectedAddress, EngineError, ExtendedAccountState, MethodRef, QueryError, QueryFees,
    RawTransaction, RawTransactions, RunResult, StackEntry, TransactionId, WalletInformation,
    DEFAULT_LOAD_THRESHOLD, DEFAULT_WORKERS,
};
pub use ports::{HistoryRange, NativeSession, SessionFactory, TonQueryApi};
pub use protocol::{QueryBuilder, Request, Response};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
