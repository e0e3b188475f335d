//! # Protocol Module
//!
//! Envelopes exchanged with a native session: the request and response
//! sets, their nested wire records, and the builder that assembles
//! requests from domain values.

pub mod builder;
pub mod request;
pub mod response;
pub mod wire;

pub use builder::QueryBuilder;
pub use request::{EngineConfig, InitOptions, KeyStoreType, Request};
pub use response::Response;
pub use wire::{
    AccountAddress, WireMethodId, WireRunResult, WireStackEntry, WireTransactionId,
};
