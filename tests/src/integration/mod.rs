//! # Integration Flows
//!
//! - `flows`: every `TonQueryApi` operation against a scripted engine
//! - `lifecycle`: session ownership, recycling and deadline recovery

pub mod flows;
pub mod lifecycle;
