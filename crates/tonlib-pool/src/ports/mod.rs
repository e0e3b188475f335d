//! # Ports Module
//!
//! Hexagonal boundaries: the Gateway-facing API (inbound) and the native
//! session it is built on (outbound).

pub mod inbound;
pub mod outbound;

pub use inbound::{HistoryRange, TonQueryApi};
pub use outbound::{NativeSession, SessionFactory};
