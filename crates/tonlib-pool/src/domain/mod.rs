//! # Domain Module
//!
//! Core types for the query layer: addresses, account and transaction
//! records, get-method values, errors and invariants.

pub mod address;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use address::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
