//! # Algorithms Module
//!
//! Pure logic with no session access of its own:
//! - `pagination`: backward history walk over batches
//! - `boc`: root-cell reader for serialized cell bags
//! - `wallet`: wallet template registry and field extraction

pub mod boc;
pub mod pagination;
pub mod wallet;

pub use boc::{parse_root, BitReader, Cell};
pub use pagination::{TransactionPaginator, TransactionSource};
pub use wallet::{
    Classification, DataExtractor, SeqnoExtractor, V3Extractor, WalletClassifier, WalletFields,
    WalletTemplate,
};
