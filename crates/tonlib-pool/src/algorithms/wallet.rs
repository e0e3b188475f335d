//! # Wallet Classifier
//!
//! Recognises well-known wallet contracts by the SHA-256 of their code
//! and reads template-specific fields from their data cell.
//!
//! The registry is immutable and built once; lookups never fail, an
//! unknown hash simply means "not a wallet".

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use super::boc::parse_root;
use crate::domain::{AccountState, QueryError, WalletInformation};

/// Code BOC of the simple wallet template.
pub const SIMPLE_WALLET_CODE: &str = "te6cckEBAQEARAAAhP8AIN2k8mCBAgDXGCDXCx/tRNDTH9P/0VESuvKhIvkBVBBE+RDyovgAAdMfMSDXSpbTB9QC+wDe0aTIyx/L/8ntVEH98Ik=";

/// Code BOC of the standard wallet template.
pub const STANDARD_WALLET_CODE: &str = "te6cckEBAQEAUwAAov8AIN0gggFMl7qXMO1E0NcLH+Ck8mCBAgDXGCDXCx/tRNDTH9P/0VESuvKhIvkBVBBE+RDyovgAAdMfMSDXSpbTB9QC+wDe0aTIyx/L/8ntVNDieG8=";

/// Code BOC of the v3 wallet template.
pub const WALLET_V3_CODE: &str = "te6cckEBAQEAYgAAwP8AIN0gggFMl7qXMO1E0NcLH+Ck8mCDCNcYINMf0x/TH/gjE7vyY+1E0NMf0x/T/9FRMrryoVFEuvKiBPkBVBBV+RDyo/gAkyDXSpbTB9QC+wDo0QGkyMsfyx/L/8ntVD++buA=";

/// Fields read from a wallet's data cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletFields {
    /// Sequence number (first 32 bits).
    pub seqno: u32,
    /// Wallet id (next 32 bits, v3 only).
    pub wallet_id: Option<u32>,
}

/// Reads template-specific fields from a data BOC.
pub trait DataExtractor: Send + Sync + fmt::Debug {
    /// Decode `data` and extract fields.
    fn extract(&self, data: &[u8]) -> Result<WalletFields, QueryError>;
}

/// Reads a leading 32-bit sequence number.
#[derive(Debug, Default)]
pub struct SeqnoExtractor;

impl DataExtractor for SeqnoExtractor {
    fn extract(&self, data: &[u8]) -> Result<WalletFields, QueryError> {
        let cell = parse_root(data)?;
        let seqno = cell.reader().load_u32()?;
        Ok(WalletFields {
            seqno,
            wallet_id: None,
        })
    }
}

/// Reads a sequence number followed by a 32-bit wallet id.
#[derive(Debug, Default)]
pub struct V3Extractor;

impl DataExtractor for V3Extractor {
    fn extract(&self, data: &[u8]) -> Result<WalletFields, QueryError> {
        let cell = parse_root(data)?;
        let mut reader = cell.reader();
        let seqno = reader.load_u32()?;
        let wallet_id = reader.load_u32()?;
        Ok(WalletFields {
            seqno,
            wallet_id: Some(wallet_id),
        })
    }
}

/// A known contract template.
#[derive(Debug)]
pub struct WalletTemplate {
    /// SHA-256 of the decoded code BOC.
    pub code_hash: [u8; 32],
    /// Human-readable type name.
    pub type_name: &'static str,
    /// Data field reader.
    pub extractor: Box<dyn DataExtractor>,
}

/// Outcome of classifying one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Code matches no known template.
    NotWallet,
    /// Code matches a template.
    Wallet {
        /// Template name.
        type_name: &'static str,
        /// Extracted fields.
        fields: WalletFields,
    },
}

/// Registry of wallet templates keyed by code hash.
#[derive(Debug)]
pub struct WalletClassifier {
    templates: HashMap<[u8; 32], WalletTemplate>,
}

impl WalletClassifier {
    /// Registry with the three built-in templates.
    pub fn new() -> Result<Self, QueryError> {
        Ok(Self::with_templates(vec![
            template(SIMPLE_WALLET_CODE, "simple wallet", Box::new(SeqnoExtractor))?,
            template(STANDARD_WALLET_CODE, "standard wallet", Box::new(SeqnoExtractor))?,
            template(WALLET_V3_CODE, "v3 wallet", Box::new(V3Extractor))?,
        ]))
    }

    /// Registry with an explicit template set.
    pub fn with_templates(templates: Vec<WalletTemplate>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.code_hash, t)).collect(),
        }
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no template is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Classify by code; extract fields from `data` on a hit.
    pub fn classify(&self, code: &[u8], data: &[u8]) -> Result<Classification, QueryError> {
        let hash: [u8; 32] = Sha256::digest(code).into();
        match self.templates.get(&hash) {
            None => Ok(Classification::NotWallet),
            Some(template) => Ok(Classification::Wallet {
                type_name: template.type_name,
                fields: template.extractor.extract(data)?,
            }),
        }
    }

    /// Combine account state and classification.
    pub fn wallet_information(&self, state: &AccountState) -> Result<WalletInformation, QueryError> {
        let mut info = WalletInformation {
            wallet: false,
            wallet_type: None,
            seqno: None,
            wallet_id: None,
            balance: state.spendable_balance(),
            account_state: state.address_state(),
            last_transaction_id: state.last_transaction_id,
        };

        if let Classification::Wallet { type_name, fields } = self.classify(&state.code, &state.data)? {
            info.wallet = true;
            info.wallet_type = Some(type_name.to_string());
            info.seqno = Some(fields.seqno);
            info.wallet_id = fields.wallet_id;
        }
        Ok(info)
    }
}

/// Build a template from a base64 code BOC.
pub fn template(
    code_b64: &str,
    type_name: &'static str,
    extractor: Box<dyn DataExtractor>,
) -> Result<WalletTemplate, QueryError> {
    let code = STANDARD
        .decode(code_b64)
        .map_err(|e| QueryError::MalformedCell(format!("{} code: {}", type_name, e)))?;
    Ok(WalletTemplate {
        code_hash: Sha256::digest(&code).into(),
        type_name,
        extractor,
    })
}
