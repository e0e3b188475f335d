//! # Address Codec
//!
//! Account addresses in raw (`workchain:hex`) and user-friendly form.
//!
//! The user-friendly form is 36 bytes, base64 or base64url encoded:
//!
//! ```text
//! [tag:1][workchain:1][hash:32][crc16:2]
//! ```
//!
//! `tag` is `0x11` (bounceable) or `0x51` (non-bounceable), with `0x80`
//! set for testnet-only addresses. The checksum is CRC16/XMODEM over the
//! first 34 bytes, big-endian.
//!
//! Gateway-facing output uses the bounceable form; envelopes sent to the
//! engine use the raw form.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::QueryError;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;
const FRIENDLY_LEN: usize = 36;
const FRIENDLY_TEXT_LEN: usize = 48;

/// Account address: workchain plus 256-bit account id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    /// Workchain id (`-1` masterchain, `0` basechain).
    pub workchain: i32,
    /// Account id.
    pub hash: [u8; 32],
}

/// Flags carried by the user-friendly form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendlyFlags {
    /// Failed deliveries bounce back to the sender.
    pub bounceable: bool,
    /// Address is only valid on testnet.
    pub test_only: bool,
    /// Encoded with the base64url alphabet.
    pub url_safe: bool,
}

/// Which form an address string was given in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressForm {
    /// `workchain:hex`
    RawForm,
    /// User-friendly, bounceable
    FriendlyBounceable,
    /// User-friendly, non-bounceable
    FriendlyNonBounceable,
}

/// Both base64 alphabets of one user-friendly variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedForms {
    /// Standard alphabet.
    pub b64: String,
    /// URL-safe alphabet.
    pub b64url: String,
}

/// Every representation of an address, plus how it was given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedAddress {
    /// `workchain:hex`
    pub raw_form: String,
    /// Bounceable encodings.
    pub bounceable: EncodedForms,
    /// Non-bounceable encodings.
    pub non_bounceable: EncodedForms,
    /// Form of the input string.
    pub given_type: AddressForm,
    /// Testnet flag of the input (false for raw input).
    pub test_only: bool,
}

impl Address {
    /// Create an address.
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either form, discarding user-friendly flags.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        Self::parse_with_form(input).map(|(address, _, _)| address)
    }

    /// Parse either form and report how it was given.
    pub fn parse_with_form(input: &str) -> Result<(Self, AddressForm, FriendlyFlags), QueryError> {
        let input = input.trim();
        if input.contains(':') {
            let address = Self::parse_raw(input)?;
            return Ok((address, AddressForm::RawForm, FriendlyFlags::default()));
        }
        let (address, flags) = Self::parse_friendly(input)?;
        let form = if flags.bounceable {
            AddressForm::FriendlyBounceable
        } else {
            AddressForm::FriendlyNonBounceable
        };
        Ok((address, form, flags))
    }

    /// Parse `workchain:hex`.
    pub fn parse_raw(input: &str) -> Result<Self, QueryError> {
        let (workchain, hash_hex) = input
            .split_once(':')
            .ok_or_else(|| QueryError::MalformedAddress(format!("`{}` has no workchain", input)))?;

        let workchain: i32 = workchain.parse().map_err(|_| {
            QueryError::MalformedAddress(format!("invalid workchain `{}`", workchain))
        })?;

        if hash_hex.len() != 64 {
            return Err(QueryError::MalformedAddress(format!(
                "account id must be 64 hex digits, got {}",
                hash_hex.len()
            )));
        }
        let mut hash = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash)
            .map_err(|e| QueryError::MalformedAddress(format!("account id: {}", e)))?;

        Ok(Self { workchain, hash })
    }

    /// Parse the user-friendly form, verifying the checksum.
    pub fn parse_friendly(input: &str) -> Result<(Self, FriendlyFlags), QueryError> {
        if input.len() != FRIENDLY_TEXT_LEN {
            return Err(QueryError::MalformedAddress(format!(
                "user-friendly address must be {} characters, got {}",
                FRIENDLY_TEXT_LEN,
                input.len()
            )));
        }

        let url_safe = input.contains(['-', '_']);
        let engine = if url_safe { &URL_SAFE } else { &STANDARD };
        let bytes = engine
            .decode(input)
            .map_err(|e| QueryError::MalformedAddress(format!("base64: {}", e)))?;
        if bytes.len() != FRIENDLY_LEN {
            return Err(QueryError::MalformedAddress(format!(
                "decoded address is {} bytes, expected {}",
                bytes.len(),
                FRIENDLY_LEN
            )));
        }

        let expected = crc16(&bytes[..34]);
        let actual = u16::from_be_bytes([bytes[34], bytes[35]]);
        if expected != actual {
            return Err(QueryError::MalformedAddress(format!(
                "checksum mismatch: {:04x} != {:04x}",
                actual, expected
            )));
        }

        let mut tag = bytes[0];
        let test_only = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;
        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(QueryError::MalformedAddress(format!(
                    "unknown address tag {:#04x}",
                    other
                )))
            }
        };

        let workchain = bytes[1] as i8 as i32;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok((
            Self { workchain, hash },
            FriendlyFlags {
                bounceable,
                test_only,
                url_safe,
            },
        ))
    }

    /// `workchain:hex`, lowercase.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// Encode the user-friendly form.
    ///
    /// Fails when the workchain does not fit the one-byte field.
    pub fn to_friendly(&self, flags: FriendlyFlags) -> Result<String, QueryError> {
        let workchain = i8::try_from(self.workchain).map_err(|_| {
            QueryError::MalformedAddress(format!(
                "workchain {} has no user-friendly form",
                self.workchain
            ))
        })?;

        let mut tag = if flags.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if flags.test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = Vec::with_capacity(FRIENDLY_LEN);
        bytes.push(tag);
        bytes.push(workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let checksum = crc16(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        Ok(if flags.url_safe {
            URL_SAFE.encode(&bytes)
        } else {
            STANDARD.encode(&bytes)
        })
    }

    /// Bounceable mainnet form, standard alphabet: the Gateway canonical form.
    pub fn to_bounceable(&self) -> Result<String, QueryError> {
        self.to_friendly(FriendlyFlags {
            bounceable: true,
            ..Default::default()
        })
    }
}

impl FromStr for Address {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

/// Report every representation of an address string.
pub fn detect_address(input: &str) -> Result<DetectedAddress, QueryError> {
    let (address, given_type, flags) = Address::parse_with_form(input)?;
    let test_only = flags.test_only;

    let forms = |bounceable: bool| -> Result<EncodedForms, QueryError> {
        let flags = FriendlyFlags {
            bounceable,
            test_only,
            url_safe: false,
        };
        Ok(EncodedForms {
            b64: address.to_friendly(flags)?,
            b64url: address.to_friendly(FriendlyFlags {
                url_safe: true,
                ..flags
            })?,
        })
    };

    Ok(DetectedAddress {
        raw_form: address.to_raw(),
        bounceable: forms(true)?,
        non_bounceable: forms(false)?,
        given_type,
        test_only,
    })
}

/// Bounceable form of any address string.
pub fn pack_address(input: &str) -> Result<String, QueryError> {
    Address::parse(input)?.to_bounceable()
}

/// Raw form of any address string.
pub fn unpack_address(input: &str) -> Result<String, QueryError> {
    Address::parse(input).map(|a| a.to_raw())
}

/// CRC16/XMODEM (poly 0x1021, init 0, no reflection).
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}
