//! # Value Objects
//!
//! Get-method arguments: the method reference and the value stack.

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use std::fmt;

use super::errors::QueryError;

/// Reference to a contract get-method, by numeric id or by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodRef {
    /// Numeric method id.
    Number(i32),
    /// Method name, hashed to an id by the engine.
    Name(String),
}

impl From<i32> for MethodRef {
    fn from(id: i32) -> Self {
        MethodRef::Number(id)
    }
}

impl From<&str> for MethodRef {
    fn from(name: &str) -> Self {
        MethodRef::Name(name.to_string())
    }
}

impl From<String> for MethodRef {
    fn from(name: String) -> Self {
        MethodRef::Name(name)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRef::Number(id) => write!(f, "#{}", id),
            MethodRef::Name(name) => f.write_str(name),
        }
    }
}

/// One value on a TVM stack.
///
/// Numbers are kept as decimal strings: TVM integers are 257 bits wide.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StackEntry {
    /// Cell slice, as a serialized BOC.
    Slice(#[serde_as(as = "Base64")] Vec<u8>),
    /// Cell, as a serialized BOC.
    Cell(#[serde_as(as = "Base64")] Vec<u8>),
    /// Integer in decimal.
    Number(String),
    /// Fixed-size tuple.
    Tuple(Vec<StackEntry>),
    /// Linked list.
    List(Vec<StackEntry>),
    /// Value the engine cannot represent.
    Unsupported,
}

impl StackEntry {
    /// Integer entry from any primitive integer.
    pub fn number(value: impl Into<i128>) -> Self {
        StackEntry::Number(value.into().to_string())
    }

    /// Integer entry from a decimal string, validated.
    pub fn decimal(value: &str) -> Result<Self, QueryError> {
        if !is_decimal(value) {
            return Err(QueryError::InvalidEnvelope(format!(
                "stack number `{}` is not a decimal integer",
                value
            )));
        }
        Ok(StackEntry::Number(value.to_string()))
    }

    /// Parse a number entry as `i128` when it fits.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            StackEntry::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StackEntry::Slice(_) => "slice",
            StackEntry::Cell(_) => "cell",
            StackEntry::Number(_) => "number",
            StackEntry::Tuple(_) => "tuple",
            StackEntry::List(_) => "list",
            StackEntry::Unsupported => "unsupported",
        }
    }
}

/// Optional sign followed by at least one ASCII digit.
pub fn is_decimal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
