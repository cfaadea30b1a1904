//! Domain models representing ledger data.
//!
//! These models are storage-agnostic and represent the canonical
//! form of ledger data within the domain layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AddressError;

// =============================================================================
// Wallet Address
// =============================================================================

/// Length of a wallet address in bytes.
pub const ADDRESS_BYTES: usize = 32;

/// Length of a rendered wallet address (lowercase hex, no prefix).
pub const ADDRESS_HEX_LEN: usize = ADDRESS_BYTES * 2;

/// 32-byte wallet identifier rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    /// Parse a 64-character lowercase hex string.
    ///
    /// Uppercase digits and `0x` prefixes are rejected so that every wallet
    /// has exactly one textual form.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidLength(s.chars().count()));
        }

        if let Some((position, character)) = s
            .chars()
            .enumerate()
            .find(|(_, c)| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(AddressError::InvalidCharacter {
                character,
                position,
            });
        }

        let bytes = hex::decode(s).map_err(|_| AddressError::InvalidLength(s.len()))?;
        let arr: [u8; ADDRESS_BYTES] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| AddressError::InvalidLength(v.len() * 2))?;
        Ok(Self(arr))
    }

    /// Render as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check whether `s` is a well-formed address without allocating.
    pub fn is_valid(s: &str) -> bool {
        s.len() == ADDRESS_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

// =============================================================================
// Wallets
// =============================================================================

/// An addressable account holding a non-negative balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: Address,
    pub balance: f64,
}

impl Wallet {
    pub fn new(address: Address, balance: f64) -> Self {
        Self { address, balance }
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Immutable record of one committed transfer.
///
/// Addresses are kept as text: the history table does not reference the
/// wallet table and never rewrites what was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Insertion identifier, increasing with every committed transfer.
    pub id: i64,
    /// Sender wallet.
    #[serde(rename = "from")]
    pub from_address: String,
    /// Receiver wallet.
    #[serde(rename = "to")]
    pub to_address: String,
    /// Amount moved, always positive.
    pub amount: f64,
    /// Time the store inserted the record.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================
