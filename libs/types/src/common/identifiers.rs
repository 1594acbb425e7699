//! # Address Identifiers
//!
//! A single 20-byte identity type is used for every party the pair engine
//! deals with: the two tradable assets, the pair itself (which doubles as the
//! liquidity-share asset), the factory, liquidity providers and swap recipients.
//!
//! Ordering is plain byte order, which is what the engine relies on to store a
//! pair's assets canonically regardless of the order they were listed in.
//!
//! ```rust
//! use pair_types::Address;
//!
//! let a = Address::from_low_u64(1);
//! let b = Address::from_hex("0x0000000000000000000000000000000000000002").unwrap();
//! assert!(a < b);
//! assert_eq!(b.to_string(), "0x0000000000000000000000000000000000000002");
//! ```

use crate::common::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// 20-byte identity of an asset, holder, pair or factory
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The zero address; used as the permanent holder of locked minimum liquidity
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Parse from a hex string with or without the `0x` prefix
    pub fn from_hex(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim_start_matches("0x");
        let bytes = hex::decode(trimmed).map_err(|_| ValidationError::InvalidHex {
            input: input.to_string(),
        })?;

        if bytes.len() != ADDRESS_LEN {
            return Err(ValidationError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: bytes.len(),
            });
        }

        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// Build an address whose low 8 bytes hold `value` big-endian
    pub fn from_low_u64(value: u64) -> Self {
        let mut out = [0u8; ADDRESS_LEN];
        out[ADDRESS_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Self(out)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}
