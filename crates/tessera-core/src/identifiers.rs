//! Identifiers shared across the condition engine and the decryption protocol.

use crate::crypto::hash::hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a distributed decryption ritual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RitualId(u32);

impl RitualId {
    /// Wrap a raw ritual number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw ritual number.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RitualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RitualId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Length of a textual `0x`-prefixed address.
pub const ADDRESS_STRING_LEN: usize = 42;

/// Check the textual address grammar (`0x` followed by 40 hex digits).
pub fn is_valid_address(value: &str) -> bool {
    value.len() == ADDRESS_STRING_LEN
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// A 20-byte account or node address.
///
/// Stored lowercase so identities compare and order consistently regardless of
/// the casing they were written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

/// Error for malformed address strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {0:?}: expected 0x followed by 40 hex characters")]
pub struct InvalidAddressError(pub String);

impl Address {
    /// Parse a textual address.
    pub fn parse(value: &str) -> Result<Self, InvalidAddressError> {
        if is_valid_address(value) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidAddressError(value.to_string()))
        }
    }

    /// Build an address from its raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Derive the account address controlled by a public key: the trailing
    /// 20 bytes of the key's digest.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = hash(public_key);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self::from_bytes(bytes)
    }

    /// Textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = InvalidAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = InvalidAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> String {
        address.0
    }
}

/// Chains a condition may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum ChainId {
    /// Ethereum mainnet
    EthereumMainnet,
    /// Polygon PoS mainnet
    Polygon,
    /// Polygon Amoy testnet
    Amoy,
    /// Ethereum Sepolia testnet
    Sepolia,
}

/// Allowed chain identifiers in the order they are reported in validation errors.
pub const SUPPORTED_CHAIN_IDS: [ChainId; 4] = [
    ChainId::Polygon,
    ChainId::Amoy,
    ChainId::Sepolia,
    ChainId::EthereumMainnet,
];

/// Error for chain identifiers outside the allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported chain id {0}")]
pub struct UnsupportedChainError(pub u64);

impl ChainId {
    /// Numeric chain identifier.
    pub const fn value(self) -> u64 {
        match self {
            Self::EthereumMainnet => 1,
            Self::Polygon => 137,
            Self::Amoy => 80002,
            Self::Sepolia => 11_155_111,
        }
    }
}

impl TryFrom<u64> for ChainId {
    type Error = UnsupportedChainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        SUPPORTED_CHAIN_IDS
            .iter()
            .copied()
            .find(|chain| chain.value() == value)
            .ok_or(UnsupportedChainError(value))
    }
}

impl From<ChainId> for u64 {
    fn from(chain: ChainId) -> u64 {
        chain.value()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
