//! Core type definitions for pool-scout

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Contract identifier (`<address>.<contract-name>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (address, contract name).
    pub fn split(&self) -> Result<(&str, &str), ValidationError> {
        match self.0.split_once('.') {
            Some((address, name)) if !address.is_empty() && !name.is_empty() => {
                Ok((address, name))
            }
            _ => Err(ValidationError::InvalidIdentifier {
                value: self.0.clone(),
                reason: "expected <address>.<contract-name>".to_string(),
            }),
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fungible token, named by its contract identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRef(pub String);

impl TokenRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contract_id(&self) -> ContractId {
        ContractId(self.0.clone())
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical pool identifier (raw bytes, hex-encoded on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub Vec<u8>);

impl PoolId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex with or without a `0x` prefix. Empty input is rejected.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.is_empty() {
            return None;
        }
        hex::decode(s).ok().map(Self)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for PoolId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PoolId::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid pool id hex"))
    }
}

/// Network type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// c32 version byte for single-sig addresses on this network
    pub fn single_sig_version(&self) -> u8 {
        match self {
            Self::Mainnet => constants::MAINNET_SINGLE_SIG,
            Self::Testnet => constants::TESTNET_SINGLE_SIG,
        }
    }

    /// c32 version byte for multi-sig addresses on this network
    pub fn multi_sig_version(&self) -> u8 {
        match self {
            Self::Mainnet => constants::MAINNET_MULTI_SIG,
            Self::Testnet => constants::TESTNET_MULTI_SIG,
        }
    }

    /// Whether an address version belongs to this network
    pub fn accepts_version(&self, version: u8) -> bool {
        version == self.single_sig_version() || version == self.multi_sig_version()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fee in basis points (parts per 10,000)
pub type FeeBps = u128;

/// Constants
pub mod constants {
    /// Basis-point denominator
    pub const BPS_DENOMINATOR: u128 = 10_000;

    /// Address version: mainnet single-sig (`SP…`)
    pub const MAINNET_SINGLE_SIG: u8 = 22;

    /// Address version: testnet single-sig (`ST…`)
    pub const TESTNET_SINGLE_SIG: u8 = 26;

    /// Address version: mainnet multi-sig (`SM…`)
    pub const MAINNET_MULTI_SIG: u8 = 20;

    /// Address version: testnet multi-sig (`SN…`)
    pub const TESTNET_MULTI_SIG: u8 = 21;
}
