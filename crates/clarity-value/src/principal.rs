//! Principal (account / contract identifier) codec
//!
//! Addresses are c32check strings: `S` + version char + c32(hash160 ++ checksum).
//! The c32check layer comes from the `c32` crate; this module owns the
//! consensus layout:
//! ```text
//! 0x05 <version:1> <hash160:20>                          -- standard
//! 0x06 <version:1> <hash160:20> <len:1> <name:len>       -- contract
//! ```

use std::fmt;
use std::str::FromStr;

use amm_core::DecodeError;

use crate::tags::Tag;

/// Maximum contract name length accepted on the wire
pub const MAX_CONTRACT_NAME_LEN: usize = 128;

/// Largest version a c32 version char can carry
pub const MAX_ADDRESS_VERSION: u8 = 31;

/// Account address: version byte plus 20-byte hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardPrincipal {
    version: u8,
    hash160: [u8; 20],
}

/// Standard account or contract principal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    Standard(StandardPrincipal),
    Contract(StandardPrincipal, String),
}

impl StandardPrincipal {
    /// Versions above 31 have no address form and are rejected
    pub fn new(version: u8, hash160: [u8; 20]) -> Result<Self, DecodeError> {
        if version > MAX_ADDRESS_VERSION {
            return Err(DecodeError::InvalidPrincipal(format!(
                "address version {} out of range",
                version
            )));
        }
        Ok(Self { version, hash160 })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    /// Parse a c32check address, verifying the checksum
    pub fn parse_address(s: &str) -> Result<Self, DecodeError> {
        let invalid = |reason: String| DecodeError::InvalidPrincipal(format!("{}: {}", s, reason));

        let body = s
            .strip_prefix('S')
            .ok_or_else(|| invalid("missing S prefix".to_string()))?;
        let (payload, version) = c32::decode_check(body).map_err(|e| invalid(e.to_string()))?;
        let hash160: [u8; 20] = payload
            .as_slice()
            .try_into()
            .map_err(|_| invalid(format!("expected 20-byte hash, got {}", payload.len())))?;
        Self::new(version, hash160)
    }

    /// Render as a c32check address
    pub fn to_address(&self) -> Result<String, DecodeError> {
        let encoded = c32::encode_check(&self.hash160[..], self.version)
            .map_err(|e| DecodeError::InvalidPrincipal(e.to_string()))?;
        Ok(format!("S{}", encoded))
    }
}

impl Principal {
    /// The account part (the deployer, for contracts)
    pub fn issuer(&self) -> &StandardPrincipal {
        match self {
            Self::Standard(p) | Self::Contract(p, _) => p,
        }
    }

    pub fn contract_name(&self) -> Option<&str> {
        match self {
            Self::Standard(_) => None,
            Self::Contract(_, name) => Some(name),
        }
    }

    /// Consensus serialization, type prefix included
    pub fn to_consensus_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(23 + self.contract_name().map_or(0, |n| n.len() + 1));
        self.write_consensus(&mut out);
        out
    }

    pub(crate) fn write_consensus(&self, out: &mut Vec<u8>) {
        match self {
            Self::Standard(p) => {
                out.push(Tag::StandardPrincipal.prefix());
                out.push(p.version);
                out.extend_from_slice(&p.hash160);
            }
            Self::Contract(p, name) => {
                out.push(Tag::ContractPrincipal.prefix());
                out.push(p.version);
                out.extend_from_slice(&p.hash160);
                // Names are validated to at most 128 bytes on construction
                out.push(name.len() as u8);
                out.extend_from_slice(name.as_bytes());
            }
        }
    }
}

impl FromStr for Principal {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((address, name)) => {
                validate_contract_name(name)?;
                Ok(Self::Contract(
                    StandardPrincipal::parse_address(address)?,
                    name.to_string(),
                ))
            }
            None => Ok(Self::Standard(StandardPrincipal::parse_address(s)?)),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(p) => {
                write!(f, "{}", p.to_address().map_err(|_| fmt::Error)?)
            }
            Self::Contract(p, name) => {
                write!(f, "{}.{}", p.to_address().map_err(|_| fmt::Error)?, name)
            }
        }
    }
}

/// Address version of a principal string (the deployer's, for contracts)
pub fn address_version(s: &str) -> Result<u8, DecodeError> {
    Ok(s.parse::<Principal>()?.issuer().version())
}

/// Contract names: a letter, then letters, digits, `-` or `_`
pub fn validate_contract_name(name: &str) -> Result<(), DecodeError> {
    let mut chars = name.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_head || !valid_tail || name.len() > MAX_CONTRACT_NAME_LEN {
        return Err(DecodeError::InvalidPrincipal(format!(
            "invalid contract name: {}",
            name
        )));
    }
    Ok(())
}
