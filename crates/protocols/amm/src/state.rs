//! AMM State Types
//!
//! Pool identity, pool records and quote results.

use std::cmp::Ordering;
use std::fmt;

use amm_core::constants::BPS_DENOMINATOR;
use amm_core::{DecodeError, FeeBps, PoolId, TokenRef, ValidationError};
use clarity_value::Principal;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Pool identity: `(token_low, token_high, fee)`.
///
/// `token_low` sorts before `token_high` by the consensus encoding of the
/// token principals. Construct through [`PoolKey::new`] only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    pub token_low: TokenRef,
    pub token_high: TokenRef,
    pub fee: FeeBps,
}

impl PoolKey {
    /// Canonicalize an unordered pair. Fails on identical tokens or a fee above 10000 bps.
    pub fn new(a: TokenRef, b: TokenRef, fee: FeeBps) -> Result<Self, ValidationError> {
        Self::canonical(a, b, fee).map(|(key, _)| key)
    }

    /// Like [`PoolKey::new`], also reporting whether `a` and `b` were swapped.
    pub fn canonical(
        a: TokenRef,
        b: TokenRef,
        fee: FeeBps,
    ) -> Result<(Self, bool), ValidationError> {
        if fee > BPS_DENOMINATOR {
            return Err(ValidationError::InvalidFee { fee });
        }
        if a == b {
            return Err(ValidationError::InvalidIdentifier {
                value: a.to_string(),
                reason: "pool tokens must differ".to_string(),
            });
        }
        let swapped = canonical_bytes(&a) > canonical_bytes(&b);
        let (token_low, token_high) = if swapped { (b, a) } else { (a, b) };
        Ok((
            Self {
                token_low,
                token_high,
                fee,
            },
            swapped,
        ))
    }

    /// Whether this key pairs `x` with `y`, in either order
    pub fn matches_pair(&self, x: &TokenRef, y: &TokenRef) -> bool {
        (&self.token_low == x && &self.token_high == y)
            || (&self.token_low == y && &self.token_high == x)
    }

    /// Non-canonical pool id used when the ledger lookup failed
    pub fn synthetic_id(&self) -> String {
        format!("{}-{}-{}", self.token_low, self.token_high, self.fee)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} @{}bps", self.token_low, self.token_high, self.fee)
    }
}

/// Byte form used for pair ordering. Tokens that are not valid principals
/// order by their raw identifier bytes.
fn canonical_bytes(token: &TokenRef) -> Vec<u8> {
    match token.as_str().parse::<Principal>() {
        Ok(principal) => principal.to_consensus_bytes(),
        Err(_) => token.as_str().as_bytes().to_vec(),
    }
}

/// Pool identifier as carried by a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolIdentifier {
    /// Identifier returned by the ledger
    Canonical(PoolId),
    /// `"{tokenLow}-{tokenHigh}-{fee}"`, never valid hex
    Synthetic(String),
}

impl PoolIdentifier {
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }

    pub fn canonical(&self) -> Option<&PoolId> {
        match self {
            Self::Canonical(id) => Some(id),
            Self::Synthetic(_) => None,
        }
    }
}

impl fmt::Display for PoolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(id) => write!(f, "{}", id),
            Self::Synthetic(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for PoolIdentifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Where a record's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Decoded from an event payload, possibly stale
    Fallback,
    /// Read directly from contract state
    Authoritative,
}

/// Pool record. `reserve0` always belongs to `key.token_low`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub id: PoolIdentifier,
    pub key: PoolKey,
    pub reserve0: u128,
    pub reserve1: u128,
    pub total_liquidity: u128,
    pub source: RecordSource,
}

impl Pool {
    /// Build from values in contract order (`token-0`, `token-1`), swapping
    /// reserves when the pair canonicalizes the other way round. Without a
    /// ledger id the record gets the synthetic one.
    #[allow(clippy::too_many_arguments)]
    pub fn from_contract_order(
        id: Option<PoolId>,
        token0: TokenRef,
        token1: TokenRef,
        fee: FeeBps,
        reserve0: u128,
        reserve1: u128,
        total_liquidity: u128,
        source: RecordSource,
    ) -> Result<Self, ValidationError> {
        let (key, swapped) = PoolKey::canonical(token0, token1, fee)?;
        let (reserve0, reserve1) = if swapped {
            (reserve1, reserve0)
        } else {
            (reserve0, reserve1)
        };
        let id = match id {
            Some(id) => PoolIdentifier::Canonical(id),
            None => PoolIdentifier::Synthetic(key.synthetic_id()),
        };
        Ok(Self {
            id,
            key,
            reserve0,
            reserve1,
            total_liquidity,
            source,
        })
    }

    /// Reserves are either all zero or all positive
    pub fn check_reserves(&self) -> Result<(), DecodeError> {
        let zeros = [self.reserve0, self.reserve1, self.total_liquidity]
            .iter()
            .filter(|v| **v == 0)
            .count();
        if zeros == 0 || zeros == 3 {
            Ok(())
        } else {
            Err(DecodeError::InconsistentReserves {
                reserve0: self.reserve0,
                reserve1: self.reserve1,
                total_liquidity: self.total_liquidity,
            })
        }
    }

    /// Synthetic id or empty reserves
    pub fn looks_like_fallback(&self) -> bool {
        !self.id.is_canonical() || (self.reserve0 == 0 && self.reserve1 == 0)
    }

    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0 && self.reserve1 > 0
    }

    /// `reserve0 * reserve1`
    pub fn reserve_product(&self) -> BigUint {
        BigUint::from(self.reserve0) * BigUint::from(self.reserve1)
    }

    /// `Some(true)` when `token` is the pool's token0
    pub fn is_token0(&self, token: &TokenRef) -> Option<bool> {
        if &self.key.token_low == token {
            Some(true)
        } else if &self.key.token_high == token {
            Some(false)
        } else {
            None
        }
    }

    /// `(reserve_in, reserve_out)` for a swap direction
    pub fn reserves_for(&self, input_is_token0: bool) -> (u128, u128) {
        if input_is_token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    /// Record precedence: canonical id first, then authoritative source.
    pub fn precedence(&self) -> (bool, RecordSource) {
        (self.id.is_canonical(), self.source)
    }

    /// Depth ordering used for pool selection: liquid pools, then larger
    /// reserve product, then lower fee.
    pub fn depth_cmp(&self, other: &Pool) -> Ordering {
        self.has_liquidity()
            .cmp(&other.has_liquidity())
            .then_with(|| self.reserve_product().cmp(&other.reserve_product()))
            .then_with(|| other.key.fee.cmp(&self.key.fee))
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool {} | {} | r0: {} | r1: {} | L: {}",
            self.id, self.key, self.reserve0, self.reserve1, self.total_liquidity
        )
    }
}

/// Why a swap estimate came back as zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteRejection {
    ZeroInput,
    EmptyReserves,
    FeeOutOfRange,
}

impl QuoteRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroInput => "zero_input",
            Self::EmptyReserves => "empty_reserves",
            Self::FeeOutOfRange => "fee_out_of_range",
        }
    }
}

/// Swap quote in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapEstimate {
    /// Output after fees
    pub amount_out: u128,
    /// Curve output before fees
    pub raw_out: u128,
    pub fee_amount: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<QuoteRejection>,
}

impl SwapEstimate {
    pub fn rejected(reason: QuoteRejection) -> Self {
        Self {
            amount_out: 0,
            raw_out: 0,
            fee_amount: 0,
            rejection: Some(reason),
        }
    }
}
