//! Error types for pool-scout

use thiserror::Error;

/// Core errors that can occur in pool-scout
#[derive(Debug, Error)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Liquidity check failed: {0}")]
    Liquidity(#[from] LiquidityError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Typed-value shape mismatches and malformed wire bytes.
///
/// Always local: callers skip the offending entry or record and continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Unknown type prefix 0x{0:02x}")]
    UnknownTypePrefix(u8),

    #[error("Unknown value tag: {0}")]
    UnknownTag(String),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("Value nesting deeper than {0}")]
    DepthExceeded(usize),

    #[error("Invalid hex string")]
    InvalidHex,

    #[error("Invalid {kind} string")]
    InvalidString { kind: &'static str },

    #[error("Expected {expected}, found {found}")]
    TagMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Result carried an err value: {0}")]
    ErrResponse(String),

    #[error("Missing tuple field: {0}")]
    MissingField(String),

    #[error("Duplicate tuple field: {0}")]
    DuplicateField(String),

    #[error("Malformed JSON value: {0}")]
    MalformedJson(String),

    #[error("Integer does not fit in {0}")]
    IntegerOverflow(&'static str),

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error(
        "Inconsistent pool reserves: reserve0={reserve0}, reserve1={reserve1}, liquidity={total_liquidity}"
    )]
    InconsistentReserves {
        reserve0: u128,
        reserve1: u128,
        total_liquidity: u128,
    },
}

/// Transport and read-channel errors
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Ledger API unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Ledger API returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Ledger request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Read-only call {function} rejected: {cause}")]
    CallRejected { function: String, cause: String },
}

/// Malformed caller-supplied input. Never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid decimals {value}: must be at most {max}")]
    InvalidDecimals { value: u128, max: u32 },

    #[error("Invalid identifier {value}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Invalid fee {fee} bps: must be at most 10000")]
    InvalidFee { fee: u128 },

    #[error("Unparsable {what} response: {message}")]
    UnparsableResponse { what: &'static str, message: String },
}

/// Local liquidity pre-flight failures, naming the violated bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiquidityError {
    #[error("Deposit ratio too low: amount1 must be at least {required_amount1}, got {provided}")]
    Ratio { required_amount1: u128, provided: u128 },

    #[error("Initial liquidity {liquidity} does not exceed minimum {threshold}")]
    TooSmall { liquidity: u128, threshold: u128 },
}

/// Result type alias for pool-scout operations
pub type Result<T> = std::result::Result<T, Error>;

impl DecodeError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedEof { .. } => "unexpected_eof",
            Self::UnknownTypePrefix(_) | Self::UnknownTag(_) => "unknown_tag",
            Self::TrailingBytes(_) => "trailing_bytes",
            Self::DepthExceeded(_) => "depth_exceeded",
            Self::InvalidHex => "invalid_hex",
            Self::InvalidString { .. } => "invalid_string",
            Self::TagMismatch { .. } => "tag_mismatch",
            Self::ErrResponse(_) => "err_response",
            Self::MissingField(_) => "missing_field",
            Self::DuplicateField(_) => "duplicate_field",
            Self::MalformedJson(_) => "malformed_json",
            Self::IntegerOverflow(_) => "integer_overflow",
            Self::InvalidPrincipal(_) => "invalid_principal",
            Self::InconsistentReserves { .. } => "inconsistent_reserves",
        }
    }
}

impl NetworkError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::HttpStatus { .. } => "http_status",
            Self::Timeout { .. } => "timeout",
            Self::ParseError(_) => "parse_error",
            Self::CallRejected { .. } => "call_rejected",
        }
    }
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidDecimals { .. } => "invalid_decimals",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::InvalidFee { .. } => "invalid_fee",
            Self::UnparsableResponse { .. } => "unparsable_response",
        }
    }
}

impl LiquidityError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ratio { .. } => "ratio",
            Self::TooSmall { .. } => "too_small",
        }
    }
}
