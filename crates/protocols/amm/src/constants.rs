//! AMM Constants
//!
//! Event log paging, payload field names and quote limits.

/// Event log scanning
pub mod events {
    /// Fixed page window
    pub const PAGE_SIZE: u64 = 50;

    /// Log topic carrying contract print output
    pub const PRINT_TOPIC: &str = "print";

    /// `action` value of a pool-creation print
    pub const CREATE_POOL_ACTION: &str = "create-pool";
}

/// Tuple field names in print payloads and pool state
pub mod fields {
    pub const ACTION: &str = "action";
    pub const DATA: &str = "data";
    pub const POOL_ID: &str = "pool-id";
    pub const TOKEN_0: &str = "token-0";
    pub const TOKEN_1: &str = "token-1";
    pub const FEE: &str = "fee";
    pub const RESERVE_0: &str = "reserve-0";
    pub const RESERVE_1: &str = "reserve-1";
    pub const TOTAL_LIQUIDITY: &str = "total-liquidity";
}

/// Quote limits
pub mod quote {
    /// Largest decimals value whose scale factor fits in u128
    pub const MAX_DECIMALS: u32 = 38;

    /// Minimum initial liquidity enforced by the pool contract
    pub const DEFAULT_MINIMUM_LIQUIDITY: u128 = 1_000;

    /// Default slippage tolerance (0.5%)
    pub const DEFAULT_SLIPPAGE_BPS: u128 = 50;
}
