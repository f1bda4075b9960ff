//! Constant-product AMM pool discovery and quoting
//!
//! Discovers the pools of one pool contract by reconciling its event log
//! with direct state reads, and quotes swaps and liquidity changes against
//! the result in exact integer arithmetic.

pub mod calculator;
pub mod constants;
pub mod discovery;
pub mod events;
pub mod reader;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use calculator::{
    apply_slippage_bps, calculate_initial_liquidity, calculate_liquidity_minted,
    calculate_price_impact_bps, calculate_remove_liquidity_shares, calculate_required_input,
    check_add_liquidity_ratio, estimate_swap_output, format_base_units, to_base_units,
    to_base_units_f64,
};
pub use discovery::{discover_pools, merge_records, DiscoveryReport};
pub use events::{scan_pool_creation_events, ScanOutcome};
pub use reader::{StateReader, SweepOutcome};
pub use router::{quote_best_pool, select_best_pool, RouteQuote};
pub use state::{
    Pool, PoolIdentifier, PoolKey, QuoteRejection, RecordSource, SwapEstimate,
};
