//! Pool selection for a direct swap

use amm_core::{FeeBps, TokenRef};
use serde::Serialize;

use crate::calculator::{apply_slippage_bps, calculate_price_impact_bps, estimate_swap_output};
use crate::state::{Pool, SwapEstimate};

/// Best pool for swapping `token_in` into `token_out`.
///
/// Pools with both reserves positive win over empty ones, then the deeper
/// reserve product, then the lower fee. `None` when no pool pairs the two.
pub fn select_best_pool<'a>(
    token_in: &TokenRef,
    token_out: &TokenRef,
    pools: &'a [Pool],
) -> Option<&'a Pool> {
    pools
        .iter()
        .filter(|p| p.key.matches_pair(token_in, token_out))
        .max_by(|a, b| a.depth_cmp(b))
}

/// Quote through one pool
#[derive(Debug, Clone, Serialize)]
pub struct RouteQuote {
    pub pool: Pool,
    pub input_is_token0: bool,
    pub amount_in: u128,
    pub estimate: SwapEstimate,
    pub price_impact_bps: u128,
    pub min_amount_out: u128,
}

/// Select the best pool and quote `amount_in` through it at the pool's fee tier
pub fn quote_best_pool(
    token_in: &TokenRef,
    token_out: &TokenRef,
    pools: &[Pool],
    amount_in: u128,
    slippage_bps: u128,
) -> Option<RouteQuote> {
    let pool = select_best_pool(token_in, token_out, pools)?;
    let input_is_token0 = pool.is_token0(token_in)?;
    let fee: FeeBps = pool.key.fee;
    let estimate = estimate_swap_output(pool, input_is_token0, amount_in, fee);
    Some(RouteQuote {
        pool: pool.clone(),
        input_is_token0,
        amount_in,
        price_impact_bps: calculate_price_impact_bps(
            pool,
            input_is_token0,
            amount_in,
            estimate.amount_out,
        ),
        min_amount_out: apply_slippage_bps(estimate.amount_out, slippage_bps),
        estimate,
    })
}
