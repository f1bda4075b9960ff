use amm::{
    apply_slippage_bps, calculate_liquidity_minted, calculate_remove_liquidity_shares,
    check_add_liquidity_ratio, discover_pools, format_base_units, quote_best_pool, to_base_units,
    DiscoveryReport, Pool, PoolKey, RecordSource,
};
use amm_core::{FeeBps, TokenRef};
use anyhow::{anyhow, Context};
use serde::Serialize;

use crate::AppState;

/// Discover every pool of the configured contract
pub async fn get_pools(state: &AppState, extra_tokens: &[TokenRef]) -> DiscoveryReport {
    let mut tokens = state.config.discovery.known_tokens.clone();
    for token in extra_tokens {
        if !tokens.contains(token) {
            tokens.push(token.clone());
        }
    }
    discover_pools(
        &state.reader,
        &tokens,
        &state.config.discovery.fee_tiers,
        state.discovery_deadline(),
    )
    .await
}

async fn decimals(state: &AppState, token: &TokenRef) -> anyhow::Result<u32> {
    let decimals = state
        .reader
        .get_decimals(token)
        .await
        .with_context(|| format!("decimals of {}", token))?;
    Ok(u32::from(decimals))
}

/// Response for a swap quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub pool_id: String,
    pub fee_bps: FeeBps,
    pub token_in: TokenRef,
    pub token_out: TokenRef,
    pub amount_in: String,
    pub amount_in_base: u128,
    pub amount_out: String,
    pub amount_out_base: u128,
    pub fee_amount: u128,
    pub min_amount_out: String,
    pub price_impact_bps: u128,
    pub rejection: Option<&'static str>,
}

/// Quote `amount` (human units of `token_in`) through the deepest pool
pub async fn get_quote(
    state: &AppState,
    token_in: TokenRef,
    token_out: TokenRef,
    amount: &str,
    slippage_bps: u128,
) -> anyhow::Result<QuoteResponse> {
    let report = get_pools(state, &[token_in.clone(), token_out.clone()]).await;
    let decimals_in = decimals(state, &token_in).await?;
    let decimals_out = decimals(state, &token_out).await?;
    build_quote(
        &report.pools,
        token_in,
        token_out,
        amount,
        (decimals_in, decimals_out),
        slippage_bps,
    )
}

fn build_quote(
    pools: &[Pool],
    token_in: TokenRef,
    token_out: TokenRef,
    amount: &str,
    (decimals_in, decimals_out): (u32, u32),
    slippage_bps: u128,
) -> anyhow::Result<QuoteResponse> {
    let amount_in = to_base_units(amount, decimals_in)?;
    let quote = quote_best_pool(&token_in, &token_out, pools, amount_in, slippage_bps)
        .ok_or_else(|| anyhow!("No pool pairs {} with {}", token_in, token_out))?;

    Ok(QuoteResponse {
        pool_id: quote.pool.id.to_string(),
        fee_bps: quote.pool.key.fee,
        amount_in: format_base_units(amount_in, decimals_in),
        amount_in_base: amount_in,
        amount_out: format_base_units(quote.estimate.amount_out, decimals_out),
        amount_out_base: quote.estimate.amount_out,
        fee_amount: quote.estimate.fee_amount,
        min_amount_out: format_base_units(quote.min_amount_out, decimals_out),
        price_impact_bps: quote.price_impact_bps,
        rejection: quote.estimate.rejection.map(|r| r.code()),
        token_in,
        token_out,
    })
}

/// Response for an add-liquidity preflight
#[derive(Debug, Serialize)]
pub struct AddLiquidityPreview {
    pub pool_id: String,
    pub new_pool: bool,
    pub amount0: u128,
    pub amount1: u128,
    pub liquidity_minted: u128,
    /// Minted shares after slippage
    pub min_liquidity: u128,
}

/// Preflight a deposit of `amount_a` / `amount_b` (human units) into the
/// `(token_a, token_b, fee)` pool. A missing pool is treated as a creation.
#[allow(clippy::too_many_arguments)]
pub async fn preview_add_liquidity(
    state: &AppState,
    token_a: TokenRef,
    token_b: TokenRef,
    fee: FeeBps,
    amount_a: &str,
    amount_b: &str,
    minimum_liquidity: u128,
    slippage_bps: u128,
) -> anyhow::Result<AddLiquidityPreview> {
    let key = PoolKey::new(token_a.clone(), token_b.clone(), fee)?;
    let report = get_pools(state, &[token_a.clone(), token_b.clone()]).await;
    let base_a = to_base_units(amount_a, decimals(state, &token_a).await?)?;
    let base_b = to_base_units(amount_b, decimals(state, &token_b).await?)?;
    build_add_liquidity(
        &report.pools,
        &key,
        (&token_a, base_a),
        base_b,
        minimum_liquidity,
        slippage_bps,
    )
}

fn build_add_liquidity(
    pools: &[Pool],
    key: &PoolKey,
    (token_a, base_a): (&TokenRef, u128),
    base_b: u128,
    minimum_liquidity: u128,
    slippage_bps: u128,
) -> anyhow::Result<AddLiquidityPreview> {
    let existing = pools.iter().find(|p| &p.key == key);
    let new_pool = existing.is_none();
    let pool = match existing {
        Some(pool) => pool.clone(),
        None => Pool::from_contract_order(
            None,
            key.token_low.clone(),
            key.token_high.clone(),
            key.fee,
            0,
            0,
            0,
            RecordSource::Fallback,
        )?,
    };

    let (amount0, amount1) = match pool.is_token0(token_a) {
        Some(true) => (base_a, base_b),
        Some(false) => (base_b, base_a),
        None => return Err(anyhow!("{} is not part of pool {}", token_a, key)),
    };
    check_add_liquidity_ratio(&pool, amount0, amount1, minimum_liquidity)?;

    let liquidity_minted = calculate_liquidity_minted(&pool, amount0, amount1);
    Ok(AddLiquidityPreview {
        pool_id: pool.id.to_string(),
        new_pool,
        amount0,
        amount1,
        liquidity_minted,
        min_liquidity: apply_slippage_bps(liquidity_minted, slippage_bps),
    })
}

/// Response for a remove-liquidity preview
#[derive(Debug, Serialize)]
pub struct RemoveLiquidityPreview {
    pub pool_id: String,
    pub shares: u128,
    pub token0: TokenRef,
    pub amount0: String,
    pub token1: TokenRef,
    pub amount1: String,
}

/// Amounts returned for burning `shares` of the `(token_a, token_b, fee)` pool
pub async fn preview_remove_liquidity(
    state: &AppState,
    token_a: TokenRef,
    token_b: TokenRef,
    fee: FeeBps,
    shares: u128,
) -> anyhow::Result<RemoveLiquidityPreview> {
    let key = PoolKey::new(token_a.clone(), token_b.clone(), fee)?;
    let pool = match state.reader.resolve_pool(&key).await? {
        Some(pool) => pool,
        None => {
            let report = get_pools(state, &[token_a, token_b]).await;
            report
                .pools
                .into_iter()
                .find(|p| p.key == key)
                .ok_or_else(|| anyhow!("Pool not found: {}", key))?
        }
    };
    let decimals0 = decimals(state, &pool.key.token_low).await?;
    let decimals1 = decimals(state, &pool.key.token_high).await?;
    build_remove_liquidity(&pool, shares, (decimals0, decimals1))
}

fn build_remove_liquidity(
    pool: &Pool,
    shares: u128,
    (decimals0, decimals1): (u32, u32),
) -> anyhow::Result<RemoveLiquidityPreview> {
    let (amount0, amount1) = calculate_remove_liquidity_shares(pool, shares).ok_or_else(|| {
        anyhow!(
            "Cannot burn {} shares of pool {} ({} outstanding)",
            shares,
            pool.id,
            pool.total_liquidity
        )
    })?;
    Ok(RemoveLiquidityPreview {
        pool_id: pool.id.to_string(),
        shares,
        token0: pool.key.token_low.clone(),
        amount0: format_base_units(amount0, decimals0),
        token1: pool.key.token_high.clone(),
        amount1: format_base_units(amount1, decimals1),
    })
}
