//! AMM Calculator
//!
//! Constant product (x * y = k) quote math in token base units.
//! Everything between the decimals conversion and fee application is exact
//! integer arithmetic; intermediates go through BigUint.

use amm_core::constants::BPS_DENOMINATOR;
use amm_core::{FeeBps, LiquidityError, ValidationError};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::constants::quote::MAX_DECIMALS;
use crate::state::{Pool, QuoteRejection, SwapEstimate};

fn big(v: u128) -> BigUint {
    BigUint::from(v)
}

/// Results here are bounded by a u128 input, so saturation never triggers in practice
fn to_u128(v: BigUint) -> u128 {
    v.to_u128().unwrap_or(u128::MAX)
}

fn invalid_amount(message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidAmount {
        message: message.into(),
    }
}

fn check_decimals(decimals: u32) -> Result<(), ValidationError> {
    if decimals > MAX_DECIMALS {
        return Err(ValidationError::InvalidDecimals {
            value: decimals as u128,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}

/// Convert a human decimal amount to base units.
///
/// Fractional digits beyond `decimals` are truncated, missing ones are
/// zero-padded. Negative, non-numeric and exponent forms are rejected.
pub fn to_base_units(human_amount: &str, decimals: u32) -> Result<u128, ValidationError> {
    check_decimals(decimals)?;
    let s = human_amount.trim();
    if s.starts_with('-') {
        return Err(invalid_amount(format!("{} is negative", s)));
    }

    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid_amount("empty amount"));
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid_amount(format!("{} is not a finite decimal number", s)));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    digits.push_str(&frac_part[..frac_part.len().min(decimals)]);
    for _ in frac_part.len()..decimals {
        digits.push('0');
    }

    let value = if digits.is_empty() {
        BigUint::zero()
    } else {
        digits
            .parse::<BigUint>()
            .map_err(|e| invalid_amount(e.to_string()))?
    };
    value
        .to_u128()
        .ok_or_else(|| invalid_amount(format!("{} overflows base units", s)))
}

/// [`to_base_units`] for numeric input. NaN, infinities and negatives are rejected.
pub fn to_base_units_f64(human_amount: f64, decimals: u32) -> Result<u128, ValidationError> {
    if !human_amount.is_finite() {
        return Err(invalid_amount(format!("{} is not finite", human_amount)));
    }
    if human_amount < 0.0 {
        return Err(invalid_amount(format!("{} is negative", human_amount)));
    }
    // f64 Display never uses exponent notation
    to_base_units(&human_amount.to_string(), decimals)
}

/// Render base units as a decimal string, trailing fractional zeros removed.
pub fn format_base_units(amount: u128, decimals: u32) -> String {
    let decimals = decimals as usize;
    let mut digits = amount.to_string();
    if decimals == 0 {
        return digits;
    }
    if digits.len() <= decimals {
        digits = format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits);
    }
    let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Swap output for `input_amount` base units.
///
/// `raw_out = reserve_out - floor(k / (reserve_in + input))`, then
/// `fee = floor(raw_out * fee_bps / 10000)`. A zero input, an empty reserve
/// or a fee above 10000 bps yields zero with a rejection reason.
pub fn estimate_swap_output(
    pool: &Pool,
    input_is_token0: bool,
    input_amount: u128,
    fee_bps: FeeBps,
) -> SwapEstimate {
    if input_amount == 0 {
        return SwapEstimate::rejected(QuoteRejection::ZeroInput);
    }
    if fee_bps > BPS_DENOMINATOR {
        return SwapEstimate::rejected(QuoteRejection::FeeOutOfRange);
    }
    let (reserve_in, reserve_out) = pool.reserves_for(input_is_token0);
    if reserve_in == 0 || reserve_out == 0 {
        return SwapEstimate::rejected(QuoteRejection::EmptyReserves);
    }

    let k = big(reserve_in) * big(reserve_out);
    let term = k / (big(reserve_in) + big(input_amount));
    let raw_out = big(reserve_out) - term;
    let fee_amount = &raw_out * big(fee_bps) / big(BPS_DENOMINATOR);
    let amount_out = if fee_amount > raw_out {
        BigUint::zero()
    } else {
        &raw_out - &fee_amount
    };

    SwapEstimate {
        amount_out: to_u128(amount_out),
        raw_out: to_u128(raw_out),
        fee_amount: to_u128(fee_amount),
        rejection: None,
    }
}

/// Input whose estimate reaches `desired_output`, rounded up at each step
/// so it may exceed the minimal input by a base unit.
///
/// `None` when the output cannot be reached: it would drain the reserve,
/// the pool is empty, or the fee takes everything.
pub fn calculate_required_input(
    pool: &Pool,
    input_is_token0: bool,
    desired_output: u128,
    fee_bps: FeeBps,
) -> Option<u128> {
    if desired_output == 0 || fee_bps >= BPS_DENOMINATOR {
        return None;
    }
    let (reserve_in, reserve_out) = pool.reserves_for(input_is_token0);
    if reserve_in == 0 || reserve_out == 0 {
        return None;
    }

    // pre-fee output needed, rounded up
    let keep = BPS_DENOMINATOR - fee_bps;
    let gross = (big(desired_output) * big(BPS_DENOMINATOR) + big(keep - 1)) / big(keep);
    if gross >= big(reserve_out) {
        return None;
    }

    // floor(k / (reserve_in + x)) <= reserve_out - gross
    let k = big(reserve_in) * big(reserve_out);
    let limit = big(reserve_out) - gross;
    let min_total_in = k / (limit + 1u32) + 1u32;
    if min_total_in <= big(reserve_in) {
        return Some(1);
    }
    (min_total_in - big(reserve_in)).to_u128()
}

/// Price impact in bps: shortfall of the execution rate against the spot rate.
pub fn calculate_price_impact_bps(
    pool: &Pool,
    input_is_token0: bool,
    input_amount: u128,
    output_amount: u128,
) -> u128 {
    let (reserve_in, reserve_out) = pool.reserves_for(input_is_token0);
    if input_amount == 0 || reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    // execution / spot = (out / in) / (reserve_out / reserve_in)
    let ratio_bps = big(output_amount) * big(reserve_in) * big(BPS_DENOMINATOR)
        / (big(input_amount) * big(reserve_out));
    BPS_DENOMINATOR.saturating_sub(to_u128(ratio_bps))
}

/// Minimum acceptable output under a slippage tolerance
pub fn apply_slippage_bps(amount: u128, slippage_bps: u128) -> u128 {
    if slippage_bps >= BPS_DENOMINATOR {
        return 0;
    }
    to_u128(big(amount) * big(BPS_DENOMINATOR - slippage_bps) / big(BPS_DENOMINATOR))
}

/// Initial liquidity for a fresh pool: `floor(sqrt(amount0 * amount1))`
pub fn calculate_initial_liquidity(amount0: u128, amount1: u128) -> u128 {
    if amount0 == 0 || amount1 == 0 {
        return 0;
    }
    to_u128((big(amount0) * big(amount1)).sqrt())
}

/// Local pre-flight check for an add-liquidity deposit.
///
/// Empty pools need `floor(sqrt(amount0 * amount1)) > minimum_liquidity`.
/// Funded pools need `amount1 >= floor(amount0 * reserve1 / reserve0)`.
/// The pool contract may still reject a deposit that passes.
pub fn check_add_liquidity_ratio(
    pool: &Pool,
    amount0: u128,
    amount1: u128,
    minimum_liquidity: u128,
) -> Result<(), LiquidityError> {
    if pool.total_liquidity == 0 || !pool.has_liquidity() {
        let liquidity = calculate_initial_liquidity(amount0, amount1);
        if liquidity <= minimum_liquidity {
            return Err(LiquidityError::TooSmall {
                liquidity,
                threshold: minimum_liquidity,
            });
        }
        return Ok(());
    }

    let required = to_u128(big(amount0) * big(pool.reserve1) / big(pool.reserve0));
    if amount1 < required {
        return Err(LiquidityError::Ratio {
            required_amount1: required,
            provided: amount1,
        });
    }
    Ok(())
}

/// Liquidity shares minted for a deposit.
///
/// `min(amount0 * L / reserve0, amount1 * L / reserve1)`, or the initial
/// liquidity when the pool is empty.
pub fn calculate_liquidity_minted(pool: &Pool, amount0: u128, amount1: u128) -> u128 {
    if pool.total_liquidity == 0 || !pool.has_liquidity() {
        return calculate_initial_liquidity(amount0, amount1);
    }
    let total = big(pool.total_liquidity);
    let from0 = big(amount0) * &total / big(pool.reserve0);
    let from1 = big(amount1) * &total / big(pool.reserve1);
    to_u128(from0.min(from1))
}

/// Reserves returned for burning `shares`: `(amount0, amount1)`.
///
/// `None` for an empty pool or more shares than exist.
pub fn calculate_remove_liquidity_shares(pool: &Pool, shares: u128) -> Option<(u128, u128)> {
    if pool.total_liquidity == 0 || shares > pool.total_liquidity {
        return None;
    }
    let total = big(pool.total_liquidity);
    let amount0 = big(shares) * big(pool.reserve0) / &total;
    let amount1 = big(shares) * big(pool.reserve1) / &total;
    Some((to_u128(amount0), to_u128(amount1)))
}
