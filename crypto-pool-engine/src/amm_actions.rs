use log::trace;
use primitive_types::U512;

use crate::crypto_invariant::{calculate_invariant, calculate_y, normalize_balances};
use crate::errors::PoolError;
use crate::fees_utils::calculate_fee;
use crate::math_utils::PRECISION;
use crate::pool_data::{PoolParams, PoolState};
use crate::price_oracle::ema_price;
use crate::repegging_utils::{spot_price, tweak_price_scale};

/// No trade may leave a reserve below this floor, in raw units.
pub const MIN_RESERVE: u64 = 100_000;

/// Denominator of the relative tolerance separating solver rounding noise
/// from a genuine invariant regression.
const REGRESSION_TOL_DENOM: u64 = 1_000_000_000_000;

/// Applies the oracle and repeg updates owed for the time elapsed since
/// the last interaction. Repeated calls at the same timestamp are no-ops;
/// a timestamp in the past is rejected.
///
/// # Arguments
/// * `params` - Pool curve parameters;
/// * `state` - State of the pool before the update;
/// * `now` - Current logical time.
///
/// # Outputs
/// * `state_after` - State of the pool after the update.
pub fn sync_time(params: &PoolParams, state: &PoolState, now: u64) -> Result<PoolState, PoolError> {
    if now < state.last_update_time {
        return Err(PoolError::NonMonotonicTime);
    }
    if now == state.last_update_time {
        return Ok(state.clone());
    }
    let dt = now - state.last_update_time;
    let spot = spot_price(params, &state.balances, &state.price_scale, &state.d)?;
    let price_oracle = ema_price(&state.price_oracle, &spot, dt);
    let (price_scale, d) =
        tweak_price_scale(params, &state.balances, &state.price_scale, &price_oracle, &state.d);
    Ok(PoolState {
        balances: state.balances,
        price_scale,
        price_oracle,
        d,
        last_update_time: now,
    })
}

/// Calculates the transition of the pool in the swap action: the caller
/// sells `dx` of asset `i` and receives asset `j`.
///
/// The trade is priced in normalized units against a freshly solved
/// invariant, charged the dynamic fee on the post-trade balances, and
/// committed only if the recomputed invariant did not regress. Every
/// rejection path returns before the new state is produced, so the
/// caller's state is never partially mutated.
///
/// # Arguments
/// * `i` - Index of the sold asset;
/// * `j` - Index of the bought asset;
/// * `dx` - Amount of asset `i` sold, in raw units;
/// * `params` - Pool curve parameters;
/// * `state` - State of the pool before the action;
/// * `now` - Current logical time.
///
/// # Outputs
/// * `(state_after, dy)` - State of the pool after the action and the
///   amount of asset `j` paid out.
pub fn swap(
    i: usize,
    j: usize,
    dx: &U512,
    params: &PoolParams,
    state: &PoolState,
    now: u64,
) -> Result<(PoolState, U512), PoolError> {
    if i == j || i > 1 || j > 1 || dx.is_zero() {
        return Err(PoolError::BoundsRejected);
    }
    let unit = U512::from(PRECISION);

    let mut state = sync_time(params, state, now)?;
    let prices = [unit, state.price_scale];

    let mut xp = normalize_balances(&state.balances, &state.price_scale);
    let d_before = calculate_invariant(&xp, &params.ampl_coeff, &params.gamma)?;

    xp[i] = xp[i] + *dx * prices[i] / unit;
    let y = calculate_y(&xp[i], &params.ampl_coeff, &params.gamma, &d_before)?;
    let dy_calc = xp[j]
        .checked_sub(y)
        .and_then(|out| out.checked_sub(U512::one()))
        .filter(|out| !out.is_zero())
        .ok_or(PoolError::BoundsRejected)?;
    xp[j] = y;

    let fee_rate = calculate_fee(&xp, &params.mid_fee, &params.out_fee, &params.gamma);
    let dy = dy_calc * (unit - fee_rate) / unit * unit / prices[j];
    if dy.is_zero() {
        return Err(PoolError::BoundsRejected);
    }
    let balance_j = state.balances[j]
        .checked_sub(dy)
        .filter(|b| *b >= U512::from(MIN_RESERVE))
        .ok_or(PoolError::BoundsRejected)?;

    state.balances[i] = state.balances[i] + *dx;
    state.balances[j] = balance_j;

    let xp_after = normalize_balances(&state.balances, &state.price_scale);
    let d_after = calculate_invariant(&xp_after, &params.ampl_coeff, &params.gamma)?;
    if d_after + d_before / U512::from(REGRESSION_TOL_DENOM) < d_before {
        return Err(PoolError::InvariantRegression);
    }
    state.d = d_after;

    let (price_scale, d) =
        tweak_price_scale(params, &state.balances, &state.price_scale, &state.price_oracle, &state.d);
    state.price_scale = price_scale;
    state.d = d;

    trace!(
        target: "pool",
        "swap {} of asset {} for {} of asset {} (fee {})",
        dx, i, dy, j, fee_rate
    );
    Ok((state, dy))
}
