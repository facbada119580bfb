use primitive_types::U512;

use crate::math_utils::{halfpow, PRECISION};

/// EMA half-life of the internal price oracle, in logical time units.
pub const MA_HALF_TIME: u64 = 500;

/// Decays the oracle price toward the observed spot price over `dt` time
/// units: `oracle' = spot * (1 - alpha) + oracle * alpha` with
/// `alpha = 0.5 ^ (dt / MA_HALF_TIME)`.
///
/// # Arguments
/// * `price_oracle` - Previous EMA price, scaled by 10^18;
/// * `spot` - Current spot price, scaled by 10^18;
/// * `dt` - Elapsed logical time since the last oracle update.
///
/// # Outputs
/// * `price_oracle_new` - Updated EMA price.
pub fn ema_price(price_oracle: &U512, spot: &U512, dt: u64) -> U512 {
    let unit = U512::from(PRECISION);
    let alpha = halfpow(&(U512::from(dt) * unit / U512::from(MA_HALF_TIME)));
    (*spot * (unit - alpha) + *price_oracle * alpha) / unit
}
