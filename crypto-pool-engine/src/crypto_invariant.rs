use primitive_types::U512;

use crate::errors::PoolError;
use crate::math_utils::{abs_diff, PRECISION};

/// Newton iteration budget shared by both solvers.
pub const MAX_NEWTON_ITERS: u32 = 255;

/// The raw amplification input is scaled up by this factor in the curve
/// formulas.
pub const A_MULTIPLIER: u64 = 10_000;

/// Both solvers refuse results where a reserve leaves `[D/100, 100*D]`
/// (normalized); the curve is not designed for such imbalance.
const MIN_FRAC: u64 = 10_000_000_000_000_000;
const MAX_FRAC: u128 = 100_000_000_000_000_000_000;

/// Reduces raw reserves to the common (asset 0) denomination used by all
/// invariant math: asset 1 is weighted by the pool's price scale.
pub fn normalize_balances(balances: &[U512; 2], price_scale: &U512) -> [U512; 2] {
    let precision = U512::from(PRECISION);
    [balances[0], balances[1] * *price_scale / precision]
}

/// Calculates the two-parameter invariant error, the absolute difference
/// between the left and right sides of
///
/// `k * d * Sum(xp) + Prod(xp) = k * d^2 + (d / 2)^2`,
///
/// where `k = (a / 10^4) * k0 * gamma^2 / (gamma + 10^18 - k0)^2` and
/// `k0 = Prod(xp) * 4 / d^2`, both sides brought to a common integer
/// denominator. Since calculations are over integers the two sides are
/// rarely exactly equal; a solved `d` minimizes this error.
///
/// # Arguments
/// * `xp` - Normalized reserves;
/// * `a` - Amplification coefficient (raw, `A_MULTIPLIER`-scaled formulas);
/// * `gamma` - Concentration coefficient, scaled by 10^18;
/// * `d` - Candidate invariant value.
///
/// # Outputs
/// * `inv_abs_err` - "Invariant error".
pub fn invariant_error_from_xp(xp: &[U512; 2], a: &U512, gamma: &U512, d: &U512) -> U512 {
    let unit = U512::from(PRECISION);
    let a_mult = U512::from(A_MULTIPLIER);
    let two = U512::from(2u8);

    let s = xp[0] + xp[1];
    let p = xp[0] * xp[1];
    let k0 = unit * xp[0] * two / *d * xp[1] * two / *d;
    let g1k0 = abs_diff(&(*gamma + unit), &k0);

    // Both sides multiplied by 10^4 * 10^18 * g1k0^2 to stay integral.
    let m = a_mult * unit * g1k0 * g1k0;
    let ag = *a * k0 * *gamma * *gamma;
    let inv_left = ag * *d * s + p * m;
    let inv_right = ag * *d * *d + *d * *d / U512::from(4u8) * m;

    abs_diff(&inv_left, &inv_right)
}

/// Two-parameter invariant value numerical calculation procedure.
///
/// Solves, relative to `d`, the equation
///
/// `k * d * Sum(xp) + Prod(xp) = k * d^2 + (d / 2)^2`
///
/// with the Newton-Raphson method, starting from `d = Sum(xp)` and using
/// the closed-form `d_plus`/`d_minus` decomposition of the Newton step so
/// no intermediate value goes negative.
///
/// # Arguments
/// * `xp` - Normalized reserves;
/// * `a` - Amplification coefficient;
/// * `gamma` - Concentration coefficient, scaled by 10^18.
///
/// # Outputs
/// * `d` - Value of the invariant, or `SolverNonConvergence` if the
///   iteration budget is exhausted or the parameters leave the curve
///   domain.
pub fn calculate_invariant(xp: &[U512; 2], a: &U512, gamma: &U512) -> Result<U512, PoolError> {
    if xp[0].is_zero() || xp[1].is_zero() {
        return Err(PoolError::SolverNonConvergence);
    }
    let unit = U512::from(PRECISION);
    let a_mult = U512::from(A_MULTIPLIER);
    let two = U512::from(2u8);

    let s = xp[0] + xp[1];
    let mut d = s;
    for _ in 0..MAX_NEWTON_ITERS {
        let d_prev = d;

        let k0 = unit * xp[0] * two / d * xp[1] * two / d;
        if k0.is_zero() {
            return Err(PoolError::SolverNonConvergence);
        }
        let g1k0 = abs_diff(&(*gamma + unit), &k0) + U512::one();

        // d / (a / 10^4) * (g1k0 / gamma)^2
        let mul1 = unit * d / *gamma * g1k0 / *gamma * g1k0 * a_mult / *a;
        // 2 * 2 * k0 / g1k0
        let mul2 = (unit + unit) * two * k0 / g1k0;

        let fprime_pos = s + s * mul2 / unit + mul1 * two / k0;
        let fprime_neg = mul2 * d / unit;
        let neg_fprime = fprime_pos
            .checked_sub(fprime_neg)
            .filter(|f| !f.is_zero())
            .ok_or(PoolError::SolverNonConvergence)?;

        let d_plus = d * (neg_fprime + s) / neg_fprime;
        let mut d_minus = d * d / neg_fprime;
        if unit > k0 {
            d_minus = d_minus + d * (mul1 / neg_fprime) / unit * (unit - k0) / k0;
        } else {
            let correction = d * (mul1 / neg_fprime) / unit * (k0 - unit) / k0;
            d_minus = d_minus
                .checked_sub(correction)
                .ok_or(PoolError::SolverNonConvergence)?;
        }

        d = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            (d_minus - d_plus) / 2
        };
        if d.is_zero() {
            return Err(PoolError::SolverNonConvergence);
        }

        let diff = abs_diff(&d, &d_prev);
        let rel_bound = d.max(U512::from(10_000_000_000_000_000u64));
        if diff <= U512::one() || diff * U512::from(100_000_000_000_000u64) < rel_bound {
            for x in xp {
                let frac = *x * unit / d;
                if frac < U512::from(MIN_FRAC) || frac > U512::from(MAX_FRAC) {
                    return Err(PoolError::SolverNonConvergence);
                }
            }
            return Ok(d);
        }
    }
    Err(PoolError::SolverNonConvergence)
}

/// The inverse solve: given the invariant value and one fixed reserve,
/// finds the reserve on the other side of the pool. Same iteration
/// structure, budget and failure contract as [`calculate_invariant`].
///
/// # Arguments
/// * `x` - The fixed normalized reserve;
/// * `a` - Amplification coefficient;
/// * `gamma` - Concentration coefficient, scaled by 10^18;
/// * `d` - Value of the invariant.
///
/// # Outputs
/// * `y` - The missing normalized reserve.
pub fn calculate_y(x: &U512, a: &U512, gamma: &U512, d: &U512) -> Result<U512, PoolError> {
    if x.is_zero() || d.is_zero() {
        return Err(PoolError::SolverNonConvergence);
    }
    let unit = U512::from(PRECISION);
    let a_mult = U512::from(A_MULTIPLIER);
    let two = U512::from(2u8);
    let rel_denom = U512::from(100_000_000_000_000u64);

    let mut y = *d * *d / (*x * two * two);
    let k0_i = unit * *x * two / *d;
    let convergence_limit = (*x / rel_denom)
        .max(*d / rel_denom)
        .max(U512::from(100u8));

    for _ in 0..MAX_NEWTON_ITERS {
        let y_prev = y;
        if y.is_zero() {
            return Err(PoolError::SolverNonConvergence);
        }

        let k0 = k0_i * y * two / *d;
        if k0.is_zero() {
            return Err(PoolError::SolverNonConvergence);
        }
        let s = *x + y;
        let g1k0 = abs_diff(&(*gamma + unit), &k0) + U512::one();

        let mul1 = unit * *d / *gamma * g1k0 / *gamma * g1k0 * a_mult / *a;
        let mul2 = unit + (unit + unit) * k0 / g1k0;

        let yfprime = match (unit * y + s * mul2 + mul1).checked_sub(*d * mul2) {
            Some(v) => v,
            None => {
                y = y_prev / 2;
                continue;
            }
        };
        let fprime = yfprime / y;
        if fprime.is_zero() {
            y = y_prev / 2;
            continue;
        }

        let mut y_minus = mul1 / fprime;
        let y_plus = (yfprime + unit * *d) / fprime + y_minus * unit / k0;
        y_minus = y_minus + unit * s / fprime;

        y = if y_plus < y_minus {
            y_prev / 2
        } else {
            y_plus - y_minus
        };

        let diff = abs_diff(&y, &y_prev);
        if diff < convergence_limit.max(y / rel_denom) {
            let frac = y * unit / *d;
            if frac < U512::from(MIN_FRAC) || frac > U512::from(MAX_FRAC) {
                return Err(PoolError::SolverNonConvergence);
            }
            return Ok(y);
        }
    }
    Err(PoolError::SolverNonConvergence)
}
