use primitive_types::U512;

use crate::amm_actions::{swap, sync_time, MIN_RESERVE};
use crate::crypto_invariant::{calculate_invariant, normalize_balances};
use crate::errors::{ConstructionError, PoolError};
use crate::fees_utils::calculate_fee;
use crate::math_utils::{mul_div, PRECISION};
use crate::repegging_utils::spot_price;

/// Supported amplification domain (raw, `A_MULTIPLIER`-scaled formulas).
const MIN_AMPL: u64 = 4_000;
const MAX_AMPL: u64 = 4_000_000_000;

/// Supported concentration domain, scaled by 10^18.
const MIN_GAMMA: u64 = 10_000_000_000;
const MAX_GAMMA: u64 = 20_000_000_000_000_000;

/// Curve parameters, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolParams {
    pub ampl_coeff: U512,
    pub gamma: U512,
    pub mid_fee: U512,
    pub out_fee: U512,
}

/// Mutable pool state. Mutated exclusively through the action functions;
/// every transition either fully commits or leaves the previous value
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    pub balances: [U512; 2],
    pub price_scale: U512,
    pub price_oracle: U512,
    pub d: U512,
    pub last_update_time: u64,
}

/// A two-asset pool concentrating liquidity around its internal price
/// scale. Asset 0 is the numeraire; all prices are quoted as asset 1 in
/// units of asset 0, scaled by 10^18.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptoPool {
    params: PoolParams,
    state: PoolState,
}

impl CryptoPool {
    /// Seeds a pool from an initial invariant and price vector. The
    /// reserves are derived so the pool starts perfectly balanced at its
    /// price scale: half the invariant on each side.
    ///
    /// # Arguments
    /// * `params` - Curve parameters;
    /// * `initial_d` - Initial invariant value, in asset 0 units scaled by
    ///   10^18;
    /// * `initial_prices` - Prices of the two assets in asset 0 units;
    ///   `initial_prices[0]` must be 10^18.
    pub fn new(
        params: PoolParams,
        initial_d: U512,
        initial_prices: [U512; 2],
    ) -> Result<Self, ConstructionError> {
        let unit = U512::from(PRECISION);
        if params.ampl_coeff < U512::from(MIN_AMPL) || params.ampl_coeff > U512::from(MAX_AMPL) {
            return Err(ConstructionError::AmplificationOutOfDomain);
        }
        if params.gamma < U512::from(MIN_GAMMA) || params.gamma > U512::from(MAX_GAMMA) {
            return Err(ConstructionError::GammaOutOfDomain);
        }
        if initial_prices[0] != unit {
            return Err(ConstructionError::BadNumeraire);
        }
        if initial_prices[1].is_zero() {
            return Err(ConstructionError::NonPositivePrice);
        }
        if params.mid_fee > params.out_fee || params.out_fee >= unit {
            return Err(ConstructionError::InvalidFeeBounds);
        }

        let price_scale = initial_prices[1];
        let half_d = initial_d / U512::from(2u8);
        let balances = [half_d, mul_div(&half_d, &unit, &price_scale)];
        let floor = U512::from(MIN_RESERVE);
        if balances[0] < floor || balances[1] < floor {
            return Err(ConstructionError::InsufficientLiquidity);
        }

        let xp = normalize_balances(&balances, &price_scale);
        let d = calculate_invariant(&xp, &params.ampl_coeff, &params.gamma)
            .map_err(|_| ConstructionError::DegenerateCurve)?;

        Ok(CryptoPool {
            params,
            state: PoolState {
                balances,
                price_scale,
                price_oracle: price_scale,
                d,
                last_update_time: 0,
            },
        })
    }

    /// Sells `dx` of asset `i` for asset `j`, mutating the pool. Returns
    /// the amount paid out, or a rejection that leaves the pool unchanged.
    pub fn execute_swap(
        &mut self,
        dx: U512,
        i: usize,
        j: usize,
        now: u64,
    ) -> Result<U512, PoolError> {
        let (state, dy) = swap(i, j, &dx, &self.params, &self.state, now)?;
        self.state = state;
        Ok(dy)
    }

    /// Quotes `execute_swap` without committing anything. The returned
    /// amount is exactly what executing the same swap on this state would
    /// pay out.
    pub fn preview_swap(&self, dx: U512, i: usize, j: usize, now: u64) -> Result<U512, PoolError> {
        swap(i, j, &dx, &self.params, &self.state, now).map(|(_, dy)| dy)
    }

    /// Applies the oracle and repeg updates owed for idle time without
    /// trading.
    pub fn advance_time(&mut self, now: u64) -> Result<(), PoolError> {
        self.state = sync_time(&self.params, &self.state, now)?;
        Ok(())
    }

    pub fn balances(&self) -> [U512; 2] {
        self.state.balances
    }

    pub fn price_scale(&self) -> U512 {
        self.state.price_scale
    }

    pub fn price_oracle(&self) -> U512 {
        self.state.price_oracle
    }

    pub fn d(&self) -> U512 {
        self.state.d
    }

    /// Instantaneous price implied by the current reserves, distinct from
    /// the EMA oracle.
    pub fn spot_price(&self) -> Result<U512, PoolError> {
        spot_price(
            &self.params,
            &self.state.balances,
            &self.state.price_scale,
            &self.state.d,
        )
    }

    /// The dynamic fee a swap would currently be charged.
    pub fn current_fee(&self) -> U512 {
        let xp = normalize_balances(&self.state.balances, &self.state.price_scale);
        calculate_fee(&xp, &self.params.mid_fee, &self.params.out_fee, &self.params.gamma)
    }
}
