use primitive_types::U512;
use rand::rngs::StdRng;
use rand::Rng;

use crate::math_utils::PRECISION;
use crate::pool_data::{CryptoPool, PoolParams};

/// Random curve parameters inside the supported domain.
pub fn pool_params_gen(rng: &mut StdRng) -> PoolParams {
    let out_fee = U512::from(rng.gen_range(1_000_000_000_000_000u64..50_000_000_000_000_000));
    let mid_fee = out_fee / U512::from(rng.gen_range(2u64..20));
    PoolParams {
        ampl_coeff: U512::from(rng.gen_range(5_000u64..3_000_000_000)),
        gamma: U512::from(rng.gen_range(10_000_000_000u64..20_000_000_000_000_000)),
        mid_fee,
        out_fee,
    }
}

/// Random freshly seeded pool: balanced reserves at a random price scale.
pub fn pool_gen(rng: &mut StdRng) -> CryptoPool {
    let params = pool_params_gen(rng);
    let unit = U512::from(PRECISION);
    let d = unit * U512::from(rng.gen_range(10_000u64..1_000_000_000));
    let price = U512::from(rng.gen_range(
        10_000_000_000_000_000u128..2_000_000_000_000_000_000_000,
    ));
    CryptoPool::new(params, d, [unit, price]).unwrap()
}

/// Applies one random swap of up to ~5% of the sold-side reserve.
pub fn random_swap(rng: &mut StdRng, pool: &mut CryptoPool, now: u64) -> Option<U512> {
    let i = rng.gen_range(0usize..2);
    let share = rng.gen_range(1u64..50);
    let dx = pool.balances()[i] * U512::from(share) / U512::from(1_000u64);
    pool.execute_swap(dx, i, 1 - i, now).ok()
}
