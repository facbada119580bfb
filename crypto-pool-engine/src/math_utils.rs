use primitive_types::U512;

/// All pool quantities are integers scaled by 10^18.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Cutoff for the `halfpow` series terms.
const EXP_PRECISION: u64 = 10_000_000_000;

pub fn mul_div(a: &U512, b: &U512, denom: &U512) -> U512 {
    *a * *b / *denom
}

pub fn abs_diff(a: &U512, b: &U512) -> U512 {
    if *a > *b {
        *a - *b
    } else {
        *b - *a
    }
}

/// Integer square root (Babylonian iteration, rounds down).
pub fn sqrt_int(x: &U512) -> U512 {
    if x.is_zero() {
        return U512::zero();
    }
    let mut z = (*x + U512::one()) / 2;
    let mut y = *x;
    while z < y {
        y = z;
        z = (*x / z + z) / 2;
    }
    y
}

/// Calculates `10^18 * 0.5 ^ (power / 10^18)` with a truncated binomial
/// series.
///
/// # Arguments
/// * `power` - Exponent, scaled by 10^18.
///
/// # Outputs
/// * Decay multiplier, scaled by 10^18.
pub fn halfpow(power: &U512) -> U512 {
    let unit = U512::from(PRECISION);
    let intpow = (*power / unit).as_u64();
    if intpow > 59 {
        return U512::zero();
    }
    let otherpow = *power - U512::from(intpow) * unit;
    let result = U512::from(PRECISION / (1u128 << intpow));
    if otherpow.is_zero() {
        return result;
    }

    let term_cutoff = U512::from(EXP_PRECISION);
    let x = U512::from(PRECISION / 2);
    let mut term = unit;
    let mut s = unit;
    let mut neg = false;
    for i in 1..=255u32 {
        let k = U512::from(i) * unit;
        let mut c = k - unit;
        if otherpow > c {
            c = otherpow - c;
            neg = !neg;
        } else {
            c = c - otherpow;
        }
        term = term * (c * x / unit) / k;
        if neg {
            s = s - term;
        } else {
            s = s + term;
        }
        if term < term_cutoff {
            break;
        }
    }
    result * s / unit
}

#[cfg(test)]
mod test {
    use primitive_types::U512;

    use crate::math_utils::{abs_diff, halfpow, mul_div, sqrt_int, PRECISION};

    #[test]
    fn mul_div_truncates() {
        let r = mul_div(&U512::from(7u8), &U512::from(3u8), &U512::from(2u8));
        assert_eq!(r, U512::from(10u8));
    }

    #[test]
    fn sqrt_int_exact_and_rounded() {
        assert_eq!(sqrt_int(&U512::zero()), U512::zero());
        assert_eq!(sqrt_int(&U512::from(1u8)), U512::from(1u8));
        assert_eq!(sqrt_int(&U512::from(144u8)), U512::from(12u8));
        assert_eq!(sqrt_int(&U512::from(145u8)), U512::from(12u8));
        let big = U512::from(PRECISION) * U512::from(PRECISION);
        assert_eq!(sqrt_int(&big), U512::from(PRECISION));
    }

    #[test]
    fn halfpow_reference_points() {
        let unit = U512::from(PRECISION);
        assert_eq!(halfpow(&U512::zero()), unit);
        assert_eq!(halfpow(&unit), unit / 2);
        assert_eq!(halfpow(&(unit * 2)), unit / 4);
        // 0.5^0.5 = 0.70710678...
        let half = halfpow(&(unit / 2));
        let expected = U512::from(707_106_781_186_547_524u64);
        assert!(abs_diff(&half, &expected) < U512::from(100_000_000_000u64));
        // 60 whole halvings underflow to zero
        assert_eq!(halfpow(&(unit * 60)), U512::zero());
    }

    #[test]
    fn halfpow_is_monotone() {
        let unit = U512::from(PRECISION);
        let mut prev = halfpow(&U512::zero());
        for i in 1..50u64 {
            let cur = halfpow(&(unit * U512::from(i) / 10));
            assert!(cur < prev);
            prev = cur;
        }
    }
}
