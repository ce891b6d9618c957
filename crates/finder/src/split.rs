//! Division of the input amount into portions
//!
//! The input is cut into `distribution_percent` units. Units are merged until
//! a portion is worth at least `min_part_usd`; as many such portions as fit
//! into 100% are produced and the integer remainder goes to the first one.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::token_amount::usd_value;

/// Portions summing exactly to `amount`.
///
/// Without a price, with `distribution_percent == 100`, or when the whole
/// amount is worth less than `min_part_usd`, the amount is not split.
pub fn split_amount_in(
    amount: &BigUint,
    decimals: u8,
    price_usd: Option<f64>,
    distribution_percent: u32,
    min_part_usd: f64,
) -> Vec<BigUint> {
    let whole = vec![amount.clone()];
    let Some(price) = price_usd else {
        return whole;
    };
    if distribution_percent == 0 || distribution_percent >= 100 || amount.is_zero() {
        return whole;
    }
    if usd_value(amount, decimals, price) < min_part_usd {
        return whole;
    }

    // Smallest number of units whose value reaches the minimum portion
    let mut units = 1u32;
    let portion = loop {
        let percent = distribution_percent * units;
        if percent > 100 {
            return whole;
        }
        let portion = amount * percent / 100u32;
        if !portion.is_zero() && usd_value(&portion, decimals, price) >= min_part_usd {
            break portion;
        }
        units += 1;
    };

    let count = 100 / (distribution_percent * units);
    if count <= 1 {
        return whole;
    }

    let mut portions = vec![portion.clone(); count as usize];
    let remainder = amount - &portion * count;
    portions[0] += remainder;
    portions
}
