//! AMM Calculator
//!
//! Swap math using constant product formula (x * y = k).

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Calculate swap output using constant product formula
///
/// Formula: output = (reserves_out * input * fee_num) / (reserves_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserves_in: &BigUint,
    reserves_out: &BigUint,
    input_amount: &BigUint,
    fee_num: u32,
    fee_denom: u32,
) -> BigUint {
    if reserves_in.is_zero() || reserves_out.is_zero() || input_amount.is_zero() {
        return BigUint::zero();
    }

    let input_with_fee = input_amount * fee_num;
    let numerator = reserves_out * &input_with_fee;
    let denominator = reserves_in * fee_denom + &input_with_fee;

    if denominator.is_zero() {
        return BigUint::zero();
    }

    numerator / denominator
}

/// Output of a fixed-rate quote: amount * rate_num / rate_denom
pub fn calculate_rate_output(input_amount: &BigUint, rate_num: &BigUint, rate_denom: &BigUint) -> BigUint {
    if rate_denom.is_zero() {
        return BigUint::zero();
    }
    input_amount * rate_num / rate_denom
}

/// Calculate price impact as percentage
pub fn calculate_price_impact(
    reserves_in: &BigUint,
    reserves_out: &BigUint,
    input_amount: &BigUint,
    output_amount: &BigUint,
) -> f64 {
    let (Some(r_in), Some(r_out), Some(input), Some(output)) = (
        reserves_in.to_f64(),
        reserves_out.to_f64(),
        input_amount.to_f64(),
        output_amount.to_f64(),
    ) else {
        return 0.0;
    };
    if r_in == 0.0 || input == 0.0 || output == 0.0 {
        return 0.0;
    }

    let spot_price = r_out / r_in;
    let execution_price = output / input;

    if spot_price == 0.0 {
        return 0.0;
    }

    ((spot_price - execution_price) / spot_price).abs() * 100.0
}
