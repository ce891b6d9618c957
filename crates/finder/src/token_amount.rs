//! Token amounts and their valuation

use num_bigint::{BigInt, BigUint};
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use router_core::TokenId;

/// Decimals of the native gas token
pub const NATIVE_DECIMALS: i32 = 18;

/// An amount of a token together with its valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAmount {
    pub token: TokenId,
    pub amount: BigUint,
    /// USD value, net of gas when the producer counted gas
    pub amount_usd: f64,
    /// Amount in native units net of gas, when native prices are known
    pub amount_after_gas: Option<BigInt>,
}

impl TokenAmount {
    /// An unvalued amount
    pub fn new(token: TokenId, amount: BigUint) -> Self {
        Self {
            token,
            amount,
            amount_usd: 0.0,
            amount_after_gas: None,
        }
    }

    pub fn zero(token: TokenId) -> Self {
        Self::new(token, BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// USD value of `amount` raw units of a token with `decimals` decimals.
pub fn usd_value(amount: &BigUint, decimals: u8, price_usd: f64) -> f64 {
    let raw = amount.to_f64().unwrap_or(f64::MAX);
    raw / 10f64.powi(decimals as i32) * price_usd
}

/// USD cost of `gas` units at `gas_price` (native wei per unit).
pub fn gas_usd(gas_price: &BigUint, gas: i64, gas_token_price_usd: f64) -> f64 {
    if gas <= 0 || gas_token_price_usd == 0.0 {
        return 0.0;
    }
    let wei = gas_price.to_f64().unwrap_or(0.0) * gas as f64;
    wei / 10f64.powi(NATIVE_DECIMALS) * gas_token_price_usd
}

/// Native value of `amount` net of the gas fee.
///
/// `native_price` is native units per raw token unit.
pub fn amount_after_gas(amount: &BigUint, native_price: f64, gas_price: &BigUint, gas: i64) -> BigInt {
    let value = amount.to_f64().unwrap_or(f64::MAX) * native_price;
    let value = BigInt::from_f64(value.floor()).unwrap_or_default();
    let fee = BigInt::from(gas_price.clone()) * BigInt::from(gas.max(0));
    value - fee
}
