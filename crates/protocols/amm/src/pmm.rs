//! Fixed-rate PMM quoter
//!
//! Quotes come from a market maker's price, not from on-chain reserves, so
//! the pool declares itself dynamic. Payouts are bounded by the shared
//! inventory of its pool type.

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{PoolError, PoolId, PoolSimulator, Quote, SwapInfo, SwapLimit, TokenId};

use crate::calculator::calculate_rate_output;

pub const PMM_TYPE: &str = "pmm";

/// Gas units charged per fill
pub const PMM_GAS: i64 = 110_000;

#[derive(Debug, Clone)]
pub struct PmmQuoter {
    address: PoolId,
    /// [base, quote]
    tokens: Vec<TokenId>,
    /// Quote units per base unit, as a fraction
    rate_num: BigUint,
    rate_denom: BigUint,
    pub gas: i64,
}

impl PmmQuoter {
    pub fn new(
        address: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
        rate_num: impl Into<BigUint>,
        rate_denom: impl Into<BigUint>,
    ) -> Self {
        Self {
            address: PoolId::new(address),
            tokens: vec![TokenId::new(base), TokenId::new(quote)],
            rate_num: rate_num.into(),
            rate_denom: rate_denom.into(),
            gas: PMM_GAS,
        }
    }

    pub fn with_gas(mut self, gas: i64) -> Self {
        self.gas = gas;
        self
    }

    fn output(&self, token_in: &TokenId, amount_in: &BigUint, token_out: &TokenId) -> Result<BigUint, PoolError> {
        let (base, quote) = (&self.tokens[0], &self.tokens[1]);
        if token_in == base && token_out == quote {
            Ok(calculate_rate_output(amount_in, &self.rate_num, &self.rate_denom))
        } else if token_in == quote && token_out == base {
            Ok(calculate_rate_output(amount_in, &self.rate_denom, &self.rate_num))
        } else {
            let bad = if self.tokens.contains(token_in) { token_out } else { token_in };
            Err(PoolError::InvalidToken {
                token: bad.to_string(),
            })
        }
    }
}

impl PoolSimulator for PmmQuoter {
    fn address(&self) -> &PoolId {
        &self.address
    }

    fn pool_type(&self) -> &str {
        PMM_TYPE
    }

    fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    fn quote(
        &self,
        token_in: &TokenId,
        amount_in: &BigUint,
        token_out: &TokenId,
        limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        if amount_in.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        let amount_out = self.output(token_in, amount_in, token_out)?;
        if amount_out.is_zero() {
            return Err(PoolError::InsufficientLiquidity {
                reason: format!("{} quotes nothing for {}", self.address, amount_in),
            });
        }
        if let Some(limit) = limit {
            limit.check(token_out, &amount_out)?;
        }

        Ok(Quote {
            amount_out: amount_out.clone(),
            gas: self.gas,
            swap_info: SwapInfo {
                pool: self.address.clone(),
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in: amount_in.clone(),
                amount_out,
                extra: serde_json::Value::Null,
            },
        })
    }

    fn apply_state_change(&mut self, swap: &SwapInfo, limit: Option<&mut SwapLimit>) {
        if let Some(limit) = limit {
            if let Err(err) = limit.consume(swap) {
                tracing::warn!(pool = %self.address, error = %err, "inventory update failed");
            }
        }
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}
