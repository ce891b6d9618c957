//! Constant-product (x * y = k) pool simulator

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{PoolError, PoolId, PoolSimulator, Quote, SwapInfo, SwapLimit, TokenId};

use crate::calculator::{calculate_output, calculate_price_impact};

pub const CONSTANT_PRODUCT_TYPE: &str = "uniswap-v2";

/// Gas units charged per hop through a constant-product pool
pub const CONSTANT_PRODUCT_GAS: i64 = 60_000;

/// Two-token constant-product pool
#[derive(Debug, Clone)]
pub struct ConstantProductPool {
    address: PoolId,
    tokens: Vec<TokenId>,
    reserves: Vec<BigUint>,
    /// Fee numerator (e.g., 997)
    pub fee_num: u32,
    /// Fee denominator (e.g., 1000)
    pub fee_denom: u32,
    pub gas: i64,
}

impl ConstantProductPool {
    pub fn new(
        address: impl Into<String>,
        token_x: impl Into<String>,
        reserve_x: impl Into<BigUint>,
        token_y: impl Into<String>,
        reserve_y: impl Into<BigUint>,
    ) -> Self {
        Self {
            address: PoolId::new(address),
            tokens: vec![TokenId::new(token_x), TokenId::new(token_y)],
            reserves: vec![reserve_x.into(), reserve_y.into()],
            fee_num: 997,
            fee_denom: 1000,
            gas: CONSTANT_PRODUCT_GAS,
        }
    }

    pub fn with_fee(mut self, fee_num: u32, fee_denom: u32) -> Self {
        self.fee_num = fee_num;
        self.fee_denom = fee_denom;
        self
    }

    pub fn with_gas(mut self, gas: i64) -> Self {
        self.gas = gas;
        self
    }

    pub fn reserve(&self, token: &TokenId) -> Option<&BigUint> {
        self.index_of(token).map(|i| &self.reserves[i])
    }

    fn index_of(&self, token: &TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }

    fn indices(&self, token_in: &TokenId, token_out: &TokenId) -> Result<(usize, usize), PoolError> {
        let i = self.index_of(token_in).ok_or_else(|| PoolError::InvalidToken {
            token: token_in.to_string(),
        })?;
        let o = self.index_of(token_out).ok_or_else(|| PoolError::InvalidToken {
            token: token_out.to_string(),
        })?;
        if i == o {
            return Err(PoolError::InvalidToken {
                token: token_out.to_string(),
            });
        }
        Ok((i, o))
    }
}

impl PoolSimulator for ConstantProductPool {
    fn address(&self) -> &PoolId {
        &self.address
    }

    fn pool_type(&self) -> &str {
        CONSTANT_PRODUCT_TYPE
    }

    fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    fn quote(
        &self,
        token_in: &TokenId,
        amount_in: &BigUint,
        token_out: &TokenId,
        _limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        if amount_in.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        let (i, o) = self.indices(token_in, token_out)?;
        let reserves_in = &self.reserves[i];
        let reserves_out = &self.reserves[o];

        let output = calculate_output(reserves_in, reserves_out, amount_in, self.fee_num, self.fee_denom);
        if output.is_zero() {
            return Err(PoolError::InsufficientLiquidity {
                reason: format!("{} returns nothing for {}", self.address, amount_in),
            });
        }

        let price_impact = calculate_price_impact(reserves_in, reserves_out, amount_in, &output);
        Ok(Quote {
            amount_out: output.clone(),
            gas: self.gas,
            swap_info: SwapInfo {
                pool: self.address.clone(),
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in: amount_in.clone(),
                amount_out: output,
                extra: serde_json::json!({ "price_impact": price_impact }),
            },
        })
    }

    fn apply_state_change(&mut self, swap: &SwapInfo, _limit: Option<&mut SwapLimit>) {
        let Ok((i, o)) = self.indices(&swap.token_in, &swap.token_out) else {
            tracing::warn!(pool = %self.address, "swap does not match pool tokens");
            return;
        };
        self.reserves[i] += &swap.amount_in;
        if self.reserves[o] >= swap.amount_out {
            self.reserves[o] -= &swap.amount_out;
        } else {
            self.reserves[o] = BigUint::zero();
        }
    }

    fn clone_box(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}
