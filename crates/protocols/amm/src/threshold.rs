//! Constant-product pool with a step in its output curve
//!
//! Inputs at or above `threshold` receive `multiplier` times the regular
//! output. The resulting output curve is not concave, which makes it useful
//! for exercising split refinement against non-convex liquidity.

use num_bigint::BigUint;
use router_core::{PoolError, PoolId, PoolSimulator, Quote, SwapInfo, SwapLimit, TokenId};

use crate::constant_product::ConstantProductPool;

#[derive(Debug, Clone)]
pub struct ThresholdPool {
    inner: ConstantProductPool,
    threshold: BigUint,
    multiplier: u32,
}

impl ThresholdPool {
    pub fn new(inner: ConstantProductPool, threshold: impl Into<BigUint>, multiplier: u32) -> Self {
        Self {
            inner,
            threshold: threshold.into(),
            multiplier,
        }
    }
}

impl PoolSimulator for ThresholdPool {
    fn address(&self) -> &PoolId {
        self.inner.address()
    }

    fn pool_type(&self) -> &str {
        self.inner.pool_type()
    }

    fn tokens(&self) -> &[TokenId] {
        self.inner.tokens()
    }

    fn quote(
        &self,
        token_in: &TokenId,
        amount_in: &BigUint,
        token_out: &TokenId,
        limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        let mut quote = self.inner.quote(token_in, amount_in, token_out, limit)?;
        if amount_in >= &self.threshold {
            quote.amount_out *= self.multiplier;
            quote.swap_info.amount_out = quote.amount_out.clone();
        }
        Ok(quote)
    }

    fn apply_state_change(&mut self, swap: &SwapInfo, limit: Option<&mut SwapLimit>) {
        self.inner.apply_state_change(swap, limit);
    }

    fn clone_box(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_steps_at_threshold() {
        let pool = ThresholdPool::new(ConstantProductPool::new("t", "a", 10u32, "c", 10u32), 571u32, 2);
        let a = TokenId::new("a");
        let c = TokenId::new("c");
        let below = pool.quote(&a, &BigUint::from(570u32), &c, None).unwrap();
        let above = pool.quote(&a, &BigUint::from(571u32), &c, None).unwrap();
        assert_eq!(below.amount_out, BigUint::from(9u32));
        assert_eq!(above.amount_out, BigUint::from(18u32));
        assert_eq!(above.swap_info.amount_out, above.amount_out);
    }
}
