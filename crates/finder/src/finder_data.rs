//! Request input and per-request state

use std::sync::Arc;

use num_bigint::BigUint;
use router_core::{FinderError, Result, Token, TokenId};

use crate::budget::SearchBudget;
use crate::hops::HopTable;
use crate::market::MarketSnapshot;
use crate::pool_bucket::PoolBucket;
use crate::token_amount::{amount_after_gas, gas_usd, usd_value, TokenAmount};

/// One quote request.
#[derive(Debug, Clone)]
pub struct FinderInput {
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: BigUint,
    /// Native wei per gas unit
    pub gas_price: BigUint,
    pub gas_token_price_usd: f64,
    /// Route through a single path only
    pub save_gas: bool,
    /// Rank candidates net of gas cost
    pub gas_include: bool,
    pub budget: SearchBudget,
}

impl FinderInput {
    pub fn new(token_in: impl Into<String>, token_out: impl Into<String>, amount_in: impl Into<BigUint>) -> Self {
        Self {
            token_in: TokenId::new(token_in),
            token_out: TokenId::new(token_out),
            amount_in: amount_in.into(),
            gas_price: BigUint::default(),
            gas_token_price_usd: 0.0,
            save_gas: false,
            gas_include: true,
            budget: SearchBudget::unlimited(),
        }
    }

    pub fn with_gas(mut self, gas_price: impl Into<BigUint>, gas_token_price_usd: f64) -> Self {
        self.gas_price = gas_price.into();
        self.gas_token_price_usd = gas_token_price_usd;
        self
    }

    pub fn save_gas(mut self, save_gas: bool) -> Self {
        self.save_gas = save_gas;
        self
    }

    pub fn gas_include(mut self, gas_include: bool) -> Self {
        self.gas_include = gas_include;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// Per-request state: the copy-on-write bucket plus cached lookups.
#[derive(Debug)]
pub struct FinderData {
    pub bucket: PoolBucket,
    hops: Option<Arc<HopTable>>,
}

impl FinderData {
    pub fn new(snapshot: Arc<MarketSnapshot>) -> Self {
        Self {
            bucket: PoolBucket::new(snapshot),
            hops: None,
        }
    }

    pub fn snapshot(&self) -> &Arc<MarketSnapshot> {
        self.bucket.baseline()
    }

    /// Drop all speculative pool state.
    ///
    /// Must be called before deriving a new route from a bucket that a
    /// previous pass already mutated.
    pub fn refresh(&mut self) {
        self.bucket.clear_changed_pools();
    }

    /// Independent copy for speculative evaluation.
    pub fn fork(&self) -> Self {
        Self {
            bucket: self.bucket.fork(),
            hops: self.hops.clone(),
        }
    }

    /// Compute (once) the hop bounds towards `token_out`.
    pub fn prepare(&mut self, token_out: &TokenId, max_hops: usize) {
        let up_to_date = self
            .hops
            .as_ref()
            .is_some_and(|h| h.token_out() == token_out && h.max_hops() >= max_hops);
        if !up_to_date {
            self.hops = Some(Arc::new(HopTable::build(self.snapshot(), token_out, max_hops)));
        }
    }

    pub fn hop_table(&self, token_out: &TokenId, max_hops: usize) -> Option<&HopTable> {
        self.hops
            .as_deref()
            .filter(|h| h.token_out() == token_out && h.max_hops() >= max_hops)
    }

    pub fn token(&self, id: &TokenId) -> Result<&Token> {
        self.snapshot()
            .token(id)
            .ok_or_else(|| FinderError::NoInfoForToken {
                token: id.to_string(),
            })
    }

    pub fn has_token(&self, id: &TokenId) -> bool {
        self.snapshot().token(id).is_some()
    }

    /// USD value of a raw amount, if the token is priced.
    pub fn amount_usd(&self, token: &TokenId, amount: &BigUint) -> Option<f64> {
        let price = self.snapshot().price_usd(token)?;
        let decimals = self.snapshot().token(token)?.decimals;
        Some(usd_value(amount, decimals, price))
    }

    /// Value an amount. With `gas` the valuation is net of that gas cost.
    pub fn token_amount(
        &self,
        input: &FinderInput,
        token: &TokenId,
        amount: BigUint,
        gas: Option<i64>,
    ) -> TokenAmount {
        let gas = gas.unwrap_or(0);
        let gross = self.amount_usd(token, &amount).unwrap_or(0.0);
        let amount_usd = gross - gas_usd(&input.gas_price, gas, input.gas_token_price_usd);
        let amount_after_gas = self
            .snapshot()
            .native_price(token)
            .map(|price| amount_after_gas(&amount, price.buy, &input.gas_price, gas));

        TokenAmount {
            token: token.clone(),
            amount,
            amount_usd,
            amount_after_gas,
        }
    }
}
