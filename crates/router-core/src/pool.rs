//! Pool simulator interface
//!
//! Every liquidity source the finder can route through implements
//! [`PoolSimulator`]. The finder never inspects concrete pool types.

use std::collections::HashMap;
use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::errors::PoolError;
use crate::types::{PoolId, TokenId};

/// Record of one simulated swap, fed back into `apply_state_change`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapInfo {
    pub pool: PoolId,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: BigUint,
    pub amount_out: BigUint,
    /// Pool-specific data the simulator needs to replay the swap
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Result of quoting a pool
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub amount_out: BigUint,
    pub gas: i64,
    pub swap_info: SwapInfo,
}

/// Shared inventory for pools of one type (e.g. a market maker's balances)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapLimit {
    pub pool_type: String,
    pub inventory: HashMap<TokenId, BigUint>,
}

impl SwapLimit {
    pub fn new(pool_type: impl Into<String>) -> Self {
        Self {
            pool_type: pool_type.into(),
            inventory: HashMap::new(),
        }
    }

    pub fn with_balance(mut self, token: impl Into<String>, amount: impl Into<BigUint>) -> Self {
        self.inventory.insert(TokenId::new(token), amount.into());
        self
    }

    pub fn available(&self, token: &TokenId) -> BigUint {
        self.inventory.get(token).cloned().unwrap_or_default()
    }

    /// Fails when `amount` of `token` cannot be paid out.
    pub fn check(&self, token: &TokenId, amount: &BigUint) -> Result<(), PoolError> {
        let available = self.available(token);
        if &available < amount {
            return Err(PoolError::SwapLimitExceeded {
                token: token.to_string(),
                required: amount.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    /// Pay out `swap.amount_out` and take in `swap.amount_in`.
    pub fn consume(&mut self, swap: &SwapInfo) -> Result<(), PoolError> {
        self.check(&swap.token_out, &swap.amount_out)?;
        let out = self.inventory.entry(swap.token_out.clone()).or_default();
        *out -= &swap.amount_out;
        *self.inventory.entry(swap.token_in.clone()).or_default() += &swap.amount_in;
        Ok(())
    }
}

/// A simulated liquidity pool
pub trait PoolSimulator: Send + Sync + fmt::Debug {
    fn address(&self) -> &PoolId;

    /// Protocol tag, e.g. "uniswap-v2" or "pmm"
    fn pool_type(&self) -> &str;

    fn tokens(&self) -> &[TokenId];

    /// Tokens reachable from `token_in` through this pool.
    fn can_swap_to(&self, token_in: &TokenId) -> Vec<TokenId> {
        if !self.tokens().contains(token_in) {
            return Vec::new();
        }
        self.tokens()
            .iter()
            .filter(|t| *t != token_in)
            .cloned()
            .collect()
    }

    fn quote(
        &self,
        token_in: &TokenId,
        amount_in: &BigUint,
        token_out: &TokenId,
        limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError>;

    /// Replay a quoted swap so later quotes see post-trade state.
    fn apply_state_change(&mut self, swap: &SwapInfo, limit: Option<&mut SwapLimit>);

    /// Dynamic pools quote from off-chain state and are candidates for
    /// substitution after the main search.
    fn is_dynamic(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn PoolSimulator>;
}

impl Clone for Box<dyn PoolSimulator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
