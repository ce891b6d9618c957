//! Shared market snapshot
//!
//! Everything a request reads but never mutates: pools, token metadata,
//! prices and swap limits. Requests share one snapshot through an `Arc` and
//! layer their own copy-on-write state on top (see [`crate::pool_bucket`]).

use std::collections::HashMap;
use std::sync::Arc;

use router_core::{NativePrice, PoolId, PoolSimulator, SwapLimit, Token, TokenId};

use crate::graph::PoolGraph;

#[derive(Debug, Default)]
pub struct MarketSnapshot {
    pools: HashMap<PoolId, Arc<dyn PoolSimulator>>,
    swap_limits: HashMap<String, SwapLimit>,
    tokens: HashMap<TokenId, Token>,
    prices_usd: HashMap<TokenId, f64>,
    native_prices: Option<HashMap<TokenId, NativePrice>>,
    graph: PoolGraph,
}

impl MarketSnapshot {
    pub fn builder() -> MarketSnapshotBuilder {
        MarketSnapshotBuilder::default()
    }

    pub fn pool(&self, id: &PoolId) -> Option<&Arc<dyn PoolSimulator>> {
        self.pools.get(id)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn swap_limit(&self, pool_type: &str) -> Option<&SwapLimit> {
        self.swap_limits.get(pool_type)
    }

    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn price_usd(&self, id: &TokenId) -> Option<f64> {
        self.prices_usd.get(id).copied().filter(|p| *p > 0.0)
    }

    pub fn native_price(&self, id: &TokenId) -> Option<NativePrice> {
        self.native_prices.as_ref()?.get(id).copied()
    }

    pub fn has_native_prices(&self) -> bool {
        self.native_prices.is_some()
    }

    pub fn graph(&self) -> &PoolGraph {
        &self.graph
    }
}

#[derive(Debug, Default)]
pub struct MarketSnapshotBuilder {
    pools: HashMap<PoolId, Arc<dyn PoolSimulator>>,
    swap_limits: HashMap<String, SwapLimit>,
    tokens: HashMap<TokenId, Token>,
    prices_usd: HashMap<TokenId, f64>,
    native_prices: Option<HashMap<TokenId, NativePrice>>,
}

impl MarketSnapshotBuilder {
    pub fn token(mut self, token: Token) -> Self {
        self.tokens.insert(token.id.clone(), token);
        self
    }

    pub fn price(mut self, token: impl Into<String>, price_usd: f64) -> Self {
        self.prices_usd.insert(TokenId::new(token), price_usd);
        self
    }

    pub fn native_price(mut self, token: impl Into<String>, price: NativePrice) -> Self {
        self.native_prices
            .get_or_insert_with(HashMap::new)
            .insert(TokenId::new(token), price);
        self
    }

    pub fn pool(self, pool: impl PoolSimulator + 'static) -> Self {
        self.shared_pool(Arc::new(pool))
    }

    pub fn shared_pool(mut self, pool: Arc<dyn PoolSimulator>) -> Self {
        self.pools.insert(pool.address().clone(), pool);
        self
    }

    pub fn boxed_pool(self, pool: Box<dyn PoolSimulator>) -> Self {
        self.shared_pool(Arc::from(pool))
    }

    pub fn swap_limit(mut self, limit: SwapLimit) -> Self {
        self.swap_limits.insert(limit.pool_type.clone(), limit);
        self
    }

    pub fn build(self) -> Arc<MarketSnapshot> {
        let graph = PoolGraph::build(&self.pools);
        tracing::debug!(
            pools = graph.pool_count(),
            tokens = graph.token_count(),
            "built market snapshot"
        );
        Arc::new(MarketSnapshot {
            pools: self.pools,
            swap_limits: self.swap_limits,
            tokens: self.tokens,
            prices_usd: self.prices_usd,
            native_prices: self.native_prices,
            graph,
        })
    }
}
