//! Shared fixtures for unit tests

use std::sync::Arc;

use amm::ConstantProductPool;
use router_core::{FinderConfig, PoolId, Token, TokenId};

use crate::market::{MarketSnapshot, MarketSnapshotBuilder};

pub fn ids(pools: &[&str]) -> Vec<PoolId> {
    pools.iter().map(|p| PoolId::new(*p)).collect()
}

pub fn toks(tokens: &[&str]) -> Vec<TokenId> {
    tokens.iter().map(|t| TokenId::new(*t)).collect()
}

pub fn make_pool(id: &str, x: &str, rx: u64, y: &str, ry: u64) -> ConstantProductPool {
    ConstantProductPool::new(id, x, rx, y, ry)
}

/// Tokens a..g, zero decimals, all priced at $1
pub fn scenario_tokens() -> MarketSnapshotBuilder {
    let mut builder = MarketSnapshot::builder();
    for t in ["a", "b", "c", "d", "e", "f", "g"] {
        builder = builder.token(Token::new(t, 0)).price(t, 1.0);
    }
    builder
}

pub fn scenario_pools(builder: MarketSnapshotBuilder) -> MarketSnapshotBuilder {
    builder
        .pool(make_pool("pool-ab-1", "a", 10, "b", 10))
        .pool(make_pool("pool-ab-2", "a", 20, "b", 20))
        .pool(make_pool("pool-ac-1", "a", 10, "c", 10))
        .pool(make_pool("pool-bc-1", "b", 10, "c", 10))
        .pool(make_pool("pool-ad-1", "a", 10, "d", 10))
        .pool(make_pool("pool-cd-1", "c", 15, "d", 15))
        .pool(make_pool("pool-de-1", "d", 10, "e", 10))
        .pool(make_pool("pool-ef-1", "e", 10, "f", 10))
        .pool(make_pool("pool-fg", "f", 10, "g", 10))
}

pub fn scenario_snapshot() -> Arc<MarketSnapshot> {
    scenario_pools(scenario_tokens()).build()
}

pub fn scenario_config() -> FinderConfig {
    FinderConfig {
        max_hops: 3,
        distribution_percent: 5,
        max_paths_in_route: 20,
        max_paths_to_generate: 5,
        max_paths_to_return: 5,
        min_part_usd: 500.0,
        ..FinderConfig::default()
    }
}
