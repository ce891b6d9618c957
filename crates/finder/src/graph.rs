//! Token/pool adjacency

use std::collections::HashMap;
use std::sync::Arc;

use router_core::{PoolId, PoolSimulator, TokenId};

/// Adjacency list: token -> pools that trade it, sorted by pool id.
#[derive(Debug, Clone, Default)]
pub struct PoolGraph {
    adjacency: HashMap<TokenId, Vec<PoolId>>,
    /// token -> pools that can output it
    reverse: HashMap<TokenId, Vec<PoolId>>,
    pool_count: usize,
}

impl PoolGraph {
    /// Build the graph from a pool map.
    ///
    /// A pool is attached to every token it can swap out of.
    pub fn build(pools: &HashMap<PoolId, Arc<dyn PoolSimulator>>) -> Self {
        let mut adjacency: HashMap<TokenId, Vec<PoolId>> = HashMap::new();
        let mut reverse: HashMap<TokenId, Vec<PoolId>> = HashMap::new();
        let mut pool_count = 0;

        for (id, pool) in pools {
            let mut attached = false;
            for token in pool.tokens() {
                let targets = pool.can_swap_to(token);
                if targets.is_empty() {
                    continue;
                }
                adjacency.entry(token.clone()).or_default().push(id.clone());
                for target in targets {
                    reverse.entry(target).or_default().push(id.clone());
                }
                attached = true;
            }
            if attached {
                pool_count += 1;
            }
        }

        for ids in adjacency.values_mut().chain(reverse.values_mut()) {
            ids.sort();
            ids.dedup();
        }

        Self {
            adjacency,
            reverse,
            pool_count,
        }
    }

    /// Pools that can output `token`.
    pub fn pools_into(&self, token: &TokenId) -> &[PoolId] {
        self.reverse.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pools_for(&self, token: &TokenId) -> &[PoolId] {
        self.adjacency.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    pub fn token_count(&self) -> usize {
        self.adjacency.len()
    }
}
