//! Copy-on-write pool state for one request
//!
//! Reads fall through to the shared snapshot until a pool is first written,
//! at which point it is cloned into the bucket. Every write advances a
//! generation counter and stamps the written pool (and its pool type, which
//! shares swap limits), so callers can tell whether a quote taken at some
//! generation may have changed since.

use std::collections::HashMap;
use std::sync::Arc;

use router_core::{FinderError, PoolId, PoolSimulator, Result, SwapInfo, SwapLimit};

use crate::market::MarketSnapshot;

#[derive(Debug)]
pub struct PoolBucket {
    baseline: Arc<MarketSnapshot>,
    changed: HashMap<PoolId, Box<dyn PoolSimulator>>,
    changed_limits: HashMap<String, SwapLimit>,
    generation: u64,
    touched: HashMap<PoolId, u64>,
    touched_types: HashMap<String, u64>,
}

impl PoolBucket {
    pub fn new(baseline: Arc<MarketSnapshot>) -> Self {
        Self {
            baseline,
            changed: HashMap::new(),
            changed_limits: HashMap::new(),
            generation: 0,
            touched: HashMap::new(),
            touched_types: HashMap::new(),
        }
    }

    pub fn baseline(&self) -> &Arc<MarketSnapshot> {
        &self.baseline
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get_pool(&self, id: &PoolId) -> Result<&dyn PoolSimulator> {
        if let Some(pool) = self.changed.get(id) {
            return Ok(pool.as_ref());
        }
        self.baseline
            .pool(id)
            .map(|p| p.as_ref())
            .ok_or_else(|| FinderError::NoPoolForAddress {
                pool: id.to_string(),
            })
    }

    pub fn swap_limit(&self, pool_type: &str) -> Option<&SwapLimit> {
        self.changed_limits
            .get(pool_type)
            .or_else(|| self.baseline.swap_limit(pool_type))
    }

    /// Mutable access to a pool, cloning it from the baseline on first use.
    pub fn clone_pool(&mut self, id: &PoolId) -> Result<&mut dyn PoolSimulator> {
        if !self.changed.contains_key(id) {
            let pool = self
                .baseline
                .pool(id)
                .ok_or_else(|| FinderError::NoPoolForAddress {
                    pool: id.to_string(),
                })?
                .clone_box();
            self.changed.insert(id.clone(), pool);
        }
        match self.changed.get_mut(id) {
            Some(pool) => Ok(pool.as_mut()),
            None => Err(FinderError::NoPoolForAddress {
                pool: id.to_string(),
            }),
        }
    }

    /// Replay a swap against the pool it was quoted on.
    pub fn apply_swap(&mut self, swap: &SwapInfo) -> Result<()> {
        let pool_type = self.get_pool(&swap.pool)?.pool_type().to_string();
        if !self.changed_limits.contains_key(&pool_type) {
            if let Some(limit) = self.baseline.swap_limit(&pool_type) {
                self.changed_limits.insert(pool_type.clone(), limit.clone());
            }
        }

        self.clone_pool(&swap.pool)?;
        let limit = self.changed_limits.get_mut(&pool_type);
        if let Some(pool) = self.changed.get_mut(&swap.pool) {
            pool.apply_state_change(swap, limit);
        }

        self.generation += 1;
        self.touched.insert(swap.pool.clone(), self.generation);
        self.touched_types.insert(pool_type, self.generation);
        Ok(())
    }

    /// Discard every clone and return to the baseline state.
    pub fn clear_changed_pools(&mut self) {
        if self.changed.is_empty() && self.changed_limits.is_empty() {
            return;
        }
        self.changed.clear();
        self.changed_limits.clear();
        self.generation += 1;
        let generation = self.generation;
        for stamp in self.touched.values_mut() {
            *stamp = generation;
        }
        for stamp in self.touched_types.values_mut() {
            *stamp = generation;
        }
    }

    /// Generation at which a pool was last written (0 if never).
    pub fn touched_at(&self, id: &PoolId) -> u64 {
        self.touched.get(id).copied().unwrap_or(0)
    }

    /// Whether a quote through `pools` taken at `computed_at` may be outdated.
    pub fn is_stale(&self, pools: &[PoolId], computed_at: u64) -> bool {
        pools.iter().any(|id| {
            if self.touched_at(id) > computed_at {
                return true;
            }
            let Ok(pool) = self.get_pool(id) else {
                return true;
            };
            self.touched_types
                .get(pool.pool_type())
                .is_some_and(|stamp| *stamp > computed_at && self.swap_limit(pool.pool_type()).is_some())
        })
    }

    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    /// An independent copy sharing the same baseline.
    pub fn fork(&self) -> Self {
        Self {
            baseline: Arc::clone(&self.baseline),
            changed: self
                .changed
                .iter()
                .map(|(id, pool)| (id.clone(), pool.clone_box()))
                .collect(),
            changed_limits: self.changed_limits.clone(),
            generation: self.generation,
            touched: self.touched.clone(),
            touched_types: self.touched_types.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scenario_snapshot;
    use num_bigint::BigUint;
    use router_core::TokenId;

    fn quote_ab2(bucket: &PoolBucket, amount: u32) -> router_core::Quote {
        bucket
            .get_pool(&PoolId::new("pool-ab-2"))
            .unwrap()
            .quote(&TokenId::new("a"), &BigUint::from(amount), &TokenId::new("b"), None)
            .unwrap()
    }

    #[test]
    fn test_apply_swap_does_not_touch_baseline() {
        let snapshot = scenario_snapshot();
        let mut bucket = PoolBucket::new(snapshot.clone());
        let q = quote_ab2(&bucket, 500);
        bucket.apply_swap(&q.swap_info).unwrap();

        assert_eq!(bucket.changed_count(), 1);
        assert!(bucket.generation() > 0);
        assert!(bucket
            .get_pool(&PoolId::new("pool-ab-2"))
            .unwrap()
            .quote(&TokenId::new("a"), &BigUint::from(500u32), &TokenId::new("b"), None)
            .is_err());

        let fresh = PoolBucket::new(snapshot);
        assert_eq!(quote_ab2(&fresh, 500).amount_out, BigUint::from(19u32));
    }

    #[test]
    fn test_clear_changed_pools_restores_baseline_and_marks_stale() {
        let mut bucket = PoolBucket::new(scenario_snapshot());
        let pools = vec![PoolId::new("pool-ab-2")];
        let q = quote_ab2(&bucket, 500);
        bucket.apply_swap(&q.swap_info).unwrap();
        let after_swap = bucket.generation();
        assert!(!bucket.is_stale(&pools, after_swap));

        bucket.clear_changed_pools();
        assert_eq!(bucket.changed_count(), 0);
        assert!(bucket.is_stale(&pools, after_swap));
        assert_eq!(quote_ab2(&bucket, 500).amount_out, BigUint::from(19u32));
    }

    #[test]
    fn test_untouched_pools_are_not_stale() {
        let mut bucket = PoolBucket::new(scenario_snapshot());
        let q = quote_ab2(&bucket, 500);
        bucket.apply_swap(&q.swap_info).unwrap();
        assert!(!bucket.is_stale(&[PoolId::new("pool-ab-1")], 0));
        assert!(bucket.is_stale(&[PoolId::new("pool-ab-2")], 0));
    }

    #[test]
    fn test_missing_pool_is_reported() {
        let mut bucket = PoolBucket::new(scenario_snapshot());
        let err = bucket.clone_pool(&PoolId::new("nope")).unwrap_err();
        assert_eq!(
            err,
            FinderError::NoPoolForAddress {
                pool: "nope".into()
            }
        );
    }

    #[test]
    fn test_fork_is_independent() {
        let mut bucket = PoolBucket::new(scenario_snapshot());
        let mut child = bucket.fork();
        let q = quote_ab2(&child, 500);
        child.apply_swap(&q.swap_info).unwrap();
        assert_eq!(child.changed_count(), 1);
        assert_eq!(bucket.changed_count(), 0);

        let q = quote_ab2(&bucket, 100);
        bucket.apply_swap(&q.swap_info).unwrap();
        assert_eq!(child.changed_count(), 1);
    }
}
