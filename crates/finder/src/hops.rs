//! Minimum hop counts to the destination token
//!
//! A reverse breadth-first search from the destination gives, for every
//! token, the fewest pools needed to reach it. Path generation uses the
//! table to drop partial paths that cannot finish within the hop limit.
//! The bound is exact in the graph, so pruning never loses a feasible path.

use std::collections::{HashMap, VecDeque};

use router_core::TokenId;

use crate::market::MarketSnapshot;

#[derive(Debug, Clone)]
pub struct HopTable {
    token_out: TokenId,
    max_hops: usize,
    hops: HashMap<TokenId, usize>,
}

impl HopTable {
    /// Search at most `max_hops` levels back from `token_out`.
    ///
    /// Tokens without metadata are never traversed.
    pub fn build(snapshot: &MarketSnapshot, token_out: &TokenId, max_hops: usize) -> Self {
        let graph = snapshot.graph();
        let mut hops = HashMap::new();
        let mut queue = VecDeque::new();

        hops.insert(token_out.clone(), 0);
        queue.push_back(token_out.clone());

        while let Some(token) = queue.pop_front() {
            let dist = hops[&token];
            if dist >= max_hops {
                continue;
            }
            for pool_id in graph.pools_into(&token) {
                let Some(pool) = snapshot.pool(pool_id) else {
                    continue;
                };
                for source in pool.tokens() {
                    if hops.contains_key(source) || snapshot.token(source).is_none() {
                        continue;
                    }
                    if !pool.can_swap_to(source).contains(&token) {
                        continue;
                    }
                    hops.insert(source.clone(), dist + 1);
                    queue.push_back(source.clone());
                }
            }
        }

        tracing::trace!(token_out = %token_out, reachable = hops.len(), "built hop table");
        Self {
            token_out: token_out.clone(),
            max_hops,
            hops,
        }
    }

    pub fn token_out(&self) -> &TokenId {
        &self.token_out
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Fewest hops from `token` to the destination, if within the limit.
    pub fn min_hops(&self, token: &TokenId) -> Option<usize> {
        self.hops.get(token).copied()
    }

    /// Whether stepping into `next` after `hops_taken` pools can still finish
    /// within `max_hops`.
    pub fn can_finish(&self, next: &TokenId, hops_taken: usize, max_hops: usize) -> bool {
        self.min_hops(next)
            .is_some_and(|remaining| hops_taken + 1 + remaining <= max_hops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scenario_snapshot;

    #[test]
    fn test_min_hops_from_destination() {
        let snapshot = scenario_snapshot();
        let table = HopTable::build(&snapshot, &"d".into(), 3);
        assert_eq!(table.min_hops(&"d".into()), Some(0));
        assert_eq!(table.min_hops(&"a".into()), Some(1));
        assert_eq!(table.min_hops(&"c".into()), Some(1));
        assert_eq!(table.min_hops(&"b".into()), Some(2));
        assert_eq!(table.min_hops(&"f".into()), Some(2));
        assert_eq!(table.min_hops(&"g".into()), Some(3));
    }

    #[test]
    fn test_search_stops_at_max_hops() {
        let snapshot = scenario_snapshot();
        let table = HopTable::build(&snapshot, &"g".into(), 3);
        assert_eq!(table.min_hops(&"f".into()), Some(1));
        assert_eq!(table.min_hops(&"e".into()), Some(2));
        assert_eq!(table.min_hops(&"d".into()), Some(3));
        assert_eq!(table.min_hops(&"a".into()), None);
    }

    #[test]
    fn test_can_finish() {
        let snapshot = scenario_snapshot();
        let table = HopTable::build(&snapshot, &"d".into(), 3);
        assert!(table.can_finish(&"b".into(), 0, 3));
        assert!(!table.can_finish(&"b".into(), 1, 3));
        assert!(table.can_finish(&"d".into(), 2, 3));
        assert!(!table.can_finish(&"zzz".into(), 0, 3));
    }
}
