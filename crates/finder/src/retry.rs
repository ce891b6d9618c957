//! Dynamic-pool substitution on a finished route
//!
//! Quotes from dynamic pools (market makers and the like) can beat the pool
//! a path was built on. Each hop is re-quoted in route order and swapped to
//! an unused dynamic pool between the same tokens when that pool pays more.

use std::collections::HashSet;

use num_bigint::BigUint;
use router_core::{PoolId, Quote, Result, RetryConfig, TokenId};

use crate::cmp::compare_amounts;
use crate::finder_data::{FinderData, FinderInput};
use crate::route::Route;

fn quote_hop(
    data: &FinderData,
    pool_id: &PoolId,
    token_in: &TokenId,
    amount_in: &BigUint,
    token_out: &TokenId,
) -> Result<Option<Quote>> {
    let pool = data.bucket.get_pool(pool_id)?;
    let limit = data.bucket.swap_limit(pool.pool_type());
    match pool.quote(token_in, amount_in, token_out, limit) {
        Ok(quote) => Ok(Some(quote)),
        Err(err) => {
            tracing::trace!(pool = %pool_id, error = %err, "hop quote failed");
            Ok(None)
        }
    }
}

fn is_dynamic(data: &FinderData, pool_id: &PoolId, config: &RetryConfig) -> Result<bool> {
    let pool = data.bucket.get_pool(pool_id)?;
    Ok(pool.is_dynamic() || config.dynamic_pool_types.iter().any(|t| t == pool.pool_type()))
}

/// Rebuild `route` with better dynamic pools where available.
///
/// Returns `None` when no hop changed. Works on a refreshed bucket and
/// leaves the rebuilt route's swaps applied.
pub fn retry_dynamic_pools(
    input: &FinderInput,
    data: &mut FinderData,
    route: &Route,
    config: &RetryConfig,
) -> Result<Option<Route>> {
    data.refresh();
    let snapshot = data.snapshot().clone();
    let mut used: HashSet<PoolId> = route.pool_sequence().cloned().collect();
    let mut modified = false;
    let mut allocations = Vec::with_capacity(route.paths.len());

    for path in &route.paths {
        input.budget.check()?;
        let mut pools = path.pools.clone();
        let mut amount = path.input.amount.clone();
        let mut gas = 0i64;

        for hop in 0..pools.len() {
            let (from, to) = (&path.tokens[hop], &path.tokens[hop + 1]);
            let mut best: Option<(PoolId, Quote)> =
                quote_hop(data, &pools[hop], from, &amount, to)?.map(|q| (pools[hop].clone(), q));

            for candidate in snapshot.graph().pools_for(from) {
                if used.contains(candidate) || !is_dynamic(data, candidate, config)? {
                    continue;
                }
                if !data.bucket.get_pool(candidate)?.can_swap_to(from).contains(to) {
                    continue;
                }
                let Some(quote) = quote_hop(data, candidate, from, &amount, to)? else {
                    continue;
                };
                let better = match &best {
                    None => true,
                    Some((_, current)) => {
                        let theirs = data.token_amount(input, to, quote.amount_out.clone(), Some(gas + quote.gas));
                        let ours = data.token_amount(input, to, current.amount_out.clone(), Some(gas + current.gas));
                        compare_amounts(&theirs, &ours, input.gas_include).is_gt()
                    }
                };
                if better {
                    best = Some((candidate.clone(), quote));
                }
            }

            let Some((chosen, quote)) = best else {
                tracing::debug!(pool = %pools[hop], "hop cannot be re-quoted");
                return Ok(None);
            };
            if chosen != pools[hop] {
                tracing::debug!(from = %pools[hop], to = %chosen, "substituting dynamic pool");
                used.insert(chosen.clone());
                pools[hop] = chosen;
                modified = true;
            }
            data.bucket.apply_swap(&quote.swap_info)?;
            gas += quote.gas;
            amount = quote.amount_out;
        }

        allocations.push((pools, path.tokens.clone(), path.input.amount.clone()));
    }

    if !modified {
        return Ok(None);
    }

    data.refresh();
    match Route::from_allocations(input, data, allocations) {
        Ok(rebuilt) => Ok(Some(rebuilt)),
        Err(err) if !err.is_fatal() => {
            tracing::debug!(error = %err, "rebuilt route rejected");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, make_pool, scenario_snapshot, scenario_tokens, toks};
    use amm::PmmQuoter;
    use router_core::SwapLimit;

    fn pmm_snapshot() -> std::sync::Arc<crate::MarketSnapshot> {
        scenario_tokens()
            .pool(make_pool("pool-ab-1", "a", 10, "b", 10))
            // 50 a buys 1 b
            .pool(PmmQuoter::new("pmm-ab", "a", "b", 1u32, 50u32))
            .swap_limit(SwapLimit::new("pmm").with_balance("b", 1000u32))
            .build()
    }

    fn route_on(input: &FinderInput, data: &mut FinderData, pool: &str) -> Route {
        Route::from_allocations(input, data, vec![(ids(&[pool]), toks(&["a", "b"]), BigUint::from(500u32))]).unwrap()
    }

    #[test]
    fn test_dynamic_pool_substituted_on_raw_amount() {
        let input = FinderInput::new("a", "b", 500u32)
            .with_gas(100_000_000_000_000u64, 1.0)
            .gas_include(false);
        let mut data = FinderData::new(pmm_snapshot());
        let route = route_on(&input, &mut data, "pool-ab-1");
        assert_eq!(route.output.amount, BigUint::from(9u32));

        let rebuilt = retry_dynamic_pools(&input, &mut data, &route, &RetryConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(rebuilt.paths[0].pools, ids(&["pmm-ab"]));
        assert_eq!(rebuilt.output.amount, BigUint::from(10u32));
        assert_eq!(rebuilt.input.amount, BigUint::from(500u32));
    }

    #[test]
    fn test_expensive_dynamic_pool_kept_out_when_gas_counts() {
        // 1e14 wei per gas at $1: 6 USD for the pool, 11 USD for the quoter
        let input = FinderInput::new("a", "b", 500u32).with_gas(100_000_000_000_000u64, 1.0);
        let mut data = FinderData::new(pmm_snapshot());
        let route = route_on(&input, &mut data, "pool-ab-1");
        assert!(retry_dynamic_pools(&input, &mut data, &route, &RetryConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pool_type_listed_as_dynamic() {
        let input = FinderInput::new("a", "b", 500u32);
        let mut data = FinderData::new(scenario_snapshot());
        let route = route_on(&input, &mut data, "pool-ab-1");

        assert!(retry_dynamic_pools(&input, &mut data, &route, &RetryConfig::default())
            .unwrap()
            .is_none());

        let config = RetryConfig {
            dynamic_pool_types: vec!["uniswap-v2".into()],
            ..RetryConfig::default()
        };
        let rebuilt = retry_dynamic_pools(&input, &mut data, &route, &config).unwrap().unwrap();
        assert_eq!(rebuilt.paths[0].pools, ids(&["pool-ab-2"]));
        assert_eq!(rebuilt.output.amount, BigUint::from(19u32));
    }

    #[test]
    fn test_inventory_limit_blocks_substitution() {
        let snapshot = scenario_tokens()
            .pool(make_pool("pool-ab-1", "a", 10, "b", 10))
            .pool(PmmQuoter::new("pmm-ab", "a", "b", 1u32, 50u32))
            .swap_limit(SwapLimit::new("pmm").with_balance("b", 5u32))
            .build();
        let input = FinderInput::new("a", "b", 500u32).gas_include(false);
        let mut data = FinderData::new(snapshot);
        let route = route_on(&input, &mut data, "pool-ab-1");
        assert!(retry_dynamic_pools(&input, &mut data, &route, &RetryConfig::default())
            .unwrap()
            .is_none());
    }
}
