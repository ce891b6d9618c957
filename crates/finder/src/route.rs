//! Routes: sets of paths sharing the input amount

use num_bigint::BigUint;
use router_core::{FinderError, PoolId, Result, TokenId};

use crate::cmp::compare_paths;
use crate::finder_data::{FinderData, FinderInput};
use crate::path::{quote_sequence, Path};
use crate::token_amount::TokenAmount;

/// Paths from the same input token to the same output token.
///
/// `input.amount` is the sum of the path inputs and `output.amount` the sum
/// of the path outputs. Routes are built through [`Route::add_path`], which
/// applies every swap to the request's pool bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub paths: Vec<Path>,
    pub total_gas: i64,
}

impl Route {
    /// The empty route
    pub fn new(input: &FinderInput) -> Self {
        Self {
            input: TokenAmount::zero(input.token_in.clone()),
            output: TokenAmount::zero(input.token_out.clone()),
            paths: Vec::new(),
            total_gas: 0,
        }
    }

    /// Build a route from `(pools, tokens, amount_in)` allocations.
    pub fn from_allocations<I>(input: &FinderInput, data: &mut FinderData, allocations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<PoolId>, Vec<TokenId>, BigUint)>,
    {
        let mut route = Self::new(input);
        for (pools, tokens, amount) in allocations {
            let path = Path::from_parts(
                data.token_amount(input, &input.token_in, amount, None),
                TokenAmount::zero(input.token_out.clone()),
                pools,
                tokens,
                0,
            );
            route.add_path(input, data, path)?;
        }
        Ok(route)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Add `path.input.amount` through `path`'s pool sequence.
    ///
    /// The path is re-quoted against the bucket, so the stored output
    /// reflects trades already made by earlier paths, and its swaps are
    /// applied before returning. Nothing is applied when quoting fails. A
    /// path whose pool sequence is already in the route is merged into it.
    pub fn add_path(&mut self, input: &FinderInput, data: &mut FinderData, path: Path) -> Result<()> {
        if path.tokens.first() != Some(&self.input.token) || path.tokens.last() != Some(&self.output.token) {
            return Err(FinderError::InvalidSwap {
                pool: path.pools.first().map(|p| p.to_string()).unwrap_or_default(),
                reason: "path does not connect the route's tokens".into(),
            });
        }

        let amount_in = path.input.amount.clone();
        let quoted = quote_sequence(&data.bucket, &path.pools, &path.tokens, &amount_in)?;
        for swap in &quoted.swaps {
            data.bucket.apply_swap(swap)?;
        }

        let token_in = self.input.token.clone();
        let token_out = self.output.token.clone();

        match self.paths.iter_mut().find(|p| p.pools == path.pools) {
            Some(existing) => {
                let merged_in = &existing.input.amount + &amount_in;
                let merged_out = &existing.output.amount + &quoted.amount_out;
                existing.input = data.token_amount(input, &token_in, merged_in, None);
                existing.output = data.token_amount(input, &token_out, merged_out, Some(existing.total_gas));
            }
            None => {
                self.total_gas += quoted.gas;
                self.paths.push(Path::from_parts(
                    data.token_amount(input, &token_in, amount_in.clone(), None),
                    data.token_amount(input, &token_out, quoted.amount_out.clone(), Some(quoted.gas)),
                    path.pools,
                    path.tokens,
                    quoted.gas,
                ));
            }
        }

        let total_in = &self.input.amount + &amount_in;
        let total_out = &self.output.amount + &quoted.amount_out;
        self.input = data.token_amount(input, &token_in, total_in, None);
        self.output = data.token_amount(input, &token_out, total_out, Some(self.total_gas));
        Ok(())
    }

    /// Best extension of an already added path with `amount` more input.
    ///
    /// Gas is not counted: the path is already paid for.
    pub fn best_path_among_added_paths(
        &self,
        input: &FinderInput,
        data: &FinderData,
        amount: &BigUint,
    ) -> Option<Path> {
        let mut best: Option<Path> = None;
        for existing in &self.paths {
            let candidate = match existing.with_amount(input, data, amount.clone(), false) {
                Ok(path) => path,
                Err(err) => {
                    tracing::debug!(error = %err, "added path cannot take more input");
                    continue;
                }
            };
            let better = best
                .as_ref()
                .map_or(true, |b| compare_paths(&candidate, b, input.gas_include).is_gt());
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    pub fn contains_pools(&self, pools: &[PoolId]) -> bool {
        self.paths.iter().any(|p| p.pools == pools)
    }

    pub fn uses_pool(&self, id: &PoolId) -> bool {
        self.paths.iter().any(|p| p.contains_pool(id))
    }

    /// All pool ids, path by path.
    pub fn pool_sequence(&self) -> impl Iterator<Item = &PoolId> + '_ {
        self.paths.iter().flat_map(|p| p.pools.iter())
    }

    /// `(pools, tokens, amount_in)` of every path.
    pub fn allocations(&self) -> Vec<(Vec<PoolId>, Vec<TokenId>, BigUint)> {
        self.paths
            .iter()
            .map(|p| (p.pools.clone(), p.tokens.clone(), p.input.amount.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, make_pool, scenario_snapshot, scenario_tokens, toks};
    use num_traits::ToPrimitive;

    fn deep_snapshot() -> std::sync::Arc<crate::MarketSnapshot> {
        scenario_tokens()
            .pool(make_pool("pool-deep", "a", 100_000, "b", 100_000))
            .build()
    }

    fn single(input: &FinderInput, data: &FinderData, pool: &str, amount: u32) -> Path {
        Path::new(input, data, ids(&[pool]), toks(&["a", "b"]), BigUint::from(amount), true).unwrap()
    }

    #[test]
    fn test_add_path_applies_swaps_and_accumulates() {
        let mut data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "b", 1000u32);
        let mut route = Route::new(&input);

        let first = single(&input, &data, "pool-ab-2", 500);
        route.add_path(&input, &mut data, first).unwrap();
        let second = single(&input, &data, "pool-ab-1", 500);
        route.add_path(&input, &mut data, second).unwrap();

        assert_eq!(route.paths.len(), 2);
        assert_eq!(route.input.amount, BigUint::from(1000u32));
        assert_eq!(route.output.amount, BigUint::from(28u32));
        assert_eq!(route.total_gas, 120_000);
        let summed: BigUint = route.paths.iter().map(|p| &p.input.amount).sum();
        assert_eq!(summed, route.input.amount);

        // pool-ab-2 was drained by the first path
        assert!(single_quote_fails(&input, &data, "pool-ab-2", 500));
    }

    fn single_quote_fails(input: &FinderInput, data: &FinderData, pool: &str, amount: u32) -> bool {
        Path::new(input, data, ids(&[pool]), toks(&["a", "b"]), BigUint::from(amount), true).is_err()
    }

    #[test]
    fn test_same_pool_sequence_is_merged() {
        let mut data = FinderData::new(deep_snapshot());
        let input = FinderInput::new("a", "b", 400u32);
        let mut route = Route::new(&input);
        let p = single(&input, &data, "pool-deep", 200);
        route.add_path(&input, &mut data, p.clone()).unwrap();
        route.add_path(&input, &mut data, p).unwrap();

        assert_eq!(route.paths.len(), 1);
        assert_eq!(route.paths[0].input.amount, BigUint::from(400u32));
        assert_eq!(route.total_gas, 60_000);
        assert_eq!(route.output.amount, route.paths[0].output.amount);
    }

    #[test]
    fn test_add_path_rejects_wrong_tokens() {
        let mut data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "c", 500u32);
        let mut route = Route::new(&input);
        let wrong = single(&input, &data, "pool-ab-1", 500);
        assert!(route.add_path(&input, &mut data, wrong).is_err());
        assert!(route.is_empty());
        assert_eq!(data.bucket.changed_count(), 0);
    }

    #[test]
    fn test_best_path_among_added_paths_ignores_gas() {
        let mut data = FinderData::new(deep_snapshot());
        let input = FinderInput::new("a", "b", 1000u32).with_gas(10_000_000_000_000u64, 1.0);
        let mut route = Route::new(&input);
        let p = single(&input, &data, "pool-deep", 100);
        route.add_path(&input, &mut data, p).unwrap();

        let ext = route
            .best_path_among_added_paths(&input, &data, &BigUint::from(500u32))
            .unwrap();
        assert_eq!(ext.pools, ids(&["pool-deep"]));
        assert_eq!(ext.input.amount, BigUint::from(500u32));
        assert_eq!(ext.output.amount_usd, ext.output.amount.to_f64().unwrap());
        assert!(route.paths[0].output.amount_usd < route.paths[0].output.amount.to_f64().unwrap());
    }

    #[test]
    fn test_from_allocations_conserves_input() {
        let mut data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "d", 1000u32);
        let route = Route::from_allocations(
            &input,
            &mut data,
            vec![
                (ids(&["pool-ad-1"]), toks(&["a", "d"]), BigUint::from(500u32)),
                (ids(&["pool-ac-1", "pool-cd-1"]), toks(&["a", "c", "d"]), BigUint::from(500u32)),
            ],
        )
        .unwrap();
        assert_eq!(route.input.amount, BigUint::from(1000u32));
        assert_eq!(route.output.amount, BigUint::from(14u32));
        assert_eq!(route.pool_sequence().count(), 3);
        assert!(route.uses_pool(&PoolId::new("pool-cd-1")));
        assert!(route.contains_pools(&ids(&["pool-ad-1"])));
    }
}
