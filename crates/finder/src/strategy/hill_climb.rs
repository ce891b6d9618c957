//! Hill-climbing refinement of a multi-path route
//!
//! Moves input between neighbouring paths in `hill_climb.distribution_percent`
//! steps, searching each pair for the shift that maximizes their combined
//! output. The search assumes the pair's output is unimodal in the shift,
//! which does not hold for every pool, so the refined route is only kept
//! when it beats the one it started from.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use router_core::{FinderConfig, HillClimbConfig, PoolId, Result, TokenId};

use super::{into_routes, RouteFinder};
use crate::cmp::compare_routes;
use crate::finder_data::{FinderData, FinderInput};
use crate::path::quote_sequence;
use crate::route::Route;

type Allocation = (Vec<PoolId>, Vec<TokenId>, BigUint);

#[derive(Debug)]
pub struct HillClimbFinder {
    config: FinderConfig,
    hill_climb: HillClimbConfig,
    base: Box<dyn RouteFinder>,
}

impl HillClimbFinder {
    pub fn new(config: FinderConfig, hill_climb: HillClimbConfig, base: Box<dyn RouteFinder>) -> Self {
        Self {
            config,
            hill_climb,
            base,
        }
    }

    /// Largest number of steps `donor` can give while keeping its minimum.
    fn max_shift(&self, input: &FinderInput, data: &FinderData, donor: &BigUint, step: &BigUint) -> usize {
        let priced = data.snapshot().price_usd(&input.token_in).is_some();
        let keeps_minimum = |left: &BigUint| {
            if priced {
                data.amount_usd(&input.token_in, left)
                    .is_some_and(|usd| usd >= self.hill_climb.min_part_usd)
            } else {
                left >= step
            }
        };

        let steps_limit = (100 / self.hill_climb.distribution_percent.max(1)) as usize;
        let mut k = (donor / step).to_usize().unwrap_or(steps_limit).min(steps_limit);
        while k > 0 && !keeps_minimum(&(donor - step * BigUint::from(k))) {
            k -= 1;
        }
        k
    }

    /// Combined output of `a` and `b` when `k` steps move from `b` to `a`.
    fn pair_output(
        working: &FinderData,
        a: &Allocation,
        b: &Allocation,
        step: &BigUint,
        k: usize,
    ) -> Option<BigUint> {
        let shift = step * BigUint::from(k);
        let a_amount = &a.2 + &shift;
        let b_amount = &b.2 - &shift;

        let mut trial = working.fork();
        let quoted_a = quote_sequence(&trial.bucket, &a.0, &a.1, &a_amount).ok()?;
        for swap in &quoted_a.swaps {
            trial.bucket.apply_swap(swap).ok()?;
        }
        let quoted_b = quote_sequence(&trial.bucket, &b.0, &b.1, &b_amount).ok()?;
        Some(quoted_a.amount_out + quoted_b.amount_out)
    }

    /// Refine `route`, returning it unchanged unless a better split is found.
    pub fn refine(&self, input: &FinderInput, data: &mut FinderData, route: &Route) -> Result<Route> {
        let step = &input.amount_in * self.hill_climb.distribution_percent / 100u32;
        if route.paths.len() < 2 || step.is_zero() {
            return Ok(route.clone());
        }

        let mut allocations = route.allocations();
        let mut moved = 0usize;

        for _ in 0..self.hill_climb.iterations {
            data.refresh();
            for i in 0..allocations.len() - 1 {
                input.budget.check()?;

                let kmax = self.max_shift(input, data, &allocations[i + 1].2, &step);
                let mut seen: HashMap<usize, Option<BigUint>> = HashMap::new();
                let mut f = |k: usize| {
                    seen.entry(k)
                        .or_insert_with(|| Self::pair_output(data, &allocations[i], &allocations[i + 1], &step, k))
                        .clone()
                };

                let (mut lo, mut hi) = (0usize, kmax);
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    if f(mid) < f(mid + 1) {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                if lo > 0 && f(lo) > f(0) {
                    let shift = &step * BigUint::from(lo);
                    allocations[i].2 += &shift;
                    allocations[i + 1].2 -= &shift;
                    moved += lo;
                }

                let (pools, tokens, amount) = &allocations[i];
                match quote_sequence(&data.bucket, pools, tokens, amount) {
                    Ok(quoted) => {
                        for swap in &quoted.swaps {
                            data.bucket.apply_swap(swap)?;
                        }
                    }
                    Err(err) => tracing::debug!(error = %err, "path no longer quotes"),
                }
            }
        }

        if moved == 0 {
            return Ok(route.clone());
        }

        data.refresh();
        let refined = match Route::from_allocations(input, data, allocations) {
            Ok(refined) => refined,
            Err(err) if !err.is_fatal() => {
                tracing::debug!(error = %err, "refined route rejected");
                return Ok(route.clone());
            }
            Err(err) => return Err(err),
        };

        if compare_routes(&refined, route, input.gas_include).is_gt() {
            tracing::info!(steps = moved, "hill climbing improved route");
            Ok(refined)
        } else {
            Ok(route.clone())
        }
    }
}

impl RouteFinder for HillClimbFinder {
    fn name(&self) -> &'static str {
        "hill_climb"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        let mut routes = self.base.find(input, data)?;
        if input.save_gas || routes.is_empty() || self.config.max_paths_in_route < 2 {
            return Ok(routes);
        }
        let best = routes.remove(0);
        let refined = self.refine(input, data, &best)?;
        let mut out = into_routes(Some(refined));
        out.extend(routes);
        Ok(out)
    }
}
