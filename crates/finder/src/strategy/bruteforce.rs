//! Bounded exhaustive split search
//!
//! Tries every ordered composition of the `distribution_percent` units into
//! at most `max_parts` portions and runs the greedy placement for each.

use num_bigint::BigUint;
use router_core::{BruteforceConfig, FinderConfig, Result};

use super::{find_single_path_route, greedy_route, into_routes, RouteFinder};
use crate::cmp::better_route;
use crate::finder_data::{FinderData, FinderInput};
use crate::route::Route;

/// Ordered compositions of `total` into at most `max_parts` positive parts.
///
/// Yields `[total]` first, then every two-part composition in
/// lexicographic order, then three parts, and so on.
#[derive(Debug, Clone)]
pub struct Compositions {
    total: u32,
    max_parts: usize,
    current: Option<Vec<u32>>,
}

impl Compositions {
    pub fn new(total: u32, max_parts: usize) -> Self {
        let current = (total > 0 && max_parts > 0).then(|| vec![total]);
        Self {
            total,
            max_parts,
            current,
        }
    }

    /// Start over from `[total]`.
    pub fn restart(&mut self) {
        *self = Self::new(self.total, self.max_parts);
    }

    fn successor(&self, parts: &[u32]) -> Option<Vec<u32>> {
        let k = parts.len();

        // Same part count: bump the rightmost part that still leaves one
        // unit for each following part.
        let mut prefix: u32 = parts.iter().sum::<u32>() - parts[k - 1];
        for i in (0..k.saturating_sub(1)).rev() {
            prefix -= parts[i];
            let head = prefix + parts[i] + 1;
            let tail_parts = (k - 1 - i) as u32;
            if head + tail_parts <= self.total {
                let mut next = parts[..i].to_vec();
                next.push(parts[i] + 1);
                next.extend(std::iter::repeat(1).take(k - 2 - i));
                next.push(self.total - head - (tail_parts - 1));
                return Some(next);
            }
        }

        // One more part
        let k = k + 1;
        if k > self.max_parts || (k as u32) > self.total {
            return None;
        }
        let mut next = vec![1; k - 1];
        next.push(self.total - (k as u32 - 1));
        Some(next)
    }
}

impl Iterator for Compositions {
    type Item = Vec<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = self.successor(&current);
        Some(current)
    }
}

/// Amounts for a composition of units; the remainder goes to the last one.
pub fn composition_amounts(amount: &BigUint, parts: &[u32], distribution_percent: u32) -> Vec<BigUint> {
    let mut amounts: Vec<BigUint> = parts
        .iter()
        .map(|units| amount * (units * distribution_percent) / 100u32)
        .collect();
    let assigned: BigUint = amounts.iter().sum();
    if let Some(last) = amounts.last_mut() {
        *last += amount - assigned;
    }
    amounts
}

#[derive(Debug, Clone)]
pub struct BruteforceFinder {
    config: FinderConfig,
    bruteforce: BruteforceConfig,
}

impl BruteforceFinder {
    pub fn new(config: FinderConfig, bruteforce: BruteforceConfig) -> Self {
        Self { config, bruteforce }
    }

    fn portions_allowed(&self, input: &FinderInput, data: &FinderData, portions: &[BigUint]) -> bool {
        portions.len() == 1
            || portions.iter().all(|p| {
                data.amount_usd(&input.token_in, p)
                    .is_some_and(|usd| usd >= self.config.min_part_usd)
            })
    }
}

impl RouteFinder for BruteforceFinder {
    fn name(&self) -> &'static str {
        "bruteforce"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        let single = find_single_path_route(input, data, &self.config)?;
        if input.save_gas {
            return Ok(into_routes(single));
        }
        let splittable = data
            .amount_usd(&input.token_in, &input.amount_in)
            .is_some_and(|usd| self.config.allows_split(usd));
        if !splittable || self.config.distribution_percent >= 100 {
            return Ok(into_routes(single));
        }

        let units = 100 / self.config.distribution_percent;
        let cap = self.bruteforce.max_compositions.unwrap_or(usize::MAX);
        let mut best: Option<Route> = None;
        let mut tried = 0usize;

        for parts in Compositions::new(units, self.bruteforce.max_parts).take(cap) {
            input.budget.check()?;
            let portions = composition_amounts(&input.amount_in, &parts, self.config.distribution_percent);
            if !self.portions_allowed(input, data, &portions) {
                continue;
            }
            tried += 1;
            let route = greedy_route(input, data, &self.config, &portions)?;
            best = better_route(best, route, input.gas_include);
        }

        tracing::info!(compositions = tried, "bruteforce search finished");
        Ok(into_routes(better_route(best, single, input.gas_include)))
    }
}
