//! Combinatorial route assembly
//!
//! Quotes the best paths for every cumulative percentage of the input on
//! the untouched market, then combines pool-disjoint paths whose
//! percentages add up to exactly 100. Disjoint paths do not affect each
//! other, so an assembly's value is the sum of its independent quotes.

use std::collections::HashSet;

use num_bigint::BigUint;
use router_core::{FinderConfig, PoolId, Result, UniswapConfig};

use super::{find_single_path_route, into_routes, RouteFinder};
use crate::cmp::{compare_amounts, compare_pool_sequences, compare_routes};
use crate::finder_data::{FinderData, FinderInput};
use crate::gen_path::{gen_kth_best_paths, GenConfig};
use crate::path::Path;
use crate::route::Route;
use crate::token_amount::TokenAmount;

#[derive(Debug, Clone)]
pub struct UniswapFinder {
    config: FinderConfig,
    uniswap: UniswapConfig,
}

/// A quoted path for `units` percentage steps of the input
#[derive(Debug)]
struct LevelPath {
    units: u32,
    path: Path,
}

#[derive(Debug, Clone)]
struct Assembly {
    picks: Vec<usize>,
    units: u32,
    pools: HashSet<PoolId>,
    amount_out: BigUint,
    gas: i64,
    value: TokenAmount,
}

impl UniswapFinder {
    pub fn new(config: FinderConfig, uniswap: UniswapConfig) -> Self {
        Self { config, uniswap }
    }

    fn level_paths(&self, input: &FinderInput, data: &FinderData, levels: u32) -> Result<Vec<LevelPath>> {
        let gen = GenConfig {
            max_hops: self.config.max_hops,
            max_paths_to_generate: self.config.max_paths_to_generate,
            max_paths_to_return: self.config.max_paths_to_return,
            count_gas: true,
        };
        let mut entries = Vec::new();
        for units in (1..=levels).rev() {
            input.budget.check()?;
            let amount = &input.amount_in * (units * self.config.distribution_percent) / 100u32;
            let paths = gen_kth_best_paths(input, data, &amount, &gen)?;
            entries.extend(
                paths
                    .into_iter()
                    .take(self.uniswap.paths_per_level)
                    .map(|path| LevelPath { units, path }),
            );
        }
        Ok(entries)
    }

    fn extend(
        &self,
        input: &FinderInput,
        data: &FinderData,
        assembly: &Assembly,
        index: usize,
        entry: &LevelPath,
    ) -> Assembly {
        let mut next = assembly.clone();
        next.picks.push(index);
        next.units += entry.units;
        next.pools.extend(entry.path.pools.iter().cloned());
        next.amount_out += &entry.path.output.amount;
        next.gas += entry.path.total_gas;
        next.value = data.token_amount(input, &input.token_out, next.amount_out.clone(), Some(next.gas));
        next
    }

    /// Complete assemblies, best first.
    fn assemble(
        &self,
        input: &FinderInput,
        data: &FinderData,
        entries: &[LevelPath],
        levels: u32,
    ) -> Result<Vec<Assembly>> {
        let rank = |a: &Assembly, b: &Assembly| {
            compare_amounts(&b.value, &a.value, input.gas_include).then_with(|| {
                compare_pool_sequences(
                    b.picks.iter().flat_map(|&i| entries[i].path.pools.iter()),
                    a.picks.iter().flat_map(|&i| entries[i].path.pools.iter()),
                )
            })
        };

        let mut beam = vec![Assembly {
            picks: Vec::new(),
            units: 0,
            pools: HashSet::new(),
            amount_out: BigUint::default(),
            gas: 0,
            value: TokenAmount::zero(input.token_out.clone()),
        }];
        let mut complete = Vec::new();

        for _ in 0..self.config.max_paths_in_route {
            input.budget.check()?;
            let mut next = Vec::new();
            for assembly in &beam {
                // entries are ordered by non-increasing units, so only
                // later entries keep the assembly order canonical
                let start = assembly.picks.last().map_or(0, |&i| i + 1);
                for (index, entry) in entries.iter().enumerate().skip(start) {
                    if assembly.units + entry.units > levels {
                        continue;
                    }
                    if entry.path.pools.iter().any(|p| assembly.pools.contains(p)) {
                        continue;
                    }
                    let extended = self.extend(input, data, assembly, index, entry);
                    if extended.units == levels {
                        complete.push(extended);
                    } else {
                        next.push(extended);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            next.sort_by(&rank);
            next.truncate(self.uniswap.beam_width);
            beam = next;
        }

        complete.sort_by(&rank);
        Ok(complete)
    }

    fn materialize(
        &self,
        input: &FinderInput,
        data: &mut FinderData,
        entries: &[LevelPath],
        assembly: &Assembly,
    ) -> Result<Option<Route>> {
        let mut allocations: Vec<_> = assembly
            .picks
            .iter()
            .map(|&i| {
                let entry = &entries[i];
                let amount = &input.amount_in * (entry.units * self.config.distribution_percent) / 100u32;
                (entry.path.pools.clone(), entry.path.tokens.clone(), amount)
            })
            .collect();
        let assigned: BigUint = allocations.iter().map(|a| &a.2).sum();
        if let Some(first) = allocations.first_mut() {
            first.2 += &input.amount_in - assigned;
        }

        data.refresh();
        match Route::from_allocations(input, data, allocations) {
            Ok(route) => Ok(Some(route)),
            Err(err) if !err.is_fatal() => {
                tracing::debug!(error = %err, "assembly rejected");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl RouteFinder for UniswapFinder {
    fn name(&self) -> &'static str {
        "uniswap"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        let percent = self.config.distribution_percent;
        if input.save_gas || percent == 0 || percent >= 100 {
            return Ok(into_routes(find_single_path_route(input, data, &self.config)?));
        }
        let levels = 100 / percent;

        data.refresh();
        let entries = self.level_paths(input, data, levels)?;
        let assemblies = self.assemble(input, data, &entries, levels)?;

        let mut routes = Vec::new();
        let mut seen: HashSet<Vec<(Vec<PoolId>, u32)>> = HashSet::new();
        for assembly in &assemblies {
            if routes.len() >= self.uniswap.max_routes {
                break;
            }
            let key: Vec<_> = assembly
                .picks
                .iter()
                .map(|&i| (entries[i].path.pools.clone(), entries[i].units))
                .collect();
            if !seen.insert(key) {
                continue;
            }
            if let Some(route) = self.materialize(input, data, &entries, assembly)? {
                routes.push(route);
            }
        }

        routes.sort_by(|a, b| compare_routes(b, a, input.gas_include));
        tracing::info!(
            levels,
            paths = entries.len(),
            assemblies = assemblies.len(),
            routes = routes.len(),
            "uniswap-style assembly finished"
        );
        Ok(routes)
    }
}
