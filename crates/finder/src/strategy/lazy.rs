//! Lazy incremental multi-path search
//!
//! Candidates are generated once for the smallest portion and kept in a
//! priority queue keyed by their last known output. A key is only trusted
//! while it was quoted for the portion being placed, none of its pools
//! changed since, and its gas treatment still matches route membership.
//! Every other entry is re-quoted before a portion is committed, so the
//! pick matches recomputing every candidate while untouched candidates
//! keep their quotes across equal portions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use num_bigint::BigUint;
use router_core::{FinderConfig, PoolId, Result};

use super::{find_single_path_route, into_routes, split_portions, RouteFinder, MAX_ADD_PATH_RETRIES};
use crate::cmp::{better_route, compare_amounts, compare_paths, compare_pool_sequences};
use crate::finder_data::{FinderData, FinderInput};
use crate::gen_path::{gen_kth_best_paths, GenConfig};
use crate::path::Path;
use crate::route::Route;
use crate::token_amount::TokenAmount;

#[derive(Debug, Clone)]
pub struct LazyFinder {
    config: FinderConfig,
}

impl LazyFinder {
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    fn gen_config(&self, portions: usize) -> GenConfig {
        GenConfig {
            max_hops: self.config.max_hops,
            max_paths_to_generate: portions.min(self.config.max_paths_to_generate),
            max_paths_to_return: self.config.max_paths_to_return,
            count_gas: true,
        }
    }

    /// Best of the first `limit` candidates re-quoted for the whole amount.
    fn single_from_candidates(
        &self,
        input: &FinderInput,
        data: &mut FinderData,
        candidates: &[Path],
        limit: usize,
    ) -> Result<Option<Route>> {
        let mut best: Option<Path> = None;
        for candidate in candidates.iter().take(limit) {
            let path = match candidate.with_amount(input, data, input.amount_in.clone(), true) {
                Ok(path) => path,
                Err(err) if !err.is_fatal() => continue,
                Err(err) => return Err(err),
            };
            if best
                .as_ref()
                .map_or(true, |b| compare_paths(&path, b, input.gas_include).is_gt())
            {
                best = Some(path);
            }
        }

        let Some(path) = best else {
            return Ok(None);
        };
        let mut route = Route::new(input);
        match route.add_path(input, data, path) {
            Ok(()) => Ok(Some(route)),
            Err(err) if !err.is_fatal() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl RouteFinder for LazyFinder {
    fn name(&self) -> &'static str {
        "lazy"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        if input.save_gas {
            return Ok(into_routes(find_single_path_route(input, data, &self.config)?));
        }

        let portions = split_portions(input, data, &self.config);
        if portions.len() == 1 {
            return Ok(into_routes(find_single_path_route(input, data, &self.config)?));
        }

        data.refresh();
        let representative = &portions[portions.len() - 1];
        let candidates = gen_kth_best_paths(input, data, representative, &self.gen_config(portions.len()))?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let single = {
            let mut scratch = data.fork();
            self.single_from_candidates(input, &mut scratch, &candidates, portions.len())?
        };
        let multi = lazy_route(input, data, &self.config, candidates, &portions)?;
        tracing::info!(
            portions = portions.len(),
            multi = multi.as_ref().map(|r| r.paths.len()),
            "lazy search finished"
        );
        Ok(into_routes(better_route(multi, single, input.gas_include)))
    }
}

#[derive(Debug)]
struct Candidate {
    path: Path,
    /// Bucket generation the quote was taken at
    computed_at: u64,
    /// Whether the quote was taken without gas
    priced_in_route: bool,
    in_route: bool,
}

/// Heap entry. A missing key forces a re-quote ahead of everything else.
#[derive(Debug)]
struct QueueEntry {
    key: Option<(TokenAmount, Vec<PoolId>)>,
    index: usize,
    gas_include: bool,
}

impl QueueEntry {
    fn keyed(candidate: &Candidate, index: usize, gas_include: bool) -> Self {
        Self {
            key: Some((candidate.path.output.clone(), candidate.path.pools.clone())),
            index,
            gas_include,
        }
    }

    fn forced(index: usize, gas_include: bool) -> Self {
        Self {
            key: None,
            index,
            gas_include,
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_key = match (&self.key, &other.key) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some((a, pa)), Some((b, pb))) => {
                compare_amounts(a, b, self.gas_include).then_with(|| compare_pool_sequences(pa, pb))
            }
        };
        by_key.then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Candidate {
    fn is_outdated(&self, data: &FinderData, amount: &BigUint) -> bool {
        data.bucket.is_stale(&self.path.pools, self.computed_at)
            || self.path.input.amount != *amount
            || self.priced_in_route != self.in_route
    }

    /// Re-quote for `amount`; `false` when the candidate no longer quotes.
    fn requote(&mut self, input: &FinderInput, data: &FinderData, amount: &BigUint) -> Result<bool> {
        match self.path.with_amount(input, data, amount.clone(), !self.in_route) {
            Ok(path) => {
                self.path = path;
                self.computed_at = data.bucket.generation();
                self.priced_in_route = self.in_route;
                Ok(true)
            }
            Err(err) if !err.is_fatal() => {
                tracing::debug!(error = %err, pools = ?self.path.pools, "candidate dropped");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Re-key every entry whose quote does not hold for `amount` at the
/// current bucket state.
fn rekey_queue(
    queue: BinaryHeap<QueueEntry>,
    candidates: &mut [Candidate],
    input: &FinderInput,
    data: &FinderData,
    amount: &BigUint,
) -> Result<BinaryHeap<QueueEntry>> {
    let mut rekeyed = BinaryHeap::with_capacity(queue.len());
    for entry in queue.into_vec() {
        let candidate = &mut candidates[entry.index];
        if entry.key.is_some() && !candidate.is_outdated(data, amount) {
            rekeyed.push(entry);
            continue;
        }
        if candidate.requote(input, data, amount)? {
            rekeyed.push(QueueEntry::keyed(candidate, entry.index, input.gas_include));
        }
    }
    Ok(rekeyed)
}

/// Place every portion using the lazily re-quoted candidates.
///
/// `data` must be fresh apart from the state the candidates were quoted
/// against. `None` when the queue runs dry or a portion exceeds its
/// rejected-addition allowance.
fn lazy_route(
    input: &FinderInput,
    data: &mut FinderData,
    cfg: &FinderConfig,
    paths: Vec<Path>,
    portions: &[BigUint],
) -> Result<Option<Route>> {
    let generation = data.bucket.generation();
    let mut candidates: Vec<Candidate> = paths
        .into_iter()
        .map(|path| Candidate {
            path,
            computed_at: generation,
            priced_in_route: false,
            in_route: false,
        })
        .collect();

    let mut queue: BinaryHeap<QueueEntry> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| QueueEntry::keyed(c, i, input.gas_include))
        .collect();

    let mut route = Route::new(input);

    for amount in portions {
        input.budget.check()?;
        queue = rekey_queue(queue, &mut candidates, input, data, amount)?;
        let mut rejected = 0usize;

        loop {
            let Some(entry) = queue.pop() else {
                tracing::warn!(portion = %amount, "candidate queue exhausted");
                return Ok(None);
            };
            let index = entry.index;
            let candidate = &mut candidates[index];

            // only a rejected addition can leave entries outdated mid-portion
            if entry.key.is_none() || candidate.is_outdated(data, amount) {
                if candidate.requote(input, data, amount)? {
                    queue.push(QueueEntry::keyed(candidate, index, input.gas_include));
                }
                continue;
            }

            if !candidate.in_route && route.paths.len() >= cfg.max_paths_in_route {
                tracing::debug!(pools = ?candidate.path.pools, "path cap reached, candidate dropped");
                continue;
            }

            match route.add_path(input, data, candidate.path.clone()) {
                Ok(()) => {
                    candidate.in_route = true;
                    queue.push(QueueEntry::forced(index, input.gas_include));
                    break;
                }
                Err(err) if !err.is_fatal() => {
                    rejected += 1;
                    tracing::warn!(error = %err, attempt = rejected, "add path rejected");
                    if rejected >= MAX_ADD_PATH_RETRIES {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(Some(route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, make_pool, scenario_config, scenario_snapshot, scenario_tokens};
    use num_traits::ToPrimitive;
    use proptest::prelude::*;

    fn run(config: FinderConfig, from: &str, to: &str, amount: u32, save_gas: bool) -> Vec<Route> {
        let finder = LazyFinder::new(config);
        let mut data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new(from, to, amount).save_gas(save_gas);
        finder.find(&input, &mut data).unwrap()
    }

    fn shape(route: &Route) -> Vec<(Vec<PoolId>, u64, u64)> {
        route
            .paths
            .iter()
            .map(|p| {
                (
                    p.pools.clone(),
                    p.input.amount.to_u64().unwrap(),
                    p.output.amount.to_u64().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_two_portions_over_parallel_pools() {
        let routes = run(scenario_config(), "a", "b", 1000, false);
        assert_eq!(
            shape(&routes[0]),
            vec![(ids(&["pool-ab-2"]), 500, 19), (ids(&["pool-ab-1"]), 500, 9)]
        );
    }

    #[test]
    fn test_save_gas_returns_single_path() {
        let routes = run(scenario_config(), "a", "b", 1000, true);
        assert_eq!(shape(&routes[0]), vec![(ids(&["pool-ab-2"]), 1000, 19)]);
    }

    #[test]
    fn test_multi_hop_second_path() {
        let routes = run(scenario_config(), "a", "d", 1000, false);
        assert_eq!(
            shape(&routes[0]),
            vec![
                (ids(&["pool-ad-1"]), 500, 9),
                (ids(&["pool-ac-1", "pool-cd-1"]), 500, 5),
            ]
        );
    }

    #[test]
    fn test_amount_above_threshold_is_not_split() {
        let config = FinderConfig {
            max_threshold_amount_in_usd: 900.0,
            ..scenario_config()
        };
        let routes = run(config, "a", "b", 1000, false);
        assert_eq!(shape(&routes[0]), vec![(ids(&["pool-ab-2"]), 1000, 19)]);
    }

    #[test]
    fn test_path_cap_limits_distinct_paths() {
        let config = FinderConfig {
            max_paths_in_route: 1,
            ..scenario_config()
        };
        let routes = run(config, "a", "b", 1000, false);
        // the only multi-path option needs two paths, so the single path wins
        assert_eq!(routes[0].paths.len(), 1);
    }

    #[test]
    fn test_unreachable_is_empty() {
        assert!(run(scenario_config(), "a", "g", 1000, false).is_empty());
    }

    #[test]
    fn test_forced_entries_pop_first() {
        let mut heap = BinaryHeap::new();
        let path = Path::from_parts(
            TokenAmount::zero("a".into()),
            TokenAmount::new("b".into(), BigUint::from(100u32)),
            ids(&["p"]),
            vec!["a".into(), "b".into()],
            0,
        );
        let candidate = Candidate {
            path,
            computed_at: 0,
            priced_in_route: false,
            in_route: false,
        };
        heap.push(QueueEntry::keyed(&candidate, 0, true));
        heap.push(QueueEntry::forced(3, true));
        heap.push(QueueEntry::forced(1, true));
        assert_eq!(heap.pop().map(|e| e.index), Some(1));
        assert_eq!(heap.pop().map(|e| e.index), Some(3));
        assert_eq!(heap.pop().map(|e| e.index), Some(0));
    }

    /// Re-quote every live candidate for every portion and take the best.
    fn eager_route(
        input: &FinderInput,
        data: &mut FinderData,
        paths: Vec<Path>,
        portions: &[BigUint],
    ) -> Option<Route> {
        let mut live: Vec<(Path, bool)> = paths.into_iter().map(|p| (p, false)).collect();
        let mut route = Route::new(input);
        for amount in portions {
            let mut best: Option<(usize, Path)> = None;
            let mut failed = Vec::new();
            for (i, (path, in_route)) in live.iter().enumerate() {
                match path.with_amount(input, data, amount.clone(), !*in_route) {
                    Ok(p) => {
                        let better = best
                            .as_ref()
                            .map_or(true, |(_, b)| compare_paths(&p, b, input.gas_include).is_gt());
                        if better {
                            best = Some((i, p));
                        }
                    }
                    Err(_) => failed.push(i),
                }
            }
            let (index, path) = best?;
            route.add_path(input, data, path.clone()).ok()?;
            live[index] = (path, true);
            for i in failed.into_iter().rev() {
                live.remove(i);
            }
        }
        Some(route)
    }

    fn topology(reserves: &[u64; 12]) -> std::sync::Arc<crate::MarketSnapshot> {
        scenario_tokens()
            .pool(make_pool("pool-ab", "a", reserves[0], "b", reserves[1]))
            .pool(make_pool("pool-ac", "a", reserves[2], "c", reserves[3]))
            .pool(make_pool("pool-bc", "b", reserves[4], "c", reserves[5]))
            .pool(make_pool("pool-ad", "a", reserves[6], "d", reserves[7]))
            .pool(make_pool("pool-cd", "c", reserves[8], "d", reserves[9]))
            // a-b-c-d and a-c-b-d cross pool-bc in opposite directions
            .pool(make_pool("pool-bd", "b", reserves[10], "d", reserves[11]))
            .build()
    }

    /// Lazy and eager placements over the same candidates and portions.
    fn lazy_and_eager(
        snapshot: std::sync::Arc<crate::MarketSnapshot>,
        config: &FinderConfig,
        input: &FinderInput,
    ) -> (Vec<BigUint>, Option<Route>, Option<Route>) {
        let finder = LazyFinder::new(config.clone());
        let mut data = FinderData::new(snapshot.clone());
        let portions = split_portions(input, &data, config);
        let candidates = gen_kth_best_paths(
            input,
            &data,
            &portions[portions.len() - 1],
            &finder.gen_config(portions.len()),
        )
        .unwrap();

        let mut eager_data = FinderData::new(snapshot);
        let eager = eager_route(input, &mut eager_data, candidates.clone(), &portions);
        let lazy = lazy_route(input, &mut data, config, candidates, &portions).unwrap();
        (portions, lazy, eager)
    }

    #[test]
    fn test_larger_first_portion_requotes_every_candidate() {
        let snapshot = scenario_tokens()
            .pool(make_pool("pool-shallow", "a", 10_000, "b", 11_000))
            .pool(make_pool("pool-deep", "a", 100_000, "b", 103_500))
            .build();
        let input = FinderInput::new("a", "b", 1900u32);
        let (portions, lazy, eager) = lazy_and_eager(snapshot, &scenario_config(), &input);

        let big = |v: u32| BigUint::from(v);
        assert_eq!(portions, vec![big(760), big(570), big(570)]);

        // shallow quotes better at 570 but deep wins the 760 portion
        let lazy = lazy.unwrap();
        assert_eq!(
            shape(&lazy).iter().map(|(p, i, _)| (p.clone(), *i)).collect::<Vec<_>>(),
            vec![(ids(&["pool-deep"]), 1330), (ids(&["pool-shallow"]), 570)]
        );
        assert_eq!(Some(lazy.allocations()), eager.as_ref().map(|r| r.allocations()));
        assert_eq!(Some(&lazy.output.amount), eager.as_ref().map(|r| &r.output.amount));
    }

    proptest! {
        #[test]
        fn test_lazy_matches_eager_recompute(
            reserves in prop::array::uniform12(1_000u64..50_000),
            amount in 1_000u32..5_000,
        ) {
            let config = FinderConfig {
                max_paths_to_return: 8,
                ..scenario_config()
            };
            let input = FinderInput::new("a", "d", amount);
            let (portions, lazy, eager) = lazy_and_eager(topology(&reserves), &config, &input);
            prop_assert!(portions.len() >= 2);

            prop_assert_eq!(
                lazy.as_ref().map(|r| r.allocations()),
                eager.as_ref().map(|r| r.allocations())
            );
            prop_assert_eq!(
                lazy.as_ref().map(|r| r.output.amount.clone()),
                eager.as_ref().map(|r| r.output.amount.clone())
            );
            if let Some(route) = lazy {
                let total: BigUint = route.paths.iter().map(|p| &p.input.amount).sum();
                prop_assert_eq!(total, BigUint::from(amount));
            }
        }
    }
}
