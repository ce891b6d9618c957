//! K-best path generation
//!
//! Layered search over `(token, hop)` nodes starting from the input token.
//! Each layer expands every live node through every pool it has not used
//! into every token it has not visited, keeps the best
//! `max_paths_to_generate` nodes per token, and turns the best
//! `max_paths_to_return` nodes that reached the destination into paths.
//! Destination nodes are not expanded further.

use std::collections::{BTreeMap, HashMap};

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{FinderError, PoolId, Result, TokenId};

use crate::cmp::{compare_amounts, compare_pool_sequences, sort_paths};
use crate::finder_data::{FinderData, FinderInput};
use crate::hops::HopTable;
use crate::path::Path;
use crate::token_amount::TokenAmount;

/// Width and depth of one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenConfig {
    pub max_hops: usize,
    pub max_paths_to_generate: usize,
    pub max_paths_to_return: usize,
    /// Value nodes net of their accumulated gas
    pub count_gas: bool,
}

impl GenConfig {
    /// The single best path
    pub fn single(max_hops: usize) -> Self {
        Self {
            max_hops,
            max_paths_to_generate: 1,
            max_paths_to_return: 1,
            count_gas: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    output: TokenAmount,
    pools: Vec<PoolId>,
    tokens: Vec<TokenId>,
    gas: i64,
}

type QuoteKey = (TokenId, TokenId, PoolId, String);

/// Quotes seen during one run, keyed by hop and input amount
#[derive(Default)]
struct QuoteCache {
    quotes: HashMap<QuoteKey, Option<(BigUint, i64)>>,
}

impl QuoteCache {
    fn quote(
        &mut self,
        data: &FinderData,
        pool_id: &PoolId,
        token_in: &TokenId,
        amount_in: &BigUint,
        token_out: &TokenId,
    ) -> Result<Option<(BigUint, i64)>> {
        let key = (token_in.clone(), token_out.clone(), pool_id.clone(), amount_in.to_string());
        if let Some(hit) = self.quotes.get(&key) {
            return Ok(hit.clone());
        }

        let pool = data.bucket.get_pool(pool_id)?;
        let limit = data.bucket.swap_limit(pool.pool_type());
        let result = match pool.quote(token_in, amount_in, token_out, limit) {
            Ok(q) if !q.amount_out.is_zero() => Some((q.amount_out, q.gas)),
            Ok(_) => None,
            Err(err) => {
                tracing::trace!(pool = %pool_id, error = %err, "hop rejected");
                None
            }
        };
        self.quotes.insert(key, result.clone());
        Ok(result)
    }
}

fn rank_nodes(nodes: &mut [Node], gas_include: bool) {
    nodes.sort_by(|a, b| {
        compare_amounts(&b.output, &a.output, gas_include)
            .then_with(|| compare_pool_sequences(&b.pools, &a.pools))
    });
}

/// Generate up to `max_paths_to_return` paths per hop length, best first.
///
/// Missing metadata for either end token is fatal. An input token that
/// cannot reach the destination within `max_hops` yields no paths.
pub fn gen_kth_best_paths(
    input: &FinderInput,
    data: &FinderData,
    amount_in: &BigUint,
    cfg: &GenConfig,
) -> Result<Vec<Path>> {
    data.token(&input.token_in)?;
    data.token(&input.token_out)?;
    if amount_in.is_zero() || input.token_in == input.token_out {
        return Ok(Vec::new());
    }

    let local;
    let hops = match data.hop_table(&input.token_out, cfg.max_hops) {
        Some(table) => table,
        None => {
            local = HopTable::build(data.snapshot(), &input.token_out, cfg.max_hops);
            &local
        }
    };
    if !hops.can_finish(&input.token_in, 0, cfg.max_hops + 1) {
        return Ok(Vec::new());
    }

    let graph = data.snapshot().graph();
    let start = data.token_amount(input, &input.token_in, amount_in.clone(), None);
    let mut cache = QuoteCache::default();
    let mut results: Vec<Path> = Vec::new();

    let mut layer: BTreeMap<TokenId, Vec<Node>> = BTreeMap::new();
    layer.insert(
        input.token_in.clone(),
        vec![Node {
            output: start.clone(),
            pools: Vec::new(),
            tokens: vec![input.token_in.clone()],
            gas: 0,
        }],
    );

    for hop in 0..cfg.max_hops {
        input.budget.check()?;
        let mut next: BTreeMap<TokenId, Vec<Node>> = BTreeMap::new();

        for (token, nodes) in &layer {
            for node in nodes {
                for pool_id in graph.pools_for(token) {
                    if node.pools.contains(pool_id) {
                        continue;
                    }
                    let targets = data.bucket.get_pool(pool_id)?.can_swap_to(token);
                    for next_token in targets {
                        if node.tokens.contains(&next_token) || !data.has_token(&next_token) {
                            continue;
                        }
                        if !hops.can_finish(&next_token, hop, cfg.max_hops) {
                            continue;
                        }
                        let Some((amount_out, gas)) =
                            cache.quote(data, pool_id, token, &node.output.amount, &next_token)?
                        else {
                            continue;
                        };

                        let total_gas = node.gas + gas;
                        let output = data.token_amount(
                            input,
                            &next_token,
                            amount_out,
                            cfg.count_gas.then_some(total_gas),
                        );
                        let mut pools = node.pools.clone();
                        pools.push(pool_id.clone());
                        let mut tokens = node.tokens.clone();
                        tokens.push(next_token.clone());

                        next.entry(next_token).or_default().push(Node {
                            output,
                            pools,
                            tokens,
                            gas: total_gas,
                        });
                    }
                }
            }
        }

        if let Some(mut arrived) = next.remove(&input.token_out) {
            rank_nodes(&mut arrived, input.gas_include);
            arrived.truncate(cfg.max_paths_to_return);
            results.extend(arrived.into_iter().map(|node| {
                Path::from_parts(start.clone(), node.output, node.pools, node.tokens, node.gas)
            }));
        }

        for nodes in next.values_mut() {
            rank_nodes(nodes, input.gas_include);
            nodes.truncate(cfg.max_paths_to_generate);
        }

        if next.is_empty() {
            break;
        }
        layer = next;
    }

    sort_paths(&mut results, input.gas_include);
    tracing::trace!(
        token_in = %input.token_in,
        token_out = %input.token_out,
        amount_in = %amount_in,
        paths = results.len(),
        "generated paths"
    );
    Ok(results)
}

/// Best single path for `amount_in`, if any.
pub fn best_path(
    input: &FinderInput,
    data: &FinderData,
    amount_in: &BigUint,
    max_hops: usize,
) -> Result<Option<Path>> {
    let paths = gen_kth_best_paths(input, data, amount_in, &GenConfig::single(max_hops))?;
    Ok(paths.into_iter().next())
}

/// Missing metadata for an end token, as the engine reports it.
pub fn ensure_tokens(input: &FinderInput, data: &FinderData) -> Result<()> {
    for token in [&input.token_in, &input.token_out] {
        if !data.has_token(token) {
            return Err(FinderError::NoInfoForToken {
                token: token.to_string(),
            });
        }
    }
    Ok(())
}
