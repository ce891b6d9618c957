//! A single sequence of pool hops

use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{FinderError, PoolId, Result, SwapInfo, SwapLimit, TokenId};

use crate::finder_data::{FinderData, FinderInput};
use crate::pool_bucket::PoolBucket;
use crate::token_amount::TokenAmount;

/// An immutable, quoted path: `tokens[i] -> pools[i] -> tokens[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub pools: Vec<PoolId>,
    pub tokens: Vec<TokenId>,
    pub total_gas: i64,
}

/// Outcome of quoting a pool sequence
#[derive(Debug, Clone)]
pub struct SequenceQuote {
    pub amount_out: BigUint,
    pub gas: i64,
    pub swaps: Vec<SwapInfo>,
}

/// Quote `pools` in order against the bucket without mutating it.
///
/// Swap limits consumed by earlier hops are honored by later hops.
pub fn quote_sequence(
    bucket: &PoolBucket,
    pools: &[PoolId],
    tokens: &[TokenId],
    amount_in: &BigUint,
) -> Result<SequenceQuote> {
    let mut limits: HashMap<String, SwapLimit> = HashMap::new();
    let mut amount = amount_in.clone();
    let mut gas = 0i64;
    let mut swaps = Vec::with_capacity(pools.len());

    for (i, pool_id) in pools.iter().enumerate() {
        let pool = bucket.get_pool(pool_id)?;
        let pool_type = pool.pool_type();
        let limit = limits
            .get(pool_type)
            .or_else(|| bucket.swap_limit(pool_type));

        let quote = pool
            .quote(&tokens[i], &amount, &tokens[i + 1], limit)
            .map_err(|e| FinderError::invalid_swap(pool_id, &e))?;
        if quote.amount_out.is_zero() {
            return Err(FinderError::InvalidSwap {
                pool: pool_id.to_string(),
                reason: "zero output".into(),
            });
        }

        if let Some(base) = bucket.swap_limit(pool_type) {
            let limit = limits
                .entry(pool_type.to_string())
                .or_insert_with(|| base.clone());
            limit
                .consume(&quote.swap_info)
                .map_err(|e| FinderError::invalid_swap(pool_id, &e))?;
        }

        amount = quote.amount_out;
        gas += quote.gas;
        swaps.push(quote.swap_info);
    }

    Ok(SequenceQuote {
        amount_out: amount,
        gas,
        swaps,
    })
}

fn check_shape(pools: &[PoolId], tokens: &[TokenId]) -> Result<()> {
    let invalid = |reason: &str| FinderError::InvalidSwap {
        pool: pools.first().map(|p| p.to_string()).unwrap_or_default(),
        reason: reason.to_string(),
    };
    if pools.is_empty() || tokens.len() != pools.len() + 1 {
        return Err(invalid("malformed path"));
    }
    let unique_pools: HashSet<&PoolId> = pools.iter().collect();
    let unique_tokens: HashSet<&TokenId> = tokens.iter().collect();
    if unique_pools.len() != pools.len() || unique_tokens.len() != tokens.len() {
        return Err(invalid("path repeats a pool or token"));
    }
    Ok(())
}

impl Path {
    /// Quote a pool sequence for `amount_in` against the current bucket.
    ///
    /// With `count_gas` false the output is valued without the path's gas,
    /// as when extending a path that is already paid for.
    pub fn new(
        input: &FinderInput,
        data: &FinderData,
        pools: Vec<PoolId>,
        tokens: Vec<TokenId>,
        amount_in: BigUint,
        count_gas: bool,
    ) -> Result<Self> {
        check_shape(&pools, &tokens)?;
        let quoted = quote_sequence(&data.bucket, &pools, &tokens, &amount_in)?;
        let token_in = &tokens[0];
        let token_out = &tokens[tokens.len() - 1];

        Ok(Self {
            input: data.token_amount(input, token_in, amount_in, None),
            output: data.token_amount(input, token_out, quoted.amount_out, count_gas.then_some(quoted.gas)),
            pools,
            tokens,
            total_gas: quoted.gas,
        })
    }

    /// Assemble an already quoted path.
    pub fn from_parts(
        input: TokenAmount,
        output: TokenAmount,
        pools: Vec<PoolId>,
        tokens: Vec<TokenId>,
        total_gas: i64,
    ) -> Self {
        Self {
            input,
            output,
            pools,
            tokens,
            total_gas,
        }
    }

    /// Re-quote the same pool sequence for another amount.
    pub fn with_amount(
        &self,
        input: &FinderInput,
        data: &FinderData,
        amount_in: BigUint,
        count_gas: bool,
    ) -> Result<Self> {
        Self::new(input, data, self.pools.clone(), self.tokens.clone(), amount_in, count_gas)
    }

    pub fn token_in(&self) -> &TokenId {
        &self.tokens[0]
    }

    pub fn token_out(&self) -> &TokenId {
        &self.tokens[self.tokens.len() - 1]
    }

    pub fn hop_count(&self) -> usize {
        self.pools.len()
    }

    pub fn same_pools(&self, other: &Path) -> bool {
        self.pools == other.pools
    }

    pub fn contains_pool(&self, id: &PoolId) -> bool {
        self.pools.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, scenario_snapshot, toks};

    #[test]
    fn test_multi_hop_quote() {
        let data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "d", 570u32);
        let path = Path::new(
            &input,
            &data,
            ids(&["pool-ac-1", "pool-cd-1"]),
            toks(&["a", "c", "d"]),
            BigUint::from(570u32),
            true,
        )
        .unwrap();
        assert_eq!(path.output.amount, BigUint::from(5u32));
        assert_eq!(path.total_gas, 120_000);
        assert_eq!(path.token_in().as_str(), "a");
        assert_eq!(path.token_out().as_str(), "d");
        assert_eq!(path.input.amount_usd, 570.0);
    }

    #[test]
    fn test_rejects_cycles_and_malformed_paths() {
        let data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "b", 100u32);
        let cyclic = Path::new(
            &input,
            &data,
            ids(&["pool-ab-1", "pool-ab-2"]),
            toks(&["a", "b", "a"]),
            BigUint::from(100u32),
            true,
        );
        assert!(matches!(cyclic, Err(FinderError::InvalidSwap { .. })));

        let malformed = Path::new(&input, &data, ids(&["pool-ab-1"]), toks(&["a"]), BigUint::from(100u32), true);
        assert!(malformed.is_err());
    }

    #[test]
    fn test_zero_output_is_invalid_swap() {
        let data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "b", 1u32);
        let err = Path::new(&input, &data, ids(&["pool-ab-1"]), toks(&["a", "b"]), BigUint::from(1u32), true)
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_with_amount_requotes() {
        let data = FinderData::new(scenario_snapshot());
        let input = FinderInput::new("a", "b", 500u32);
        let path = Path::new(&input, &data, ids(&["pool-ab-2"]), toks(&["a", "b"]), BigUint::from(500u32), true)
            .unwrap();
        let bigger = path.with_amount(&input, &data, BigUint::from(5000u32), true).unwrap();
        assert!(bigger.output.amount >= path.output.amount);
        assert!(bigger.same_pools(&path));
        assert_eq!(bigger.input.amount, BigUint::from(5000u32));
    }
}
