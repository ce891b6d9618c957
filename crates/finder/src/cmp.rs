//! Ranking of paths and routes
//!
//! Every comparison returns `Ordering::Greater` when the first argument is
//! the better candidate. Ties on value fall back to the pool sequence, the
//! lexicographically smaller one winning, so the order is total.

use std::cmp::Ordering;

use router_core::PoolId;

use crate::path::Path;
use crate::route::Route;
use crate::token_amount::TokenAmount;

/// USD values are compared after rounding to this resolution
pub const USD_RESOLUTION: f64 = 1e-9;

/// Rounding is monotonic, so comparing rounded values stays transitive.
fn quantize_usd(usd: f64) -> f64 {
    (usd / USD_RESOLUTION).round()
}

/// Compare two outputs of the same token.
pub fn compare_amounts(a: &TokenAmount, b: &TokenAmount, gas_include: bool) -> Ordering {
    if gas_include {
        if let (Some(x), Some(y)) = (&a.amount_after_gas, &b.amount_after_gas) {
            if x != y {
                return x.cmp(y);
            }
        }
        let by_usd = quantize_usd(a.amount_usd).total_cmp(&quantize_usd(b.amount_usd));
        if by_usd != Ordering::Equal {
            return by_usd;
        }
    }
    a.amount.cmp(&b.amount)
}

/// The smaller pool sequence ranks higher.
pub fn compare_pool_sequences<'a, A, B>(a: A, b: B) -> Ordering
where
    A: IntoIterator<Item = &'a PoolId>,
    B: IntoIterator<Item = &'a PoolId>,
{
    b.into_iter().cmp(a)
}

pub fn compare_paths(a: &Path, b: &Path, gas_include: bool) -> Ordering {
    compare_amounts(&a.output, &b.output, gas_include)
        .then_with(|| compare_pool_sequences(&a.pools, &b.pools))
}

pub fn compare_routes(a: &Route, b: &Route, gas_include: bool) -> Ordering {
    compare_amounts(&a.output, &b.output, gas_include)
        .then_with(|| compare_pool_sequences(a.pool_sequence(), b.pool_sequence()))
}

/// Compare optional routes; a missing route always loses.
pub fn compare_route_options(a: Option<&Route>, b: Option<&Route>, gas_include: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_routes(a, b, gas_include),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// The better of two optional routes, preferring `a` on a full tie.
pub fn better_route(a: Option<Route>, b: Option<Route>, gas_include: bool) -> Option<Route> {
    match compare_route_options(a.as_ref(), b.as_ref(), gas_include) {
        Ordering::Less => b,
        _ => a,
    }
}

/// Sort paths best first.
pub fn sort_paths(paths: &mut [Path], gas_include: bool) {
    paths.sort_by(|a, b| compare_paths(b, a, gas_include));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, toks};
    use num_bigint::{BigInt, BigUint};
    use proptest::prelude::*;
    use router_core::TokenId;

    fn amount(raw: u64, usd: f64, after_gas: Option<i64>) -> TokenAmount {
        TokenAmount {
            token: TokenId::new("b"),
            amount: BigUint::from(raw),
            amount_usd: usd,
            amount_after_gas: after_gas.map(BigInt::from),
        }
    }

    fn path(raw: u64, usd: f64, pools: &[&str]) -> Path {
        let tokens: Vec<&str> = std::iter::once("a")
            .chain((1..pools.len()).map(|_| "x"))
            .chain(std::iter::once("b"))
            .collect();
        Path::from_parts(amount(0, 0.0, None), amount(raw, usd, None), ids(pools), toks(&tokens), 0)
    }

    #[test]
    fn test_usd_wins_when_gas_included() {
        let cheap = amount(90, 95.0, None);
        let rich = amount(100, 80.0, None);
        assert_eq!(compare_amounts(&cheap, &rich, true), Ordering::Greater);
        assert_eq!(compare_amounts(&cheap, &rich, false), Ordering::Less);
    }

    #[test]
    fn test_after_gas_amount_takes_precedence() {
        let a = amount(100, 10.0, Some(50));
        let b = amount(100, 20.0, Some(60));
        assert_eq!(compare_amounts(&a, &b, true), Ordering::Less);
        let c = amount(100, 30.0, Some(60));
        assert_eq!(compare_amounts(&c, &b, true), Ordering::Greater);
    }

    #[test]
    fn test_usd_within_resolution_falls_back_to_amount() {
        let a = amount(101, 100.0, None);
        let b = amount(100, 100.0 + 1e-12, None);
        assert_eq!(compare_amounts(&a, &b, true), Ordering::Greater);
    }

    #[test]
    fn test_tie_broken_by_smaller_pool_sequence() {
        let a = path(9, 9.0, &["pool-ab-1"]);
        let b = path(9, 9.0, &["pool-ab-2"]);
        assert_eq!(compare_paths(&a, &b, true), Ordering::Greater);
        assert_eq!(compare_paths(&b, &a, true), Ordering::Less);
        assert_eq!(compare_paths(&a, &a, true), Ordering::Equal);
    }

    #[test]
    fn test_missing_route_loses() {
        let route = Route {
            input: amount(0, 0.0, None),
            output: amount(1, 1.0, None),
            paths: vec![],
            total_gas: 0,
        };
        assert_eq!(compare_route_options(Some(&route), None, true), Ordering::Greater);
        assert_eq!(compare_route_options(None, Some(&route), true), Ordering::Less);
        assert_eq!(compare_route_options(None, None, true), Ordering::Equal);
        assert!(better_route(None, Some(route.clone()), true).is_some());
    }

    #[test]
    fn test_sort_paths_best_first() {
        let mut paths = vec![
            path(5, 5.0, &["p3"]),
            path(9, 9.0, &["p2"]),
            path(9, 9.0, &["p1"]),
        ];
        sort_paths(&mut paths, true);
        let order: Vec<&str> = paths.iter().map(|p| p.pools[0].as_str()).collect();
        assert_eq!(order, vec!["p1", "p2", "p3"]);
    }

    proptest! {
        #[test]
        fn test_comparison_is_antisymmetric(
            raw_a in 0u64..1000, raw_b in 0u64..1000,
            usd_a in 0.0f64..1000.0, usd_b in 0.0f64..1000.0,
            pool_a in 0u8..4, pool_b in 0u8..4,
            gas_include in any::<bool>(),
        ) {
            let a = path(raw_a, usd_a, &[format!("p{pool_a}").as_str()]);
            let b = path(raw_b, usd_b, &[format!("p{pool_b}").as_str()]);
            let ab = compare_paths(&a, &b, gas_include);
            let ba = compare_paths(&b, &a, gas_include);
            prop_assert_eq!(ab, ba.reverse());
            if ab == Ordering::Equal {
                prop_assert_eq!(&a.pools, &b.pools);
            }
        }

        #[test]
        fn test_near_equal_usd_orders_transitively(
            raws in prop::array::uniform3(0u64..4),
            offsets in prop::array::uniform3(0u32..40),
            base in 1.0f64..1000.0,
        ) {
            // offsets of a tenth of the resolution straddle rounding boundaries
            let amounts: Vec<TokenAmount> = raws
                .iter()
                .zip(offsets.iter())
                .map(|(raw, off)| amount(*raw, base + f64::from(*off) * USD_RESOLUTION / 10.0, None))
                .collect();
            for a in &amounts {
                for b in &amounts {
                    for c in &amounts {
                        let ab = compare_amounts(a, b, true);
                        let bc = compare_amounts(b, c, true);
                        if ab.is_ge() && bc.is_ge() {
                            prop_assert!(compare_amounts(a, c, true).is_ge());
                        }
                    }
                }
            }
        }
    }
}
