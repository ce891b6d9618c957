//! Search strategies
//!
//! Every strategy takes the same request input and per-request data and
//! returns candidate routes, best first. An empty result means no route.

pub mod bruteforce;
pub mod greedy;
pub mod hill_climb;
pub mod lazy;
pub mod single;
pub mod uniswap;

use std::fmt;

use num_bigint::BigUint;
use router_core::{FinderConfig, Result};

use crate::cmp::compare_paths;
use crate::finder_data::{FinderData, FinderInput};
use crate::gen_path::best_path;
use crate::route::Route;
use crate::split::split_amount_in;

pub use bruteforce::{BruteforceFinder, Compositions};
pub use greedy::GreedyFinder;
pub use hill_climb::HillClimbFinder;
pub use lazy::LazyFinder;
pub use single::SingleFinder;
pub use uniswap::UniswapFinder;

/// Maximum rejected additions tolerated for one portion
pub const MAX_ADD_PATH_RETRIES: usize = 3;

pub trait RouteFinder: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>>;
}

/// Route the whole amount through the single best path.
pub fn find_single_path_route(
    input: &FinderInput,
    data: &mut FinderData,
    cfg: &FinderConfig,
) -> Result<Option<Route>> {
    data.refresh();
    let Some(path) = best_path(input, data, &input.amount_in, cfg.max_hops)? else {
        return Ok(None);
    };
    let mut route = Route::new(input);
    match route.add_path(input, data, path) {
        Ok(()) => Ok(Some(route)),
        Err(err) if !err.is_fatal() => {
            tracing::debug!(error = %err, "single path rejected");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Portions of the input, or the whole input when splitting is not allowed.
pub fn split_portions(input: &FinderInput, data: &FinderData, cfg: &FinderConfig) -> Vec<BigUint> {
    let whole = vec![input.amount_in.clone()];
    let Ok(token) = data.token(&input.token_in) else {
        return whole;
    };
    let Some(amount_usd) = data.amount_usd(&input.token_in, &input.amount_in) else {
        return whole;
    };
    if !cfg.allows_split(amount_usd) {
        return whole;
    }
    split_amount_in(
        &input.amount_in,
        token.decimals,
        data.snapshot().price_usd(&input.token_in),
        cfg.distribution_percent,
        cfg.min_part_usd,
    )
}

/// Place each portion on the better of the best fresh path and the best
/// extension of a path already in the route.
///
/// Starts from a refreshed bucket. `None` when some portion has no viable
/// path.
pub fn greedy_route(
    input: &FinderInput,
    data: &mut FinderData,
    cfg: &FinderConfig,
    portions: &[BigUint],
) -> Result<Option<Route>> {
    data.refresh();
    let mut route = Route::new(input);

    for amount in portions {
        input.budget.check()?;

        let fresh = if route.paths.len() < cfg.max_paths_in_route {
            best_path(input, data, amount, cfg.max_hops)?
        } else {
            None
        };
        let extension = route.best_path_among_added_paths(input, data, amount);

        let chosen = match (fresh, extension) {
            (Some(f), Some(e)) => {
                if compare_paths(&e, &f, input.gas_include).is_lt() {
                    Some(f)
                } else {
                    Some(e)
                }
            }
            (f, e) => f.or(e),
        };

        let Some(path) = chosen else {
            tracing::debug!(portion = %amount, "no path for portion");
            return Ok(None);
        };
        if let Err(err) = route.add_path(input, data, path) {
            if err.is_fatal() {
                return Err(err);
            }
            tracing::debug!(portion = %amount, error = %err, "portion rejected");
            return Ok(None);
        }
    }

    Ok(Some(route))
}

pub(crate) fn into_routes(route: Option<Route>) -> Vec<Route> {
    route.into_iter().collect()
}
