//! Request entry point
//!
//! Validates the request against the market, runs the configured strategy
//! on a fresh per-request bucket and polishes the winner with the
//! dynamic-pool pass.

use std::sync::Arc;

use num_traits::Zero;
use router_core::{FinderError, Result, RouterConfig, StrategyKind};

use crate::cmp::better_route;
use crate::finder_data::{FinderData, FinderInput};
use crate::gen_path::ensure_tokens;
use crate::market::MarketSnapshot;
use crate::retry::retry_dynamic_pools;
use crate::route::Route;
use crate::strategy::{
    BruteforceFinder, GreedyFinder, HillClimbFinder, LazyFinder, RouteFinder, SingleFinder, UniswapFinder,
};

#[derive(Debug)]
pub struct RouteEngine {
    config: RouterConfig,
    finder: Box<dyn RouteFinder>,
}

fn build_finder(config: &RouterConfig) -> Box<dyn RouteFinder> {
    let finder = config.finder.clone();
    match config.strategy {
        StrategyKind::Single => Box::new(SingleFinder::new(finder)),
        StrategyKind::Greedy => Box::new(GreedyFinder::new(finder)),
        StrategyKind::Lazy => Box::new(LazyFinder::new(finder)),
        StrategyKind::Bruteforce => Box::new(BruteforceFinder::new(finder, config.bruteforce.clone())),
        StrategyKind::HillClimb => Box::new(HillClimbFinder::new(
            finder.clone(),
            config.hill_climb.clone(),
            Box::new(LazyFinder::new(finder)),
        )),
        StrategyKind::Uniswap => Box::new(UniswapFinder::new(finder, config.uniswap.clone())),
    }
}

impl RouteEngine {
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        let finder = build_finder(&config);
        tracing::debug!(strategy = finder.name(), "route engine ready");
        Ok(Self { config, finder })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.finder.name()
    }

    /// Best route for the request.
    pub fn find_route(&self, input: &FinderInput, snapshot: Arc<MarketSnapshot>) -> Result<Route> {
        self.find_routes(input, snapshot)?
            .into_iter()
            .next()
            .ok_or(FinderError::RouteNotFound)
    }

    /// Candidate routes, best first. Never empty on success.
    pub fn find_routes(&self, input: &FinderInput, snapshot: Arc<MarketSnapshot>) -> Result<Vec<Route>> {
        let span = tracing::info_span!(
            "find_route",
            strategy = self.finder.name(),
            token_in = %input.token_in,
            token_out = %input.token_out,
            amount_in = %input.amount_in,
        );
        let _guard = span.enter();

        let mut data = FinderData::new(snapshot);
        ensure_tokens(input, &data)?;
        if input.amount_in.is_zero() || input.token_in == input.token_out {
            return Err(FinderError::RouteNotFound);
        }
        data.prepare(&input.token_out, self.config.finder.max_hops);

        let mut routes = self.finder.find(input, &mut data)?;
        routes.retain(|r| !r.is_empty());
        if routes.is_empty() {
            tracing::info!("no route found");
            return Err(FinderError::RouteNotFound);
        }

        if self.config.retry.enabled {
            let best = routes.remove(0);
            let retried = retry_dynamic_pools(input, &mut data, &best, &self.config.retry)?;
            let winner = better_route(retried, Some(best.clone()), input.gas_include).unwrap_or(best);
            routes.insert(0, winner);
        }

        tracing::info!(
            paths = routes[0].paths.len(),
            amount_out = %routes[0].output.amount,
            "route found"
        );
        Ok(routes)
    }
}
