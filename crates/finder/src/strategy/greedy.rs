//! Greedy multi-path search
//!
//! Splits the input, places each portion on its best path given the trades
//! already made, and keeps the result only if it beats the single best
//! path for the whole amount.

use router_core::{FinderConfig, Result};

use super::{find_single_path_route, greedy_route, into_routes, split_portions, RouteFinder};
use crate::cmp::better_route;
use crate::finder_data::{FinderData, FinderInput};
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct GreedyFinder {
    config: FinderConfig,
}

impl GreedyFinder {
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl RouteFinder for GreedyFinder {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        let single = find_single_path_route(input, data, &self.config)?;
        if input.save_gas {
            return Ok(into_routes(single));
        }

        let portions = split_portions(input, data, &self.config);
        if portions.len() == 1 {
            return Ok(into_routes(single));
        }

        let multi = greedy_route(input, data, &self.config, &portions)?;
        if multi.is_none() {
            tracing::info!(portions = portions.len(), "multi-path failed, using single path");
        }
        Ok(into_routes(better_route(multi, single, input.gas_include)))
    }
}
