//! Single best path for the whole amount

use router_core::{FinderConfig, Result};

use super::{find_single_path_route, into_routes, RouteFinder};
use crate::finder_data::{FinderData, FinderInput};
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct SingleFinder {
    config: FinderConfig,
}

impl SingleFinder {
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl RouteFinder for SingleFinder {
    fn name(&self) -> &'static str {
        "single"
    }

    fn find(&self, input: &FinderInput, data: &mut FinderData) -> Result<Vec<Route>> {
        Ok(into_routes(find_single_path_route(input, data, &self.config)?))
    }
}
