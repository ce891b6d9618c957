//! Serializable view of a route
//!
//! Amounts are rendered as decimal strings so they survive JSON clients
//! that parse numbers as doubles.

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::route::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub pools: Vec<String>,
    pub tokens: Vec<String>,
    pub amount_in: String,
    pub amount_out: String,
    pub amount_out_usd: f64,
    pub gas: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_out: String,
    /// Output value net of gas
    pub amount_out_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_out_after_gas: Option<String>,
    pub total_gas: i64,
    pub paths: Vec<PathSummary>,
}

impl From<&Path> for PathSummary {
    fn from(path: &Path) -> Self {
        Self {
            pools: path.pools.iter().map(|p| p.to_string()).collect(),
            tokens: path.tokens.iter().map(|t| t.to_string()).collect(),
            amount_in: path.input.amount.to_string(),
            amount_out: path.output.amount.to_string(),
            amount_out_usd: path.output.amount_usd,
            gas: path.total_gas,
        }
    }
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        Self {
            token_in: route.input.token.to_string(),
            token_out: route.output.token.to_string(),
            amount_in: route.input.amount.to_string(),
            amount_out: route.output.amount.to_string(),
            amount_out_usd: route.output.amount_usd,
            amount_out_after_gas: route.output.amount_after_gas.as_ref().map(|a| a.to_string()),
            total_gas: route.total_gas,
            paths: route.paths.iter().map(PathSummary::from).collect(),
        }
    }
}
