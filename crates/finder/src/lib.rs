//! Route finder
//!
//! Searches a snapshot of liquidity pools for the route that turns an input
//! amount of one token into the most of another. A route is a set of paths
//! (sequences of pool hops) sharing the input between them.
//!
//! The pieces, leaves first:
//! - [`market`]: the shared read-only snapshot and its token/pool graph
//! - [`pool_bucket`]: per-request copy-on-write view over the snapshot
//! - [`hops`]: minimum hop counts to the destination, used for pruning
//! - [`split`]: division of the input into portions
//! - [`gen_path`]: k-best path generation
//! - [`route`] and [`cmp`]: route assembly and ranking
//! - [`strategy`]: interchangeable search strategies
//! - [`retry`]: dynamic-pool substitution on a finished route
//! - [`engine`]: strategy selection and the request entry point

pub mod budget;
pub mod cmp;
pub mod engine;
pub mod finder_data;
pub mod gen_path;
pub mod graph;
pub mod hops;
pub mod market;
pub mod path;
pub mod pool_bucket;
pub mod retry;
pub mod route;
pub mod split;
pub mod strategy;
pub mod summary;
pub mod token_amount;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use budget::SearchBudget;
pub use engine::RouteEngine;
pub use finder_data::{FinderData, FinderInput};
pub use market::{MarketSnapshot, MarketSnapshotBuilder};
pub use path::Path;
pub use route::Route;
pub use strategy::RouteFinder;
pub use summary::{PathSummary, RouteSummary};
pub use token_amount::TokenAmount;
