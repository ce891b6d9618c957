//! router-core: Shared types, errors, configuration and the pool interface
//!
//! This crate provides the foundational types used across the router workspace.
//! Pool math lives in protocol crates; they plug in through [`PoolSimulator`].

pub mod config;
pub mod errors;
pub mod pool;
pub mod types;

pub use config::*;
pub use errors::*;
pub use pool::*;
pub use types::*;
