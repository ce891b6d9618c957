//! router-api: HTTP quote service
//!
//! Holds the current market snapshot and answers route requests against it.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, MarketError};
