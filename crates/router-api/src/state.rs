//! Application state shared across API handlers

use std::sync::Arc;

use finder::{MarketSnapshot, RouteEngine};
use router_core::{FinderError, RouterConfig};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors turning a market description into a snapshot
#[derive(Debug, Error)]
pub enum MarketError {
    /// An amount field is not a non-negative integer
    #[error("Invalid amount for {field}: {value:?}")]
    InvalidAmount { field: String, value: String },

    /// A pool references a token that has no metadata
    #[error("Pool {pool} references unknown token {token}")]
    UnknownToken { pool: String, token: String },
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RouterConfig,
    engine: RouteEngine,
    market: RwLock<Arc<MarketSnapshot>>,
}

impl AppState {
    /// Create state with an empty market
    pub fn new(config: RouterConfig) -> Result<Self, FinderError> {
        let engine = RouteEngine::new(config.clone())?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                market: RwLock::new(MarketSnapshot::builder().build()),
            }),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &RouteEngine {
        &self.inner.engine
    }

    /// Current market snapshot
    pub async fn market(&self) -> Arc<MarketSnapshot> {
        self.inner.market.read().await.clone()
    }

    /// Replace the market snapshot. Searches already running keep the old one.
    pub async fn set_market(&self, snapshot: Arc<MarketSnapshot>) {
        let mut market = self.inner.market.write().await;
        *market = snapshot;
    }
}
