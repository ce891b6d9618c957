//! Data Transfer Objects for API requests and responses
//!
//! Token amounts travel as decimal strings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use amm::{ConstantProductPool, PmmQuoter};
use finder::{FinderInput, MarketSnapshot, RouteSummary};
use num_bigint::BigUint;
use router_core::{NativePrice, SwapLimit, Token, TokenId};
use serde::{Deserialize, Serialize};

use crate::state::MarketError;

/// Health check response with the loaded market's size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub strategy: String,
    pub pools: usize,
    pub tokens: usize,
    pub quote_timeout_ms: u64,
}

impl HealthResponse {
    pub fn new(strategy: &str, market: &MarketSnapshot, quote_timeout_ms: u64) -> Self {
        Self {
            status: if market.pool_count() == 0 { "no_market" } else { "ok" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            strategy: strategy.to_string(),
            pools: market.pool_count(),
            tokens: market.token_count(),
            quote_timeout_ms,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

fn parse_amount(field: &str, value: &str) -> Result<BigUint, MarketError> {
    value.trim().parse().map_err(|_| MarketError::InvalidAmount {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn default_fee_num() -> u32 {
    997
}

fn default_fee_denom() -> u32 {
    1000
}

/// Pool description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolDto {
    ConstantProduct {
        address: String,
        token_x: String,
        reserve_x: String,
        token_y: String,
        reserve_y: String,
        #[serde(default = "default_fee_num")]
        fee_num: u32,
        #[serde(default = "default_fee_denom")]
        fee_denom: u32,
        #[serde(default)]
        gas: Option<i64>,
    },
    Pmm {
        address: String,
        base: String,
        quote: String,
        /// Quote units per base unit, numerator
        rate_num: String,
        rate_denom: String,
        #[serde(default)]
        gas: Option<i64>,
    },
}

impl PoolDto {
    fn address(&self) -> &str {
        match self {
            Self::ConstantProduct { address, .. } | Self::Pmm { address, .. } => address,
        }
    }

    fn tokens(&self) -> [&str; 2] {
        match self {
            Self::ConstantProduct { token_x, token_y, .. } => [token_x.as_str(), token_y.as_str()],
            Self::Pmm { base, quote, .. } => [base.as_str(), quote.as_str()],
        }
    }
}

/// Inventory of one pool type, amounts by token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapLimitDto {
    pub pool_type: String,
    pub inventory: HashMap<String, String>,
}

/// PUT /market body: replaces the whole snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRequest {
    pub tokens: Vec<Token>,
    /// USD price per whole token
    #[serde(default)]
    pub prices: HashMap<String, f64>,
    #[serde(default)]
    pub native_prices: HashMap<String, NativePrice>,
    pub pools: Vec<PoolDto>,
    #[serde(default)]
    pub swap_limits: Vec<SwapLimitDto>,
}

impl MarketRequest {
    pub fn into_snapshot(self) -> Result<Arc<MarketSnapshot>, MarketError> {
        let known: HashSet<TokenId> = self.tokens.iter().map(|t| t.id.clone()).collect();
        let mut builder = MarketSnapshot::builder();

        for token in self.tokens {
            builder = builder.token(token);
        }
        for (token, price) in self.prices {
            builder = builder.price(token, price);
        }
        for (token, price) in self.native_prices {
            builder = builder.native_price(token, price);
        }

        for pool in self.pools {
            for token in pool.tokens() {
                if !known.contains(&TokenId::new(token)) {
                    return Err(MarketError::UnknownToken {
                        pool: pool.address().to_string(),
                        token: token.to_string(),
                    });
                }
            }
            builder = match pool {
                PoolDto::ConstantProduct {
                    address,
                    token_x,
                    reserve_x,
                    token_y,
                    reserve_y,
                    fee_num,
                    fee_denom,
                    gas,
                } => {
                    let reserve_x = parse_amount("reserve_x", &reserve_x)?;
                    let reserve_y = parse_amount("reserve_y", &reserve_y)?;
                    let mut pool = ConstantProductPool::new(address, token_x, reserve_x, token_y, reserve_y)
                        .with_fee(fee_num, fee_denom);
                    if let Some(gas) = gas {
                        pool = pool.with_gas(gas);
                    }
                    builder.pool(pool)
                }
                PoolDto::Pmm {
                    address,
                    base,
                    quote,
                    rate_num,
                    rate_denom,
                    gas,
                } => {
                    let rate_num = parse_amount("rate_num", &rate_num)?;
                    let rate_denom = parse_amount("rate_denom", &rate_denom)?;
                    let mut pool = PmmQuoter::new(address, base, quote, rate_num, rate_denom);
                    if let Some(gas) = gas {
                        pool = pool.with_gas(gas);
                    }
                    builder.pool(pool)
                }
            };
        }

        for limit in self.swap_limits {
            let mut swap_limit = SwapLimit::new(limit.pool_type);
            for (token, amount) in limit.inventory {
                let amount = parse_amount("inventory", &amount)?;
                swap_limit = swap_limit.with_balance(token, amount);
            }
            builder = builder.swap_limit(swap_limit);
        }

        Ok(builder.build())
    }
}

/// PUT /market response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResponse {
    pub pools: usize,
    pub tokens: usize,
}

fn default_gas_price() -> String {
    "0".to_string()
}

fn default_true() -> bool {
    true
}

/// POST /route body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    /// Native wei per gas unit
    #[serde(default = "default_gas_price")]
    pub gas_price: String,
    #[serde(default)]
    pub gas_token_price_usd: f64,
    #[serde(default)]
    pub save_gas: bool,
    #[serde(default = "default_true")]
    pub gas_include: bool,
}

impl RouteRequest {
    pub fn to_input(&self) -> Result<FinderInput, MarketError> {
        let amount_in = parse_amount("amount_in", &self.amount_in)?;
        let gas_price = parse_amount("gas_price", &self.gas_price)?;
        Ok(FinderInput::new(self.token_in.as_str(), self.token_out.as_str(), amount_in)
            .with_gas(gas_price, self.gas_token_price_usd)
            .save_gas(self.save_gas)
            .gas_include(self.gas_include))
    }
}

/// POST /route response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub strategy: String,
    pub route: RouteSummary,
}
