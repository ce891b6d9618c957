//! Error types for the router

use thiserror::Error;

use crate::types::PoolId;

/// Errors raised by the route finder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FinderError {
    #[error("No token metadata for {token}")]
    NoInfoForToken { token: String },

    #[error("Pool {pool} is missing from the snapshot")]
    NoPoolForAddress { pool: String },

    #[error("Invalid swap through {pool}: {reason}")]
    InvalidSwap { pool: String, reason: String },

    #[error("Route not found")]
    RouteNotFound,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Search cancelled")]
    Cancelled,
}

/// Errors a pool simulator returns from a quote
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Token {token} cannot be swapped in this pool")]
    InvalidToken { token: String },

    #[error("Insufficient liquidity: {reason}")]
    InsufficientLiquidity { reason: String },

    #[error("Swap limit exceeded for {token}: need {required}, have {available}")]
    SwapLimitExceeded {
        token: String,
        required: String,
        available: String,
    },

    #[error("Amount must be positive")]
    ZeroAmount,
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for finder operations
pub type Result<T> = std::result::Result<T, FinderError>;

impl FinderError {
    pub fn invalid_swap(pool: &PoolId, err: &PoolError) -> Self {
        Self::InvalidSwap {
            pool: pool.to_string(),
            reason: err.to_string(),
        }
    }

    /// Fatal errors abort the whole request; the rest only drop a candidate.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidSwap { .. })
    }

    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoInfoForToken { .. } => "no_info_for_token",
            Self::NoPoolForAddress { .. } => "no_pool_for_address",
            Self::InvalidSwap { .. } => "invalid_swap",
            Self::RouteNotFound => "route_not_found",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Cancelled => "cancelled",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoInfoForToken { .. } => 400,
            Self::InvalidConfig(_) => 400,
            Self::RouteNotFound | Self::InvalidSwap { .. } => 422,
            Self::NoPoolForAddress { .. } => 500,
            Self::Cancelled => 504,
        }
    }
}

impl From<ConfigError> for FinderError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_error_codes() {
        let err = FinderError::NoInfoForToken { token: "a".into() };
        assert_eq!(err.error_code(), "no_info_for_token");
        assert_eq!(err.status_code(), 400);

        let err = FinderError::RouteNotFound;
        assert_eq!(err.error_code(), "route_not_found");
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.to_string(), "Route not found");
    }

    #[test]
    fn test_invalid_swap_is_not_fatal() {
        let err = FinderError::invalid_swap(&PoolId::new("p1"), &PoolError::ZeroAmount);
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("p1"));
        assert!(FinderError::Cancelled.is_fatal());
    }
}
