//! Configuration types for the router

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Path search and splitting parameters shared by every strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Maximum pools in a single path
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Split granularity in percent of the input (must divide 100)
    #[serde(default = "default_distribution_percent")]
    pub distribution_percent: u32,

    /// Maximum distinct paths in one route
    #[serde(default = "default_max_paths_in_route")]
    pub max_paths_in_route: usize,

    /// Nodes kept per token per layer during path generation
    #[serde(default = "default_max_paths")]
    pub max_paths_to_generate: usize,

    /// Destination paths kept per hop length
    #[serde(default = "default_max_paths")]
    pub max_paths_to_return: usize,

    /// Smallest USD value of a single split portion
    #[serde(default = "default_min_part_usd")]
    pub min_part_usd: f64,

    /// Inputs worth less than this (USD) are routed through a single path
    #[serde(default)]
    pub min_threshold_amount_in_usd: f64,

    /// Inputs worth more than this (USD) are routed through a single path
    #[serde(default = "default_max_threshold_usd")]
    pub max_threshold_amount_in_usd: f64,
}

fn default_max_hops() -> usize {
    3
}

fn default_distribution_percent() -> u32 {
    5
}

fn default_max_paths_in_route() -> usize {
    20
}

fn default_max_paths() -> usize {
    5
}

fn default_min_part_usd() -> f64 {
    500.0
}

fn default_max_threshold_usd() -> f64 {
    1e15
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            distribution_percent: default_distribution_percent(),
            max_paths_in_route: default_max_paths_in_route(),
            max_paths_to_generate: default_max_paths(),
            max_paths_to_return: default_max_paths(),
            min_part_usd: default_min_part_usd(),
            min_threshold_amount_in_usd: 0.0,
            max_threshold_amount_in_usd: default_max_threshold_usd(),
        }
    }
}

impl FinderConfig {
    /// Whether an input worth `amount_usd` may be split across paths.
    pub fn allows_split(&self, amount_usd: f64) -> bool {
        amount_usd >= self.min_threshold_amount_in_usd
            && amount_usd <= self.max_threshold_amount_in_usd
    }
}

/// Local refinement of a multi-path route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillClimbConfig {
    /// Step size when moving amount between neighbouring paths
    #[serde(default = "default_hill_climb_distribution")]
    pub distribution_percent: u32,

    /// Full passes over the neighbouring pairs
    #[serde(default = "default_hill_climb_iterations")]
    pub iterations: usize,

    /// Smallest USD value a donor path may be left with
    #[serde(default = "default_min_part_usd")]
    pub min_part_usd: f64,
}

fn default_hill_climb_distribution() -> u32 {
    1
}

fn default_hill_climb_iterations() -> usize {
    2
}

impl Default for HillClimbConfig {
    fn default() -> Self {
        Self {
            distribution_percent: default_hill_climb_distribution(),
            iterations: default_hill_climb_iterations(),
            min_part_usd: default_min_part_usd(),
        }
    }
}

/// Exhaustive enumeration of split compositions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BruteforceConfig {
    /// Maximum portions in one composition
    #[serde(default = "default_max_parts")]
    pub max_parts: usize,

    /// Stop after this many compositions (unbounded when absent)
    #[serde(default)]
    pub max_compositions: Option<usize>,
}

fn default_max_parts() -> usize {
    3
}

impl Default for BruteforceConfig {
    fn default() -> Self {
        Self {
            max_parts: default_max_parts(),
            max_compositions: None,
        }
    }
}

/// Combinatorial assembly of pool-disjoint paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniswapConfig {
    /// Best paths kept per percentage level
    #[serde(default = "default_max_paths")]
    pub paths_per_level: usize,

    /// Partial assemblies kept per search layer
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,

    /// Complete routes returned
    #[serde(default = "default_max_routes")]
    pub max_routes: usize,
}

fn default_beam_width() -> usize {
    50
}

fn default_max_routes() -> usize {
    3
}

impl Default for UniswapConfig {
    fn default() -> Self {
        Self {
            paths_per_level: default_max_paths(),
            beam_width: default_beam_width(),
            max_routes: default_max_routes(),
        }
    }
}

/// Dynamic-pool substitution after the main search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pool types treated as dynamic in addition to pools that declare it
    #[serde(default = "default_dynamic_pool_types")]
    pub dynamic_pool_types: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_dynamic_pool_types() -> Vec<String> {
    vec!["pmm".to_string()]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dynamic_pool_types: default_dynamic_pool_types(),
        }
    }
}

/// Which search strategy the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Single,
    Greedy,
    #[default]
    Lazy,
    Bruteforce,
    HillClimb,
    Uniswap,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub finder: FinderConfig,

    #[serde(default)]
    pub strategy: StrategyKind,

    #[serde(default)]
    pub hill_climb: HillClimbConfig,

    #[serde(default)]
    pub bruteforce: BruteforceConfig,

    #[serde(default)]
    pub uniswap: UniswapConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Upper bound on a single route search, in milliseconds
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
}

fn default_api_port() -> u16 {
    19080
}

fn default_quote_timeout_ms() -> u64 {
    1500
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            finder: FinderConfig::default(),
            strategy: StrategyKind::default(),
            hill_climb: HillClimbConfig::default(),
            bruteforce: BruteforceConfig::default(),
            uniswap: UniswapConfig::default(),
            retry: RetryConfig::default(),
            api_port: default_api_port(),
            quote_timeout_ms: default_quote_timeout_ms(),
        }
    }
}

fn check_distribution(name: &str, percent: u32) -> Result<(), ConfigError> {
    if percent == 0 || percent > 100 || 100 % percent != 0 {
        return Err(ConfigError::Invalid(format!(
            "{name} must divide 100, got {percent}"
        )));
    }
    Ok(())
}

impl RouterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.finder;
        check_distribution("finder.distribution_percent", f.distribution_percent)?;
        check_distribution(
            "hill_climb.distribution_percent",
            self.hill_climb.distribution_percent,
        )?;

        if f.max_hops == 0 {
            return Err(ConfigError::Invalid("finder.max_hops must be positive".into()));
        }
        if f.max_paths_to_generate == 0 || f.max_paths_to_return == 0 {
            return Err(ConfigError::Invalid(
                "finder path counts must be positive".into(),
            ));
        }
        if f.max_paths_in_route == 0 {
            return Err(ConfigError::Invalid(
                "finder.max_paths_in_route must be positive".into(),
            ));
        }
        if f.min_threshold_amount_in_usd > f.max_threshold_amount_in_usd {
            return Err(ConfigError::Invalid(
                "finder thresholds are inverted".into(),
            ));
        }
        if self.bruteforce.max_parts == 0 {
            return Err(ConfigError::Invalid(
                "bruteforce.max_parts must be positive".into(),
            ));
        }
        if self.uniswap.beam_width == 0 || self.uniswap.max_routes == 0 {
            return Err(ConfigError::Invalid(
                "uniswap beam and route counts must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.finder.max_hops, 3);
        assert_eq!(config.finder.distribution_percent, 5);
        assert_eq!(config.finder.max_paths_in_route, 20);
        assert_eq!(config.strategy, StrategyKind::Lazy);
        assert_eq!(config.retry.dynamic_pool_types, vec!["pmm".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = RouterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = RouterConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed =
            RouterConfig::from_json_str(r#"{"strategy":"hill_climb","finder":{"max_hops":2}}"#)
                .unwrap();
        assert_eq!(parsed.strategy, StrategyKind::HillClimb);
        assert_eq!(parsed.finder.max_hops, 2);
        assert_eq!(parsed.finder.min_part_usd, 500.0);
        assert_eq!(parsed.hill_climb.iterations, 2);
    }

    #[test]
    fn test_rejects_distribution_not_dividing_100() {
        let err = RouterConfig::from_json_str(r#"{"finder":{"distribution_percent":7}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_split_threshold_window() {
        let config = FinderConfig {
            min_threshold_amount_in_usd: 10.0,
            max_threshold_amount_in_usd: 1000.0,
            ..Default::default()
        };
        assert!(!config.allows_split(5.0));
        assert!(config.allows_split(10.0));
        assert!(config.allows_split(1000.0));
        assert!(!config.allows_split(1000.5));
    }
}
