//! AMM pool simulators
//!
//! Constant-product pools and a fixed-rate PMM quoter implementing
//! [`router_core::PoolSimulator`], used by the quote service and the
//! finder's tests.

pub mod calculator;
pub mod constant_product;
pub mod pmm;
pub mod threshold;

// Re-exports
pub use calculator::{calculate_output, calculate_price_impact, calculate_rate_output};
pub use constant_product::{ConstantProductPool, CONSTANT_PRODUCT_GAS, CONSTANT_PRODUCT_TYPE};
pub use pmm::{PmmQuoter, PMM_GAS, PMM_TYPE};
pub use threshold::ThresholdPool;
