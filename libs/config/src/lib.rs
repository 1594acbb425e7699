//! # Pair Engine Configuration
//!
//! This crate provides the protocol constants and the layered configuration
//! used to build a pair engine, plus the logging bootstrap shared by every
//! host that embeds one.
//!
//! ## Features
//!
//! - **Protocol Constants**: fee denominator, minimum locked liquidity, reserve width
//! - **Pair Configuration**: TOML file + environment overlay + `PAIR__` env vars
//! - **Logging**: `tracing-subscriber` setup driven by the same configuration
//!
//! ## Usage
//!
//! ```rust
//! use pair_config::{protocol, PairConfig};
//!
//! let config = PairConfig::default();
//! assert_eq!(config.pair.fee_bps, protocol::DEFAULT_FEE_BPS);
//! assert_eq!(u128::from(config.pair.minimum_liquidity), protocol::MINIMUM_LIQUIDITY);
//! ```

pub mod logging;
pub mod pair_config;
pub mod protocol;

// Re-export commonly used types
pub use logging::{init_logging, LoggingConfig};
pub use pair_config::{load_config, PairConfig, PairSection, ProtocolFeeSection};
