//! Protocol constants for constant-product pairs
//!
//! Values every pair agrees on unless its configuration overrides them.

/// Shares permanently locked to the zero address on the first deposit
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Swap fee in basis points (30 = 0.3%)
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Denominator for basis-point fees
pub const FEE_DENOMINATOR: u32 = 10_000;

/// Protocol fee divisor: `fee_to` receives 1/(divisor + 1) of √k growth
pub const DEFAULT_PROTOCOL_FEE_DIVISOR: u32 = 5;

/// Reserve and oracle widths
pub mod width {
    /// Reserves are bounded to 112 bits so that UQ112x112 prices fit in 224 bits
    pub const RESERVE_BITS: u32 = 112;

    /// Largest representable reserve
    pub const MAX_RESERVE: u128 = (1u128 << RESERVE_BITS) - 1;
}

/// Configuration defaults
pub mod defaults {
    /// Default configuration file
    pub const CONFIG_PATH: &str = "config/pair.toml";

    /// Directory holding per-environment overlays
    pub const ENVIRONMENTS_DIR: &str = "config/environments";

    /// Prefix for environment variable overrides (`PAIR__PAIR__FEE_BPS=25`)
    pub const ENV_PREFIX: &str = "PAIR";

    /// Default log filter
    pub const LOG_LEVEL: &str = "info";
}
