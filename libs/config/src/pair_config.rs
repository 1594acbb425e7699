//! Pair Configuration Module
//!
//! Provides configuration loading for pair engines.
//! Supports loading from TOML files with environment-specific overrides.

use crate::logging::LoggingConfig;
use crate::protocol::{self, defaults};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main pair configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PairConfig {
    /// Trading parameters
    pub pair: PairSection,

    /// Optional protocol fee on liquidity growth
    pub protocol_fee: ProtocolFeeSection,

    pub logging: LoggingConfig,
}

/// Trading parameters of a pair
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PairSection {
    /// Swap fee in basis points
    pub fee_bps: u32,

    /// Shares locked forever on the first deposit
    ///
    /// Held as `u64` because the config deserializer has no `u128` support;
    /// the engine widens it.
    pub minimum_liquidity: u64,
}

/// Protocol fee settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProtocolFeeSection {
    pub enabled: bool,

    /// Hex address receiving protocol fee shares
    pub fee_to: Option<String>,

    /// `fee_to` receives 1/(divisor + 1) of √k growth
    pub divisor: u32,
}

impl Default for PairSection {
    fn default() -> Self {
        Self {
            fee_bps: protocol::DEFAULT_FEE_BPS,
            minimum_liquidity: protocol::MINIMUM_LIQUIDITY as u64,
        }
    }
}

impl Default for ProtocolFeeSection {
    fn default() -> Self {
        Self {
            enabled: false,
            fee_to: None,
            divisor: protocol::DEFAULT_PROTOCOL_FEE_DIVISOR,
        }
    }
}

impl PairConfig {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist; the default path is optional and
    /// falls back to built-in defaults. An `environment` overlay is read from
    /// `environments/<env>.toml` next to the base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(defaults::CONFIG_PATH), false),
        };

        debug!("Loading pair config from {:?} (required: {})", base, required);
        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(required));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = Self::environment_file(&base, env);

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (PAIR__ prefix)
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn environment_file(base: &Path, environment: &str) -> PathBuf {
        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join("environments"),
            _ => PathBuf::from(defaults::ENVIRONMENTS_DIR),
        };
        dir.join(format!("{}.toml", environment))
    }

    /// Reject values no pair can run with
    pub fn validate(&self) -> Result<()> {
        if self.pair.fee_bps >= protocol::FEE_DENOMINATOR {
            bail!(
                "fee_bps {} must be below {}",
                self.pair.fee_bps,
                protocol::FEE_DENOMINATOR
            );
        }
        if self.protocol_fee.enabled {
            if self.protocol_fee.divisor == 0 {
                bail!("protocol_fee.divisor must be nonzero");
            }
            if self.protocol_fee.fee_to.is_none() {
                bail!("protocol_fee.enabled requires protocol_fee.fee_to");
            }
        }
        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(environment: Option<&str>) -> Result<PairConfig> {
    PairConfig::load(None, environment)
}
