//! Logging bootstrap
//!
//! Hosts embedding a pair call [`init_logging`] once at startup. The filter
//! comes from `RUST_LOG` when set, otherwise from the configured level.

use crate::protocol::defaults;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging section of the pair configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `pair_amm=debug`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(defaults::LOG_LEVEL))
    }
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed (tests call this
/// repeatedly).
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(config.filter());

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.is_ok()
}
