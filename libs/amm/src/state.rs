//! Pair state store and engine settings
//!
//! `PairState` is plain data. The engine clones it, stages every change on
//! the clone and swaps it in only once all checks have passed.

use crate::error::{PairError, Result};
use ethnum::U256;
use pair_config::protocol::{self, width::MAX_RESERVE};
use pair_config::PairConfig;
use pair_types::Address;
use serde::{Deserialize, Serialize};

/// Protocol fee recipient and share of √k growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFee {
    pub fee_to: Address,

    /// `fee_to` receives 1/(divisor + 1) of √k growth
    pub divisor: u32,
}

/// Engine configuration for a single pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSettings {
    pub fee_bps: u32,
    pub minimum_liquidity: u128,
    pub protocol_fee: Option<ProtocolFee>,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            fee_bps: protocol::DEFAULT_FEE_BPS,
            minimum_liquidity: protocol::MINIMUM_LIQUIDITY,
            protocol_fee: None,
        }
    }
}

impl PairSettings {
    pub fn validate(&self) -> Result<()> {
        if self.fee_bps >= protocol::FEE_DENOMINATOR {
            return Err(PairError::InvalidSettings(format!(
                "fee_bps {} must be below {}",
                self.fee_bps,
                protocol::FEE_DENOMINATOR
            )));
        }
        if let Some(fee) = &self.protocol_fee {
            if fee.divisor == 0 {
                return Err(PairError::InvalidSettings(
                    "protocol fee divisor must be nonzero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<&PairConfig> for PairSettings {
    type Error = PairError;

    fn try_from(config: &PairConfig) -> Result<Self> {
        let protocol_fee = if config.protocol_fee.enabled {
            let fee_to = config
                .protocol_fee
                .fee_to
                .as_deref()
                .ok_or_else(|| PairError::InvalidSettings("protocol fee needs fee_to".to_string()))?;
            let fee_to = Address::from_hex(fee_to)
                .map_err(|e| PairError::InvalidSettings(format!("fee_to: {}", e)))?;
            Some(ProtocolFee {
                fee_to,
                divisor: config.protocol_fee.divisor,
            })
        } else {
            None
        };

        let settings = Self {
            fee_bps: config.pair.fee_bps,
            minimum_liquidity: u128::from(config.pair.minimum_liquidity),
            protocol_fee,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Reserves as last recorded, with the time of that record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub last_update: u64,
}

/// Complete state of a single pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairState {
    /// Canonically ordered assets, `None` until initialized
    pub assets: Option<(Address, Address)>,

    pub reserve_a: u128,
    pub reserve_b: u128,
    pub total_shares: u128,

    /// Wrapping UQ112x112 × seconds accumulators
    pub price_a_cumulative: U256,
    pub price_b_cumulative: U256,
    pub last_update: u64,

    /// reserve_a × reserve_b after the last liquidity event (protocol fee on)
    pub k_last: U256,
}

impl PairState {
    pub fn assets(&self) -> Result<(Address, Address)> {
        self.assets.ok_or(PairError::NotInitialized)
    }

    pub fn reserves(&self) -> Reserves {
        Reserves {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            last_update: self.last_update,
        }
    }

    /// No shares outstanding (and therefore no reserves)
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// Shares exist exactly when both reserves do, and reserves fit 112 bits
    pub fn is_consistent(&self) -> bool {
        let has_shares = self.total_shares > 0;
        let has_reserves = self.reserve_a > 0 && self.reserve_b > 0;
        let no_reserves = self.reserve_a == 0 && self.reserve_b == 0;
        let within_width = self.reserve_a <= MAX_RESERVE && self.reserve_b <= MAX_RESERVE;

        within_width && ((has_shares && has_reserves) || (!has_shares && no_reserves))
    }

    /// Current product of reserves
    pub fn k(&self) -> U256 {
        U256::from(self.reserve_a) * U256::from(self.reserve_b)
    }
}
