//! Pair event records
//!
//! Every reserve-affecting operation on a pair produces one of these records
//! after it commits. `Sync` is emitted whenever reserves are rewritten, so an
//! indexer that only follows `Sync` always knows the current reserves; the
//! other variants describe who moved what.

use crate::common::identifiers::Address;
use serde::{Deserialize, Serialize};

/// Structured event describing a committed pair operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PairEvent {
    /// Liquidity added; `shares` were credited to `to`
    Mint {
        sender: Address,
        to: Address,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },

    /// Liquidity removed; both payouts were transferred to `to`
    Burn {
        sender: Address,
        to: Address,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },

    Swap {
        sender: Address,
        to: Address,
        amount_a_in: u128,
        amount_b_in: u128,
        amount_a_out: u128,
        amount_b_out: u128,
    },

    /// Reserves after the update
    Sync { reserve_a: u128, reserve_b: u128 },
}

impl PairEvent {
    /// Short lowercase name, matching the serialized `event` tag
    pub fn name(&self) -> &'static str {
        match self {
            PairEvent::Mint { .. } => "mint",
            PairEvent::Burn { .. } => "burn",
            PairEvent::Swap { .. } => "swap",
            PairEvent::Sync { .. } => "sync",
        }
    }

    /// JSON encoding for log shipping and off-chain indexers
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
