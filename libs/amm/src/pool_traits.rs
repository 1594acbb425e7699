//! Pool trait definitions for quoting against a pair

use crate::error::Result;
use crate::pair::Pair;

/// Which asset goes in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sell asset a for asset b
    AToB,
    /// Sell asset b for asset a
    BToA,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::AToB => Direction::BToA,
            Direction::BToA => Direction::AToB,
        }
    }
}

/// Read-only quoting interface for routers and simulations
pub trait AmmPool {
    /// Calculate output amount for given input
    fn get_amount_out(&self, amount_in: u128, direction: Direction) -> Result<u128>;

    /// Calculate required input for desired output
    fn get_amount_in(&self, amount_out: u128, direction: Direction) -> Result<u128>;

    /// Current reserves as `(reserve_a, reserve_b)`
    fn get_liquidity(&self) -> (u128, u128);

    /// Get fee tier
    fn get_fee_bps(&self) -> u32;
}

impl AmmPool for Pair {
    fn get_amount_out(&self, amount_in: u128, direction: Direction) -> Result<u128> {
        self.quote_amount_out(amount_in, direction)
    }

    fn get_amount_in(&self, amount_out: u128, direction: Direction) -> Result<u128> {
        self.quote_amount_in(amount_out, direction)
    }

    fn get_liquidity(&self) -> (u128, u128) {
        let reserves = self.reserves();
        (reserves.reserve_a, reserves.reserve_b)
    }

    fn get_fee_bps(&self) -> u32 {
        self.settings().fee_bps
    }
}
