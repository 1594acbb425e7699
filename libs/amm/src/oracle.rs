//! Time-weighted price oracle
//!
//! Before reserves change, each accumulator grows by the price that held over
//! the elapsed interval multiplied by the interval length. Accumulators wrap at
//! 2^256: a consumer samples twice and divides the wrapped difference by the
//! elapsed time to get a TWAP that a single block of trading cannot move much.
//!
//! `price_a` is the price of asset a in units of b (`reserve_b / reserve_a`),
//! `price_b` the inverse.

use crate::error::{PairError, Result};
use crate::state::PairState;
use ethnum::U256;
use pair_config::protocol::width::MAX_RESERVE;
use pair_types::UQ112x112;
use rust_decimal::Decimal;
use tracing::trace;

/// Fold the interval since `last_update` into the accumulators and move
/// `last_update` to `now`. Uses the reserves currently in `state`.
pub fn accumulate(state: &mut PairState, now: u64) -> Result<()> {
    let elapsed = now.saturating_sub(state.last_update);

    if elapsed > 0 && state.reserve_a != 0 && state.reserve_b != 0 {
        let price_a = UQ112x112::ratio(state.reserve_b, state.reserve_a)?;
        let price_b = UQ112x112::ratio(state.reserve_a, state.reserve_b)?;

        state.price_a_cumulative = state
            .price_a_cumulative
            .wrapping_add(price_a.wrapping_mul_u64(elapsed));
        state.price_b_cumulative = state
            .price_b_cumulative
            .wrapping_add(price_b.wrapping_mul_u64(elapsed));

        trace!(elapsed, %price_a, %price_b, "oracle accumulated");
    }

    state.last_update = now;
    Ok(())
}

/// Record new reserves, accumulating the old ones first
///
/// Fails with `Overflow` if a balance does not fit the 112-bit reserve width.
pub fn record_reserves(state: &mut PairState, balance_a: u128, balance_b: u128, now: u64) -> Result<()> {
    if balance_a > MAX_RESERVE || balance_b > MAX_RESERVE {
        return Err(PairError::Overflow);
    }
    accumulate(state, now)?;
    state.reserve_a = balance_a;
    state.reserve_b = balance_b;
    Ok(())
}

/// A sample of both accumulators at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleObservation {
    pub timestamp: u64,
    pub price_a_cumulative: U256,
    pub price_b_cumulative: U256,
}

/// Average prices over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwapPrice {
    pub price_a: UQ112x112,
    pub price_b: UQ112x112,
    pub window: u64,
}

impl TwapPrice {
    pub fn price_a_decimal(&self) -> Result<Decimal> {
        Ok(self.price_a.to_decimal()?)
    }

    pub fn price_b_decimal(&self) -> Result<Decimal> {
        Ok(self.price_b.to_decimal()?)
    }
}

impl OracleObservation {
    /// Accumulators as they would read at `now`, without touching state
    pub fn current(state: &PairState, now: u64) -> Result<Self> {
        let mut projected = state.clone();
        accumulate(&mut projected, now.max(state.last_update))?;
        Ok(Self {
            timestamp: projected.last_update,
            price_a_cumulative: projected.price_a_cumulative,
            price_b_cumulative: projected.price_b_cumulative,
        })
    }

    /// Time-weighted average prices between `self` and a `later` observation
    pub fn twap(&self, later: &OracleObservation) -> Result<TwapPrice> {
        if later.timestamp <= self.timestamp {
            return Err(PairError::OracleWindowEmpty {
                earlier: self.timestamp,
                later: later.timestamp,
            });
        }

        let window = later.timestamp - self.timestamp;
        let span = U256::from(window as u128);

        Ok(TwapPrice {
            price_a: UQ112x112(
                later.price_a_cumulative.wrapping_sub(self.price_a_cumulative) / span,
            ),
            price_b: UQ112x112(
                later.price_b_cumulative.wrapping_sub(self.price_b_cumulative) / span,
            ),
            window,
        })
    }
}
