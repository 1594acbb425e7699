//! Swap executor
//!
//! A swap pays out first and asks questions later: the requested outputs are
//! transferred to the recipient, an optional flash-swap callee runs, and only
//! then does the pair look at what it holds. Whatever arrived is the input;
//! the fee-adjusted balances must keep `reserve_a * reserve_b` from shrinking.
//!
//! Stages, in order:
//! `ReservesChecked → OptimisticTransferSent → CallbackInvoked →
//! BalancesRevalidated → InvariantChecked → Committed`.
//! The pair's reentrancy guard is held across all of them.

use crate::error::{PairError, Result};
use crate::pair::Pair;
use crate::state::PairState;
use ethnum::U256;
use pair_config::protocol::{width::MAX_RESERVE, FEE_DENOMINATOR};
use pair_types::Address;
use std::fmt;
use tracing::{trace, warn};

/// Receiver of a flash swap
///
/// Called after the outputs have been sent and before the invariant is
/// checked. The callee repays through its own ledger handle. Calling back
/// into `mint`, `burn`, `swap`, `sync` or `skim` on the same pair fails with
/// `Reentrancy`; read-only queries are allowed.
pub trait FlashSwapCallee {
    fn on_flash_swap(
        &self,
        pair: &Pair,
        sender: Address,
        amount_a_out: u128,
        amount_b_out: u128,
        data: &[u8],
    ) -> anyhow::Result<()>;
}

/// Callback request attached to a swap
#[derive(Clone, Copy)]
pub struct FlashSwap<'a> {
    pub callee: &'a dyn FlashSwapCallee,
    pub data: &'a [u8],
}

impl<'a> FlashSwap<'a> {
    pub fn new(callee: &'a dyn FlashSwapCallee, data: &'a [u8]) -> Self {
        Self { callee, data }
    }
}

impl fmt::Debug for FlashSwap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashSwap")
            .field("data_len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    ReservesChecked,
    OptimisticTransferSent,
    CallbackInvoked,
    BalancesRevalidated,
    InvariantChecked,
    Committed,
}

/// Tracks how far a swap got, for diagnostics on abort
#[derive(Debug)]
pub struct SwapExecution {
    stage: Option<SwapStage>,
}

impl SwapExecution {
    pub fn new() -> Self {
        Self { stage: None }
    }

    pub fn stage(&self) -> Option<SwapStage> {
        self.stage
    }

    pub fn advance(&mut self, next: SwapStage) {
        trace!(from = ?self.stage, to = ?next, "swap stage");
        self.stage = Some(next);
    }

    /// Log the abort with the last stage reached and hand the error back
    pub fn abort(&self, error: PairError) -> PairError {
        warn!(stage = ?self.stage, %error, "swap aborted");
        error
    }
}

impl Default for SwapExecution {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a committed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount_a_in: u128,
    pub amount_b_in: u128,
    pub reserve_a: u128,
    pub reserve_b: u128,
}

/// Preconditions checked before anything is transferred
pub fn check_request(
    state: &PairState,
    amount_a_out: u128,
    amount_b_out: u128,
    to: Address,
) -> Result<()> {
    let (asset_a, asset_b) = state.assets()?;

    if amount_a_out == 0 && amount_b_out == 0 {
        return Err(PairError::InsufficientOutputAmount);
    }
    if amount_a_out >= state.reserve_a && amount_a_out > 0 {
        return Err(PairError::InsufficientLiquidity {
            requested: amount_a_out,
            reserve: state.reserve_a,
        });
    }
    if amount_b_out >= state.reserve_b && amount_b_out > 0 {
        return Err(PairError::InsufficientLiquidity {
            requested: amount_b_out,
            reserve: state.reserve_b,
        });
    }
    if to == asset_a || to == asset_b {
        return Err(PairError::InvalidRecipient);
    }
    Ok(())
}

/// What arrived for one asset: `balance - (reserve - out)`, floored at zero
pub fn amount_in(balance: u128, reserve: u128, amount_out: u128) -> u128 {
    balance.saturating_sub(reserve - amount_out)
}

/// Constant-product check after fee
///
/// `(balance_a·D − in_a·fee)·(balance_b·D − in_b·fee) ≥ reserve_a·reserve_b·D²`
/// with `D = 10_000` and `fee` in basis points.
pub fn check_invariant(
    reserve_a: u128,
    reserve_b: u128,
    balance_a: u128,
    balance_b: u128,
    amount_a_in: u128,
    amount_b_in: u128,
    fee_bps: u32,
) -> Result<()> {
    if balance_a > MAX_RESERVE || balance_b > MAX_RESERVE {
        return Err(PairError::Overflow);
    }

    let denominator = U256::from(FEE_DENOMINATOR as u128);
    let fee = U256::from(fee_bps as u128);

    let adjusted_a = U256::from(balance_a) * denominator - U256::from(amount_a_in) * fee;
    let adjusted_b = U256::from(balance_b) * denominator - U256::from(amount_b_in) * fee;

    let after = adjusted_a
        .checked_mul(adjusted_b)
        .ok_or(PairError::Overflow)?;
    let before = U256::from(reserve_a) * U256::from(reserve_b) * denominator * denominator;

    if after < before {
        return Err(PairError::InvariantViolation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> PairState {
        PairState {
            assets: Some((Address::from_low_u64(1), Address::from_low_u64(2))),
            reserve_a: 1000,
            reserve_b: 4000,
            total_shares: 2000,
            ..PairState::default()
        }
    }

    #[test]
    fn test_minimum_input_for_100_out() {
        // 26 of a in for 100 of b out passes, 25 does not
        assert!(check_invariant(1000, 4000, 1026, 3900, 26, 0, 30).is_ok());
        assert!(matches!(
            check_invariant(1000, 4000, 1025, 3900, 25, 0, 30),
            Err(PairError::InvariantViolation)
        ));
    }

    #[test]
    fn test_zero_fee_allows_exact_curve() {
        // 1000 * 4000 = 4_000_000 = 1250 * 3200
        assert!(check_invariant(1000, 4000, 1250, 3200, 250, 0, 0).is_ok());
        assert!(check_invariant(1000, 4000, 1250, 3200, 250, 0, 30).is_err());
    }

    #[test]
    fn test_request_validation() {
        let state = seeded();
        let bob = Address::from_low_u64(0xb0b);

        assert!(matches!(
            check_request(&state, 0, 0, bob),
            Err(PairError::InsufficientOutputAmount)
        ));
        assert!(matches!(
            check_request(&state, 1000, 0, bob),
            Err(PairError::InsufficientLiquidity { requested: 1000, reserve: 1000 })
        ));
        assert!(matches!(
            check_request(&state, 0, 10, Address::from_low_u64(1)),
            Err(PairError::InvalidRecipient)
        ));
        assert!(check_request(&state, 0, 100, bob).is_ok());
        assert!(check_request(&state, 10, 100, bob).is_ok());
    }

    #[test]
    fn test_amount_in_floors_at_zero() {
        assert_eq!(amount_in(1026, 1000, 0), 26);
        assert_eq!(amount_in(3900, 4000, 100), 0);
        assert_eq!(amount_in(3800, 4000, 100), 0);
    }

    #[test]
    fn test_execution_tracks_stage() {
        let mut execution = SwapExecution::new();
        assert_eq!(execution.stage(), None);
        execution.advance(SwapStage::ReservesChecked);
        execution.advance(SwapStage::OptimisticTransferSent);
        assert_eq!(execution.stage(), Some(SwapStage::OptimisticTransferSent));

        let err = execution.abort(PairError::InvariantViolation);
        assert!(matches!(err, PairError::InvariantViolation));
    }
}
