//! Liquidity manager: share issuance and redemption
//!
//! Both operations follow the optimistic-transfer pattern: the caller has
//! already moved assets (for mint) or shares (for burn) into the pair, and the
//! engine works out what arrived by comparing ledger balances to reserves.
//!
//! The functions here only stage changes on a `PairState` and return the
//! ledger effects to apply; the pair applies them under a ledger checkpoint.

use crate::error::{PairError, Result};
use crate::math::V2Math;
use crate::oracle;
use crate::state::{PairSettings, PairState};
use ethnum::U256;
use pair_types::Address;
use tracing::debug;

/// Shares owed to the protocol fee recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeMint {
    pub fee_to: Address,
    pub shares: u128,
}

/// Outcome of a mint, with the ledger effects still to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintPlan {
    pub amount_a: u128,
    pub amount_b: u128,
    pub shares: u128,

    /// Minimum liquidity to lock on the first deposit
    pub locked: u128,
    pub fee: Option<FeeMint>,
}

/// Amounts owed for burning `shares`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnPlan {
    pub amount_a: u128,
    pub amount_b: u128,
    pub shares: u128,
    pub fee: Option<FeeMint>,
}

/// Mint protocol fee shares on √k growth since the last liquidity event
///
/// Adds the fee shares to `state.total_shares`. Returns whether protocol fees
/// are on, plus the shares to credit `fee_to` if any are owed.
pub fn accrue_protocol_fee(
    state: &mut PairState,
    settings: &PairSettings,
) -> Result<(bool, Option<FeeMint>)> {
    let Some(protocol_fee) = settings.protocol_fee else {
        if state.k_last != U256::ZERO {
            state.k_last = U256::ZERO;
        }
        return Ok((false, None));
    };

    if state.k_last == U256::ZERO {
        return Ok((true, None));
    }

    let root_k = V2Math::isqrt(state.k());
    let root_k_last = V2Math::isqrt(state.k_last);
    if root_k <= root_k_last {
        return Ok((true, None));
    }

    let numerator = U256::from(state.total_shares) * (root_k - root_k_last);
    let denominator = root_k * U256::from(protocol_fee.divisor as u128) + root_k_last;
    let shares = V2Math::to_u128(numerator / denominator)?;

    if shares == 0 || protocol_fee.fee_to.is_zero() {
        return Ok((true, None));
    }

    state.total_shares = state
        .total_shares
        .checked_add(shares)
        .ok_or(PairError::Overflow)?;
    debug!(fee_to = %protocol_fee.fee_to, shares, "protocol fee accrued");

    Ok((
        true,
        Some(FeeMint {
            fee_to: protocol_fee.fee_to,
            shares,
        }),
    ))
}

/// Stage a mint given the pair's current asset balances
pub fn plan_mint(
    state: &mut PairState,
    settings: &PairSettings,
    balance_a: u128,
    balance_b: u128,
    now: u64,
) -> Result<MintPlan> {
    let amount_a = balance_a.saturating_sub(state.reserve_a);
    let amount_b = balance_b.saturating_sub(state.reserve_b);

    let (fee_on, fee) = accrue_protocol_fee(state, settings)?;

    let (shares, locked) = if state.total_shares == 0 {
        let root = V2Math::to_u128(V2Math::isqrt(V2Math::mul(amount_a, amount_b)))?;
        if root <= settings.minimum_liquidity {
            return Err(PairError::InsufficientInitialLiquidity {
                root,
                minimum: settings.minimum_liquidity,
            });
        }
        (root - settings.minimum_liquidity, settings.minimum_liquidity)
    } else {
        let by_a = V2Math::mul_div(amount_a, state.total_shares, state.reserve_a)?;
        let by_b = V2Math::mul_div(amount_b, state.total_shares, state.reserve_b)?;
        (by_a.min(by_b), 0)
    };

    if shares == 0 {
        return Err(PairError::InsufficientLiquidityMinted);
    }

    state.total_shares = state
        .total_shares
        .checked_add(shares)
        .and_then(|total| total.checked_add(locked))
        .ok_or(PairError::Overflow)?;

    oracle::record_reserves(state, balance_a, balance_b, now)?;
    if fee_on {
        state.k_last = state.k();
    }

    Ok(MintPlan {
        amount_a,
        amount_b,
        shares,
        locked,
        fee,
    })
}

/// Work out payouts for burning `shares` and stage the share reduction
///
/// Reserves are not touched here; the pair records post-payout balances once
/// the transfers have gone through (see [`finish_burn`]).
pub fn plan_burn(
    state: &mut PairState,
    settings: &PairSettings,
    balance_a: u128,
    balance_b: u128,
    shares: u128,
) -> Result<(BurnPlan, bool)> {
    let (fee_on, fee) = accrue_protocol_fee(state, settings)?;

    if state.total_shares == 0 {
        return Err(PairError::InsufficientLiquidityBurned);
    }

    let amount_a = V2Math::mul_div(shares, balance_a, state.total_shares)?;
    let amount_b = V2Math::mul_div(shares, balance_b, state.total_shares)?;
    if amount_a == 0 || amount_b == 0 {
        return Err(PairError::InsufficientLiquidityBurned);
    }

    state.total_shares = state
        .total_shares
        .checked_sub(shares)
        .ok_or(PairError::InsufficientLiquidityBurned)?;

    Ok((
        BurnPlan {
            amount_a,
            amount_b,
            shares,
            fee,
        },
        fee_on,
    ))
}

/// Record reserves after burn payouts have been transferred
pub fn finish_burn(
    state: &mut PairState,
    balance_a: u128,
    balance_b: u128,
    fee_on: bool,
    now: u64,
) -> Result<()> {
    oracle::record_reserves(state, balance_a, balance_b, now)?;
    if fee_on {
        state.k_last = state.k();
    }
    Ok(())
}
