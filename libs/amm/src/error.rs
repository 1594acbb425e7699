//! Pair engine errors
//!
//! Every variant aborts the current operation only. Nothing is retried and no
//! partial state is ever committed.

use crate::ledger::LedgerError;
use pair_types::FixedPointError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairError {
    #[error("Pair already initialized")]
    AlreadyInitialized,

    #[error("Pair not initialized")]
    NotInitialized,

    #[error("Only the factory may initialize this pair")]
    Forbidden,

    #[error("Pair assets must differ")]
    IdenticalAssets,

    #[error("Pair asset cannot be the zero address")]
    ZeroAddress,

    #[error("Insufficient initial liquidity: sqrt(a*b) = {root}, minimum {minimum}")]
    InsufficientInitialLiquidity { root: u128, minimum: u128 },

    #[error("Insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    #[error("Insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    #[error("Insufficient output amount")]
    InsufficientOutputAmount,

    #[error("Insufficient liquidity: requested {requested}, reserve {reserve}")]
    InsufficientLiquidity { requested: u128, reserve: u128 },

    #[error("Insufficient input amount")]
    InsufficientInputAmount,

    #[error("Swap recipient cannot be a pair asset")]
    InvalidRecipient,

    #[error("Constant-product invariant violated")]
    InvariantViolation,

    #[error("Reentrant call into pair")]
    Reentrancy,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Oracle window is empty: observations at {earlier} and {later}")]
    OracleWindowEmpty { earlier: u64, later: u64 },

    #[error("Invalid pair settings: {0}")]
    InvalidSettings(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),

    #[error("Flash swap callback failed: {0}")]
    FlashSwapFailed(#[source] anyhow::Error),
}

pub type Result<T, E = PairError> = std::result::Result<T, E>;
