//! # Pair AMM - Constant-Product Pair Engine
//!
//! ## Purpose
//!
//! Core of a two-asset constant-product market maker. A [`Pair`] custodies two
//! assets, issues fungible liquidity shares against deposits, swaps one asset
//! for the other while keeping `reserve_a × reserve_b` from falling after fees,
//! and accumulates time-weighted prices for external consumers.
//!
//! ## Integration Points
//!
//! - **Ledger**: balances and share issuance come from a [`Ledger`]
//!   implementation; [`InMemoryLedger`] is the reference one
//! - **Clock**: oracle timestamps come from a [`Clock`] ([`SystemClock`] or
//!   [`ManualClock`])
//! - **Events**: committed `Mint`/`Burn`/`Swap`/`Sync` events go to an
//!   [`EventSink`]
//! - **Flash swaps**: a [`FlashSwapCallee`] runs between the optimistic payout
//!   and the invariant check
//! - **Configuration**: [`PairSettings`] converts from `pair_config::PairConfig`
//!
//! ## Architecture Role
//!
//! ```text
//!  caller ──transfer──▶ Ledger ◀──balance_of/transfer/mint_shares── Pair
//!     │                                                              │
//!     └──────── mint / burn / swap / sync / skim ───────────────────▶│
//!                                                                    ├─▶ PairState (staged, committed)
//!                                                                    ├─▶ oracle accumulators
//!                                                                    └─▶ EventSink
//! ```
//!
//! ## Precision
//!
//! Integer arithmetic only. Reserves fit 112 bits, products are taken in
//! 256 bits, and prices are UQ112x112 fixed point. `rust_decimal` appears only
//! when converting oracle prices for display.
//!
//! ## Example
//!
//! ```
//! use pair_amm::{InMemoryLedger, ManualClock, Pair, PairSettings, RecordingEventSink};
//! use pair_types::Address;
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(InMemoryLedger::new());
//! let factory = Address::from_low_u64(0xf0);
//! let pair = Pair::new(
//!     Address::from_low_u64(0xaa),
//!     factory,
//!     ledger.clone(),
//!     Arc::new(ManualClock::new(1)),
//!     Arc::new(RecordingEventSink::new()),
//!     PairSettings::default(),
//! )
//! .unwrap();
//!
//! let (a, b) = (Address::from_low_u64(1), Address::from_low_u64(2));
//! pair.initialize(factory, a, b).unwrap();
//!
//! ledger.credit(a, pair.address(), 1_000).unwrap();
//! ledger.credit(b, pair.address(), 4_000).unwrap();
//! let alice = Address::from_low_u64(0xa11ce);
//! assert_eq!(pair.mint(alice, alice).unwrap(), 1_000);
//! ```

pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod liquidity;
pub mod math;
pub mod oracle;
pub mod pair;
pub mod pool_traits;
pub mod state;
pub mod swap;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PairError, Result};
pub use events::{EventSink, RecordingEventSink, TracingEventSink};
pub use ledger::{AssetLedger, Checkpoint, InMemoryLedger, Ledger, LedgerError, ShareLedger};
pub use math::V2Math;
pub use oracle::{OracleObservation, TwapPrice};
pub use pair::Pair;
pub use pool_traits::{AmmPool, Direction};
pub use state::{PairSettings, PairState, ProtocolFee, Reserves};
pub use swap::{FlashSwap, FlashSwapCallee, SwapOutcome, SwapStage};

/// Common types for AMM calculations
pub use ethnum::U256;
pub use rust_decimal::Decimal;
