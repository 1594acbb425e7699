//! Pair engine
//!
//! One `Pair` owns the state of one constant-product pool. Every mutating
//! entry point runs through [`Pair::execute`], which
//!
//! 1. takes the pair's reentrant mutex (other threads wait here),
//! 2. raises the entry flag (a flash-swap callee re-entering on the same thread
//!    fails with `Reentrancy`),
//! 3. stages changes on a clone of the state under a ledger checkpoint,
//! 4. swaps the clone in and commits the ledger only if the body succeeded,
//!    otherwise reverts every ledger effect, the callee's included,
//! 5. hands committed events to the sink.
//!
//! The state `RefCell` is never borrowed across ledger or callback calls, so
//! read-only queries stay available to a callee.

use crate::clock::Clock;
use crate::error::{PairError, Result};
use crate::events::EventSink;
use crate::ledger::Ledger;
use crate::liquidity;
use crate::math::V2Math;
use crate::oracle::{self, OracleObservation};
use crate::pool_traits::Direction;
use crate::state::{PairSettings, PairState, Reserves};
use crate::swap::{self, FlashSwap, SwapExecution, SwapOutcome, SwapStage};
use ethnum::U256;
use pair_types::{Address, PairEvent};
use parking_lot::ReentrantMutex;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Guarded {
    state: RefCell<PairState>,
    entered: Cell<bool>,
}

/// Holds the entry flag for the duration of one operation
struct EntryGuard<'a> {
    entered: &'a Cell<bool>,
}

impl<'a> EntryGuard<'a> {
    fn enter(entered: &'a Cell<bool>, pair: Address, operation: &'static str) -> Result<Self> {
        if entered.replace(true) {
            warn!(%pair, operation, "reentrant call rejected");
            return Err(PairError::Reentrancy);
        }
        Ok(Self { entered })
    }
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}

/// A constant-product liquidity pair
pub struct Pair {
    address: Address,
    factory: Address,
    settings: PairSettings,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    inner: ReentrantMutex<Guarded>,
}

impl fmt::Debug for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pair")
            .field("address", &self.address)
            .field("factory", &self.factory)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

impl Pair {
    /// Create an uninitialized pair
    ///
    /// `address` is both the custody identity the pair holds assets under and
    /// the asset id of its liquidity shares. Only `factory` may initialize it.
    pub fn new(
        address: Address,
        factory: Address,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        settings: PairSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            address,
            factory,
            settings,
            ledger,
            clock,
            events,
            inner: ReentrantMutex::new(Guarded {
                state: RefCell::new(PairState::default()),
                entered: Cell::new(false),
            }),
        })
    }

    /// Bind the pair to its two assets, stored in canonical order
    pub fn initialize(
        &self,
        caller: Address,
        asset_a: Address,
        asset_b: Address,
    ) -> Result<(Address, Address)> {
        self.execute("initialize", |state| {
            if caller != self.factory {
                return Err(PairError::Forbidden);
            }
            if state.assets.is_some() {
                return Err(PairError::AlreadyInitialized);
            }
            if asset_a == asset_b {
                return Err(PairError::IdenticalAssets);
            }
            let sorted = if asset_a < asset_b {
                (asset_a, asset_b)
            } else {
                (asset_b, asset_a)
            };
            if sorted.0.is_zero() {
                return Err(PairError::ZeroAddress);
            }

            state.assets = Some(sorted);
            state.last_update = self.clock.now();
            info!(pair = %self.address, asset_a = %sorted.0, asset_b = %sorted.1, "pair initialized");
            Ok((sorted, Vec::new()))
        })
    }

    /// Issue shares to `to` for whatever was deposited since the last update
    pub fn mint(&self, sender: Address, to: Address) -> Result<u128> {
        self.execute("mint", |state| {
            let (asset_a, asset_b) = state.assets()?;
            let balance_a = self.ledger.balance_of(asset_a, self.address);
            let balance_b = self.ledger.balance_of(asset_b, self.address);

            let plan = liquidity::plan_mint(
                state,
                &self.settings,
                balance_a,
                balance_b,
                self.clock.now(),
            )?;

            if let Some(fee) = plan.fee {
                self.ledger.mint_shares(self.address, fee.fee_to, fee.shares)?;
            }
            if plan.locked > 0 {
                self.ledger
                    .mint_shares(self.address, Address::ZERO, plan.locked)?;
            }
            self.ledger.mint_shares(self.address, to, plan.shares)?;

            let events = vec![
                Self::sync_event(state),
                PairEvent::Mint {
                    sender,
                    to,
                    amount_a: plan.amount_a,
                    amount_b: plan.amount_b,
                    shares: plan.shares,
                },
            ];
            Ok((plan.shares, events))
        })
    }

    /// Redeem the shares the pair holds of itself, paying both assets to `to`
    pub fn burn(&self, sender: Address, to: Address) -> Result<(u128, u128)> {
        self.execute("burn", |state| {
            let (asset_a, asset_b) = state.assets()?;
            let balance_a = self.ledger.balance_of(asset_a, self.address);
            let balance_b = self.ledger.balance_of(asset_b, self.address);
            let shares = self.ledger.balance_of(self.address, self.address);

            let (plan, fee_on) =
                liquidity::plan_burn(state, &self.settings, balance_a, balance_b, shares)?;

            if let Some(fee) = plan.fee {
                self.ledger.mint_shares(self.address, fee.fee_to, fee.shares)?;
            }
            self.ledger
                .burn_shares(self.address, self.address, plan.shares)?;
            self.ledger
                .transfer(asset_a, self.address, to, plan.amount_a)?;
            self.ledger
                .transfer(asset_b, self.address, to, plan.amount_b)?;

            let balance_a = self.ledger.balance_of(asset_a, self.address);
            let balance_b = self.ledger.balance_of(asset_b, self.address);
            liquidity::finish_burn(state, balance_a, balance_b, fee_on, self.clock.now())?;

            let events = vec![
                Self::sync_event(state),
                PairEvent::Burn {
                    sender,
                    to,
                    amount_a: plan.amount_a,
                    amount_b: plan.amount_b,
                    shares: plan.shares,
                },
            ];
            Ok(((plan.amount_a, plan.amount_b), events))
        })
    }

    /// Pay out `amount_a_out`/`amount_b_out` to `to` against input that must
    /// be in the pair by the time the invariant is checked
    pub fn swap(
        &self,
        sender: Address,
        amount_a_out: u128,
        amount_b_out: u128,
        to: Address,
        flash: Option<FlashSwap<'_>>,
    ) -> Result<SwapOutcome> {
        self.execute("swap", |state| {
            let mut execution = SwapExecution::new();
            self.run_swap(
                state,
                &mut execution,
                sender,
                amount_a_out,
                amount_b_out,
                to,
                flash,
            )
            .map_err(|e| execution.abort(e))
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_swap(
        &self,
        state: &mut PairState,
        execution: &mut SwapExecution,
        sender: Address,
        amount_a_out: u128,
        amount_b_out: u128,
        to: Address,
        flash: Option<FlashSwap<'_>>,
    ) -> Result<(SwapOutcome, Vec<PairEvent>)> {
        swap::check_request(state, amount_a_out, amount_b_out, to)?;
        let (asset_a, asset_b) = state.assets()?;
        let (reserve_a, reserve_b) = (state.reserve_a, state.reserve_b);
        execution.advance(SwapStage::ReservesChecked);

        if amount_a_out > 0 {
            self.ledger
                .transfer(asset_a, self.address, to, amount_a_out)?;
        }
        if amount_b_out > 0 {
            self.ledger
                .transfer(asset_b, self.address, to, amount_b_out)?;
        }
        execution.advance(SwapStage::OptimisticTransferSent);

        if let Some(flash) = flash {
            flash
                .callee
                .on_flash_swap(self, sender, amount_a_out, amount_b_out, flash.data)
                .map_err(PairError::FlashSwapFailed)?;
            execution.advance(SwapStage::CallbackInvoked);
        }

        let balance_a = self.ledger.balance_of(asset_a, self.address);
        let balance_b = self.ledger.balance_of(asset_b, self.address);
        let amount_a_in = swap::amount_in(balance_a, reserve_a, amount_a_out);
        let amount_b_in = swap::amount_in(balance_b, reserve_b, amount_b_out);
        if amount_a_in == 0 && amount_b_in == 0 {
            return Err(PairError::InsufficientInputAmount);
        }
        execution.advance(SwapStage::BalancesRevalidated);

        swap::check_invariant(
            reserve_a,
            reserve_b,
            balance_a,
            balance_b,
            amount_a_in,
            amount_b_in,
            self.settings.fee_bps,
        )?;
        execution.advance(SwapStage::InvariantChecked);

        oracle::record_reserves(state, balance_a, balance_b, self.clock.now())?;
        execution.advance(SwapStage::Committed);

        let outcome = SwapOutcome {
            amount_a_in,
            amount_b_in,
            reserve_a: state.reserve_a,
            reserve_b: state.reserve_b,
        };
        let events = vec![
            Self::sync_event(state),
            PairEvent::Swap {
                sender,
                to,
                amount_a_in,
                amount_b_in,
                amount_a_out,
                amount_b_out,
            },
        ];
        Ok((outcome, events))
    }

    /// Bring reserves in line with the balances the pair holds
    ///
    /// An empty pool (no shares outstanding) keeps zero reserves; donations
    /// there are picked up by the first mint instead.
    pub fn sync(&self, sender: Address) -> Result<Reserves> {
        self.execute("sync", |state| {
            let (asset_a, asset_b) = state.assets()?;
            let now = self.clock.now();

            if state.is_empty() {
                oracle::accumulate(state, now)?;
            } else {
                let balance_a = self.ledger.balance_of(asset_a, self.address);
                let balance_b = self.ledger.balance_of(asset_b, self.address);
                oracle::record_reserves(state, balance_a, balance_b, now)?;
            }
            debug!(pair = %self.address, %sender, "reserves synced");

            Ok((state.reserves(), vec![Self::sync_event(state)]))
        })
    }

    /// Send any balance above reserves to `to`, leaving reserves as they are
    pub fn skim(&self, sender: Address, to: Address) -> Result<(u128, u128)> {
        self.execute("skim", |state| {
            let (asset_a, asset_b) = state.assets()?;
            let surplus_a = self
                .ledger
                .balance_of(asset_a, self.address)
                .saturating_sub(state.reserve_a);
            let surplus_b = self
                .ledger
                .balance_of(asset_b, self.address)
                .saturating_sub(state.reserve_b);

            if surplus_a > 0 {
                self.ledger.transfer(asset_a, self.address, to, surplus_a)?;
            }
            if surplus_b > 0 {
                self.ledger.transfer(asset_b, self.address, to, surplus_b)?;
            }
            debug!(pair = %self.address, %sender, %to, surplus_a, surplus_b, "surplus skimmed");

            Ok(((surplus_a, surplus_b), Vec::new()))
        })
    }

    /// Largest output for `amount_in` at live reserves
    pub fn quote_amount_out(&self, amount_in: u128, direction: Direction) -> Result<u128> {
        let (reserve_in, reserve_out) = self.oriented_reserves(direction);
        V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.settings.fee_bps)
    }

    /// Smallest input that buys `amount_out` at live reserves
    pub fn quote_amount_in(&self, amount_out: u128, direction: Direction) -> Result<u128> {
        let (reserve_in, reserve_out) = self.oriented_reserves(direction);
        V2Math::get_amount_in(amount_out, reserve_in, reserve_out, self.settings.fee_bps)
    }

    /// Oracle accumulators as of now, including the interval since the last
    /// update
    pub fn observe(&self) -> Result<OracleObservation> {
        let now = self.clock.now();
        self.read(|state| OracleObservation::current(state, now))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn settings(&self) -> &PairSettings {
        &self.settings
    }

    pub fn assets(&self) -> Option<(Address, Address)> {
        self.read(|state| state.assets)
    }

    pub fn asset_a(&self) -> Option<Address> {
        self.assets().map(|(a, _)| a)
    }

    pub fn asset_b(&self) -> Option<Address> {
        self.assets().map(|(_, b)| b)
    }

    pub fn reserves(&self) -> Reserves {
        self.read(PairState::reserves)
    }

    pub fn total_shares(&self) -> u128 {
        self.read(|state| state.total_shares)
    }

    pub fn k_last(&self) -> U256 {
        self.read(|state| state.k_last)
    }

    /// `(price_a_cumulative, price_b_cumulative)` as of the last update
    pub fn price_cumulatives(&self) -> (U256, U256) {
        self.read(|state| (state.price_a_cumulative, state.price_b_cumulative))
    }

    /// Copy of the committed state
    pub fn state(&self) -> PairState {
        self.read(PairState::clone)
    }

    fn oriented_reserves(&self, direction: Direction) -> (u128, u128) {
        let reserves = self.reserves();
        match direction {
            Direction::AToB => (reserves.reserve_a, reserves.reserve_b),
            Direction::BToA => (reserves.reserve_b, reserves.reserve_a),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&PairState) -> T) -> T {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        f(&state)
    }

    fn sync_event(state: &PairState) -> PairEvent {
        PairEvent::Sync {
            reserve_a: state.reserve_a,
            reserve_b: state.reserve_b,
        }
    }

    /// Run one operation atomically: all of `body`'s state and ledger effects,
    /// or none of them
    fn execute<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&mut PairState) -> Result<(T, Vec<PairEvent>)>,
    ) -> Result<T> {
        let guarded = self.inner.lock();
        let _entry = EntryGuard::enter(&guarded.entered, self.address, operation)?;

        let mut staged = guarded.state.borrow().clone();
        let checkpoint = self.ledger.checkpoint();

        match body(&mut staged) {
            Ok((value, events)) => {
                self.ledger.commit(checkpoint);
                debug!(
                    pair = %self.address,
                    operation,
                    reserve_a = staged.reserve_a,
                    reserve_b = staged.reserve_b,
                    total_shares = staged.total_shares,
                    "operation committed"
                );
                *guarded.state.borrow_mut() = staged;

                for event in &events {
                    self.events.emit(self.address, event);
                }
                Ok(value)
            }
            Err(e) => {
                self.ledger.revert_to(checkpoint);
                if matches!(e, PairError::InvariantViolation) {
                    warn!(pair = %self.address, operation, "invariant violated, reverted");
                } else {
                    debug!(pair = %self.address, operation, error = %e, "operation reverted");
                }
                Err(e)
            }
        }
    }
}
