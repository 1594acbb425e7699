//! Shared fixtures for pair integration tests

#![allow(dead_code)]

use pair_amm::{
    AssetLedger, Direction, FlashSwap, FlashSwapCallee, InMemoryLedger, ManualClock, Pair,
    PairSettings, RecordingEventSink, Result, ShareLedger, SwapOutcome, V2Math,
};
use pair_config::LoggingConfig;
use pair_types::Address;
use std::sync::Arc;

pub const START_TIME: u64 = 1_700_000_000;
pub const PROVIDER: Address = Address([0x1f; 20]);

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn init_test_logging() {
    pair_config::init_logging(&LoggingConfig {
        level: "pair_amm=debug".to_string(),
        json: false,
    });
}

/// An initialized pair on its own ledger, clock and event recorder
pub struct PairFixture {
    pub pair: Arc<Pair>,
    pub ledger: Arc<InMemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<RecordingEventSink>,
    pub factory: Address,
    pub asset_a: Address,
    pub asset_b: Address,
}

impl PairFixture {
    pub fn new() -> Self {
        Self::with_settings(PairSettings::default())
    }

    pub fn with_settings(settings: PairSettings) -> Self {
        init_test_logging();

        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::new(START_TIME));
        let events = Arc::new(RecordingEventSink::new());
        let factory = addr(0xf0);

        let pair = Pair::new(
            addr(0xaa),
            factory,
            ledger.clone(),
            clock.clone(),
            events.clone(),
            settings,
        )
        .expect("valid settings");

        let (asset_a, asset_b) = pair
            .initialize(factory, addr(0x1b), addr(0x1a))
            .expect("fresh pair");

        Self {
            pair: Arc::new(pair),
            ledger,
            clock,
            events,
            factory,
            asset_a,
            asset_b,
        }
    }

    /// Fresh pair seeded with the given reserves by [`PROVIDER`]
    pub fn seeded(reserve_a: u128, reserve_b: u128) -> Self {
        let fixture = Self::new();
        fixture
            .add_liquidity(PROVIDER, reserve_a, reserve_b)
            .expect("seed liquidity");
        fixture.events.take();
        fixture
    }

    pub fn address(&self) -> Address {
        self.pair.address()
    }

    pub fn fund(&self, who: Address, amount_a: u128, amount_b: u128) {
        self.ledger.credit(self.asset_a, who, amount_a).unwrap();
        self.ledger.credit(self.asset_b, who, amount_b).unwrap();
    }

    pub fn balance_a(&self, who: Address) -> u128 {
        self.ledger.balance_of(self.asset_a, who)
    }

    pub fn balance_b(&self, who: Address) -> u128 {
        self.ledger.balance_of(self.asset_b, who)
    }

    pub fn shares_of(&self, who: Address) -> u128 {
        self.ledger.balance_of(self.address(), who)
    }

    /// Donate assets to the pair without telling it
    pub fn donate(&self, amount_a: u128, amount_b: u128) {
        self.fund(self.address(), amount_a, amount_b);
    }

    /// Fund `who`, transfer both amounts into the pair and mint to `who`
    pub fn add_liquidity(&self, who: Address, amount_a: u128, amount_b: u128) -> Result<u128> {
        self.fund(who, amount_a, amount_b);
        self.ledger
            .transfer(self.asset_a, who, self.address(), amount_a)?;
        self.ledger
            .transfer(self.asset_b, who, self.address(), amount_b)?;
        self.pair.mint(who, who)
    }

    /// Send `shares` back to the pair and burn them to `who`
    pub fn remove_liquidity(&self, who: Address, shares: u128) -> Result<(u128, u128)> {
        self.ledger
            .transfer(self.address(), who, self.address(), shares)?;
        self.pair.burn(who, who)
    }

    /// Fund `who` with `amount_in`, pay it in and take the quoted output
    pub fn swap_exact_in(
        &self,
        who: Address,
        amount_in: u128,
        direction: Direction,
    ) -> Result<SwapOutcome> {
        let amount_out = self.pair.quote_amount_out(amount_in, direction)?;
        let (asset_in, outputs) = match direction {
            Direction::AToB => (self.asset_a, (0, amount_out)),
            Direction::BToA => (self.asset_b, (amount_out, 0)),
        };
        self.ledger.credit(asset_in, who, amount_in)?;
        self.ledger
            .transfer(asset_in, who, self.address(), amount_in)?;
        self.pair.swap(who, outputs.0, outputs.1, who, None)
    }

    pub fn flash_swap(
        &self,
        who: Address,
        amount_a_out: u128,
        amount_b_out: u128,
        flash: FlashSwap<'_>,
    ) -> Result<SwapOutcome> {
        self.pair.swap(who, amount_a_out, amount_b_out, who, Some(flash))
    }

    /// Ledger total supply of shares matches the pair's own count
    pub fn share_supply_matches(&self) -> bool {
        self.ledger.total_shares(self.address()) == self.pair.total_shares()
    }
}

impl Default for PairFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Flash-swap callee that repays the quoted input out of `payer`'s balance
///
/// `overpay` is added on top of the quote; a negative adjustment is expressed
/// with `underpay`.
pub struct Repayer {
    pub ledger: Arc<InMemoryLedger>,
    pub payer: Address,
    pub overpay: u128,
    pub underpay: u128,
}

impl Repayer {
    pub fn exact(ledger: Arc<InMemoryLedger>, payer: Address) -> Self {
        Self {
            ledger,
            payer,
            overpay: 0,
            underpay: 0,
        }
    }
}

impl FlashSwapCallee for Repayer {
    fn on_flash_swap(
        &self,
        pair: &Pair,
        _sender: Address,
        amount_a_out: u128,
        amount_b_out: u128,
        _data: &[u8],
    ) -> anyhow::Result<()> {
        let (asset_a, asset_b) = pair.assets().ok_or_else(|| anyhow::anyhow!("uninitialized"))?;
        let reserves = pair.reserves();
        let fee_bps = pair.settings().fee_bps;

        // Pay the other side for whatever was taken
        let (asset_in, owed) = if amount_b_out > 0 {
            (
                asset_a,
                V2Math::get_amount_in(amount_b_out, reserves.reserve_a, reserves.reserve_b, fee_bps)?,
            )
        } else {
            (
                asset_b,
                V2Math::get_amount_in(amount_a_out, reserves.reserve_b, reserves.reserve_a, fee_bps)?,
            )
        };

        let owed = (owed + self.overpay).saturating_sub(self.underpay);
        self.ledger
            .transfer(asset_in, self.payer, pair.address(), owed)?;
        Ok(())
    }
}
