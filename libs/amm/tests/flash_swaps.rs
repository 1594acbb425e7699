//! Flash swaps: optimistic payout, callee repayment, rollback and reentrancy

mod common;

use common::{addr, PairFixture, Repayer};
use pair_amm::{AssetLedger, FlashSwap, FlashSwapCallee, InMemoryLedger, Pair, PairError};
use pair_types::Address;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_flash_swap_repaid_in_other_asset() {
    let fixture = PairFixture::seeded(1_000, 4_000);
    let borrower = addr(0xb0);
    fixture.fund(borrower, 26, 0);

    let callee = Repayer::exact(fixture.ledger.clone(), borrower);
    let outcome = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&callee, b"arb"))
        .unwrap();

    assert_eq!(outcome.amount_a_in, 26);
    assert_eq!(fixture.balance_a(borrower), 0);
    assert_eq!(fixture.balance_b(borrower), 100);
    let reserves = fixture.pair.reserves();
    assert_eq!((reserves.reserve_a, reserves.reserve_b), (1_026, 3_900));
}

/// Returns what it borrowed plus `extra` of the same asset
struct SameAssetRepayer {
    ledger: Arc<InMemoryLedger>,
    payer: Address,
    asset: Address,
    extra: u128,
}

impl FlashSwapCallee for SameAssetRepayer {
    fn on_flash_swap(
        &self,
        pair: &Pair,
        _sender: Address,
        _amount_a_out: u128,
        amount_b_out: u128,
        _data: &[u8],
    ) -> anyhow::Result<()> {
        self.ledger
            .transfer(self.asset, self.payer, pair.address(), amount_b_out + self.extra)?;
        Ok(())
    }
}

#[test]
fn test_flash_loan_repaid_in_same_asset_pays_fee() {
    let fixture = PairFixture::seeded(1_000, 4_000);
    let borrower = addr(0xb0);
    fixture.fund(borrower, 0, 10);

    // Returning 100 for 100 borrowed does not cover the fee
    let stingy = SameAssetRepayer {
        ledger: fixture.ledger.clone(),
        payer: borrower,
        asset: fixture.asset_b,
        extra: 0,
    };
    let err = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&stingy, &[]))
        .unwrap_err();
    assert!(matches!(err, PairError::InvariantViolation));
    assert_eq!(fixture.balance_b(borrower), 10);

    let fair = SameAssetRepayer { extra: 1, ..stingy };
    let outcome = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&fair, &[]))
        .unwrap();
    assert_eq!(outcome.amount_b_in, 101);
    assert_eq!(fixture.pair.reserves().reserve_b, 4_001);
    assert_eq!(fixture.balance_b(borrower), 9);
}

#[test]
fn test_unpaid_flash_swap_reverts_everything() {
    let fixture = PairFixture::seeded(1_000, 4_000);
    let borrower = addr(0xb0);
    fixture.fund(borrower, 100, 0);
    let before = fixture.pair.state();

    let callee = Repayer {
        underpay: 1,
        ..Repayer::exact(fixture.ledger.clone(), borrower)
    };
    let err = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&callee, &[]))
        .unwrap_err();

    assert!(matches!(err, PairError::InvariantViolation));
    assert_eq!(fixture.pair.state(), before);
    assert_eq!(fixture.balance_a(borrower), 100);
    assert_eq!(fixture.balance_b(borrower), 0);
    assert_eq!(fixture.balance_a(fixture.address()), 1_000);
    assert_eq!(fixture.balance_b(fixture.address()), 4_000);
    assert!(fixture.events.is_empty());
}

/// Pays part of its debt and then gives up
struct FailingCallee {
    ledger: Arc<InMemoryLedger>,
    payer: Address,
    asset: Address,
}

impl FlashSwapCallee for FailingCallee {
    fn on_flash_swap(
        &self,
        pair: &Pair,
        _sender: Address,
        _amount_a_out: u128,
        _amount_b_out: u128,
        _data: &[u8],
    ) -> anyhow::Result<()> {
        self.ledger
            .transfer(self.asset, self.payer, pair.address(), 10)?;
        anyhow::bail!("route no longer profitable")
    }
}

#[test]
fn test_callee_error_reverts_callee_transfers() {
    let fixture = PairFixture::seeded(1_000, 4_000);
    let borrower = addr(0xb0);
    fixture.fund(borrower, 50, 0);

    let callee = FailingCallee {
        ledger: fixture.ledger.clone(),
        payer: borrower,
        asset: fixture.asset_a,
    };
    let err = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&callee, &[]))
        .unwrap_err();

    match err {
        PairError::FlashSwapFailed(source) => {
            assert!(source.to_string().contains("no longer profitable"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.balance_a(borrower), 50);
    assert_eq!(fixture.balance_b(borrower), 0);
    assert_eq!(fixture.balance_a(fixture.address()), 1_000);
}

/// Tries every mutating entry point from inside the callback
struct ReentrantCallee {
    rejected: Mutex<Vec<&'static str>>,
}

impl ReentrantCallee {
    fn new() -> Self {
        Self {
            rejected: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, operation: &'static str, result: Result<(), PairError>) {
        if matches!(result, Err(PairError::Reentrancy)) {
            self.rejected.lock().push(operation);
        }
    }
}

impl FlashSwapCallee for ReentrantCallee {
    fn on_flash_swap(
        &self,
        pair: &Pair,
        sender: Address,
        _amount_a_out: u128,
        amount_b_out: u128,
        _data: &[u8],
    ) -> anyhow::Result<()> {
        // Reads are fine
        assert_eq!(pair.reserves().reserve_b, 4_000);
        pair.observe()?;

        self.record("mint", pair.mint(sender, sender).map(drop));
        self.record("burn", pair.burn(sender, sender).map(drop));
        self.record("sync", pair.sync(sender).map(drop));
        self.record("skim", pair.skim(sender, sender).map(drop));

        pair.swap(sender, 0, amount_b_out, sender, None)?;
        Ok(())
    }
}

#[test]
fn test_reentry_from_callback_is_rejected() {
    let fixture = PairFixture::seeded(1_000, 4_000);
    let borrower = addr(0xb0);
    let before = fixture.pair.state();

    let callee = ReentrantCallee::new();
    let err = fixture
        .flash_swap(borrower, 0, 100, FlashSwap::new(&callee, &[]))
        .unwrap_err();

    assert_eq!(
        *callee.rejected.lock(),
        vec!["mint", "burn", "sync", "skim"]
    );
    match err {
        PairError::FlashSwapFailed(source) => assert!(matches!(
            source.downcast_ref::<PairError>(),
            Some(PairError::Reentrancy)
        )),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(fixture.pair.state(), before);
    assert_eq!(fixture.balance_b(borrower), 0);

    // The guard is released once the outer call returns
    fixture.pair.sync(borrower).unwrap();
}

#[test]
fn test_callee_sees_payload() {
    struct Checker;

    impl FlashSwapCallee for Checker {
        fn on_flash_swap(
            &self,
            _pair: &Pair,
            sender: Address,
            amount_a_out: u128,
            amount_b_out: u128,
            data: &[u8],
        ) -> anyhow::Result<()> {
            anyhow::ensure!(sender == Address::from_low_u64(0xb0), "wrong sender");
            anyhow::ensure!((amount_a_out, amount_b_out) == (5, 0), "wrong amounts");
            anyhow::ensure!(data == b"payload", "wrong data");
            anyhow::bail!("checked")
        }
    }

    let fixture = PairFixture::seeded(1_000, 4_000);
    let err = fixture
        .flash_swap(addr(0xb0), 5, 0, FlashSwap::new(&Checker, b"payload"))
        .unwrap_err();

    match err {
        PairError::FlashSwapFailed(source) => assert_eq!(source.to_string(), "checked"),
        other => panic!("unexpected error: {other}"),
    }
}
