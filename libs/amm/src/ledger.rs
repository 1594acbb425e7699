//! Asset and share ledgers
//!
//! The pair never keeps its own book of balances beyond its reserve cache. It
//! reads what it custodies from an [`AssetLedger`], pays out through it, and
//! issues liquidity shares through a [`ShareLedger`]. Shares are themselves a
//! fungible asset whose identity is the pair's own address.
//!
//! [`Ledger`] adds checkpoints so that a failed operation can undo every
//! transfer it (or a flash-swap callee) made, which is how the engine keeps
//! operations all-or-nothing.

use pair_types::Address;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance of {asset} held by {holder}: available {available}, required {required}")]
    InsufficientBalance {
        asset: Address,
        holder: Address,
        available: u128,
        required: u128,
    },

    #[error("Balance or supply overflow for {asset}")]
    Overflow { asset: Address },
}

/// Balance queries and transfers of the two tradable assets
pub trait AssetLedger: Send + Sync {
    fn balance_of(&self, asset: Address, holder: Address) -> u128;

    fn transfer(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError>;
}

/// Issuance and destruction of liquidity shares for a pair
pub trait ShareLedger: Send + Sync {
    fn mint_shares(&self, pair: Address, to: Address, amount: u128) -> Result<(), LedgerError>;

    fn burn_shares(&self, pair: Address, from: Address, amount: u128) -> Result<(), LedgerError>;

    fn total_shares(&self, pair: Address) -> u128;
}

/// Opaque marker returned by [`Ledger::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// A ledger that can roll back to a checkpoint
///
/// Checkpoints nest: every `checkpoint` must be closed by exactly one `commit`
/// or `revert_to`, innermost first, on the thread that opened it. Reverting
/// must only undo changes made by that thread; writes from elsewhere are
/// either kept out of the window or survive the revert.
pub trait Ledger: AssetLedger + ShareLedger {
    fn checkpoint(&self) -> Checkpoint;

    /// Keep every change made since `checkpoint`
    fn commit(&self, checkpoint: Checkpoint);

    /// Undo every change made since `checkpoint`
    fn revert_to(&self, checkpoint: Checkpoint);
}

#[derive(Debug, Clone, Copy)]
enum JournalEntry {
    Balance {
        asset: Address,
        holder: Address,
        previous: u128,
    },
    Supply {
        asset: Address,
        previous: u128,
    },
}

#[derive(Debug, Default)]
struct LedgerBook {
    balances: HashMap<(Address, Address), u128>,
    supplies: HashMap<Address, u128>,
    journal: Vec<JournalEntry>,
    open_checkpoints: usize,
    /// Thread holding the open checkpoints, if any
    owner: Option<ThreadId>,
}

impl LedgerBook {
    fn balance(&self, asset: Address, holder: Address) -> u128 {
        self.balances.get(&(asset, holder)).copied().unwrap_or(0)
    }

    fn supply(&self, asset: Address) -> u128 {
        self.supplies.get(&asset).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, asset: Address, holder: Address, value: u128) {
        let previous = self.balance(asset, holder);
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry::Balance {
                asset,
                holder,
                previous,
            });
        }
        self.balances.insert((asset, holder), value);
    }

    fn set_supply(&mut self, asset: Address, value: u128) {
        let previous = self.supply(asset);
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry::Supply { asset, previous });
        }
        self.supplies.insert(asset, value);
    }

    fn debit(&mut self, asset: Address, holder: Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance(asset, holder);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                asset,
                holder,
                available,
                required: amount,
            })?;
        self.set_balance(asset, holder, remaining);
        Ok(())
    }

    fn credit(&mut self, asset: Address, holder: Address, amount: u128) -> Result<(), LedgerError> {
        let updated = self
            .balance(asset, holder)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { asset })?;
        self.set_balance(asset, holder, updated);
        Ok(())
    }

    fn issue(&mut self, asset: Address, to: Address, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .supply(asset)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { asset })?;
        self.credit(asset, to, amount)?;
        self.set_supply(asset, supply);
        Ok(())
    }

    fn destroy(&mut self, asset: Address, from: Address, amount: u128) -> Result<(), LedgerError> {
        self.debit(asset, from, amount)?;
        let supply = self.supply(asset).saturating_sub(amount);
        self.set_supply(asset, supply);
        Ok(())
    }

    /// Returns true once the outermost checkpoint is closed
    fn close_checkpoint(&mut self) -> bool {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
            self.owner = None;
            return true;
        }
        false
    }
}

/// Reference in-memory ledger for embedding and tests
///
/// Holds balances of any number of assets, including the share asset of any
/// number of pairs. An open checkpoint belongs to the thread that opened it:
/// writes from that thread (a flash-swap callee included) are journaled, while
/// writers on other threads wait until the outermost checkpoint closes. A
/// revert therefore never touches a transfer that another caller saw succeed.
/// Reads are never blocked and may observe uncommitted balances.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    book: Mutex<LedgerBook>,
    released: Condvar,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` out of thin air for `holder`
    pub fn credit(&self, asset: Address, holder: Address, amount: u128) -> Result<(), LedgerError> {
        self.write().issue(asset, holder, amount)
    }

    /// Circulating supply of an asset (shares included)
    pub fn supply_of(&self, asset: Address) -> u128 {
        self.book.lock().supply(asset)
    }

    /// Lock the book for writing, waiting out checkpoints held by other threads
    fn write(&self) -> MutexGuard<'_, LedgerBook> {
        let me = thread::current().id();
        let mut book = self.book.lock();
        while book.owner.is_some_and(|owner| owner != me) {
            trace!("ledger write waiting for open checkpoint");
            self.released.wait(&mut book);
        }
        book
    }

    fn close(&self, mut book: MutexGuard<'_, LedgerBook>) {
        if book.close_checkpoint() {
            drop(book);
            self.released.notify_all();
        }
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: Address, holder: Address) -> u128 {
        self.book.lock().balance(asset, holder)
    }

    fn transfer(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut book = self.write();
        if from != to && book.balance(asset, to).checked_add(amount).is_none() {
            return Err(LedgerError::Overflow { asset });
        }
        book.debit(asset, from, amount)?;
        book.credit(asset, to, amount)?;
        trace!(%asset, %from, %to, amount, "ledger transfer");
        Ok(())
    }
}

impl ShareLedger for InMemoryLedger {
    fn mint_shares(&self, pair: Address, to: Address, amount: u128) -> Result<(), LedgerError> {
        self.write().issue(pair, to, amount)
    }

    fn burn_shares(&self, pair: Address, from: Address, amount: u128) -> Result<(), LedgerError> {
        self.write().destroy(pair, from, amount)
    }

    fn total_shares(&self, pair: Address) -> u128 {
        self.book.lock().supply(pair)
    }
}

impl Ledger for InMemoryLedger {
    fn checkpoint(&self) -> Checkpoint {
        let mut book = self.write();
        book.owner = Some(thread::current().id());
        book.open_checkpoints += 1;
        Checkpoint(book.journal.len())
    }

    fn commit(&self, _checkpoint: Checkpoint) {
        let book = self.write();
        self.close(book);
    }

    fn revert_to(&self, checkpoint: Checkpoint) {
        let mut book = self.write();
        while book.journal.len() > checkpoint.0 {
            match book.journal.pop() {
                Some(JournalEntry::Balance {
                    asset,
                    holder,
                    previous,
                }) => {
                    book.balances.insert((asset, holder), previous);
                }
                Some(JournalEntry::Supply { asset, previous }) => {
                    book.supplies.insert(asset, previous);
                }
                None => break,
            }
        }
        self.close(book);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::from_low_u64(0x70)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let ledger = InMemoryLedger::new();
        let (alice, bob) = (Address::from_low_u64(1), Address::from_low_u64(2));
        ledger.credit(token(), alice, 100).unwrap();

        ledger.transfer(token(), alice, bob, 40).unwrap();

        assert_eq!(ledger.balance_of(token(), alice), 60);
        assert_eq!(ledger.balance_of(token(), bob), 40);
        assert_eq!(ledger.supply_of(token()), 100);
    }

    #[test]
    fn test_transfer_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        let alice = Address::from_low_u64(1);
        ledger.credit(token(), alice, 10).unwrap();

        let err = ledger
            .transfer(token(), alice, Address::from_low_u64(2), 11)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                available: 10,
                required: 11,
                ..
            }
        ));
        assert_eq!(ledger.balance_of(token(), alice), 10);
    }

    #[test]
    fn test_revert_restores_balances_and_supply() {
        let ledger = InMemoryLedger::new();
        let pair = Address::from_low_u64(0xaa);
        let alice = Address::from_low_u64(1);
        ledger.credit(token(), alice, 100).unwrap();

        let checkpoint = ledger.checkpoint();
        ledger.transfer(token(), alice, pair, 100).unwrap();
        ledger.mint_shares(pair, alice, 50).unwrap();
        ledger.revert_to(checkpoint);

        assert_eq!(ledger.balance_of(token(), alice), 100);
        assert_eq!(ledger.balance_of(token(), pair), 0);
        assert_eq!(ledger.total_shares(pair), 0);
        assert_eq!(ledger.balance_of(pair, alice), 0);
    }

    #[test]
    fn test_nested_checkpoints_unwind_innermost_only() {
        let ledger = InMemoryLedger::new();
        let (alice, bob) = (Address::from_low_u64(1), Address::from_low_u64(2));
        ledger.credit(token(), alice, 100).unwrap();

        let outer = ledger.checkpoint();
        ledger.transfer(token(), alice, bob, 10).unwrap();

        let inner = ledger.checkpoint();
        ledger.transfer(token(), alice, bob, 20).unwrap();
        ledger.revert_to(inner);

        assert_eq!(ledger.balance_of(token(), bob), 10);

        ledger.commit(outer);
        assert_eq!(ledger.balance_of(token(), bob), 10);
        assert_eq!(ledger.balance_of(token(), alice), 90);
    }

    #[test]
    fn test_other_threads_wait_for_open_checkpoint() {
        let ledger = InMemoryLedger::new();
        let (alice, bob, carol) = (
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            Address::from_low_u64(3),
        );
        let other = Address::from_low_u64(0x71);
        ledger.credit(token(), alice, 100).unwrap();
        ledger.credit(other, alice, 100).unwrap();

        thread::scope(|scope| {
            let checkpoint = ledger.checkpoint();
            ledger.transfer(token(), alice, carol, 30).unwrap();

            let writer = scope.spawn(|| ledger.transfer(other, alice, bob, 50));
            std::thread::sleep(std::time::Duration::from_millis(20));
            assert_eq!(ledger.balance_of(other, bob), 0);

            ledger.revert_to(checkpoint);
            writer.join().unwrap().unwrap();
        });

        assert_eq!(ledger.balance_of(token(), carol), 0);
        assert_eq!(ledger.balance_of(token(), alice), 100);
        assert_eq!(ledger.balance_of(other, bob), 50);
        assert_eq!(ledger.balance_of(other, alice), 50);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let ledger = InMemoryLedger::new();
        let pair = Address::from_low_u64(0xaa);
        ledger.mint_shares(pair, pair, 70).unwrap();
        ledger.burn_shares(pair, pair, 30).unwrap();

        assert_eq!(ledger.total_shares(pair), 40);
        assert!(ledger.burn_shares(pair, pair, 41).is_err());
    }
}
