//! A transaction's private view of state: reads fall through to the
//! block's committed state, writes buffer locally until the scheduler
//! decides the transaction can merge. Two transactions that ran
//! speculatively in parallel can both hold one of these at once, each
//! unaware of the other's buffered writes — conflict detection at merge
//! time is what keeps that safe.

use crate::access_set::AccessSet;
use crate::account::Account;
use crate::block_state::BlockState;
use crate::error::StateResult;
use exec_primitives::{Address, Hash256, U256};
use std::collections::HashMap;

/// A transaction's buffered writes, detached from the [`BlockState`] it was
/// computed against. The speculative-execution phase produces one of these
/// per transaction and never applies it directly; the block executor's
/// serial commit phase calls [`Overlay::apply`] against the *real* state
/// only once [`AccessSet::can_merge_after`] confirms it's safe.
pub struct Overlay {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, Hash256), U256>,
}

impl Overlay {
    pub fn apply(self, state: &mut BlockState) -> StateResult<()> {
        for (address, account) in self.accounts {
            state.put_account(&address, &account)?;
        }
        for ((address, slot), value) in self.storage {
            state.put_storage(&address, slot, value)?;
        }
        Ok(())
    }
}

pub struct TransactionState<'a> {
    base: &'a mut BlockState,
    account_overlay: HashMap<Address, Account>,
    storage_overlay: HashMap<(Address, Hash256), U256>,
    pub access: AccessSet,
}

impl<'a> TransactionState<'a> {
    pub fn new(base: &'a mut BlockState) -> Self {
        TransactionState {
            base,
            account_overlay: HashMap::new(),
            storage_overlay: HashMap::new(),
            access: AccessSet::new(),
        }
    }

    pub fn get_account(&mut self, address: &Address) -> StateResult<Account> {
        if let Some(account) = self.account_overlay.get(address) {
            return Ok(account.clone());
        }
        self.access.record_read(*address, None);
        Ok(self.base.get_account(address)?.unwrap_or_else(Account::empty))
    }

    pub fn set_account(&mut self, address: Address, account: Account) {
        self.access.record_write(address, None);
        self.account_overlay.insert(address, account);
    }

    pub fn get_storage(&mut self, address: &Address, slot: Hash256) -> StateResult<U256> {
        if let Some(value) = self.storage_overlay.get(&(*address, slot)) {
            return Ok(*value);
        }
        self.access.record_read(*address, Some(slot));
        self.base.get_storage(address, slot)
    }

    pub fn set_storage(&mut self, address: Address, slot: Hash256, value: U256) {
        self.access.record_write(address, Some(slot));
        self.storage_overlay.insert((address, slot), value);
    }

    /// True if nothing this transaction read was written by `already_merged`
    /// — i.e. re-running it wouldn't have observed different values, so its
    /// buffered writes can be folded into the block as-is.
    pub fn can_merge(&self, already_merged: &AccessSet) -> bool {
        self.access.can_merge_after(already_merged)
    }

    /// Fold buffered writes directly into whatever [`BlockState`] this
    /// transaction ran against. Only correct when that base is the block's
    /// real, canonical state — a transaction that ran speculatively against
    /// a [`BlockState::snapshot`] must go through [`Self::into_overlay`]
    /// instead, since merging here would write through the snapshot's
    /// shared chunk log without the executor's conflict check ever running.
    pub fn merge(self) -> StateResult<AccessSet> {
        for (address, account) in self.account_overlay {
            self.base.put_account(&address, &account)?;
        }
        for ((address, slot), value) in self.storage_overlay {
            self.base.put_storage(&address, slot, value)?;
        }
        Ok(self.access)
    }

    /// Detach this transaction's buffered writes from whatever base it ran
    /// against, without applying them. The block executor's speculative
    /// phase uses this so a snapshot's borrow ends here instead of escaping
    /// into a later merge call.
    pub fn into_overlay(self) -> (Overlay, AccessSet) {
        (
            Overlay {
                accounts: self.account_overlay,
                storage: self.storage_overlay,
            },
            self.access,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fall_through_to_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let addr = Address([1; 20]);
        block
            .put_account(&addr, &Account { nonce: 3, ..Account::empty() })
            .unwrap();

        let mut tx = TransactionState::new(&mut block);
        assert_eq!(tx.get_account(&addr).unwrap().nonce, 3);
    }

    #[test]
    fn writes_are_visible_within_the_same_transaction_before_merge() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let addr = Address([2; 20]);

        let mut tx = TransactionState::new(&mut block);
        tx.set_account(addr, Account { nonce: 9, ..Account::empty() });
        assert_eq!(tx.get_account(&addr).unwrap().nonce, 9);
    }

    #[test]
    fn merge_commits_writes_to_block_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let addr = Address([3; 20]);
        {
            let mut tx = TransactionState::new(&mut block);
            tx.set_account(addr, Account { nonce: 1, ..Account::empty() });
            tx.merge().unwrap();
        }
        assert_eq!(block.get_account(&addr).unwrap().unwrap().nonce, 1);
    }

    #[test]
    fn can_merge_false_when_a_read_was_written_by_an_earlier_commit() {
        let addr = Address([4; 20]);
        let mut earlier = AccessSet::new();
        earlier.record_write(addr, None);

        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let mut tx = TransactionState::new(&mut block);
        tx.access.record_read(addr, None);
        assert!(!tx.can_merge(&earlier));
    }
}
