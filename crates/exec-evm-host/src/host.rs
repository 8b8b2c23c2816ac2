//! The host interface an external bytecode interpreter calls into for
//! every instruction that touches chain state (`SLOAD`, `SSTORE`,
//! `BALANCE`, `CREATE`, logs, self-destruct) — this crate never
//! interprets EVM bytecode itself, it only answers these queries.

use crate::block_hashes::BlockHashRing;
use crate::create::{create2_address, create_address};
use exec_primitives::{Address, Hash256, U256};
use exec_state::{Account, StateResult, TransactionState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash256>,
    pub data: Vec<u8>,
}

/// Host-visible storage access classification (EIP-2929): cold accesses
/// cost more than warm ones, and the interpreter needs to know which one
/// just happened to charge the right gas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

pub trait Host {
    fn balance(&mut self, address: &Address) -> StateResult<U256>;
    fn nonce(&mut self, address: &Address) -> StateResult<u64>;
    fn code_hash(&mut self, address: &Address) -> StateResult<Hash256>;
    fn storage(&mut self, address: &Address, slot: Hash256) -> StateResult<(U256, AccessStatus)>;
    fn set_storage(&mut self, address: &Address, slot: Hash256, value: U256) -> StateResult<()>;
    fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> StateResult<()>;
    fn create_address(&mut self, sender: &Address) -> StateResult<Address>;
    fn create2_address(&self, sender: &Address, salt: &Hash256, init_code: &[u8]) -> Address;
    fn block_hash(&self, number: u64) -> Option<Hash256>;
    fn emit_log(&mut self, log: Log);
}

pub struct ExecHost<'a, 'b> {
    state: &'a mut TransactionState<'b>,
    block_hashes: &'a BlockHashRing,
    warm_addresses: std::collections::HashSet<Address>,
    warm_slots: std::collections::HashSet<(Address, Hash256)>,
    pub logs: Vec<Log>,
}

impl<'a, 'b> ExecHost<'a, 'b> {
    pub fn new(state: &'a mut TransactionState<'b>, block_hashes: &'a BlockHashRing) -> Self {
        ExecHost {
            state,
            block_hashes,
            warm_addresses: std::collections::HashSet::new(),
            warm_slots: std::collections::HashSet::new(),
            logs: Vec::new(),
        }
    }
}

impl<'a, 'b> Host for ExecHost<'a, 'b> {
    fn balance(&mut self, address: &Address) -> StateResult<U256> {
        self.warm_addresses.insert(*address);
        Ok(self.state.get_account(address)?.balance)
    }

    fn nonce(&mut self, address: &Address) -> StateResult<u64> {
        Ok(self.state.get_account(address)?.nonce)
    }

    fn code_hash(&mut self, address: &Address) -> StateResult<Hash256> {
        Ok(self.state.get_account(address)?.code_hash)
    }

    fn storage(&mut self, address: &Address, slot: Hash256) -> StateResult<(U256, AccessStatus)> {
        let status = if self.warm_slots.insert((*address, slot)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        };
        Ok((self.state.get_storage(address, slot)?, status))
    }

    fn set_storage(&mut self, address: &Address, slot: Hash256, value: U256) -> StateResult<()> {
        self.state.set_storage(*address, slot, value);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> StateResult<()> {
        if value.is_zero() {
            return Ok(());
        }
        let mut sender = self.state.get_account(from)?;
        sender.balance = sender
            .balance
            .checked_sub(value)
            .ok_or(exec_state::StateError::InsufficientBalance {
                address: *from,
                balance: sender.balance,
                required: value,
            })?;
        self.state.set_account(*from, sender);

        let mut recipient = self.state.get_account(to)?;
        recipient.balance = recipient.balance.saturating_add(value);
        self.state.set_account(*to, recipient);
        Ok(())
    }

    fn create_address(&mut self, sender: &Address) -> StateResult<Address> {
        let account = self.state.get_account(sender)?;
        Ok(create_address(sender, account.nonce))
    }

    fn create2_address(&self, sender: &Address, salt: &Hash256, init_code: &[u8]) -> Address {
        create2_address(sender, salt, init_code)
    }

    fn block_hash(&self, number: u64) -> Option<Hash256> {
        self.block_hashes.get(number)
    }

    fn emit_log(&mut self, log: Log) {
        self.logs.push(log);
    }
}

/// Apply the sender's intrinsic nonce bump + gas-cost debit for a
/// transaction before any EVM execution begins. `required_balance` (gas
/// cost plus call value) gates whether the sender can afford the
/// transaction at all; only `gas_cost` is actually deducted here, since the
/// call's value moves during EVM execution itself (`Host::transfer`).
pub fn apply_sender_prelude(
    state: &mut TransactionState<'_>,
    sender: &Address,
    nonce: u64,
    required_balance: U256,
    gas_cost: U256,
) -> StateResult<Account> {
    let mut account = state.get_account(sender)?;
    if account.nonce != nonce {
        return Err(exec_state::StateError::NonceMismatch {
            address: *sender,
            expected: account.nonce,
            found: nonce,
        });
    }
    if account.balance < required_balance {
        return Err(exec_state::StateError::InsufficientBalance {
            address: *sender,
            balance: account.balance,
            required: required_balance,
        });
    }
    account.nonce += 1;
    account.balance = account.balance - gas_cost;
    state.set_account(*sender, account.clone());
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exec_state::BlockState;

    #[test]
    fn transfer_moves_balance_between_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let from = Address([1; 20]);
        let to = Address([2; 20]);
        block
            .put_account(&from, &Account { balance: U256::from_u64(100), ..Account::empty() })
            .unwrap();

        let ring = BlockHashRing::new();
        let mut tx = TransactionState::new(&mut block);
        {
            let mut host = ExecHost::new(&mut tx, &ring);
            host.transfer(&from, &to, U256::from_u64(40)).unwrap();
        }
        assert_eq!(tx.get_account(&from).unwrap().balance, U256::from_u64(60));
        assert_eq!(tx.get_account(&to).unwrap().balance, U256::from_u64(40));
    }

    #[test]
    fn transfer_rejects_insufficient_balance() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let from = Address([3; 20]);
        let to = Address([4; 20]);
        let ring = BlockHashRing::new();
        let mut tx = TransactionState::new(&mut block);
        let mut host = ExecHost::new(&mut tx, &ring);
        assert!(host.transfer(&from, &to, U256::from_u64(1)).is_err());
    }

    #[test]
    fn sender_prelude_rejects_nonce_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = BlockState::open(dir.path()).unwrap();
        let sender = Address([5; 20]);
        let mut tx = TransactionState::new(&mut block);
        let err = apply_sender_prelude(&mut tx, &sender, 3, U256::ZERO, U256::ZERO).unwrap_err();
        assert!(matches!(err, exec_state::StateError::NonceMismatch { .. }));
    }
}
