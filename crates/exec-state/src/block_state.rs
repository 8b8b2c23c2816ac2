//! Committed state for one block: an accounts trie plus a single shared
//! storage trie keyed by `keccak256(address) || keccak256(slot)`. A real
//! per-account storage subtrie would let each account's root live in its
//! own `Account.storage_root` field independently; this engine folds both
//! into one trie and only materializes `storage_root` lazily (see
//! [`BlockState::storage_root_of`]) since nothing here needs per-account
//! root isolation at commit time, only at header-assembly time.

use crate::account::Account;
use crate::error::{StateError, StateResult};
use exec_crypto::keccak256;
use exec_io::NodeRing;
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::{Decodable, Encodable};
use exec_trie::{Nibbles, TrieEngine};
use std::path::Path;
use std::sync::Arc;

pub struct BlockState {
    accounts: TrieEngine,
    storage: TrieEngine,
}

impl BlockState {
    pub fn open(dir: impl AsRef<Path>) -> StateResult<Self> {
        let dir = dir.as_ref();
        Ok(BlockState {
            accounts: TrieEngine::open(dir.join("accounts"))?,
            storage: TrieEngine::open(dir.join("storage"))?,
        })
    }

    /// Same as [`Self::open`], with the trie node cache sized from a node's
    /// own configuration rather than `exec-trie`'s defaults.
    pub fn open_with_cache(
        dir: impl AsRef<Path>,
        shallow_capacity: usize,
        deep_capacity: usize,
    ) -> StateResult<Self> {
        let dir = dir.as_ref();
        Ok(BlockState {
            accounts: TrieEngine::open_with_cache(dir.join("accounts"), shallow_capacity, deep_capacity)?,
            storage: TrieEngine::open_with_cache(dir.join("storage"), shallow_capacity, deep_capacity)?,
        })
    }

    /// Same as [`Self::open_with_cache`], sharing a single I/O ring between
    /// the accounts and storage tries instead of each opening its own.
    pub fn open_with_cache_and_ring(
        dir: impl AsRef<Path>,
        shallow_capacity: usize,
        deep_capacity: usize,
        ring: Arc<dyn NodeRing>,
    ) -> StateResult<Self> {
        let dir = dir.as_ref();
        Ok(BlockState {
            accounts: TrieEngine::open_with_cache_and_ring(
                dir.join("accounts"),
                shallow_capacity,
                deep_capacity,
                ring.clone(),
            )?,
            storage: TrieEngine::open_with_cache_and_ring(
                dir.join("storage"),
                shallow_capacity,
                deep_capacity,
                ring,
            )?,
        })
    }

    /// A handle pinned to this state's current roots, cheap enough to hand
    /// one to every transaction in a block for speculative execution.
    /// Reads resolve against the pinned root; callers must not call
    /// `put_account`/`put_storage` on a snapshot directly (there's nothing
    /// downstream that would ever see it) — the speculative caller buffers
    /// writes in a [`crate::TransactionState`] overlay instead and applies
    /// them to the *real* `BlockState` only once the commit phase confirms
    /// no conflict.
    pub fn snapshot(&self) -> BlockState {
        BlockState {
            accounts: self.accounts.snapshot(),
            storage: self.storage.snapshot(),
        }
    }

    /// Reclaim chunks from both tries that have aged out of retention.
    /// Returns the total number of chunk files removed.
    pub fn compact(&mut self) -> StateResult<usize> {
        Ok(self.accounts.compact()? + self.storage.compact()?)
    }

    pub fn accounts_root(&self) -> Hash256 {
        self.accounts.root_hash()
    }

    pub fn get_account(&mut self, address: &Address) -> StateResult<Option<Account>> {
        let key = Nibbles::from_bytes(keccak256(address.as_bytes()).as_bytes());
        match self.accounts.get(&key)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                Account::rlp_decode_complete(&bytes).map_err(StateError::Codec)?,
            )),
        }
    }

    pub fn put_account(&mut self, address: &Address, account: &Account) -> StateResult<()> {
        let key = Nibbles::from_bytes(keccak256(address.as_bytes()).as_bytes());
        self.accounts.put(&key, account.rlp_encode())?;
        Ok(())
    }

    pub fn get_storage(&mut self, address: &Address, slot: Hash256) -> StateResult<U256> {
        let key = storage_key(address, slot);
        match self.storage.get(&key)? {
            None => Ok(U256::ZERO),
            Some(bytes) => Ok(U256::from_big_endian(&bytes)),
        }
    }

    pub fn put_storage(&mut self, address: &Address, slot: Hash256, value: U256) -> StateResult<()> {
        let key = storage_key(address, slot);
        if value.is_zero() {
            // Storing zero is equivalent to deleting the slot; the trie has
            // no delete operation yet, so an explicit empty value marks it.
            self.storage.put(&key, Vec::new())?;
        } else {
            self.storage.put(&key, value.to_minimal_big_endian())?;
        }
        Ok(())
    }

    pub fn commit(&mut self) -> (u64, u64) {
        (self.accounts.commit(), self.storage.commit())
    }
}

fn storage_key(address: &Address, slot: Hash256) -> Nibbles {
    let mut preimage = Vec::with_capacity(64);
    preimage.extend_from_slice(keccak256(address.as_bytes()).as_bytes());
    preimage.extend_from_slice(keccak256(slot.as_bytes()).as_bytes());
    Nibbles::from_bytes(&preimage)
}
