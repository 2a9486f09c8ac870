use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use ethrun_common::{
    constants::{EMPTY_KECCAK_HASH, EMPTY_TRIE_ROOT},
    types::{AccountState, Genesis},
    utils::keccak,
};
use ethrun_rlp::{decode::RLPDecode, encode::RLPEncode};
use ethrun_trie::Trie;
use tracing::debug;

use crate::{api::KvStore, error::StoreError, journal::JournalDb};

/// A point the world state can be rolled back to: the state root plus the
/// journal changeset open at the time.
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot {
    root: H256,
    journal_id: usize,
}

/// Account-level API over the journaled state trie.
///
/// Accounts are RLP-encoded [`AccountState`] records keyed by
/// keccak(address); contract storage lives in per-account tries keyed by
/// keccak(slot); code blobs are keyed by their hash. All writes flow through
/// the journal, so a [`revert`](WorldState::revert) atomically rolls back
/// accounts, storage and code.
pub struct WorldState {
    db: JournalDb,
    state_root: H256,
}

impl WorldState {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            db: JournalDb::new(store),
            state_root: *EMPTY_TRIE_ROOT,
        }
    }

    /// Opens a world state at an existing root.
    pub fn open(store: Arc<dyn KvStore>, state_root: H256) -> Self {
        Self {
            db: JournalDb::new(store),
            state_root,
        }
    }

    /// Populates a fresh world state from a genesis allocation. If the
    /// genesis declares a state root, the computed root must match it.
    pub fn from_genesis(store: Arc<dyn KvStore>, genesis: &Genesis) -> Result<Self, StoreError> {
        let mut state = Self::new(store);
        for (address, account) in &genesis.alloc {
            state.set_balance(*address, account.balance)?;
            if account.nonce != 0 {
                state.set_nonce(*address, account.nonce)?;
            }
            if !account.code.is_empty() {
                state.set_code(*address, &account.code)?;
            }
            for (slot, value) in &account.storage {
                state.set_storage(*address, *slot, *value)?;
            }
        }
        if let Some(declared) = genesis.state_root {
            if declared != state.state_root {
                return Err(StoreError::InvalidGenesisStateRoot {
                    computed: state.state_root,
                    declared,
                });
            }
        }
        debug!(root = ?state.state_root, accounts = genesis.alloc.len(), "genesis state built");
        state.persist()?;
        Ok(state)
    }

    fn open_state_trie(&self) -> Trie {
        Trie::open(Box::new(self.db.clone()), self.state_root)
    }

    fn open_storage_trie(&self, storage_root: H256) -> Trie {
        Trie::open(Box::new(self.db.clone()), storage_root)
    }

    /// Reads an account record, blank if absent.
    pub fn get_account(&self, address: Address) -> Result<AccountState, StoreError> {
        let trie = self.open_state_trie();
        match trie.get(keccak(address).as_bytes())? {
            Some(rlp) => Ok(AccountState::decode(&rlp)?),
            None => Ok(AccountState::default()),
        }
    }

    fn write_account(&mut self, address: Address, account: &AccountState) -> Result<(), StoreError> {
        let mut trie = self.open_state_trie();
        trie.insert(keccak(address).as_bytes(), account.encode_to_vec())?;
        self.state_root = trie.hash()?;
        Ok(())
    }

    pub fn account_exists(&self, address: Address) -> Result<bool, StoreError> {
        let trie = self.open_state_trie();
        Ok(trie.get(keccak(address).as_bytes())?.is_some())
    }

    pub fn account_has_code_or_nonce(&self, address: Address) -> Result<bool, StoreError> {
        Ok(self.get_account(address)?.has_code_or_nonce())
    }

    /// True when the account record is indistinguishable from a blank one.
    pub fn account_is_empty(&self, address: Address) -> Result<bool, StoreError> {
        Ok(self.get_account(address)?.is_empty())
    }

    //
    // Balance
    //
    pub fn get_balance(&self, address: Address) -> Result<U256, StoreError> {
        Ok(self.get_account(address)?.balance)
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        account.balance = balance;
        self.write_account(address, &account)
    }

    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StoreError::BalanceOverflow)?;
        self.write_account(address, &account)
    }

    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or(StoreError::BalanceUnderflow)?;
        self.write_account(address, &account)
    }

    //
    // Nonce
    //
    pub fn get_nonce(&self, address: Address) -> Result<u64, StoreError> {
        Ok(self.get_account(address)?.nonce)
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        account.nonce = nonce;
        self.write_account(address, &account)
    }

    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        account.nonce += 1;
        self.write_account(address, &account)
    }

    //
    // Code
    //
    pub fn get_code(&self, address: Address) -> Result<Bytes, StoreError> {
        let account = self.get_account(address)?;
        if !account.has_code() {
            return Ok(Bytes::new());
        }
        Ok(self
            .db
            .get(account.code_hash.as_bytes())?
            .map(Bytes::from)
            .unwrap_or_default())
    }

    pub fn set_code(&mut self, address: Address, code: &[u8]) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        let code_hash = keccak(code);
        self.db.put(code_hash.as_bytes().to_vec(), code.to_vec())?;
        account.code_hash = code_hash;
        self.write_account(address, &account)
    }

    //
    // Storage
    //
    pub fn get_storage(&self, address: Address, slot: U256) -> Result<U256, StoreError> {
        let account = self.get_account(address)?;
        let trie = self.open_storage_trie(account.storage_root);
        match trie.get(keccak(slot.to_big_endian()).as_bytes())? {
            Some(rlp) => Ok(U256::decode(&rlp)?),
            None => Ok(U256::zero()),
        }
    }

    /// Writes a storage slot. A zero value deletes the slot, which is
    /// load-bearing for SSTORE gas accounting.
    pub fn set_storage(&mut self, address: Address, slot: U256, value: U256) -> Result<(), StoreError> {
        let mut account = self.get_account(address)?;
        let mut trie = self.open_storage_trie(account.storage_root);
        let key = keccak(slot.to_big_endian());
        if value.is_zero() {
            trie.remove(key.as_bytes())?;
        } else {
            trie.insert(key.as_bytes(), value.encode_to_vec())?;
        }
        account.storage_root = trie.hash()?;
        self.write_account(address, &account)
    }

    //
    // Account lifecycle
    //
    pub fn delete_account(&mut self, address: Address) -> Result<(), StoreError> {
        let mut trie = self.open_state_trie();
        trie.remove(keccak(address).as_bytes())?;
        self.state_root = trie.hash()?;
        Ok(())
    }

    //
    // Snapshot and revert
    //
    pub fn state_root(&self) -> H256 {
        self.state_root
    }

    pub fn snapshot(&mut self) -> Result<StateSnapshot, StoreError> {
        Ok(StateSnapshot {
            root: self.state_root,
            journal_id: self.db.snapshot()?,
        })
    }

    pub fn revert(&mut self, snapshot: StateSnapshot) -> Result<(), StoreError> {
        self.db.revert(snapshot.journal_id)?;
        self.state_root = snapshot.root;
        Ok(())
    }

    pub fn commit(&mut self, snapshot: StateSnapshot) -> Result<(), StoreError> {
        self.db.commit(snapshot.journal_id)
    }

    /// Flushes the journal overlay to the backing store.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        self.db.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryKv;
    use ethrun_common::types::GenesisAccount;

    fn empty_state() -> WorldState {
        WorldState::new(Arc::new(InMemoryKv::new()))
    }

    #[test]
    fn blank_state_has_empty_root() {
        assert_eq!(empty_state().state_root(), *EMPTY_TRIE_ROOT);
    }

    #[test]
    fn balance_roundtrip_changes_root() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xaa);
        state.set_balance(address, U256::from(1000)).unwrap();
        assert_eq!(state.get_balance(address).unwrap(), U256::from(1000));
        assert_ne!(state.state_root(), *EMPTY_TRIE_ROOT);
        assert!(state.account_exists(address).unwrap());
    }

    #[test]
    fn storage_zero_value_deletes_slot() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xaa);
        state.set_storage(address, U256::zero(), U256::from(7)).unwrap();
        let root_with_slot = state.get_account(address).unwrap().storage_root;
        assert_ne!(root_with_slot, *EMPTY_TRIE_ROOT);

        state.set_storage(address, U256::zero(), U256::zero()).unwrap();
        assert_eq!(state.get_storage(address, U256::zero()).unwrap(), U256::zero());
        assert_eq!(
            state.get_account(address).unwrap().storage_root,
            *EMPTY_TRIE_ROOT
        );
    }

    #[test]
    fn snapshot_revert_restores_root_and_values() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xaa);
        state.set_balance(address, U256::from(10)).unwrap();
        let root_before = state.state_root();

        let snapshot = state.snapshot().unwrap();
        state.set_balance(address, U256::from(99)).unwrap();
        state.set_storage(address, U256::one(), U256::from(5)).unwrap();
        state.set_code(address, &[0x60, 0x00]).unwrap();
        state.revert(snapshot).unwrap();

        assert_eq!(state.state_root(), root_before);
        assert_eq!(state.get_balance(address).unwrap(), U256::from(10));
        assert_eq!(state.get_storage(address, U256::one()).unwrap(), U256::zero());
        assert!(state.get_code(address).unwrap().is_empty());
    }

    #[test]
    fn code_roundtrip() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xcc);
        let code = [0x60u8, 0x05, 0x60, 0x00, 0x55];
        state.set_code(address, &code).unwrap();
        assert_eq!(state.get_code(address).unwrap().as_ref(), &code);
        assert_eq!(state.get_account(address).unwrap().code_hash, keccak(code));
        assert!(state.account_has_code_or_nonce(address).unwrap());
    }

    #[test]
    fn delete_account_removes_it_from_the_trie() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xdd);
        state.set_balance(address, U256::from(100)).unwrap();
        state.delete_account(address).unwrap();
        assert!(!state.account_exists(address).unwrap());
        assert_eq!(state.state_root(), *EMPTY_TRIE_ROOT);
    }

    #[test]
    fn genesis_alloc_and_declared_root() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKv::new());
        let mut genesis = Genesis::default();
        genesis.alloc.insert(
            Address::repeat_byte(0xaa),
            GenesisAccount {
                balance: U256::from(10).pow(18.into()),
                ..Default::default()
            },
        );
        let state = WorldState::from_genesis(store.clone(), &genesis).unwrap();
        let computed = state.state_root();

        // Re-building with the computed root declared succeeds...
        genesis.state_root = Some(computed);
        WorldState::from_genesis(Arc::new(InMemoryKv::new()), &genesis).unwrap();

        // ...and a wrong declared root is rejected.
        genesis.state_root = Some(H256::repeat_byte(0xff));
        assert!(matches!(
            WorldState::from_genesis(Arc::new(InMemoryKv::new()), &genesis),
            Err(StoreError::InvalidGenesisStateRoot { .. })
        ));
    }

    #[test]
    fn nonce_increments() {
        let mut state = empty_state();
        let address = Address::repeat_byte(0xee);
        state.increment_nonce(address).unwrap();
        state.increment_nonce(address).unwrap();
        assert_eq!(state.get_nonce(address).unwrap(), 2);
    }
}
