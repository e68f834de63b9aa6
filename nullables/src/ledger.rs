//! Nullable ledger — thread-safe in-memory ledger collaborator for testing.

use lattice_ledger::{Ledger, LedgerError, ProcessResult, StateBlock};
use lattice_types::{Address, BlockHash};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    blocks: HashMap<BlockHash, StateBlock>,
    /// Committed occupant per (chain slot, account) — the fork rival lookup.
    children: HashMap<(BlockHash, Address), BlockHash>,
    /// Programmed verdicts per block hash; absent hashes fall back to
    /// `Old` (stored) / `Progress` (new).
    verdicts: HashMap<BlockHash, ProcessResult>,
    /// Remaining transient conflicts to inject per block hash.
    conflicts: HashMap<BlockHash, u32>,
    registered: HashSet<Address>,
    weights: HashMap<Address, u128>,
    online: Vec<Address>,
    check_attempts: HashMap<BlockHash, u32>,
    commit_attempts: HashMap<BlockHash, u32>,
    rolled_back: Vec<BlockHash>,
}

/// An in-memory [`Ledger`] with programmable verdicts and injectable
/// transactional conflicts. Thread-safe for use with tokio's multi-threaded
/// runtime.
pub struct NullLedger {
    inner: Mutex<Inner>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed a block directly, bypassing attempt counters.
    pub fn seed_block(&self, block: StateBlock) {
        let mut inner = self.inner.lock().unwrap();
        let hash = block.hash();
        let slot = block.slot();
        inner
            .children
            .entry((slot, block.address.clone()))
            .or_insert(hash);
        inner.blocks.insert(hash, block);
    }

    /// Force the verdict returned by `block_check` for one block.
    pub fn set_verdict(&self, hash: BlockHash, verdict: ProcessResult) {
        self.inner.lock().unwrap().verdicts.insert(hash, verdict);
    }

    /// Remove a programmed verdict so the default (Old/Progress) applies.
    pub fn clear_verdict(&self, hash: &BlockHash) {
        self.inner.lock().unwrap().verdicts.remove(hash);
    }

    /// Make the next `n` check/commit calls for this block fail with
    /// [`LedgerError::Conflict`].
    pub fn inject_conflicts(&self, hash: BlockHash, n: u32) {
        self.inner.lock().unwrap().conflicts.insert(hash, n);
    }

    /// Register an address as an on-chain representative with a weight.
    pub fn register_representative(&self, address: Address, weight: u128) {
        let mut inner = self.inner.lock().unwrap();
        inner.registered.insert(address.clone());
        inner.weights.insert(address, weight);
    }

    pub fn check_attempts(&self, hash: &BlockHash) -> u32 {
        *self
            .inner
            .lock()
            .unwrap()
            .check_attempts
            .get(hash)
            .unwrap_or(&0)
    }

    pub fn commit_attempts(&self, hash: &BlockHash) -> u32 {
        *self
            .inner
            .lock()
            .unwrap()
            .commit_attempts
            .get(hash)
            .unwrap_or(&0)
    }

    pub fn rollbacks(&self) -> Vec<BlockHash> {
        self.inner.lock().unwrap().rolled_back.clone()
    }

    pub fn online_representatives(&self) -> Vec<Address> {
        self.inner.lock().unwrap().online.clone()
    }

    fn take_conflict(inner: &mut Inner, hash: &BlockHash) -> bool {
        match inner.conflicts.get_mut(hash) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for NullLedger {
    fn block_check(&self, block: &StateBlock) -> Result<ProcessResult, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let hash = block.hash();
        *inner.check_attempts.entry(hash).or_insert(0) += 1;

        if Self::take_conflict(&mut inner, &hash) {
            return Err(LedgerError::Conflict);
        }
        if let Some(verdict) = inner.verdicts.get(&hash) {
            return Ok(*verdict);
        }
        if inner.blocks.contains_key(&hash) {
            Ok(ProcessResult::Old)
        } else {
            Ok(ProcessResult::Progress)
        }
    }

    fn block_commit(&self, block: &StateBlock) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let hash = block.hash();
        *inner.commit_attempts.entry(hash).or_insert(0) += 1;

        if Self::take_conflict(&mut inner, &hash) {
            return Err(LedgerError::Conflict);
        }
        if inner.blocks.contains_key(&hash) {
            return Err(LedgerError::BlockExists);
        }
        let slot = block.slot();
        inner
            .children
            .entry((slot, block.address.clone()))
            .or_insert(hash);
        inner.blocks.insert(hash, block.clone());
        Ok(())
    }

    fn has_block(&self, hash: &BlockHash) -> Result<bool, LedgerError> {
        Ok(self.inner.lock().unwrap().blocks.contains_key(hash))
    }

    fn get_block(&self, hash: &BlockHash) -> Result<StateBlock, LedgerError> {
        self.inner
            .lock()
            .unwrap()
            .blocks
            .get(hash)
            .cloned()
            .ok_or(LedgerError::BlockNotFound(*hash))
    }

    fn competing_child(
        &self,
        slot: &BlockHash,
        address: &Address,
    ) -> Result<BlockHash, LedgerError> {
        self.inner
            .lock()
            .unwrap()
            .children
            .get(&(*slot, address.clone()))
            .copied()
            .ok_or(LedgerError::BlockNotFound(*slot))
    }

    fn rollback(&self, hash: &BlockHash) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(block) = inner.blocks.remove(hash) else {
            return Err(LedgerError::BlockNotFound(*hash));
        };
        let key = (block.slot(), block.address.clone());
        if inner.children.get(&key) == Some(hash) {
            inner.children.remove(&key);
        }
        inner.rolled_back.push(*hash);
        Ok(())
    }

    fn random_block(&self) -> Result<StateBlock, LedgerError> {
        let inner = self.inner.lock().unwrap();
        inner
            .blocks
            .iter()
            .min_by_key(|(hash, _)| *hash)
            .map(|(_, block)| block.clone())
            .ok_or(LedgerError::Store("ledger is empty".into()))
    }

    fn is_registered_representative(&self, address: &Address) -> bool {
        self.inner.lock().unwrap().registered.contains(address)
    }

    fn representative_weight(&self, address: &Address) -> u128 {
        *self
            .inner
            .lock()
            .unwrap()
            .weights
            .get(address)
            .unwrap_or(&0)
    }

    fn total_representative_weight(&self) -> u128 {
        let inner = self.inner.lock().unwrap();
        inner
            .registered
            .iter()
            .map(|addr| inner.weights.get(addr).copied().unwrap_or(0))
            .sum()
    }

    fn set_online_representatives(&self, reps: &[Address]) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().online = reps.to_vec();
        Ok(())
    }
}
