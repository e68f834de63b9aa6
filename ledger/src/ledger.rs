//! The narrow interface consensus uses to talk to the ledger engine.

use crate::{LedgerError, ProcessResult, StateBlock};
use lattice_types::{Address, BlockHash};

/// Ledger operations consumed by the consensus subsystem.
///
/// The storage engine behind this trait has its own transactional semantics;
/// any operation may fail with [`LedgerError::Conflict`], which callers must
/// retry after a short delay. [`LedgerError::BlockExists`] from
/// [`block_commit`](Ledger::block_commit) means the work is already done and
/// is treated as success.
pub trait Ledger: Send + Sync {
    /// Classify a candidate block against current ledger state.
    fn block_check(&self, block: &StateBlock) -> Result<ProcessResult, LedgerError>;

    /// Persist a verified block.
    fn block_commit(&self, block: &StateBlock) -> Result<(), LedgerError>;

    /// Whether a block with this hash is stored.
    fn has_block(&self, hash: &BlockHash) -> Result<bool, LedgerError>;

    /// Fetch a stored block by hash.
    fn get_block(&self, hash: &BlockHash) -> Result<StateBlock, LedgerError>;

    /// The hash of the stored block occupying the given chain slot for an
    /// account — the locally committed rival of a fork candidate.
    fn competing_child(
        &self,
        slot: &BlockHash,
        address: &Address,
    ) -> Result<BlockHash, LedgerError>;

    /// Remove a block (and its chain successors) from the ledger.
    fn rollback(&self, hash: &BlockHash) -> Result<(), LedgerError>;

    /// A pseudo-randomly chosen stored block, used to provoke liveness votes.
    fn random_block(&self) -> Result<StateBlock, LedgerError>;

    /// Whether the address is registered on-chain as a representative.
    fn is_registered_representative(&self, address: &Address) -> bool;

    /// Voting weight delegated to a representative.
    fn representative_weight(&self, address: &Address) -> u128;

    /// Total weight across all registered representatives (the quorum base).
    fn total_representative_weight(&self) -> u128;

    /// Persist the currently-online representative set.
    fn set_online_representatives(&self, reps: &[Address]) -> Result<(), LedgerError>;
}
