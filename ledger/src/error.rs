use lattice_types::BlockHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transient transactional conflict in the storage engine. Callers retry
    /// after a short delay; never terminal.
    #[error("storage transaction conflict")]
    Conflict,

    /// The block is already stored. Commit callers treat this as success.
    #[error("block already exists")]
    BlockExists,

    #[error("block {0} not found")]
    BlockNotFound(BlockHash),

    #[error("rollback of block {hash} failed: {reason}")]
    Rollback { hash: BlockHash, reason: String },

    #[error("store error: {0}")]
    Store(String),
}
