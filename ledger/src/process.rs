//! Block classification outcomes produced by the ledger verifier.

use serde::{Deserialize, Serialize};

/// Result of checking a candidate block against the ledger.
///
/// Produced by [`Ledger::block_check`](crate::Ledger::block_check); the
/// consensus engine routes every candidate by this outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessResult {
    /// Block is new and valid — eligible for an election.
    Progress,
    /// Block is already settled locally.
    Old,
    /// Block competes with an existing block for the same chain slot.
    Fork,
    /// Block's `previous` hash is not yet known locally.
    GapPrevious,
    /// Block's `link` (source transaction) is not yet known locally.
    GapSource,
    /// Signature does not verify.
    BadSignature,
    /// Proof-of-work does not meet the required difficulty.
    BadWork,
    /// Balance transition is inconsistent with the previous block.
    BalanceMismatch,
    /// Receive block references a send that is not receivable.
    UnReceivable,
    /// Referenced contract state is not yet known locally.
    GapSmartContract,
    /// Block is structurally malformed.
    InvalidData,
    /// Any other verifier failure.
    Other,
}

impl ProcessResult {
    /// Whether this outcome parks the block on a missing dependency.
    pub fn is_gap(&self) -> bool {
        matches!(self, ProcessResult::GapPrevious | ProcessResult::GapSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_classification() {
        assert!(ProcessResult::GapPrevious.is_gap());
        assert!(ProcessResult::GapSource.is_gap());
        assert!(!ProcessResult::Progress.is_gap());
        assert!(!ProcessResult::GapSmartContract.is_gap());
    }
}
