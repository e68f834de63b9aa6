//! Per-candidate ingestion metadata.

use lattice_ledger::StateBlock;
use serde::{Deserialize, Serialize};

/// Where an inbound block came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Delivered by a bulk/sync feed; consensus on it was reached elsewhere.
    Synchronized,
    /// Live gossip — needs an election before it counts as settled.
    UnSynchronized,
}

/// A candidate block together with its origin, created per inbound message
/// and discarded after routing.
#[derive(Clone, Debug)]
pub struct BlockSource {
    pub block: StateBlock,
    pub origin: Origin,
}

impl BlockSource {
    pub fn live(block: StateBlock) -> Self {
        Self {
            block,
            origin: Origin::UnSynchronized,
        }
    }

    pub fn synced(block: StateBlock) -> Self {
        Self {
            block,
            origin: Origin::Synchronized,
        }
    }
}
