//! Election state machine — resolves which block owns a contested chain slot.
//!
//! An election is created when a root key is first sighted and collects
//! representative votes for the candidate blocks sharing that root. A
//! candidate is confirmed when its tally strictly exceeds half of the total
//! registered representative weight sampled at election creation. Once
//! confirmed, the winner is sticky: later votes are ignored and finalization
//! happens on the next announcement sweep.

use crate::error::ConsensusError;
use crate::root::RootKey;
use lattice_ledger::StateBlock;
use lattice_messages::ConfirmAck;
use lattice_types::{Address, BlockHash, Timestamp};
use std::collections::HashMap;

/// The result of folding one vote into an election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First ballot from this representative.
    Accepted,
    /// Replaced the representative's earlier ballot.
    Updated,
    /// Election already confirmed; the ballot was discarded.
    Ignored,
    /// This ballot pushed the winner past quorum.
    Confirmed,
}

/// A representative's current ballot in one election.
#[derive(Clone, Debug)]
struct Ballot {
    block_hash: BlockHash,
    weight: u128,
}

/// A single consensus election for one contested chain slot.
#[derive(Clone, Debug)]
pub struct Election {
    root: RootKey,
    /// Every block sighted for this root, keyed by hash.
    candidates: HashMap<BlockHash, StateBlock>,
    /// Latest ballot per representative.
    ballots: HashMap<Address, Ballot>,
    /// Per-candidate weight tally.
    tally: HashMap<BlockHash, u128>,
    /// Current leader (the initial candidate until votes say otherwise).
    winner: BlockHash,
    confirmed: bool,
    /// Quorum base: total registered representative weight at creation.
    total_weight: u128,
    /// Confirmation requests sent without reaching quorum.
    pub announcements: u32,
    /// When the sweep last touched this election.
    pub last_announce: Timestamp,
}

impl Election {
    /// Create a new election with `block` as its initial candidate.
    pub fn new(block: StateBlock, total_weight: u128, now: Timestamp) -> Self {
        let root = RootKey::for_block(&block);
        let hash = block.hash();
        let mut candidates = HashMap::new();
        candidates.insert(hash, block);
        Self {
            root,
            candidates,
            ballots: HashMap::new(),
            tally: HashMap::new(),
            winner: hash,
            confirmed: false,
            total_weight,
            announcements: 0,
            last_announce: now,
        }
    }

    pub fn root(&self) -> RootKey {
        self.root
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// The current leading candidate.
    pub fn winner_block(&self) -> &StateBlock {
        &self.candidates[&self.winner]
    }

    /// Candidates that lost to the winner. Meaningful once confirmed.
    pub fn losers(&self) -> Vec<StateBlock> {
        self.candidates
            .iter()
            .filter(|(hash, _)| **hash != self.winner)
            .map(|(_, block)| block.clone())
            .collect()
    }

    pub fn tally_for(&self, hash: &BlockHash) -> u128 {
        self.tally.get(hash).copied().unwrap_or(0)
    }

    /// Number of representatives that have voted.
    pub fn voter_count(&self) -> usize {
        self.ballots.len()
    }

    /// Fold a representative's vote into the tally.
    ///
    /// Rejects votes whose block belongs to a different root. A voter's new
    /// ballot supersedes their earlier one. Once the election is confirmed,
    /// further votes are ignored.
    pub fn vote_action(
        &mut self,
        ack: &ConfirmAck,
        weight: u128,
    ) -> Result<VoteOutcome, ConsensusError> {
        if RootKey::for_block(&ack.block) != self.root {
            return Err(ConsensusError::RootMismatch);
        }
        if self.confirmed {
            return Ok(VoteOutcome::Ignored);
        }

        let hash = ack.block_hash();
        self.candidates
            .entry(hash)
            .or_insert_with(|| ack.block.clone());

        let previous = self.ballots.insert(
            ack.voter.clone(),
            Ballot {
                block_hash: hash,
                weight,
            },
        );
        let outcome = match previous {
            Some(old) => {
                let entry = self.tally.entry(old.block_hash).or_insert(0);
                *entry = entry.saturating_sub(old.weight);
                if *entry == 0 {
                    self.tally.remove(&old.block_hash);
                }
                VoteOutcome::Updated
            }
            None => VoteOutcome::Accepted,
        };
        *self.tally.entry(hash).or_insert(0) += weight;

        self.recompute_winner();

        if self.tally_for(&self.winner) * 2 > self.total_weight {
            self.confirmed = true;
            return Ok(VoteOutcome::Confirmed);
        }
        Ok(outcome)
    }

    /// Re-evaluate the leader after a tally change. The current winner keeps
    /// the lead on ties; otherwise the heaviest candidate (smallest hash on
    /// equal weight) takes it.
    fn recompute_winner(&mut self) {
        let current = self.tally_for(&self.winner);
        let best = self
            .tally
            .iter()
            .filter(|(_, w)| **w > current)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)));
        if let Some((hash, _)) = best {
            self.winner = *hash;
        }
    }
}
