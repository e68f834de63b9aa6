//! Election pool — owns every live election and runs the announcement sweep.
//!
//! The pool is a pure state machine: [`ElectionPool::tick`] mutates election
//! bookkeeping and returns the side effects the caller must execute
//! (broadcast a confirmation request, or finalize a confirmed winner).
//! Keeping ledger and network effects outside the pool keeps the sweep
//! deterministic and lets the lock drop before any I/O happens.

use crate::election::{Election, VoteOutcome};
use crate::root::RootKey;
use lattice_ledger::StateBlock;
use lattice_messages::ConfirmAck;
use lattice_types::Timestamp;
use std::collections::HashMap;

/// A side effect produced by one sweep tick, executed by the engine.
#[derive(Clone, Debug)]
pub enum SweepAction {
    /// Broadcast a confirmation request for the current leader.
    Announce { block: StateBlock },
    /// The election confirmed: publish, persist the winner, roll back losers.
    Finalize {
        winner: StateBlock,
        losers: Vec<StateBlock>,
    },
}

/// Container for all live elections, keyed by root.
pub struct ElectionPool {
    roots: HashMap<RootKey, Election>,
    /// Quorum base applied to newly created elections.
    total_weight: u128,
    announce_interval_secs: u64,
    max_announcements: u32,
}

impl ElectionPool {
    pub fn new(announce_interval_secs: u64, max_announcements: u32, total_weight: u128) -> Self {
        Self {
            roots: HashMap::new(),
            total_weight,
            announce_interval_secs,
            max_announcements,
        }
    }

    /// Register a block as an election candidate for its root.
    ///
    /// Creates the election if the root is unseen (atomic check-and-insert —
    /// two racing creators resolve to one election). Returns `true` if a new
    /// election was created.
    pub fn add_to_roots(&mut self, block: StateBlock, now: Timestamp) -> bool {
        let root = RootKey::for_block(&block);
        match self.roots.entry(root) {
            std::collections::hash_map::Entry::Occupied(_) => {
                tracing::debug!(%root, block = %block.hash(), "root already has an election");
                false
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(Election::new(block, self.total_weight, now));
                true
            }
        }
    }

    /// Whether an election exists for this root.
    pub fn contains(&self, root: &RootKey) -> bool {
        self.roots.contains_key(root)
    }

    /// Fold a vote into the election owning its root, if one exists.
    pub fn vote(&mut self, ack: &ConfirmAck, weight: u128) -> Option<VoteOutcome> {
        let root = RootKey::for_block(&ack.block);
        let election = self.roots.get_mut(&root)?;
        match election.vote_action(ack, weight) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(%root, voter = %ack.voter, "vote rejected: {e}");
                None
            }
        }
    }

    /// One announcement sweep.
    ///
    /// Acts on elections whose last announcement is at least the announce
    /// interval old: confirmed elections produce a [`SweepAction::Finalize`]
    /// and leave the pool; the rest produce a [`SweepAction::Announce`] and
    /// are evicted once they exhaust the announcement budget. Evictions are
    /// collected during iteration and applied afterwards.
    pub fn tick(&mut self, now: Timestamp) -> Vec<SweepAction> {
        let mut actions = Vec::new();
        let mut evict = Vec::new();

        for (root, election) in self.roots.iter_mut() {
            if election.last_announce.elapsed_since(now) < self.announce_interval_secs {
                continue;
            }
            election.last_announce = now;

            if election.is_confirmed() {
                actions.push(SweepAction::Finalize {
                    winner: election.winner_block().clone(),
                    losers: election.losers(),
                });
                evict.push(*root);
                continue;
            }

            actions.push(SweepAction::Announce {
                block: election.winner_block().clone(),
            });
            election.announcements += 1;
            if election.announcements >= self.max_announcements {
                tracing::debug!(%root, "election exhausted its announcements, evicting");
                evict.push(*root);
            }
        }

        for root in evict {
            self.roots.remove(&root);
        }
        actions
    }

    /// Update the quorum base for elections created from now on.
    pub fn set_total_weight(&mut self, weight: u128) {
        self.total_weight = weight;
    }

    pub fn get(&self, root: &RootKey) -> Option<&Election> {
        self.roots.get(root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_ledger::BlockKind;
    use lattice_types::{Address, BlockHash, Signature};

    const INTERVAL: u64 = 16;
    const MAX_ANNOUNCEMENTS: u32 = 20;

    fn make_block(balance: u128) -> StateBlock {
        StateBlock {
            kind: BlockKind::Send,
            address: Address::new("lat_1111"),
            previous: BlockHash::new([7u8; 32]),
            link: BlockHash::ZERO,
            representative: Address::new("lat_2222"),
            balance,
            timestamp: Timestamp::new(1_000_000),
            work: 0,
            signature: Signature([1u8; 64]),
        }
    }

    fn ack_from(voter: &str, block: &StateBlock) -> ConfirmAck {
        ConfirmAck {
            block: block.clone(),
            voter: Address::new(format!("lat_{voter}")),
            signature: Signature([3u8; 64]),
            sequence: 0,
        }
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn pool() -> ElectionPool {
        ElectionPool::new(INTERVAL, MAX_ANNOUNCEMENTS, 100)
    }

    #[test]
    fn add_to_roots_creates_once() {
        let mut pool = pool();
        let block = make_block(100);
        assert!(pool.add_to_roots(block.clone(), ts(0)));
        assert!(!pool.add_to_roots(block.clone(), ts(1)));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&RootKey::for_block(&block)));
    }

    #[test]
    fn fork_candidates_share_one_election() {
        let mut pool = pool();
        let s1 = make_block(100);
        let s2 = make_block(200);
        assert!(pool.add_to_roots(s1, ts(0)));
        assert!(!pool.add_to_roots(s2, ts(0)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn vote_without_election_is_dropped() {
        let mut pool = pool();
        let block = make_block(100);
        assert!(pool.vote(&ack_from("r1", &block), 30).is_none());
    }

    #[test]
    fn vote_routes_to_election() {
        let mut pool = pool();
        let block = make_block(100);
        pool.add_to_roots(block.clone(), ts(0));

        let outcome = pool.vote(&ack_from("r1", &block), 30).unwrap();
        assert_eq!(outcome, VoteOutcome::Accepted);

        let election = pool.get(&RootKey::for_block(&block)).unwrap();
        assert_eq!(election.tally_for(&block.hash()), 30);
    }

    #[test]
    fn no_action_before_interval() {
        let mut pool = pool();
        pool.add_to_roots(make_block(100), ts(100));
        assert!(pool.tick(ts(100 + INTERVAL - 1)).is_empty());
    }

    #[test]
    fn announce_after_interval() {
        let mut pool = pool();
        let block = make_block(100);
        pool.add_to_roots(block.clone(), ts(100));

        let actions = pool.tick(ts(100 + INTERVAL));
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SweepAction::Announce { block: announced } => {
                assert_eq!(announced.hash(), block.hash())
            }
            other => panic!("expected Announce, got {other:?}"),
        }
        // The same tick must not announce twice.
        assert!(pool.tick(ts(100 + INTERVAL)).is_empty());
    }

    #[test]
    fn confirmed_election_finalizes_and_leaves_pool() {
        let mut pool = pool();
        let s1 = make_block(100);
        let s2 = make_block(200);
        pool.add_to_roots(s1.clone(), ts(100));
        pool.vote(&ack_from("r1", &s2), 20);
        pool.vote(&ack_from("r2", &s1), 60);

        let actions = pool.tick(ts(100 + INTERVAL));
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SweepAction::Finalize { winner, losers } => {
                assert_eq!(winner.hash(), s1.hash());
                assert_eq!(losers.len(), 1);
                assert_eq!(losers[0].hash(), s2.hash());
            }
            other => panic!("expected Finalize, got {other:?}"),
        }
        assert!(pool.is_empty());
        // Finalization happens exactly once.
        assert!(pool.tick(ts(100 + 2 * INTERVAL)).is_empty());
    }

    #[test]
    fn unanswered_election_evicted_after_budget() {
        let mut pool = pool();
        pool.add_to_roots(make_block(100), ts(0));

        let mut announcements = 0;
        for round in 1..=MAX_ANNOUNCEMENTS as u64 + 5 {
            for action in pool.tick(ts(round * INTERVAL)) {
                match action {
                    SweepAction::Announce { .. } => announcements += 1,
                    other => panic!("unexpected action {other:?}"),
                }
            }
        }
        assert_eq!(announcements, MAX_ANNOUNCEMENTS);
        assert!(pool.is_empty());
    }

    #[test]
    fn late_votes_still_finalize_before_eviction() {
        let mut pool = pool();
        let block = make_block(100);
        pool.add_to_roots(block.clone(), ts(0));

        // Burn most of the announcement budget.
        for round in 1..MAX_ANNOUNCEMENTS as u64 {
            pool.tick(ts(round * INTERVAL));
        }
        assert_eq!(pool.len(), 1);

        // Quorum arrives on the last legal round.
        pool.vote(&ack_from("r1", &block), 60);
        let actions = pool.tick(ts(MAX_ANNOUNCEMENTS as u64 * INTERVAL));
        assert!(matches!(actions[0], SweepAction::Finalize { .. }));
        assert!(pool.is_empty());
    }

    #[test]
    fn total_weight_applies_to_new_elections_only() {
        let mut pool = pool();
        let s1 = make_block(100);
        pool.add_to_roots(s1.clone(), ts(0));
        pool.set_total_weight(10);

        // Existing election still needs > 50 of the original 100.
        assert_eq!(
            pool.vote(&ack_from("r1", &s1), 30).unwrap(),
            VoteOutcome::Accepted
        );

        // A new election confirms against the updated base.
        let mut other = make_block(100);
        other.previous = BlockHash::new([8u8; 32]);
        pool.add_to_roots(other.clone(), ts(0));
        assert_eq!(
            pool.vote(&ack_from("r2", &other), 6).unwrap(),
            VoteOutcome::Confirmed
        );
    }
}
