//! Consensus — chain slot resolution via delegated representative voting.
//!
//! Each account in the lattice owns its own chain of blocks; when two blocks
//! claim the same chain slot, delegated representatives vote and the
//! candidate crossing a weighted quorum wins. This crate is the consensus
//! core: ingestion deduplication, election management, vote generation and
//! aggregation, fork detection and rollback, and the dependency-gap queue
//! for blocks that arrive before their predecessor or source.
//!
//! ## Module overview
//!
//! - [`receiver`] — ingress adapter: per-topic workers, dedup, verify/commit.
//! - [`dpos`] — the DPoS engine: routing, local voting, maintenance loops.
//! - [`election_pool`] — container for live elections + announcement sweep.
//! - [`election`] — per-slot election state machine.
//! - [`root`] — deterministic root keys for contested chain slots.
//! - [`representatives`] — local signing identities and online-rep liveness.
//! - [`cache`] — bounded, time-expiring cache behind dedup/gap/vote parking.
//! - [`consensus`] — lifecycle façade and the algorithm capability trait.
//! - [`config`] — tunables with TOML support.
//! - [`error`] — consensus error types.

pub mod cache;
pub mod config;
pub mod consensus;
pub mod dpos;
pub mod election;
pub mod election_pool;
pub mod error;
pub mod logging;
pub mod receiver;
pub mod representatives;
pub mod root;

pub use cache::ExpiringCache;
pub use config::ConsensusConfig;
pub use consensus::{Consensus, ConsensusAlgorithm};
pub use dpos::Dpos;
pub use election::{Election, VoteOutcome};
pub use election_pool::{ElectionPool, SweepAction};
pub use error::ConsensusError;
pub use logging::{init_logging, LogFormat};
pub use receiver::{InboundHandle, Receiver};
pub use representatives::{LocalReps, OnlineReps};
pub use root::RootKey;
