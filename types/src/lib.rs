//! Fundamental types for the lattice ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, block hashes, key material, and timestamps.

pub mod address;
pub mod hash;
pub mod keys;
pub mod time;

pub use address::Address;
pub use hash::BlockHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
