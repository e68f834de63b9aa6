//! Nullable infrastructure for deterministic testing.
//!
//! The consensus core talks to its collaborators through traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic, programmable values
//! - Record every interaction for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod ledger;
pub mod sink;

pub use ledger::NullLedger;
pub use sink::NullSink;
