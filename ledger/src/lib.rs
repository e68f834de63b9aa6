//! Ledger collaborator interface for the consensus subsystem.
//!
//! The on-disk ledger engine lives outside this workspace; consensus consumes
//! it through the narrow [`Ledger`] trait. This crate also defines the state
//! block format shared by every component and the closed [`ProcessResult`]
//! classification produced by the ledger's verifier.

pub mod error;
pub mod ledger;
pub mod process;
pub mod state_block;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use process::ProcessResult;
pub use state_block::{BlockKind, StateBlock};
