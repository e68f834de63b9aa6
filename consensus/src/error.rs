use lattice_ledger::LedgerError;
use lattice_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("vote generation failed for representative {0}")]
    VoteGeneration(Address),

    #[error("vote root does not match election root")]
    RootMismatch,

    #[error("ingress queue for {0} is closed")]
    ChannelClosed(lattice_messages::Topic),

    #[error("invalid configuration: {0}")]
    Config(String),
}
