//! Outbound events produced by the consensus subsystem.

use crate::vote::ConfirmAck;
use lattice_ledger::StateBlock;

/// Payload carried by an outbound network event.
#[derive(Clone, Debug)]
pub enum NetPayload {
    /// Flood a block (publish).
    Publish(StateBlock),
    /// Ask representatives to vote on a block.
    ConfirmReq(StateBlock),
    /// A representative's vote.
    ConfirmAck(ConfirmAck),
}

/// An event handed to the network/event collaborator.
#[derive(Clone, Debug)]
pub enum OutboundEvent {
    /// Flood to every connected peer.
    Broadcast(NetPayload),
    /// Relay to peers, optionally excluding the one the message came from.
    SendToPeers {
        payload: NetPayload,
        exclude: Option<String>,
    },
    /// A block reached quorum and is final.
    ConfirmedBlock(StateBlock),
}

/// The network/event collaborator consumed by consensus.
///
/// Implementations must be cheap to call from ingress workers; delivery is
/// fire-and-forget and failures are the collaborator's concern.
pub trait MessageSink: Send + Sync {
    fn publish(&self, event: OutboundEvent);
}
