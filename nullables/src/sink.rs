//! Nullable sink — records outbound consensus events instead of sending them.

use lattice_ledger::StateBlock;
use lattice_messages::{ConfirmAck, MessageSink, NetPayload, OutboundEvent};
use std::sync::Mutex;

/// A test sink that records every event published by the consensus core.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullSink {
    events: Mutex<Vec<OutboundEvent>>,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// All recorded events, in publish order.
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Blocks announced as confirmed.
    pub fn confirmed_blocks(&self) -> Vec<StateBlock> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::ConfirmedBlock(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    /// Blocks sent out as broadcast confirmation requests.
    pub fn broadcast_confirm_reqs(&self) -> Vec<StateBlock> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Broadcast(NetPayload::ConfirmReq(block)) => Some(block),
                _ => None,
            })
            .collect()
    }

    /// Votes sent out as broadcast confirmation acks.
    pub fn broadcast_confirm_acks(&self) -> Vec<ConfirmAck> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Broadcast(NetPayload::ConfirmAck(ack)) => Some(ack),
                _ => None,
            })
            .collect()
    }

    /// Peer relays, with their exclusion, in publish order.
    pub fn peer_sends(&self) -> Vec<(NetPayload, Option<String>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::SendToPeers { payload, exclude } => Some((payload, exclude)),
                _ => None,
            })
            .collect()
    }

    /// Clear all recorded events.
    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for NullSink {
    fn publish(&self, event: OutboundEvent) {
        self.events.lock().unwrap().push(event);
    }
}
