//! Inbound message topics and payloads.

use crate::vote::ConfirmAck;
use lattice_ledger::{ProcessResult, StateBlock};
use lattice_types::BlockHash;
use std::fmt;

/// The consensus topics the receiver subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Publish,
    ConfirmReq,
    ConfirmAck,
    SyncBlock,
    GenerateBlock,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::Publish => "publish",
            Topic::ConfirmReq => "confirm_req",
            Topic::ConfirmAck => "confirm_ack",
            Topic::SyncBlock => "sync_block",
            Topic::GenerateBlock => "generate_block",
        };
        write!(f, "{name}")
    }
}

/// One inbound message, decoded at the ingress boundary.
///
/// `hash` is the transport-level message hash used for deduplication, not
/// necessarily the block hash. `peer` is the sending peer's id, absent for
/// locally originated messages.
#[derive(Clone, Debug)]
pub enum InboundMessage {
    Publish {
        block: StateBlock,
        hash: BlockHash,
        peer: Option<String>,
    },
    ConfirmReq {
        block: StateBlock,
        hash: BlockHash,
        peer: Option<String>,
    },
    ConfirmAck {
        ack: ConfirmAck,
        hash: BlockHash,
        peer: Option<String>,
    },
    SyncBlock {
        block: StateBlock,
    },
    /// A locally generated block, already classified by the generator.
    GenerateBlock {
        result: ProcessResult,
        block: StateBlock,
    },
}

impl InboundMessage {
    pub fn topic(&self) -> Topic {
        match self {
            InboundMessage::Publish { .. } => Topic::Publish,
            InboundMessage::ConfirmReq { .. } => Topic::ConfirmReq,
            InboundMessage::ConfirmAck { .. } => Topic::ConfirmAck,
            InboundMessage::SyncBlock { .. } => Topic::SyncBlock,
            InboundMessage::GenerateBlock { .. } => Topic::GenerateBlock,
        }
    }
}
