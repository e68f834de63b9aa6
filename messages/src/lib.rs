//! Typed message payloads exchanged between the network layer and the
//! consensus subsystem.
//!
//! Inbound payloads form a closed tagged union decoded once at the ingress
//! boundary, so downstream code pattern-matches statically-typed values.
//! Outbound events flow through the [`MessageSink`] trait implemented by the
//! network/event collaborator.

pub mod inbound;
pub mod outbound;
pub mod source;
pub mod vote;

pub use inbound::{InboundMessage, Topic};
pub use outbound::{MessageSink, NetPayload, OutboundEvent};
pub use source::{BlockSource, Origin};
pub use vote::ConfirmAck;
