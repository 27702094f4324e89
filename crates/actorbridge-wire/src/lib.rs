//! Actor bridge wire protocol: request/reply correlation over a one-way,
//! string-only message channel.
//!
//! ## Architecture
//!
//! - **WireRequest / InboundMessage**: JSON messages and the classifier that
//!   turns untagged inbound shapes into a typed enum
//! - **CorrelationBus**: per-request identifiers and one-shot reply slots
//! - **ReadinessGate**: latch that holds traffic until the remote surface is live
//! - **ChannelTransport**: outbound delivery with an origin restriction,
//!   plus an in-process [`memory_channel`]

pub mod correlation;
pub mod message;
pub mod readiness;
pub mod transport;

pub use correlation::{CorrelationBus, PendingReply};
pub use message::{
    decode_inbound, encode_request, Action, ChoiceNotice, InboundMessage, ReplyOutcome,
    WireRequest,
};
pub use readiness::ReadinessGate;
pub use transport::{memory_channel, ChannelTransport, InboundEnvelope, MemoryTransport, RemoteEndpoint};
