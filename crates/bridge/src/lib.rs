//! Host persistence bridge contract
//!
//! Wire payloads and the request/reply protocol the annotation engine uses
//! to persist through its embedding host. Contract only: the transport (a
//! parent-frame channel, an RPC client) lives on the host side.

pub mod payload;
pub mod protocol;

pub use payload::{AnnotationId, AnnotationPayload, WirePoint};
pub use protocol::{
    BridgeError, BridgeReply, DetachedBridge, HostBridge, OutboundRequest, QueueBridge, RequestId,
};
