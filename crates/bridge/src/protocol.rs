//! Request/reply protocol between the engine and the host
//!
//! Persistence is fire-and-forget with a completion reply: the engine sends
//! an [`OutboundRequest`] carrying a fresh [`RequestId`], continues
//! immediately, and the host answers at an unspecified later time with a
//! [`BridgeReply`] bearing the same id. The protocol makes no delivery
//! promises beyond at-most-once replies:
//!
//! - no timeout, cancellation, or retry — a reply that never arrives leaves
//!   the annotation permanently without a host id;
//! - replies are assumed to arrive in request order within one annotation's
//!   lifecycle, but nothing enforces it; hosts that reorder create/delete
//!   replies can race. Callers needing reliability must layer an idempotent
//!   outbox on top.

use crate::payload::{AnnotationId, AnnotationPayload};

/// Correlation key for one in-flight request.
///
/// Monotonically increasing for the lifetime of the process; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// One persistence request sent to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    /// Persist a newly created annotation; answered by `Assigned`.
    New {
        request: RequestId,
        payload: AnnotationPayload,
    },
    /// Re-persist an already-known annotation; answered by `Assigned`.
    Update {
        request: RequestId,
        payload: AnnotationPayload,
    },
    /// Remove a persisted annotation; answered by `Deleted`.
    Delete {
        request: RequestId,
        id: AnnotationId,
    },
}

impl OutboundRequest {
    /// The correlation key the host must echo back.
    pub fn request_id(&self) -> RequestId {
        match self {
            OutboundRequest::New { request, .. }
            | OutboundRequest::Update { request, .. }
            | OutboundRequest::Delete { request, .. } => *request,
        }
    }
}

/// Completion of an earlier request, delivered by the host.
///
/// Each request receives at most one reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeReply {
    /// The host persisted a `New`/`Update` request and assigned (or
    /// confirmed) the annotation's identifier.
    Assigned {
        request: RequestId,
        id: AnnotationId,
    },
    /// The host completed a `Delete` request.
    Deleted { request: RequestId },
}

impl BridgeReply {
    pub fn request_id(&self) -> RequestId {
        match self {
            BridgeReply::Assigned { request, .. } | BridgeReply::Deleted { request } => *request,
        }
    }
}

/// Error surfaced when a request cannot be handed to the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No host listener is attached. The request is dropped; there is no
    /// retry and no queueing on this side of the boundary.
    #[error("no host listener attached; request dropped")]
    Unavailable,
}

/// Transport seam to the host's persistence layer.
///
/// Implementations forward requests to whatever the embedding provides — a
/// parent-frame message channel, an RPC client, a test buffer. `send` must
/// not block: completion arrives later as a [`BridgeReply`].
pub trait HostBridge {
    fn send(&mut self, request: OutboundRequest) -> Result<(), BridgeError>;
}

/// Bridge that buffers requests for the host to drain.
///
/// The reference implementation for hosts that poll an outbound queue, and
/// the double used throughout the workspace's tests.
#[derive(Debug, Default)]
pub struct QueueBridge {
    queue: Vec<OutboundRequest>,
}

impl QueueBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return all buffered requests, oldest first.
    pub fn drain(&mut self) -> Vec<OutboundRequest> {
        std::mem::take(&mut self.queue)
    }

    /// Buffered requests, oldest first, without draining.
    pub fn pending(&self) -> &[OutboundRequest] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl HostBridge for QueueBridge {
    fn send(&mut self, request: OutboundRequest) -> Result<(), BridgeError> {
        self.queue.push(request);
        Ok(())
    }
}

/// Bridge with no host attached: every send fails with `Unavailable`.
///
/// Used when the engine runs detached from a host (previews, tests of the
/// degraded path).
#[derive(Debug, Default)]
pub struct DetachedBridge;

impl HostBridge for DetachedBridge {
    fn send(&mut self, _request: OutboundRequest) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::WirePoint;

    fn highlight_payload() -> AnnotationPayload {
        AnnotationPayload::Highlight {
            collection_id: 1,
            page: 1,
            color: "#FFFF00".to_string(),
            start_position: WirePoint::new(0.1, 0.1),
            end_position: WirePoint::new(0.2, 0.2),
        }
    }

    #[test]
    fn queue_bridge_preserves_request_order() {
        let mut bridge = QueueBridge::new();

        bridge
            .send(OutboundRequest::New {
                request: RequestId(1),
                payload: highlight_payload(),
            })
            .unwrap();
        bridge
            .send(OutboundRequest::Delete {
                request: RequestId(2),
                id: AnnotationId(9),
            })
            .unwrap();

        let drained = bridge.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].request_id(), RequestId(1));
        assert_eq!(drained[1].request_id(), RequestId(2));
        assert!(bridge.is_empty());
    }

    #[test]
    fn detached_bridge_rejects_every_send() {
        let mut bridge = DetachedBridge;

        let result = bridge.send(OutboundRequest::Delete {
            request: RequestId(1),
            id: AnnotationId(1),
        });
        assert!(matches!(result, Err(BridgeError::Unavailable)));
    }

    #[test]
    fn reply_exposes_its_request_id() {
        let assigned = BridgeReply::Assigned {
            request: RequestId(5),
            id: AnnotationId(77),
        };
        assert_eq!(assigned.request_id(), RequestId(5));

        let deleted = BridgeReply::Deleted {
            request: RequestId(6),
        };
        assert_eq!(deleted.request_id(), RequestId(6));
    }
}
