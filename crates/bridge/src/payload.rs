//! Wire payloads exchanged with the host over the persistence bridge
//!
//! The host speaks a small JSON vocabulary: annotation payloads tagged by
//! `type`, camelCase field names, and normalized page positions. These types
//! serialize to exactly that shape; nothing else in the workspace is allowed
//! to define wire formats.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the host once an annotation has been persisted.
///
/// Opaque to this engine: it is received from the host, stored, and echoed
/// back on update/delete requests. Locally created annotations have no
/// `AnnotationId` until the host acknowledges them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub i64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized page position as it appears on the wire.
///
/// Both components are fractions of the current page dimensions, so the
/// value survives zoom changes on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

impl WirePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Annotation payload for `new`/`update` requests, tagged by `type`.
///
/// Highlights travel as a start/end point pair (the drag endpoints, order
/// preserved); sticky notes as a single position plus content. The optional
/// sticky-note `id` is present on updates and absent on first creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationPayload {
    #[serde(rename = "highlight")]
    Highlight {
        #[serde(rename = "collectionId")]
        collection_id: i64,
        page: u32,
        color: String,
        #[serde(rename = "startPosition")]
        start_position: WirePoint,
        #[serde(rename = "endPosition")]
        end_position: WirePoint,
    },
    #[serde(rename = "stickyNote")]
    StickyNote {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<AnnotationId>,
        #[serde(rename = "collectionId")]
        collection_id: i64,
        content: Option<String>,
        color: String,
        page: u32,
        position: WirePoint,
    },
}

impl AnnotationPayload {
    /// The page this payload targets.
    pub fn page(&self) -> u32 {
        match self {
            AnnotationPayload::Highlight { page, .. } => *page,
            AnnotationPayload::StickyNote { page, .. } => *page,
        }
    }

    /// The wire value of the `type` tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            AnnotationPayload::Highlight { .. } => "highlight",
            AnnotationPayload::StickyNote { .. } => "stickyNote",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_payload_uses_host_field_names() {
        let payload = AnnotationPayload::Highlight {
            collection_id: 3,
            page: 1,
            color: "#FF0000".to_string(),
            start_position: WirePoint::new(0.2, 0.2),
            end_position: WirePoint::new(0.1, 0.1),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "highlight");
        assert_eq!(json["collectionId"], 3);
        assert_eq!(json["startPosition"]["x"], 0.2);
        assert_eq!(json["endPosition"]["y"], 0.1);
    }

    #[test]
    fn sticky_note_payload_omits_absent_id() {
        let payload = AnnotationPayload::StickyNote {
            id: None,
            collection_id: 1,
            content: Some("margin note".to_string()),
            color: "#FF0000".to_string(),
            page: 2,
            position: WirePoint::new(0.5, 0.5),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "stickyNote");
        assert!(json.get("id").is_none());
        assert_eq!(json["content"], "margin note");
    }

    #[test]
    fn sticky_note_payload_carries_id_on_update() {
        let payload = AnnotationPayload::StickyNote {
            id: Some(AnnotationId(42)),
            collection_id: 1,
            content: Some("revised".to_string()),
            color: "#00FF00".to_string(),
            page: 2,
            position: WirePoint::new(0.5, 0.5),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["id"], 42);
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = AnnotationPayload::Highlight {
            collection_id: 7,
            page: 4,
            color: "#FFFF00".to_string(),
            start_position: WirePoint::new(0.25, 0.75),
            end_position: WirePoint::new(0.5, 0.5),
        };

        let json = serde_json::to_string(&payload).unwrap();
        let parsed: AnnotationPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
    }
}
