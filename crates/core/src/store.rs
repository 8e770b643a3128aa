//! In-memory annotation store
//!
//! Single owner of all highlight and sticky-note records, and the only
//! component that talks to the host persistence bridge. Mutations are
//! optimistic: records enter (or leave) the in-memory collections
//! immediately, and the host's reply later fills in the assigned identifier
//! via [`AnnotationStore::resolve`].
//!
//! All access happens on the embedding's event thread; the store itself does
//! no locking. A multi-threaded embedding must funnel calls through a single
//! owner to keep the per-event atomicity the interaction code relies on.

use std::collections::HashMap;

use marginalia_bridge::{
    AnnotationId, AnnotationPayload, BridgeReply, HostBridge, OutboundRequest, RequestId,
};

use crate::annotation::{
    Color, CollectionId, Highlight, HighlightKey, NormPoint, NormSize, PageNumber, StickyNote,
    StickyNoteId, UserId,
};

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No resident highlight carries this key.
    #[error("unknown {0}")]
    UnknownHighlight(HighlightKey),
    /// No resident sticky note carries this id.
    #[error("unknown {0}")]
    UnknownStickyNote(StickyNoteId),
    /// The record has no host id yet; the host protocol cannot address it,
    /// so the delete is rejected and the record stays resident.
    #[error("annotation has no host id yet; delete rejected")]
    NotPersisted,
}

/// Reference to one resident annotation, by its local key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationRef {
    Highlight(HighlightKey),
    StickyNote(StickyNoteId),
}

/// What an in-flight request will touch when its reply arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingTarget {
    Highlight(HighlightKey),
    StickyNote(StickyNoteId),
    Deletion { page: PageNumber },
}

/// Outcome of applying one host reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    HighlightPersisted {
        key: HighlightKey,
        id: AnnotationId,
    },
    StickyNotePersisted {
        sticky_note_id: StickyNoteId,
        id: AnnotationId,
    },
    DeleteConfirmed {
        page: PageNumber,
    },
}

/// Owner of all annotation records and their persistence lifecycle.
///
/// `B` is the transport to the host; tests and queue-draining hosts use
/// [`marginalia_bridge::QueueBridge`].
pub struct AnnotationStore<B> {
    highlights: Vec<Highlight>,
    sticky_notes: Vec<StickyNote>,
    pending: HashMap<RequestId, PendingTarget>,
    next_sticky_note_id: u64,
    next_highlight_key: u64,
    next_request_id: u64,
    bridge: B,
}

impl<B: HostBridge> AnnotationStore<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            highlights: Vec::new(),
            sticky_notes: Vec::new(),
            pending: HashMap::new(),
            next_sticky_note_id: 1,
            next_highlight_key: 1,
            next_request_id: 1,
            bridge,
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Create a highlight from the two drag endpoints and request its
    /// persistence.
    ///
    /// `rel_pos` is the drag start point and `rel_size` the signed
    /// `end - start` extent; the record is resident (and hit-testable)
    /// immediately, with no host id until the create reply arrives.
    pub fn create_highlight(
        &mut self,
        page: PageNumber,
        start: NormPoint,
        end: NormPoint,
        color: Color,
        collection_id: CollectionId,
    ) -> HighlightKey {
        let key = HighlightKey(self.next_highlight_key);
        self.next_highlight_key += 1;

        self.highlights.push(Highlight {
            key,
            id: None,
            collection_id,
            page,
            rel_pos: start,
            rel_size: NormSize::between(start, end),
            color,
        });
        tracing::debug!(%key, page, "highlight created");

        let payload = AnnotationPayload::Highlight {
            collection_id,
            page,
            color: color.to_hex(),
            start_position: start.into(),
            end_position: end.into(),
        };
        let request = self.next_request();
        self.dispatch(
            OutboundRequest::New { request, payload },
            PendingTarget::Highlight(key),
        );
        key
    }

    /// Place a sticky note. Content starts empty and nothing is sent to the
    /// host until the first [`save_sticky_note_content`] call.
    ///
    /// [`save_sticky_note_content`]: AnnotationStore::save_sticky_note_content
    pub fn create_sticky_note(
        &mut self,
        page: PageNumber,
        point: NormPoint,
        color: Color,
        owner_id: UserId,
        collection_id: CollectionId,
    ) -> StickyNoteId {
        let sticky_note_id = StickyNoteId(self.next_sticky_note_id);
        self.next_sticky_note_id += 1;

        self.sticky_notes.push(StickyNote {
            sticky_note_id,
            id: None,
            owner_id,
            collection_id,
            page,
            rel_pos: point,
            color,
            content: None,
        });
        tracing::debug!(%sticky_note_id, page, "sticky note placed");
        sticky_note_id
    }

    /// Store new note content and persist it: a create request on the first
    /// save, an update afterwards.
    pub fn save_sticky_note_content(
        &mut self,
        sticky_note_id: StickyNoteId,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let note = self
            .sticky_notes
            .iter_mut()
            .find(|note| note.sticky_note_id == sticky_note_id)
            .ok_or(StoreError::UnknownStickyNote(sticky_note_id))?;

        note.content = Some(content.into());

        let first_save = note.id.is_none();
        let payload = AnnotationPayload::StickyNote {
            id: note.id,
            collection_id: note.collection_id,
            content: note.content.clone(),
            color: note.color.to_hex(),
            page: note.page,
            position: note.rel_pos.into(),
        };

        let request = self.next_request();
        let outbound = if first_save {
            OutboundRequest::New { request, payload }
        } else {
            OutboundRequest::Update { request, payload }
        };
        self.dispatch(outbound, PendingTarget::StickyNote(sticky_note_id));
        Ok(())
    }

    /// Remove an annotation and request its deletion from the host.
    ///
    /// The record leaves the in-memory collections synchronously; the reply
    /// only confirms. A record the host has not acknowledged yet cannot be
    /// addressed by the delete protocol: the call warns, returns
    /// [`StoreError::NotPersisted`] and leaves the record resident, so the
    /// caller must skip its visual removal too.
    pub fn delete_annotation(&mut self, target: AnnotationRef) -> Result<PageNumber, StoreError> {
        let (id, page) = match target {
            AnnotationRef::Highlight(key) => {
                let index = self
                    .highlights
                    .iter()
                    .position(|highlight| highlight.key == key)
                    .ok_or(StoreError::UnknownHighlight(key))?;
                let Some(id) = self.highlights[index].id else {
                    tracing::warn!(%key, "delete rejected: highlight not yet persisted");
                    return Err(StoreError::NotPersisted);
                };
                let page = self.highlights[index].page;
                self.highlights.remove(index);
                (id, page)
            }
            AnnotationRef::StickyNote(sticky_note_id) => {
                let index = self
                    .sticky_notes
                    .iter()
                    .position(|note| note.sticky_note_id == sticky_note_id)
                    .ok_or(StoreError::UnknownStickyNote(sticky_note_id))?;
                let Some(id) = self.sticky_notes[index].id else {
                    tracing::warn!(%sticky_note_id, "delete rejected: sticky note not yet persisted");
                    return Err(StoreError::NotPersisted);
                };
                let page = self.sticky_notes[index].page;
                self.sticky_notes.remove(index);
                (id, page)
            }
        };

        tracing::debug!(%id, page, "annotation removed, requesting host delete");
        let request = self.next_request();
        self.dispatch(
            OutboundRequest::Delete { request, id },
            PendingTarget::Deletion { page },
        );
        Ok(page)
    }

    /// Apply one host reply to the record it was issued for.
    ///
    /// Replies are at-most-once: the pending entry is consumed, and a reply
    /// whose request id is unknown (duplicate, stale, or never dispatched)
    /// is logged and discarded.
    pub fn resolve(&mut self, reply: BridgeReply) -> Option<Resolution> {
        let request = reply.request_id();
        let Some(target) = self.pending.remove(&request) else {
            tracing::warn!(%request, "reply for unknown or already-resolved request");
            return None;
        };

        match (reply, target) {
            (BridgeReply::Assigned { id, .. }, PendingTarget::Highlight(key)) => {
                let Some(highlight) = self.highlights.iter_mut().find(|h| h.key == key) else {
                    tracing::warn!(%key, %id, "create reply for a highlight no longer resident");
                    return None;
                };
                highlight.id = Some(id);
                Some(Resolution::HighlightPersisted { key, id })
            }
            (BridgeReply::Assigned { id, .. }, PendingTarget::StickyNote(sticky_note_id)) => {
                let Some(note) = self
                    .sticky_notes
                    .iter_mut()
                    .find(|n| n.sticky_note_id == sticky_note_id)
                else {
                    tracing::warn!(%sticky_note_id, %id, "reply for a sticky note no longer resident");
                    return None;
                };
                note.id = Some(id);
                Some(Resolution::StickyNotePersisted { sticky_note_id, id })
            }
            (BridgeReply::Deleted { .. }, PendingTarget::Deletion { page }) => {
                Some(Resolution::DeleteConfirmed { page })
            }
            (reply, target) => {
                tracing::warn!(?reply, ?target, "reply kind does not match pending request");
                None
            }
        }
    }

    /// First highlight on `page` containing `point`, in insertion order.
    ///
    /// Deliberately not z-order or smallest-area: when highlights overlap,
    /// the oldest one wins, which is what erasure operates on.
    pub fn hit_test(&self, page: PageNumber, point: NormPoint) -> Option<&Highlight> {
        self.highlights
            .iter()
            .find(|highlight| highlight.page == page && highlight.contains(point))
    }

    pub fn highlight(&self, key: HighlightKey) -> Option<&Highlight> {
        self.highlights.iter().find(|highlight| highlight.key == key)
    }

    pub fn sticky_note(&self, sticky_note_id: StickyNoteId) -> Option<&StickyNote> {
        self.sticky_notes
            .iter()
            .find(|note| note.sticky_note_id == sticky_note_id)
    }

    /// Highlights on `page`, in insertion order.
    pub fn highlights_on(&self, page: PageNumber) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .iter()
            .filter(move |highlight| highlight.page == page)
    }

    /// Sticky notes on `page`, in insertion order.
    pub fn sticky_notes_on(&self, page: PageNumber) -> impl Iterator<Item = &StickyNote> {
        self.sticky_notes
            .iter()
            .filter(move |note| note.page == page)
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
    }

    pub fn sticky_note_count(&self) -> usize {
        self.sticky_notes.len()
    }

    /// Number of requests still awaiting a host reply.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn insert_seed_highlight(
        &mut self,
        id: AnnotationId,
        collection_id: CollectionId,
        page: PageNumber,
        rel_pos: NormPoint,
        rel_size: NormSize,
        color: Color,
    ) {
        let key = HighlightKey(self.next_highlight_key);
        self.next_highlight_key += 1;
        self.highlights.push(Highlight {
            key,
            id: Some(id),
            collection_id,
            page,
            rel_pos,
            rel_size,
            color,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_seed_sticky_note(
        &mut self,
        id: AnnotationId,
        owner_id: UserId,
        collection_id: CollectionId,
        page: PageNumber,
        rel_pos: NormPoint,
        color: Color,
        content: Option<String>,
    ) {
        let sticky_note_id = StickyNoteId(self.next_sticky_note_id);
        self.next_sticky_note_id += 1;
        self.sticky_notes.push(StickyNote {
            sticky_note_id,
            id: Some(id),
            owner_id,
            collection_id,
            page,
            rel_pos,
            color,
            content,
        });
    }

    fn next_request(&mut self) -> RequestId {
        let request = RequestId(self.next_request_id);
        self.next_request_id += 1;
        request
    }

    /// Hand a request to the bridge, remembering it for reply correlation.
    /// An unavailable host drops the request: no retry, no queueing, and no
    /// pending entry (a reply can never arrive).
    fn dispatch(&mut self, request: OutboundRequest, target: PendingTarget) {
        let request_id = request.request_id();
        match self.bridge.send(request) {
            Ok(()) => {
                self.pending.insert(request_id, target);
            }
            Err(error) => {
                tracing::warn!(%request_id, %error, "persistence request dropped");
            }
        }
    }
}
