//! Overlay renderer
//!
//! A pure function from annotation state, filter state and page geometry to
//! a [`PageScene`]. Holding no state of its own keeps it trivially
//! idempotent: every call recomputes the full scene (clear and redraw), so
//! repeated renders can never stack duplicate visuals.

use std::time::Duration;

use marginalia_bridge::HostBridge;
use marginalia_core::{AnnotationStore, CollectionFilter, PageNumber};

use crate::scene::{
    HighlightQuad, NoteWidget, NoteWidgetState, PageGeometry, PageScene, HIGHLIGHT_OPACITY,
};

/// Scroll jitter the host must apply after a filter-driven redraw.
///
/// The host viewer caches its page layers and will not repaint them for an
/// overlay-only change; nudging the scroll position and reverting it after a
/// short delay invalidates that cache. This is a host workaround carried on
/// the plan, not overlay logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollNudge {
    /// Pixels to add to the scroll position, then subtract again.
    pub delta_px: i32,
    /// Delay before reverting.
    pub revert_after: Duration,
}

impl Default for ScrollNudge {
    fn default() -> Self {
        Self {
            delta_px: 2,
            revert_after: Duration::from_millis(10),
        }
    }
}

/// Redraw instructions handed to the host after a filter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPlan {
    /// Pages to reset and repaint, in page order.
    pub pages: Vec<PageNumber>,
    pub scroll_nudge: ScrollNudge,
}

/// Produces paint-ready scenes from the store and filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the full scene for one page.
    ///
    /// Only annotations whose collection passes the filter appear. Geometry
    /// is applied fresh on every call; nothing pixel-shaped is retained
    /// between calls.
    pub fn render_page<B: HostBridge>(
        &self,
        store: &AnnotationStore<B>,
        filter: &CollectionFilter,
        page: PageNumber,
        geometry: &PageGeometry,
    ) -> PageScene {
        let highlights = store
            .highlights_on(page)
            .filter(|highlight| filter.is_visible(highlight.collection_id))
            .map(|highlight| HighlightQuad {
                rect: geometry.project_rect(highlight.rect()),
                color: highlight.color,
                opacity: HIGHLIGHT_OPACITY,
            })
            .collect();

        let notes = store
            .sticky_notes_on(page)
            .filter(|note| filter.is_visible(note.collection_id))
            .map(|note| {
                let (x, y) = geometry.project(note.rel_pos);
                NoteWidget {
                    sticky_note_id: note.sticky_note_id,
                    x,
                    y,
                    color: note.color,
                    content: note.content.clone(),
                    owner_id: note.owner_id,
                    state: if note.content.is_none() {
                        NoteWidgetState::Editing
                    } else {
                        NoteWidgetState::Display
                    },
                }
            })
            .collect();

        PageScene { page, highlights, notes }
    }

    /// Plan the redraw cycle after a filter change: every initialized page
    /// gets a full reset-and-repaint, plus the scroll nudge.
    ///
    /// Filter changes affect visibility, not geometry, so a full redraw is
    /// the contract here; there is no incremental diffing.
    pub fn filter_refresh(&self, initialized: impl IntoIterator<Item = PageNumber>) -> RefreshPlan {
        let mut pages: Vec<PageNumber> = initialized.into_iter().collect();
        pages.sort_unstable();
        pages.dedup();

        RefreshPlan {
            pages,
            scroll_nudge: ScrollNudge::default(),
        }
    }
}
