//! Overlay scene primitives
//!
//! The renderer's output vocabulary: pixel-space quads and note widget
//! placements for one page. The host paints these however it likes (canvas,
//! DOM, GPU); nothing here touches a drawing surface.

use marginalia_core::{Color, NormPoint, NormRect, PageNumber, StickyNoteId, UserId};
use serde::{Deserialize, Serialize};

/// Fill alpha for highlight quads.
pub const HIGHLIGHT_OPACITY: f32 = 0.2;

/// Current pixel bounding box of one rendered page.
///
/// Supplied by the host at every render call and never cached: the box
/// changes on zoom and relayout, and normalized coordinates are projected
/// through whatever box is current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Viewport x of the page box's left edge.
    pub left: f64,
    /// Viewport y of the page box's top edge.
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Convert a viewport position into normalized page coordinates.
    pub fn normalize(&self, x: f64, y: f64) -> NormPoint {
        NormPoint::new((x - self.left) / self.width, (y - self.top) / self.height)
    }

    /// Project a normalized point into page-local pixels.
    pub fn project(&self, point: NormPoint) -> (f64, f64) {
        (point.x * self.width, point.y * self.height)
    }

    /// Project a normalized rectangle into a page-local pixel rectangle.
    pub fn project_rect(&self, rect: NormRect) -> PixelRect {
        PixelRect {
            x: rect.x * self.width,
            y: rect.y * self.height,
            width: rect.width * self.width,
            height: rect.height * self.height,
        }
    }
}

/// Axis-aligned rectangle in page-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One highlight, positioned for painting.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightQuad {
    pub rect: PixelRect,
    pub color: Color,
    pub opacity: f32,
}

/// Which of a note's two companion widgets the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteWidgetState {
    /// Freshly placed, never saved: the edit widget is open.
    Editing,
    /// Saved at least once: the display widget shows the content.
    Display,
}

/// One sticky note, positioned for the host's widget layer.
///
/// Profile pictures stay a host concern; the widget exposes the owner id
/// for the host's user directory lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteWidget {
    pub sticky_note_id: StickyNoteId,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub content: Option<String>,
    pub owner_id: UserId,
    pub state: NoteWidgetState,
}

/// Everything to paint on one page, produced by a single render pass.
///
/// A scene fully replaces whatever was painted before; repeated renders of
/// unchanged state produce equal scenes, never accumulated duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct PageScene {
    pub page: PageNumber,
    pub highlights: Vec<HighlightQuad>,
    pub notes: Vec<NoteWidget>,
}

impl PageScene {
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.notes.is_empty()
    }
}
