//! Annotation data model
//!
//! Records live in normalized page coordinates: every position and size is a
//! fraction of the current page dimensions, so zoom changes on the host side
//! never invalidate stored state. Pixel geometry exists only at render time.

use marginalia_bridge::{AnnotationId, WirePoint};
use serde::{Deserialize, Serialize};

/// 1-based page number, keyed to the host viewer's pages.
pub type PageNumber = u32;

/// Opaque collection identifier from the external collection catalog.
pub type CollectionId = i64;

/// Opaque user identifier from the host's user directory.
pub type UserId = i64;

/// Store-assigned key for a sticky note.
///
/// Assigned immediately at creation, before (and independent of) the host
/// [`AnnotationId`], so UI widgets have a stable correlation key for notes
/// the host has not acknowledged yet. Monotonic for the process lifetime;
/// never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StickyNoteId(pub u64);

impl std::fmt::Display for StickyNoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "note#{}", self.0)
    }
}

/// Store-assigned key for a highlight.
///
/// Keeps a pending highlight addressable until the host's create reply
/// arrives and its [`AnnotationId`] is filled in. Local-only; never
/// serialized. Same monotonic, never-reused discipline as [`StickyNoteId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighlightKey(pub u64);

impl std::fmt::Display for HighlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "highlight#{}", self.0)
    }
}

/// Error parsing an RGB hex color string.
#[derive(Debug, thiserror::Error)]
#[error("invalid RGB hex color {0:?}")]
pub struct ColorParseError(String);

/// RGB color carried as `#RRGGBB` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Neutral default, returned when no tool color applies.
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` string, case-insensitive.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(hex.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError(hex.to_string()));
        }

        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorParseError(hex.to_string()))
        };

        Ok(Self {
            r: component(0..2)?,
            g: component(2..4)?,
            b: component(4..6)?,
        })
    }

    /// Format as `#RRGGBB`, uppercase.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Position in normalized page coordinates, `[0, 1]` per axis at capture
/// time (values are not clamped; geometry conversions own the range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<NormPoint> for WirePoint {
    fn from(point: NormPoint) -> Self {
        WirePoint::new(point.x, point.y)
    }
}

impl From<WirePoint> for NormPoint {
    fn from(point: WirePoint) -> Self {
        NormPoint::new(point.x, point.y)
    }
}

/// Signed size in normalized page coordinates.
///
/// The sign encodes drag direction: a drag up-and-left from its start point
/// yields negative components. Two drags covering the same region from
/// opposite corners produce distinct sizes; [`NormRect::from_drag`] is the
/// single place that collapses them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormSize {
    pub width: f64,
    pub height: f64,
}

impl NormSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Component-wise `end - start`.
    pub fn between(start: NormPoint, end: NormPoint) -> Self {
        Self::new(end.x - start.x, end.y - start.y)
    }
}

/// Axis-aligned rectangle in normalized coordinates with positive extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormRect {
    /// Normalize a drag-start position and signed size into a geometric
    /// rectangle: origin moves by the negative components, extent is the
    /// absolute size.
    pub fn from_drag(pos: NormPoint, size: NormSize) -> Self {
        Self {
            x: pos.x + size.width.min(0.0),
            y: pos.y + size.height.min(0.0),
            width: size.width.abs(),
            height: size.height.abs(),
        }
    }

    /// Containment check, inclusive on all four edges.
    pub fn contains(&self, point: NormPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// A rectangular highlight on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    /// Store-assigned local key; see [`HighlightKey`].
    pub key: HighlightKey,
    /// Host identifier; `None` until the create reply arrives.
    pub id: Option<AnnotationId>,
    pub collection_id: CollectionId,
    pub page: PageNumber,
    /// Drag start point, not necessarily the rectangle's geometric origin.
    pub rel_pos: NormPoint,
    /// Signed drag extent; see [`NormSize`].
    pub rel_size: NormSize,
    pub color: Color,
}

impl Highlight {
    /// The geometric rectangle this highlight covers.
    pub fn rect(&self) -> NormRect {
        NormRect::from_drag(self.rel_pos, self.rel_size)
    }

    pub fn contains(&self, point: NormPoint) -> bool {
        self.rect().contains(point)
    }

    /// Whether the host has not yet acknowledged this record.
    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }
}

/// A sticky note anchored to one point on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct StickyNote {
    pub sticky_note_id: StickyNoteId,
    /// Host identifier; `None` until the first save is acknowledged.
    pub id: Option<AnnotationId>,
    pub owner_id: UserId,
    pub collection_id: CollectionId,
    pub page: PageNumber,
    pub rel_pos: NormPoint,
    pub color: Color,
    /// `None` means freshly placed and never saved; the note has not been
    /// sent to the host yet.
    pub content: Option<String>,
}

impl StickyNote {
    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }
}
