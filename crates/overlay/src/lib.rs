//! Overlay rendering
//!
//! Turns annotation state plus current page geometry into paint-ready
//! scenes. Headless by design: the host owns the drawing surfaces.

pub mod renderer;
pub mod scene;

pub use renderer::{OverlayRenderer, RefreshPlan, ScrollNudge};
pub use scene::{
    HighlightQuad, NoteWidget, NoteWidgetState, PageGeometry, PageScene, PixelRect,
    HIGHLIGHT_OPACITY,
};
