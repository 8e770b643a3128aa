//! Annotation engine core
//!
//! State model for the annotation overlay: normalized-coordinate records,
//! the in-memory store with its host persistence lifecycle, the collection
//! filter, and the interaction mode machine.

pub mod annotation;
pub mod filter;
pub mod mode;
pub mod seed;
pub mod store;

pub use annotation::{
    Color, ColorParseError, CollectionId, Highlight, HighlightKey, NormPoint, NormRect, NormSize,
    PageNumber, StickyNote, StickyNoteId, UserId,
};
pub use filter::{Collection, CollectionFilter};
pub use mode::{Mode, ModeController, ToolColors};
pub use seed::SeedReport;
pub use store::{AnnotationRef, AnnotationStore, Resolution, StoreError};
