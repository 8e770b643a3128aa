//! Viewer embedding surface
//!
//! Everything a host viewer needs to run the annotation overlay: the page
//! registry fed by render notifications, and the interaction engine that
//! turns pointer events, filter changes and bridge replies into scenes and
//! redraw plans.

pub mod engine;
pub mod pages;

pub use engine::{Annotator, AnnotatorConfig, ClickOutcome};
pub use pages::{HostElement, PageHandle, PageRegistry};
