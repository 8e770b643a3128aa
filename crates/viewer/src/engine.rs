//! Interaction engine
//!
//! Ties the subsystems together behind the host's event feed: pointer
//! events become highlights, note placements and erasures depending on the
//! active mode; filter changes re-gate the tools and plan redraws; host
//! replies flow back into the store. Everything runs on the embedding's
//! event thread, one event at a time.

use marginalia_bridge::{BridgeReply, HostBridge};
use marginalia_core::{
    AnnotationRef, AnnotationStore, Collection, CollectionFilter, CollectionId, Color, Mode,
    ModeController, NormPoint, NormRect, NormSize, PageNumber, Resolution, SeedReport, StickyNoteId,
    StoreError, ToolColors, UserId,
};
use marginalia_overlay::{OverlayRenderer, PageGeometry, PageScene, PixelRect, RefreshPlan};

use crate::pages::{PageHandle, PageRegistry};

/// Startup configuration for the engine.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// The acting user; recorded as the owner of placed sticky notes.
    pub user_id: UserId,
    /// Externally supplied collection catalog, consumed read-only.
    pub collections: Vec<Collection>,
    /// Collection new annotations are created in (the scope picker's
    /// current value).
    pub scope: CollectionId,
    pub tool_colors: ToolColors,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            user_id: 0,
            collections: Vec::new(),
            scope: 0,
            tool_colors: ToolColors::default(),
        }
    }
}

/// In-progress highlight drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    page: PageNumber,
    start: NormPoint,
    current: NormPoint,
}

/// What a click did under the active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No tool flow consumed the click.
    Ignored,
    /// A sticky note was placed; the host should open its edit widget. The
    /// mode has been reset to `None`.
    NotePlaced { sticky_note_id: StickyNoteId },
    /// The eraser removed a highlight; the host should re-render the page.
    HighlightErased { page: PageNumber },
    /// The eraser hit nothing it could remove.
    EraseMissed,
}

/// The annotation overlay engine.
///
/// Owns all subsystem state; the host drives it with render notifications,
/// pointer events and bridge replies, and paints whatever scenes come back.
pub struct Annotator<B> {
    store: AnnotationStore<B>,
    filter: CollectionFilter,
    mode: ModeController,
    renderer: OverlayRenderer,
    registry: PageRegistry,
    collections: Vec<Collection>,
    user_id: UserId,
    scope: CollectionId,
    drag: Option<DragState>,
}

impl<B: HostBridge> Annotator<B> {
    pub fn new(config: AnnotatorConfig, bridge: B) -> Self {
        Self {
            store: AnnotationStore::new(bridge),
            filter: CollectionFilter::new(),
            mode: ModeController::with_colors(config.tool_colors),
            renderer: OverlayRenderer::new(),
            registry: PageRegistry::new(),
            collections: config.collections,
            user_id: config.user_id,
            scope: config.scope,
            drag: None,
        }
    }

    /// Load the host's startup annotations. Call once before interaction.
    pub fn load_seed(&mut self, records: &[serde_json::Value]) -> SeedReport {
        self.store.load_seed(records)
    }

    /// One page finished rendering on the host side. Registers it (setup
    /// side effects are applied once per page) and returns the scene to
    /// paint over it.
    pub fn page_rendered(
        &mut self,
        page: PageNumber,
        handle: PageHandle,
        geometry: &PageGeometry,
    ) -> PageScene {
        if self.registry.register(page, handle) {
            tracing::debug!(page, "page initialized");
        }
        self.renderer.render_page(&self.store, &self.filter, page, geometry)
    }

    /// Recompute the scene for an already-rendered page, e.g. while working
    /// through a [`RefreshPlan`].
    pub fn render_page(&self, page: PageNumber, geometry: &PageGeometry) -> PageScene {
        self.renderer.render_page(&self.store, &self.filter, page, geometry)
    }

    /// Pointer pressed on a page. Starts a highlight drag when the
    /// highlight tool is active.
    pub fn pointer_down(&mut self, page: PageNumber, x: f64, y: f64, geometry: &PageGeometry) {
        if self.mode.mode() != Mode::Highlight {
            return;
        }
        if !self.registry.is_initialized(page) {
            tracing::debug!(page, "pointer on unregistered page ignored");
            return;
        }

        let start = geometry.normalize(x, y);
        self.drag = Some(DragState { page, start, current: start });
    }

    /// Pointer moved during a drag. Returns the live preview rectangle in
    /// page-local pixels for the host to display.
    pub fn pointer_move(&mut self, x: f64, y: f64, geometry: &PageGeometry) -> Option<PixelRect> {
        if self.mode.mode() != Mode::Highlight {
            return None;
        }
        let drag = self.drag.as_mut()?;
        drag.current = geometry.normalize(x, y);

        let rect = NormRect::from_drag(drag.start, NormSize::between(drag.start, drag.current));
        Some(geometry.project_rect(rect))
    }

    /// Pointer released: commit the drag as a highlight in the current
    /// scope and return the page's new scene. The preview is discarded
    /// either way.
    pub fn pointer_up(&mut self, x: f64, y: f64, geometry: &PageGeometry) -> Option<PageScene> {
        let drag = self.drag.take()?;
        if self.mode.mode() != Mode::Highlight {
            return None;
        }

        let end = geometry.normalize(x, y);
        self.store.create_highlight(
            drag.page,
            drag.start,
            end,
            self.mode.active_color(),
            self.scope,
        );
        Some(self.render_page(drag.page, geometry))
    }

    /// A click on a page, dispatched by the active tool.
    pub fn click(
        &mut self,
        page: PageNumber,
        x: f64,
        y: f64,
        geometry: &PageGeometry,
    ) -> ClickOutcome {
        if !self.registry.is_initialized(page) {
            return ClickOutcome::Ignored;
        }

        match self.mode.mode() {
            Mode::StickyNote => {
                let point = geometry.normalize(x, y);
                let sticky_note_id = self.store.create_sticky_note(
                    page,
                    point,
                    self.mode.active_color(),
                    self.user_id,
                    self.scope,
                );
                // Placement completes the tool's job; back to neutral.
                self.mode.set_mode(Mode::None);
                ClickOutcome::NotePlaced { sticky_note_id }
            }
            Mode::Eraser => {
                let point = geometry.normalize(x, y);
                let Some(hit) = self.store.hit_test(page, point) else {
                    return ClickOutcome::EraseMissed;
                };
                let key = hit.key;
                match self.store.delete_annotation(AnnotationRef::Highlight(key)) {
                    Ok(page) => ClickOutcome::HighlightErased { page },
                    // Pending records cannot be deleted yet; leave the
                    // visual in place.
                    Err(_) => ClickOutcome::EraseMissed,
                }
            }
            Mode::None | Mode::Highlight => ClickOutcome::Ignored,
        }
    }

    /// Store new content for a note and persist it (create on first save,
    /// update afterwards).
    pub fn save_sticky_note(
        &mut self,
        sticky_note_id: StickyNoteId,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.store.save_sticky_note_content(sticky_note_id, content)
    }

    /// Delete a note. On success the host must remove both companion
    /// widgets (edit and display) for the returned page.
    pub fn delete_sticky_note(
        &mut self,
        sticky_note_id: StickyNoteId,
    ) -> Result<PageNumber, StoreError> {
        self.store
            .delete_annotation(AnnotationRef::StickyNote(sticky_note_id))
    }

    /// Toggle one collection in the filter. Re-gates the tools and returns
    /// the redraw plan for every initialized page.
    pub fn toggle_filter(&mut self, id: CollectionId) -> RefreshPlan {
        self.filter.toggle(id);
        self.apply_filter_gate()
    }

    /// Reset the filter to "show all".
    pub fn clear_filter(&mut self) -> RefreshPlan {
        self.filter.clear();
        self.apply_filter_gate()
    }

    /// Route one host reply into the store.
    pub fn deliver_reply(&mut self, reply: BridgeReply) -> Option<Resolution> {
        let resolution = self.store.resolve(reply);
        if let Some(Resolution::DeleteConfirmed { page }) = resolution {
            tracing::debug!(page, "host confirmed deletion");
        }
        resolution
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.mode.set_mode(mode)
    }

    /// Color of the active tool (neutral black for `none`/eraser).
    pub fn active_color(&self) -> Color {
        self.mode.active_color()
    }

    pub fn mode_controller_mut(&mut self) -> &mut ModeController {
        &mut self.mode
    }

    pub fn filter(&self) -> &CollectionFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut CollectionFilter {
        &mut self.filter
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn scope(&self) -> CollectionId {
        self.scope
    }

    /// Point new annotations at a different collection (the scope picker
    /// changed).
    pub fn set_scope(&mut self, scope: CollectionId) {
        self.scope = scope;
    }

    pub fn store(&self) -> &AnnotationStore<B> {
        &self.store
    }

    /// Bridge access for hosts that drain an outbound queue.
    pub fn bridge_mut(&mut self) -> &mut B {
        self.store.bridge_mut()
    }

    fn apply_filter_gate(&mut self) -> RefreshPlan {
        self.mode.apply_filter_state(self.filter.is_restricted());
        self.renderer.filter_refresh(self.registry.initialized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::HostElement;
    use marginalia_bridge::{AnnotationId, OutboundRequest, QueueBridge};
    use serde_json::json;

    fn geometry() -> PageGeometry {
        PageGeometry::new(0.0, 0.0, 1000.0, 500.0)
    }

    fn handle(seed: u64) -> PageHandle {
        PageHandle {
            canvas: HostElement(seed),
            container: HostElement(seed + 1),
        }
    }

    fn annotator() -> Annotator<QueueBridge> {
        let config = AnnotatorConfig {
            user_id: 7,
            collections: vec![
                Collection { name: "Collection 1".to_string(), id: 1 },
                Collection { name: "Collection 2".to_string(), id: 2 },
            ],
            scope: 1,
            tool_colors: ToolColors::default(),
        };
        let mut annotator = Annotator::new(config, QueueBridge::new());
        annotator.page_rendered(1, handle(10), &geometry());
        annotator.page_rendered(2, handle(20), &geometry());
        annotator
    }

    fn persisted_highlight_seed() -> serde_json::Value {
        json!({
            "type": "highlight",
            "id": 50,
            "collectionId": 1,
            "page": 1,
            "color": "#FFFF00",
            "startPosition": { "x": 0.3, "y": 0.3 },
            "endPosition": { "x": 0.7, "y": 0.7 },
        })
    }

    #[test]
    fn page_rendered_returns_the_seeded_scene() {
        let mut annotator = annotator();
        annotator.load_seed(&[persisted_highlight_seed()]);

        let scene = annotator.page_rendered(1, handle(10), &geometry());
        assert_eq!(scene.highlights.len(), 1);
        assert!(scene.notes.is_empty());
    }

    #[test]
    fn drag_commits_a_highlight_in_the_current_scope() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::Highlight);

        annotator.pointer_down(1, 200.0, 100.0, &geometry());
        let preview = annotator.pointer_move(100.0, 50.0, &geometry()).unwrap();
        assert!((preview.x - 100.0).abs() < 1e-9);
        assert!((preview.y - 50.0).abs() < 1e-9);
        assert!((preview.width - 100.0).abs() < 1e-9);
        assert!((preview.height - 50.0).abs() < 1e-9);

        let scene = annotator.pointer_up(100.0, 50.0, &geometry()).unwrap();
        assert_eq!(scene.highlights.len(), 1);

        let highlight = annotator.store().highlights_on(1).next().unwrap();
        assert_eq!(highlight.collection_id, 1);
        assert_eq!(highlight.color, Color::rgb(255, 255, 0));
        assert_eq!(highlight.rel_pos, NormPoint::new(0.2, 0.2));
        assert_eq!(highlight.rel_size, NormSize::new(-0.1, -0.1));

        let requests = annotator.bridge_mut().drain();
        assert!(matches!(requests[0], OutboundRequest::New { .. }));
    }

    #[test]
    fn pointer_events_do_nothing_without_the_highlight_tool() {
        let mut annotator = annotator();

        annotator.pointer_down(1, 200.0, 100.0, &geometry());
        assert!(annotator.pointer_move(300.0, 200.0, &geometry()).is_none());
        assert!(annotator.pointer_up(300.0, 200.0, &geometry()).is_none());
        assert_eq!(annotator.store().highlight_count(), 0);
    }

    #[test]
    fn pointer_down_on_unregistered_page_is_ignored() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::Highlight);

        annotator.pointer_down(9, 200.0, 100.0, &geometry());
        assert!(annotator.pointer_up(300.0, 200.0, &geometry()).is_none());
    }

    #[test]
    fn sticky_note_click_places_a_note_and_resets_the_mode() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::StickyNote);

        let outcome = annotator.click(1, 500.0, 250.0, &geometry());
        let ClickOutcome::NotePlaced { sticky_note_id } = outcome else {
            panic!("expected a placed note, got {outcome:?}");
        };

        assert_eq!(annotator.mode(), Mode::None);
        let note = annotator.store().sticky_note(sticky_note_id).unwrap();
        assert_eq!(note.rel_pos, NormPoint::new(0.5, 0.5));
        assert_eq!(note.owner_id, 7);
        assert_eq!(note.collection_id, 1);
        assert_eq!(note.color, Color::rgb(255, 0, 0));
        assert_eq!(note.content, None);
        assert!(annotator.store().bridge().is_empty(), "placement must not persist");
    }

    #[test]
    fn eraser_click_removes_a_persisted_highlight() {
        let mut annotator = annotator();
        annotator.load_seed(&[persisted_highlight_seed()]);
        annotator.set_mode(Mode::Eraser);

        let outcome = annotator.click(1, 500.0, 250.0, &geometry());
        assert_eq!(outcome, ClickOutcome::HighlightErased { page: 1 });
        assert_eq!(annotator.store().highlight_count(), 0);

        let requests = annotator.bridge_mut().drain();
        match &requests[0] {
            OutboundRequest::Delete { id, .. } => assert_eq!(*id, AnnotationId(50)),
            other => panic!("expected a delete request, got {other:?}"),
        }
    }

    #[test]
    fn eraser_leaves_pending_highlights_alone() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::Highlight);
        annotator.pointer_down(1, 100.0, 100.0, &geometry());
        annotator.pointer_up(400.0, 300.0, &geometry());
        annotator.bridge_mut().drain();

        annotator.set_mode(Mode::Eraser);
        let outcome = annotator.click(1, 200.0, 200.0, &geometry());
        assert_eq!(outcome, ClickOutcome::EraseMissed);
        assert_eq!(annotator.store().highlight_count(), 1);
    }

    #[test]
    fn eraser_misses_empty_space() {
        let mut annotator = annotator();
        annotator.load_seed(&[persisted_highlight_seed()]);
        annotator.set_mode(Mode::Eraser);

        let outcome = annotator.click(1, 950.0, 450.0, &geometry());
        assert_eq!(outcome, ClickOutcome::EraseMissed);
        assert_eq!(annotator.store().highlight_count(), 1);
    }

    #[test]
    fn toggling_the_filter_gates_tools_and_plans_a_full_refresh() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::Highlight);

        let plan = annotator.toggle_filter(2);
        assert_eq!(plan.pages, vec![1, 2]);
        assert_eq!(plan.scroll_nudge.delta_px, 2);
        assert_eq!(annotator.mode(), Mode::None);
        assert!(!annotator.set_mode(Mode::Highlight));

        // Untoggling empties the selection and re-enables the tools.
        let plan = annotator.toggle_filter(2);
        assert_eq!(plan.pages, vec![1, 2]);
        assert!(annotator.set_mode(Mode::Highlight));
    }

    #[test]
    fn restricted_filter_hides_other_collections_in_scenes() {
        let mut annotator = annotator();
        annotator.load_seed(&[persisted_highlight_seed()]);

        annotator.toggle_filter(2);
        let scene = annotator.render_page(1, &geometry());
        assert!(scene.is_empty());

        annotator.clear_filter();
        let scene = annotator.render_page(1, &geometry());
        assert_eq!(scene.highlights.len(), 1);
    }

    #[test]
    fn reply_delivery_fills_in_the_host_id() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::Highlight);
        annotator.pointer_down(1, 100.0, 100.0, &geometry());
        annotator.pointer_up(300.0, 200.0, &geometry());

        let request = annotator.bridge_mut().drain()[0].request_id();
        let resolution = annotator.deliver_reply(BridgeReply::Assigned {
            request,
            id: AnnotationId(31),
        });

        assert!(matches!(
            resolution,
            Some(Resolution::HighlightPersisted { id: AnnotationId(31), .. })
        ));
        let highlight = annotator.store().highlights_on(1).next().unwrap();
        assert_eq!(highlight.id, Some(AnnotationId(31)));
    }

    #[test]
    fn note_save_and_delete_complete_the_widget_lifecycle() {
        let mut annotator = annotator();
        annotator.set_mode(Mode::StickyNote);
        let ClickOutcome::NotePlaced { sticky_note_id } =
            annotator.click(2, 100.0, 100.0, &geometry())
        else {
            panic!("expected a placed note");
        };

        annotator.save_sticky_note(sticky_note_id, "remember this").unwrap();
        let request = annotator.bridge_mut().drain()[0].request_id();
        annotator.deliver_reply(BridgeReply::Assigned {
            request,
            id: AnnotationId(60),
        });

        let page = annotator.delete_sticky_note(sticky_note_id).unwrap();
        assert_eq!(page, 2);
        assert_eq!(annotator.store().sticky_note_count(), 0);
    }

    #[test]
    fn scope_changes_apply_to_later_creations() {
        let mut annotator = annotator();
        annotator.set_scope(2);
        annotator.set_mode(Mode::StickyNote);

        let ClickOutcome::NotePlaced { sticky_note_id } =
            annotator.click(1, 100.0, 100.0, &geometry())
        else {
            panic!("expected a placed note");
        };
        assert_eq!(
            annotator.store().sticky_note(sticky_note_id).unwrap().collection_id,
            2
        );
    }
}
