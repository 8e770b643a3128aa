//! Collection filter
//!
//! Owns the set of selected collection ids and answers the one question the
//! rest of the engine asks: is an annotation in this collection currently
//! visible? An empty selection is the designated "show all" sentinel, not
//! "show none".

use std::collections::BTreeSet;

use crate::annotation::CollectionId;
use serde::{Deserialize, Serialize};

/// One entry of the externally supplied collection catalog.
///
/// Consumed read-only; uniqueness of ids is an input invariant, not checked
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub id: CollectionId,
}

type FilterListener = Box<dyn FnMut(&BTreeSet<CollectionId>)>;

/// Multi-select membership filter over collection ids.
///
/// `is_visible` is a pure function of the current selection; mutations
/// notify subscribers synchronously, in registration order.
#[derive(Default)]
pub struct CollectionFilter {
    selected: BTreeSet<CollectionId>,
    listeners: Vec<FilterListener>,
}

impl CollectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present. Ids are opaque; no
    /// bounds checking against the catalog.
    pub fn toggle(&mut self, id: CollectionId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        self.notify();
    }

    /// Reset to the "show all" state (the catalog's "All" option).
    pub fn clear(&mut self) {
        self.selected.clear();
        self.notify();
    }

    /// Whether annotations in `collection_id` should currently be shown.
    pub fn is_visible(&self, collection_id: CollectionId) -> bool {
        self.selected.is_empty() || self.selected.contains(&collection_id)
    }

    /// Whether the view is restricted to an explicit selection.
    pub fn is_restricted(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn selected(&self) -> &BTreeSet<CollectionId> {
        &self.selected
    }

    /// Register a listener invoked synchronously after every mutation, with
    /// the selection as of that mutation. Not debounced.
    pub fn subscribe(&mut self, listener: FilterListener) {
        self.listeners.push(listener);
    }

    fn notify(&mut self) {
        let selected = self.selected.clone();
        for listener in &mut self.listeners {
            listener(&selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn empty_selection_shows_everything() {
        let filter = CollectionFilter::new();
        assert!(filter.is_visible(1));
        assert!(filter.is_visible(999));
        assert!(!filter.is_restricted());
    }

    #[test]
    fn selection_restricts_to_members() {
        let mut filter = CollectionFilter::new();
        filter.toggle(2);
        filter.toggle(5);

        assert!(filter.is_visible(2));
        assert!(filter.is_visible(5));
        assert!(!filter.is_visible(1));
        assert!(filter.is_restricted());
    }

    #[test]
    fn double_toggle_returns_to_show_all() {
        let mut filter = CollectionFilter::new();
        filter.toggle(2);
        filter.toggle(2);

        assert!(filter.selected().is_empty());
        assert!(filter.is_visible(2));
        assert!(filter.is_visible(7));
    }

    #[test]
    fn clear_resets_any_selection() {
        let mut filter = CollectionFilter::new();
        filter.toggle(1);
        filter.toggle(2);
        filter.toggle(3);
        filter.clear();

        assert!(filter.selected().is_empty());
        assert!(filter.is_visible(4));
    }

    #[test]
    fn listeners_run_in_registration_order_on_every_mutation() {
        let calls = Rc::new(RefCell::new(Vec::new()));

        let mut filter = CollectionFilter::new();
        for tag in ["first", "second"] {
            let calls = Rc::clone(&calls);
            filter.subscribe(Box::new(move |selected| {
                calls.borrow_mut().push((tag, selected.len()));
            }));
        }

        filter.toggle(3);
        filter.clear();

        assert_eq!(
            *calls.borrow(),
            vec![("first", 1), ("second", 1), ("first", 0), ("second", 0)]
        );
    }

    #[test]
    fn visibility_tracks_any_toggle_sequence() {
        let mut filter = CollectionFilter::new();
        let sequence = [4, 9, 4, 2, 9, 9];
        for id in sequence {
            filter.toggle(id);
        }

        // Net effect: {2, 9}.
        assert_eq!(filter.selected().iter().copied().collect::<Vec<_>>(), vec![2, 9]);
        assert!(!filter.is_visible(4));
        assert!(filter.is_visible(2));
    }
}
