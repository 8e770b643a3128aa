//! Host render feed registry
//!
//! The host announces each rendered page together with opaque handles to
//! its canvas and container elements. Handles are stored for correlation
//! (they may be recreated on every render), while initialization side
//! effects are guarded to run once per page.

use std::collections::{BTreeSet, HashMap};

use marginalia_core::PageNumber;
use serde::{Deserialize, Serialize};

/// Opaque reference to a host-owned element. The host allocates these; the
/// engine only stores and echoes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostElement(pub u64);

/// Handles delivered with one page render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    pub canvas: HostElement,
    pub container: HostElement,
}

/// Tracks which pages the host has rendered at least once.
#[derive(Debug, Default)]
pub struct PageRegistry {
    handles: HashMap<PageNumber, PageHandle>,
    initialized: BTreeSet<PageNumber>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page render. The stored handle is always replaced (the host
    /// may have rebuilt its elements); the return value is true only the
    /// first time the page is seen, which is when per-page setup must run.
    pub fn register(&mut self, page: PageNumber, handle: PageHandle) -> bool {
        self.handles.insert(page, handle);
        self.initialized.insert(page)
    }

    pub fn is_initialized(&self, page: PageNumber) -> bool {
        self.initialized.contains(&page)
    }

    pub fn handle(&self, page: PageNumber) -> Option<PageHandle> {
        self.handles.get(&page).copied()
    }

    /// Initialized pages in ascending order.
    pub fn initialized(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.initialized.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.initialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initialized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(seed: u64) -> PageHandle {
        PageHandle {
            canvas: HostElement(seed),
            container: HostElement(seed + 1),
        }
    }

    #[test]
    fn first_registration_initializes_the_page() {
        let mut registry = PageRegistry::new();

        assert!(registry.register(1, handle(10)));
        assert!(registry.is_initialized(1));
        assert!(!registry.is_initialized(2));
    }

    #[test]
    fn re_registration_updates_handles_but_not_initialization() {
        let mut registry = PageRegistry::new();
        registry.register(1, handle(10));

        assert!(!registry.register(1, handle(20)));
        assert_eq!(registry.handle(1), Some(handle(20)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn initialized_pages_iterate_in_order() {
        let mut registry = PageRegistry::new();
        registry.register(3, handle(30));
        registry.register(1, handle(10));
        registry.register(2, handle(20));

        assert_eq!(registry.initialized().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
