//! Interaction mode state machine
//!
//! At most one tool is active at a time; activating a mode deactivates the
//! rest in the same operation. A restricted collection filter disables all
//! tools and forces the mode back to `None` until the filter is cleared.

use crate::annotation::Color;

/// The single active interaction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    None,
    Highlight,
    StickyNote,
    Eraser,
}

impl Mode {
    /// Stable name used in logs and host-facing notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::Highlight => "highlight",
            Mode::StickyNote => "stickyNote",
            Mode::Eraser => "eraser",
        }
    }

    /// Whether this mode is an actual tool (everything except `None`).
    pub fn is_tool(&self) -> bool {
        !matches!(self, Mode::None)
    }
}

/// Colors configured for the color-bearing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolColors {
    pub highlight: Color,
    pub sticky_note: Color,
}

impl Default for ToolColors {
    fn default() -> Self {
        Self {
            highlight: Color::rgb(255, 255, 0),
            sticky_note: Color::rgb(255, 0, 0),
        }
    }
}

type ModeListener = Box<dyn FnMut(Mode)>;

/// Owner of the active mode.
///
/// Subscribers are notified synchronously on every transition, including a
/// re-activation of the current mode (side effects such as cursor styling
/// are reapplied, not skipped).
pub struct ModeController {
    active: Mode,
    tools_enabled: bool,
    colors: ToolColors,
    listeners: Vec<ModeListener>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::with_colors(ToolColors::default())
    }

    pub fn with_colors(colors: ToolColors) -> Self {
        Self {
            active: Mode::None,
            tools_enabled: true,
            colors,
            listeners: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.active
    }

    /// Whether tools can currently be activated (false while the filter is
    /// restricted).
    pub fn tools_enabled(&self) -> bool {
        self.tools_enabled
    }

    /// Activate `mode`, deactivating every other mode in the same step.
    ///
    /// Returns false (and leaves the state untouched) when a tool is
    /// requested while tools are disabled. Setting the current mode again
    /// succeeds and re-notifies.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode.is_tool() && !self.tools_enabled {
            tracing::warn!(mode = mode.label(), "tool activation rejected while filter is restricted");
            return false;
        }

        tracing::debug!(from = self.active.label(), to = mode.label(), "mode change");
        self.active = mode;
        self.notify();
        true
    }

    /// Register a listener invoked synchronously with the new mode after
    /// every transition, in registration order.
    pub fn subscribe(&mut self, listener: ModeListener) {
        self.listeners.push(listener);
    }

    /// The color configured for the active tool, or [`Color::BLACK`] when
    /// no tool is active or the tool has no color concept (eraser).
    pub fn active_color(&self) -> Color {
        match self.active {
            Mode::Highlight => self.colors.highlight,
            Mode::StickyNote => self.colors.sticky_note,
            Mode::None | Mode::Eraser => Color::BLACK,
        }
    }

    pub fn colors(&self) -> &ToolColors {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut ToolColors {
        &mut self.colors
    }

    /// Re-gate tools against the filter state. Entering restriction forces
    /// the mode to `None` (notifying subscribers) and disables tools;
    /// leaving it re-enables them without changing the mode.
    pub fn apply_filter_state(&mut self, restricted: bool) {
        if restricted {
            self.set_mode(Mode::None);
            self.tools_enabled = false;
        } else {
            self.tools_enabled = true;
        }
    }

    fn notify(&mut self) {
        let mode = self.active;
        for listener in &mut self.listeners {
            listener(mode);
        }
    }
}
