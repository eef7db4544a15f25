//! Icon selection shared by window chrome and the taskbar.
//!
//! App icons resolve through one pure function so the window header and the taskbar can never
//! disagree about which theme variant is showing. Chrome glyphs are semantic identifiers; the
//! presentation layer maps tokens to artwork.

use std::{cell::Cell, rc::Rc};

use desktop_app_contract::{AppDescriptor, AppIcon, ThemeMode};

use crate::model::{WindowControl, WindowVisibility};

/// Picks the icon reference for `mode`.
pub fn app_icon_ref(icon: &AppIcon, mode: ThemeMode) -> &str {
    icon.resolve(mode)
}

/// Picks the icon reference of a catalog entry for `mode`.
pub fn descriptor_icon_ref(descriptor: &AppDescriptor, mode: ThemeMode) -> &str {
    app_icon_ref(&descriptor.icon, mode)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Shared handle to the session's current theme.
///
/// Windows and taskbar entries hold a clone and resolve their icon on read, so a theme switch is
/// visible everywhere the moment the handle is updated.
pub struct LiveTheme(Rc<Cell<ThemeMode>>);

impl LiveTheme {
    pub fn new(mode: ThemeMode) -> Self {
        Self(Rc::new(Cell::new(mode)))
    }

    pub fn get(&self) -> ThemeMode {
        self.0.get()
    }

    /// Stores `mode`. Returns `true` when the theme changed.
    pub fn set(&self, mode: ThemeMode) -> bool {
        self.0.replace(mode) != mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Semantic glyphs drawn by window chrome and the taskbar.
pub enum IconName {
    /// Window minimize control icon.
    WindowMinimize,
    /// Window maximize control icon.
    WindowMaximize,
    /// Window restore control icon.
    WindowRestore,
    /// Dismiss/close icon.
    Dismiss,
    /// Grouped taskbar entry badge.
    WindowMultiple,
}

impl IconName {
    /// Stable token used for CSS hooks and debugging.
    pub const fn token(self) -> &'static str {
        match self {
            Self::WindowMinimize => "window-minimize",
            Self::WindowMaximize => "window-maximize",
            Self::WindowRestore => "window-restore",
            Self::Dismiss => "dismiss",
            Self::WindowMultiple => "window-multiple",
        }
    }
}

/// Glyph for a title bar control. The maximize button shows the restore glyph while maximized.
pub const fn control_glyph(control: WindowControl, visibility: WindowVisibility) -> IconName {
    match (control, visibility) {
        (WindowControl::Minimize, _) => IconName::WindowMinimize,
        (WindowControl::Maximize, WindowVisibility::Maximized) => IconName::WindowRestore,
        (WindowControl::Maximize, _) => IconName::WindowMaximize,
        (WindowControl::Close, _) => IconName::Dismiss,
    }
}
