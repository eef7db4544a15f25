use std::fmt;

use desktop_app_contract::ApplicationId;
use serde::{Deserialize, Serialize};

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 320;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 200;
pub const DEFAULT_WINDOW_WIDTH: i32 = 800;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 500;
/// Height reserved at the bottom of the viewport for the taskbar.
pub const TASKBAR_HEIGHT: i32 = 48;
/// Offset applied per already-open window when placing a new one.
pub const CASCADE_OFFSET: i32 = 24;
/// Closest distance a new window may be placed from the top-left edge.
pub const EDGE_MARGIN: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Session-unique window identifier in the form `<app-id>-<unix-ms>`.
pub struct WindowId(String);

impl WindowId {
    /// Builds an id from an application id and a creation timestamp.
    pub fn for_app(app_id: &ApplicationId, created_at_ms: u64) -> Self {
        Self(format!("{app_id}-{created_at_ms}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn right(self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(self) -> i32 {
        self.y + self.h
    }

    /// Whether `point` lies inside the rectangle (right and bottom edges exclusive).
    pub fn contains(self, point: PointerPosition) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Host surface size in layout units.
pub struct ViewportSize {
    pub width: i32,
    pub height: i32,
}

impl ViewportSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Area a maximized window fills: full width, height minus the taskbar.
    pub fn workspace(self, taskbar_height: i32) -> WindowRect {
        WindowRect {
            x: 0,
            y: 0,
            w: self.width.max(0),
            h: (self.height - taskbar_height).max(0),
        }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    const fn moves_west(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    const fn moves_east(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    const fn moves_north(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    const fn moves_south(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowVisibility {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowActivity {
    Active,
    #[default]
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Pointer gesture sub-state of one window.
pub enum Interaction {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

impl Interaction {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowControl {
    Minimize,
    Maximize,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Chrome region of a window under the pointer.
pub enum WindowRegion {
    /// Title bar outside the control buttons; pressing starts a drag.
    Header,
    Control(WindowControl),
    ResizeHandle(ResizeEdge),
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of hit testing the desktop at one pointer position.
pub struct WindowHit {
    pub window_id: WindowId,
    pub region: WindowRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowEventKind {
    Opened,
    Closed,
    Focused,
    Minimized,
    Maximized,
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Lifecycle notification emitted after the manager mutation it reports.
pub struct WindowEvent {
    pub kind: WindowEventKind,
    pub window_id: WindowId,
    pub app_id: ApplicationId,
}

impl WindowEvent {
    pub fn new(kind: WindowEventKind, window_id: WindowId, app_id: ApplicationId) -> Self {
        Self {
            kind,
            window_id,
            app_id,
        }
    }
}

/// Applies resize deltas for a given edge/corner drag, relative to the gesture-start rect.
///
/// Each axis is floored independently. West and north handles keep the opposite edge fixed by
/// shifting the origin, but only while the new size stays strictly above the floor; once the
/// floor is reached the origin holds its gesture-start value.
pub fn resize_rect(
    start: WindowRect,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    min_w: i32,
    min_h: i32,
) -> WindowRect {
    let mut next = start;

    if edge.moves_east() {
        next.w = (start.w + dx).max(min_w);
    } else if edge.moves_west() {
        next.w = (start.w - dx).max(min_w);
        if next.w != min_w {
            next.x = start.x + dx;
        }
    }

    if edge.moves_south() {
        next.h = (start.h + dy).max(min_h);
    } else if edge.moves_north() {
        next.h = (start.h - dy).max(min_h);
        if next.h != min_h {
            next.y = start.y + dy;
        }
    }

    next
}
