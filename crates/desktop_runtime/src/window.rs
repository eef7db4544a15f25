//! Per-window geometry, visibility, and pointer-gesture state machines.

use desktop_app_contract::{AppDescriptor, AppIcon, ApplicationId, ContentRoot};
use thiserror::Error;

use crate::{
    config::{ChromeMetrics, WindowMetrics},
    icons::{descriptor_icon_ref, LiveTheme},
    model::{
        resize_rect, DragSession, Interaction, PointerPosition, ResizeEdge, ResizeSession,
        WindowActivity, WindowControl, WindowId, WindowRect, WindowRegion, WindowVisibility,
    },
};

/// Placeholder body shown while window content is being fetched.
pub const LOADING_MARKUP: &str = "<p>Loading...</p>";
/// Body shown when window content could not be fetched.
pub const LOAD_FAILED_MARKUP: &str = "<p>Failed to load content.</p>";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// Reasons a drag or resize gesture could not start.
pub enum GestureError {
    /// Another gesture is already in progress on the window.
    #[error("window already has a gesture in progress")]
    Busy,
    /// Maximized windows cannot be moved or resized.
    #[error("window is maximized")]
    Maximized,
    /// Minimized windows cannot be moved or resized.
    #[error("window is minimized")]
    Minimized,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Window body load state.
pub enum WindowContent {
    #[default]
    Loading,
    Ready(ContentRoot),
    Failed {
        /// Retrieval error reported by the content source.
        message: String,
    },
}

impl WindowContent {
    /// Markup the presentation layer renders for the current state.
    pub fn markup(&self) -> &str {
        match self {
            Self::Loading => LOADING_MARKUP,
            Self::Ready(root) => root.markup(),
            Self::Failed { .. } => LOAD_FAILED_MARKUP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One managed application window.
///
/// Invariants kept by every transition:
/// - saved geometry exists only while the window is maximized;
/// - interaction is idle whenever the window is not in the normal state;
/// - a minimized window is never active.
pub struct Window {
    id: WindowId,
    descriptor: AppDescriptor,
    theme: LiveTheme,
    rect: WindowRect,
    visibility: WindowVisibility,
    saved_rect: Option<WindowRect>,
    activity: WindowActivity,
    interaction: Interaction,
    content: WindowContent,
}

impl Window {
    pub fn new(id: WindowId, descriptor: AppDescriptor, rect: WindowRect, theme: LiveTheme) -> Self {
        Self {
            id,
            descriptor,
            theme,
            rect,
            visibility: WindowVisibility::Normal,
            saved_rect: None,
            activity: WindowActivity::Inactive,
            interaction: Interaction::Idle,
            content: WindowContent::Loading,
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn app_id(&self) -> &ApplicationId {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &AppDescriptor {
        &self.descriptor
    }

    pub fn title(&self) -> &str {
        &self.descriptor.name
    }

    pub fn icon(&self) -> &AppIcon {
        &self.descriptor.icon
    }

    /// Icon reference resolved for the current theme.
    pub fn icon_ref(&self) -> &str {
        descriptor_icon_ref(&self.descriptor, self.theme.get())
    }

    /// Stylesheet the presentation layer attaches while the window is open.
    pub fn style_locator(&self) -> Option<&str> {
        self.descriptor.style_locator.as_deref()
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }

    pub fn visibility(&self) -> WindowVisibility {
        self.visibility
    }

    pub fn saved_rect(&self) -> Option<WindowRect> {
        self.saved_rect
    }

    pub fn activity(&self) -> WindowActivity {
        self.activity
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn content(&self) -> &WindowContent {
        &self.content
    }

    pub fn is_active(&self) -> bool {
        self.activity == WindowActivity::Active
    }

    pub fn is_minimized(&self) -> bool {
        self.visibility == WindowVisibility::Minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.visibility == WindowVisibility::Maximized
    }

    pub(crate) fn set_activity(&mut self, activity: WindowActivity) {
        self.activity = activity;
    }

    pub(crate) fn set_content(&mut self, content: WindowContent) {
        self.content = content;
    }

    /// Hides the window. A maximized window gets its saved geometry back first, so restoring
    /// always lands in the normal state.
    pub fn minimize(&mut self) -> bool {
        if self.is_minimized() {
            return false;
        }
        self.cancel_interaction();
        if let Some(saved) = self.saved_rect.take() {
            self.rect = saved;
        }
        self.visibility = WindowVisibility::Minimized;
        self.activity = WindowActivity::Inactive;
        true
    }

    /// Snapshots the current geometry and fills `workspace`. Only valid from the normal state.
    pub fn maximize(&mut self, workspace: WindowRect) -> bool {
        if self.visibility != WindowVisibility::Normal {
            return false;
        }
        self.cancel_interaction();
        self.saved_rect = Some(self.rect);
        self.rect = workspace;
        self.visibility = WindowVisibility::Maximized;
        true
    }

    /// Returns a minimized or maximized window to the normal state.
    pub fn restore(&mut self) -> bool {
        match self.visibility {
            WindowVisibility::Normal => false,
            WindowVisibility::Minimized => {
                self.visibility = WindowVisibility::Normal;
                true
            }
            WindowVisibility::Maximized => {
                self.cancel_interaction();
                if let Some(saved) = self.saved_rect.take() {
                    self.rect = saved;
                }
                self.visibility = WindowVisibility::Normal;
                true
            }
        }
    }

    /// Re-fills a new workspace while maximized; saved geometry is untouched.
    pub(crate) fn refit(&mut self, workspace: WindowRect) -> bool {
        if !self.is_maximized() || self.rect == workspace {
            return false;
        }
        self.rect = workspace;
        true
    }

    fn check_gesture_start(&self) -> Result<(), GestureError> {
        match self.visibility {
            WindowVisibility::Maximized => Err(GestureError::Maximized),
            WindowVisibility::Minimized => Err(GestureError::Minimized),
            WindowVisibility::Normal if !self.interaction.is_idle() => Err(GestureError::Busy),
            WindowVisibility::Normal => Ok(()),
        }
    }

    /// Starts moving the window from `pointer`.
    ///
    /// # Errors
    ///
    /// Returns a [`GestureError`] when the window is not normal or already mid-gesture.
    pub fn begin_drag(&mut self, pointer: PointerPosition) -> Result<(), GestureError> {
        self.check_gesture_start()?;
        self.interaction = Interaction::Dragging(DragSession {
            pointer_start: pointer,
            rect_start: self.rect,
        });
        Ok(())
    }

    /// Starts resizing the window from `edge`.
    ///
    /// # Errors
    ///
    /// Returns a [`GestureError`] when the window is not normal or already mid-gesture.
    pub fn begin_resize(
        &mut self,
        edge: ResizeEdge,
        pointer: PointerPosition,
    ) -> Result<(), GestureError> {
        self.check_gesture_start()?;
        self.interaction = Interaction::Resizing(ResizeSession {
            edge,
            pointer_start: pointer,
            rect_start: self.rect,
        });
        Ok(())
    }

    /// Applies the cumulative pointer delta of the current gesture. Returns `true` when the
    /// geometry changed.
    pub fn pointer_move(&mut self, pointer: PointerPosition, metrics: &WindowMetrics) -> bool {
        let next = match self.interaction {
            Interaction::Idle => return false,
            Interaction::Dragging(session) => session.rect_start.offset(
                pointer.x - session.pointer_start.x,
                pointer.y - session.pointer_start.y,
            ),
            Interaction::Resizing(session) => resize_rect(
                session.rect_start,
                session.edge,
                pointer.x - session.pointer_start.x,
                pointer.y - session.pointer_start.y,
                metrics.min_width,
                metrics.min_height,
            ),
        };
        if next == self.rect {
            return false;
        }
        self.rect = next;
        true
    }

    /// Commits the current gesture. Returns `true` when one was in progress.
    pub fn pointer_release(&mut self) -> bool {
        let was_active = !self.interaction.is_idle();
        self.interaction = Interaction::Idle;
        was_active
    }

    /// Abandons the current gesture and puts the geometry back where it started.
    pub fn cancel_interaction(&mut self) -> bool {
        let rect_start = match self.interaction {
            Interaction::Idle => return false,
            Interaction::Dragging(session) => session.rect_start,
            Interaction::Resizing(session) => session.rect_start,
        };
        self.rect = rect_start;
        self.interaction = Interaction::Idle;
        true
    }

    /// Classifies `point` against this window's chrome. `None` when the window is minimized or
    /// the point lies outside it.
    ///
    /// Resize handles own the outer band of a normal window, so they win over the header and
    /// control buttons they overlap.
    pub fn region_at(&self, point: PointerPosition, chrome: &ChromeMetrics) -> Option<WindowRegion> {
        if self.is_minimized() || !self.rect.contains(point) {
            return None;
        }

        let local_x = point.x - self.rect.x;
        let local_y = point.y - self.rect.y;
        let (w, h) = (self.rect.w, self.rect.h);

        if self.visibility == WindowVisibility::Normal {
            if let Some(edge) = resize_edge_at(local_x, local_y, w, h, chrome) {
                return Some(WindowRegion::ResizeHandle(edge));
            }
        }

        if local_y < chrome.header_height {
            let controls_start = w - chrome.control_width * 3;
            if chrome.control_width > 0 && local_x >= controls_start {
                let control = match (local_x - controls_start) / chrome.control_width {
                    0 => WindowControl::Minimize,
                    1 => WindowControl::Maximize,
                    _ => WindowControl::Close,
                };
                return Some(WindowRegion::Control(control));
            }
            return Some(WindowRegion::Header);
        }

        Some(WindowRegion::Body)
    }
}

fn resize_edge_at(
    local_x: i32,
    local_y: i32,
    w: i32,
    h: i32,
    chrome: &ChromeMetrics,
) -> Option<ResizeEdge> {
    let corner = chrome.resize_corner;
    let west = local_x < corner;
    let east = local_x >= w - corner;
    let north = local_y < corner;
    let south = local_y >= h - corner;

    let corner_edge = match (north, south, west, east) {
        (true, _, true, _) => Some(ResizeEdge::NorthWest),
        (true, _, _, true) => Some(ResizeEdge::NorthEast),
        (_, true, true, _) => Some(ResizeEdge::SouthWest),
        (_, true, _, true) => Some(ResizeEdge::SouthEast),
        _ => None,
    };
    if corner_edge.is_some() {
        return corner_edge;
    }

    let band = chrome.resize_handle;
    if local_y < band {
        Some(ResizeEdge::North)
    } else if local_y >= h - band {
        Some(ResizeEdge::South)
    } else if local_x < band {
        Some(ResizeEdge::West)
    } else if local_x >= w - band {
        Some(ResizeEdge::East)
    } else {
        None
    }
}
