//! Authoritative window registry: creation, focus and stacking, visibility transitions, closure,
//! pointer capture, and lifecycle notifications.

use desktop_app_contract::{AppDescriptor, ApplicationId, ThemeMode};
use leptos::logging;
use platform_host::{next_monotonic_timestamp_ms, AppCatalog};

use crate::{
    config::ShellConfig,
    error::ShellError,
    icons::LiveTheme,
    model::{
        PointerPosition, ResizeEdge, ViewportSize, WindowActivity, WindowEvent, WindowEventKind,
        WindowHit, WindowId, WindowRect,
    },
    window::{GestureError, Window},
};

#[derive(Debug, Clone, PartialEq)]
/// Registry of open windows for one desktop session.
///
/// Mutations never emit directly: they queue [`WindowEvent`] values which the session drains
/// with [`WindowManager::drain_events`] once the mutation is complete.
pub struct WindowManager {
    config: ShellConfig,
    theme: LiveTheme,
    windows: Vec<Window>,
    active: Option<WindowId>,
    stacking: Vec<WindowId>,
    capture: Option<WindowId>,
    pending: Vec<WindowEvent>,
}

impl WindowManager {
    pub fn new(config: ShellConfig, theme: ThemeMode) -> Self {
        Self {
            config,
            theme: LiveTheme::new(theme),
            windows: Vec::new(),
            active: None,
            stacking: Vec::new(),
            capture: None,
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme.get()
    }

    /// Theme handle shared with every window this manager opens.
    pub fn live_theme(&self) -> &LiveTheme {
        &self.theme
    }

    /// Opens a new window for `app_id`, makes it active, and queues `Opened`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::NotFound`] when the catalog has no such application. No window is
    /// created in that case.
    pub fn open_app(
        &mut self,
        catalog: &dyn AppCatalog,
        app_id: &ApplicationId,
    ) -> Result<WindowId, ShellError> {
        let Some(descriptor) = catalog.app(app_id) else {
            logging::warn!("cannot open `{app_id}`: application not found");
            return Err(ShellError::NotFound {
                app_id: app_id.clone(),
            });
        };
        Ok(self.open_window(descriptor))
    }

    /// Opens a new window for an already resolved descriptor.
    pub fn open_window(&mut self, descriptor: AppDescriptor) -> WindowId {
        let window_id = WindowId::for_app(&descriptor.id, next_monotonic_timestamp_ms());
        let rect = self.initial_rect(&descriptor);
        let app_id = descriptor.id.clone();

        self.windows
            .push(Window::new(window_id.clone(), descriptor, rect, self.theme.clone()));
        self.stacking.push(window_id.clone());
        self.activate(&window_id);
        self.queue(WindowEventKind::Opened, window_id.clone(), app_id);
        window_id
    }

    /// Preferred size clamped to the floor, centered in the workspace, cascaded per open window,
    /// and kept off the top-left edge.
    fn initial_rect(&self, descriptor: &AppDescriptor) -> WindowRect {
        let metrics = self.config.window;
        let w = descriptor
            .width
            .unwrap_or(metrics.default_width)
            .max(metrics.min_width);
        let h = descriptor
            .height
            .unwrap_or(metrics.default_height)
            .max(metrics.min_height);
        let offset = self.windows.len() as i32 * metrics.cascade_offset;
        let workspace = self.config.workspace();

        WindowRect {
            x: ((workspace.w - w) / 2 + offset).max(metrics.edge_margin),
            y: ((workspace.h - h) / 2 + offset).max(metrics.edge_margin),
            w,
            h,
        }
    }

    /// Marks `window_id` active, everything else inactive, and raises it.
    fn activate(&mut self, window_id: &WindowId) {
        for window in &mut self.windows {
            let activity = if window.id() == window_id {
                WindowActivity::Active
            } else {
                WindowActivity::Inactive
            };
            window.set_activity(activity);
        }
        self.active = Some(window_id.clone());
        if let Some(index) = self.stacking.iter().position(|id| id == window_id) {
            let id = self.stacking.remove(index);
            self.stacking.push(id);
        }
    }

    /// Focuses and raises `window_id` and queues `Focused`.
    ///
    /// Unknown ids and minimized windows are ignored. Focusing the already active top window
    /// leaves stacking as it is but still queues `Focused`. Returns `true` when `Focused` was
    /// queued.
    pub fn set_active(&mut self, window_id: &WindowId) -> bool {
        let Some(window) = self.window(window_id) else {
            return false;
        };
        if window.is_minimized() {
            return false;
        }

        let app_id = window.app_id().clone();
        self.activate(window_id);
        self.queue(WindowEventKind::Focused, window_id.clone(), app_id);
        true
    }

    /// Restores `window_id` if minimized, then focuses it.
    pub fn show_window(&mut self, window_id: &WindowId) -> bool {
        let restored = self
            .window(window_id)
            .is_some_and(Window::is_minimized)
            && self.restore(window_id);
        let focused = self.set_active(window_id);
        restored || focused
    }

    pub fn minimize(&mut self, window_id: &WindowId) -> bool {
        let changed = self.transition(window_id, WindowEventKind::Minimized, Window::minimize);
        if changed && self.active.as_ref() == Some(window_id) {
            self.active = None;
        }
        changed
    }

    pub fn maximize(&mut self, window_id: &WindowId) -> bool {
        let workspace = self.config.workspace();
        self.transition(window_id, WindowEventKind::Maximized, |window| {
            window.maximize(workspace)
        })
    }

    pub fn restore(&mut self, window_id: &WindowId) -> bool {
        self.transition(window_id, WindowEventKind::Restored, Window::restore)
    }

    /// Restores a maximized window, maximizes anything else that is not minimized.
    pub fn toggle_maximize(&mut self, window_id: &WindowId) -> bool {
        match self.window(window_id) {
            Some(window) if window.is_maximized() => self.restore(window_id),
            Some(_) => self.maximize(window_id),
            None => false,
        }
    }

    fn transition(
        &mut self,
        window_id: &WindowId,
        kind: WindowEventKind,
        apply: impl FnOnce(&mut Window) -> bool,
    ) -> bool {
        let Some(window) = self.window_mut(window_id) else {
            return false;
        };
        if !apply(window) {
            return false;
        }
        let app_id = window.app_id().clone();
        self.release_capture_of(window_id);
        self.queue(kind, window_id.clone(), app_id);
        true
    }

    /// Closes `window_id` and queues `Closed`.
    ///
    /// When the closed window was active, the most recently created remaining window that is not
    /// minimized takes focus and `Focused` is queued after `Closed`.
    pub fn close(&mut self, window_id: &WindowId) -> bool {
        let Some(index) = self.index_of(window_id) else {
            return false;
        };
        self.release_capture_of(window_id);
        let window = self.windows.remove(index);
        self.stacking.retain(|id| id != window_id);
        self.queue(
            WindowEventKind::Closed,
            window_id.clone(),
            window.app_id().clone(),
        );

        if self.active.as_ref() == Some(window_id) {
            self.active = None;
            let successor = self
                .windows
                .iter()
                .rev()
                .find(|candidate| !candidate.is_minimized())
                .map(|candidate| (candidate.id().clone(), candidate.app_id().clone()));
            if let Some((next_id, app_id)) = successor {
                self.activate(&next_id);
                self.queue(WindowEventKind::Focused, next_id, app_id);
            }
        }
        true
    }

    /// Closes every window in creation order without promoting a successor.
    pub fn close_all(&mut self) -> usize {
        self.capture = None;
        self.active = None;
        self.stacking.clear();
        let closed = std::mem::take(&mut self.windows);
        for window in &closed {
            self.queue(
                WindowEventKind::Closed,
                window.id().clone(),
                window.app_id().clone(),
            );
        }
        closed.len()
    }

    /// Adopts a new host surface size and re-fills maximized windows.
    pub fn set_viewport(&mut self, viewport: ViewportSize) -> usize {
        self.config.viewport = viewport;
        let workspace = self.config.workspace();
        self.windows
            .iter_mut()
            .map(|window| window.refit(workspace))
            .filter(|changed| *changed)
            .count()
    }

    /// Starts a drag on `window_id` and takes the pointer capture. `Ok(false)` for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::Busy`] while any window holds the capture, or the window's own
    /// rejection.
    pub fn begin_drag(
        &mut self,
        window_id: &WindowId,
        pointer: PointerPosition,
    ) -> Result<bool, GestureError> {
        self.begin_gesture(window_id, |window| window.begin_drag(pointer))
    }

    /// Starts a resize on `window_id` and takes the pointer capture. `Ok(false)` for unknown ids.
    ///
    /// # Errors
    ///
    /// Same as [`WindowManager::begin_drag`].
    pub fn begin_resize(
        &mut self,
        window_id: &WindowId,
        edge: ResizeEdge,
        pointer: PointerPosition,
    ) -> Result<bool, GestureError> {
        self.begin_gesture(window_id, |window| window.begin_resize(edge, pointer))
    }

    fn begin_gesture(
        &mut self,
        window_id: &WindowId,
        start: impl FnOnce(&mut Window) -> Result<(), GestureError>,
    ) -> Result<bool, GestureError> {
        if self.capture.is_some() {
            return Err(GestureError::Busy);
        }
        let Some(window) = self.window_mut(window_id) else {
            return Ok(false);
        };
        start(window)?;
        self.capture = Some(window_id.clone());
        Ok(true)
    }

    /// Routes a pointer move to the captured window.
    pub fn pointer_move(&mut self, pointer: PointerPosition) -> bool {
        let Some(captured) = self.capture.clone() else {
            return false;
        };
        let metrics = self.config.window;
        self.window_mut(&captured)
            .is_some_and(|window| window.pointer_move(pointer, &metrics))
    }

    /// Commits the captured gesture and releases the capture.
    pub fn pointer_release(&mut self) -> bool {
        let Some(captured) = self.capture.take() else {
            return false;
        };
        self.window_mut(&captured)
            .is_some_and(Window::pointer_release)
    }

    /// Abandons the captured gesture, reverting its geometry, and releases the capture.
    pub fn cancel_interaction(&mut self) -> bool {
        let Some(captured) = self.capture.take() else {
            return false;
        };
        self.window_mut(&captured)
            .is_some_and(Window::cancel_interaction)
    }

    fn release_capture_of(&mut self, window_id: &WindowId) {
        if self.capture.as_ref() == Some(window_id) {
            self.capture = None;
            if let Some(window) = self.window_mut(window_id) {
                window.cancel_interaction();
            }
        }
    }

    pub fn captured_window_id(&self) -> Option<&WindowId> {
        self.capture.as_ref()
    }

    /// Windows in creation order.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&Window> {
        self.windows.iter().find(|window| window.id() == window_id)
    }

    pub(crate) fn window_mut(&mut self, window_id: &WindowId) -> Option<&mut Window> {
        self.windows
            .iter_mut()
            .find(|window| window.id() == window_id)
    }

    fn index_of(&self, window_id: &WindowId) -> Option<usize> {
        self.windows
            .iter()
            .position(|window| window.id() == window_id)
    }

    pub fn active_window_id(&self) -> Option<&WindowId> {
        self.active.as_ref()
    }

    pub fn active_window(&self) -> Option<&Window> {
        self.active.as_ref().and_then(|id| self.window(id))
    }

    pub fn app_id_of(&self, window_id: &WindowId) -> Option<&ApplicationId> {
        self.window(window_id).map(Window::app_id)
    }

    /// Windows of one application in creation order.
    pub fn windows_for_app<'a>(
        &'a self,
        app_id: &'a ApplicationId,
    ) -> impl Iterator<Item = &'a Window> + 'a {
        self.windows
            .iter()
            .filter(move |window| window.app_id() == app_id)
    }

    /// Window ids from bottom to top.
    pub fn stacking_order(&self) -> &[WindowId] {
        &self.stacking
    }

    /// Topmost visible window under `pointer` and the chrome region that was hit.
    pub fn hit_test(&self, pointer: PointerPosition) -> Option<WindowHit> {
        self.stacking.iter().rev().find_map(|window_id| {
            let window = self.window(window_id)?;
            let region = window.region_at(pointer, &self.config.chrome)?;
            Some(WindowHit {
                window_id: window_id.clone(),
                region,
            })
        })
    }

    fn queue(&mut self, kind: WindowEventKind, window_id: WindowId, app_id: ApplicationId) {
        self.pending.push(WindowEvent::new(kind, window_id, app_id));
    }

    /// Takes every notification queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::AppIcon;
    use platform_host::MemoryAppCatalog;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{WindowControl, WindowRegion, WindowVisibility};

    fn catalog() -> MemoryAppCatalog {
        MemoryAppCatalog::new(vec![
            AppDescriptor::new(
                ApplicationId::trusted("editor"),
                "Editor",
                AppIcon::Single("editor.svg".to_string()),
                "apps/editor/index.html",
            ),
            AppDescriptor::new(
                ApplicationId::trusted("about"),
                "About",
                AppIcon::Single("about.svg".to_string()),
                "apps/about/index.html",
            )
            .with_size(420, 100),
        ])
    }

    fn manager() -> WindowManager {
        WindowManager::new(ShellConfig::default(), ThemeMode::Dark)
    }

    fn open(manager: &mut WindowManager, app: &str) -> WindowId {
        manager
            .open_app(&catalog(), &ApplicationId::trusted(app))
            .expect("open app")
    }

    fn kinds(manager: &mut WindowManager) -> Vec<WindowEventKind> {
        manager
            .drain_events()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }

    #[test]
    fn open_places_centered_cascaded_and_focused() {
        let mut manager = manager();
        let first = open(&mut manager, "editor");
        let second = open(&mut manager, "editor");

        // 1280x800 viewport, 752 high workspace, 800x500 default size.
        assert_eq!(
            manager.window(&first).map(Window::rect),
            Some(WindowRect {
                x: 240,
                y: 126,
                w: 800,
                h: 500
            })
        );
        assert_eq!(
            manager.window(&second).map(Window::rect),
            Some(WindowRect {
                x: 264,
                y: 150,
                w: 800,
                h: 500
            })
        );
        assert_eq!(manager.active_window_id(), Some(&second));
        assert_eq!(manager.stacking_order(), &[first.clone(), second.clone()]);
        assert_ne!(first, second);
        assert_eq!(
            kinds(&mut manager),
            vec![WindowEventKind::Opened, WindowEventKind::Opened]
        );
    }

    #[test]
    fn preferred_size_is_clamped_to_floor() {
        let mut manager = manager();
        let id = open(&mut manager, "about");
        let rect = manager.window(&id).map(Window::rect).expect("window");
        assert_eq!((rect.w, rect.h), (420, 200));
    }

    #[test]
    fn unknown_app_is_not_found_and_creates_nothing() {
        let mut manager = manager();
        let result = manager.open_app(&catalog(), &ApplicationId::trusted("missing"));
        assert_eq!(
            result,
            Err(ShellError::NotFound {
                app_id: ApplicationId::trusted("missing")
            })
        );
        assert!(manager.is_empty());
        assert!(manager.drain_events().is_empty());
    }

    #[test]
    fn set_active_raises_and_ignores_unknown_or_minimized() {
        let mut manager = manager();
        let first = open(&mut manager, "editor");
        let second = open(&mut manager, "about");
        manager.drain_events();

        assert!(manager.set_active(&first));
        assert_eq!(manager.stacking_order(), &[second.clone(), first.clone()]);
        assert!(manager.set_active(&first));
        assert_eq!(manager.stacking_order(), &[second.clone(), first.clone()]);
        assert!(!manager.set_active(&WindowId::for_app(&ApplicationId::trusted("x"), 1)));

        manager.minimize(&second);
        assert!(!manager.set_active(&second));
        assert_eq!(manager.active_window_id(), Some(&first));
        assert_eq!(
            kinds(&mut manager),
            vec![
                WindowEventKind::Focused,
                WindowEventKind::Focused,
                WindowEventKind::Minimized
            ]
        );
    }

    #[test]
    fn minimize_active_clears_pointer_and_repeat_is_silent() {
        let mut manager = manager();
        let id = open(&mut manager, "editor");
        manager.drain_events();

        assert!(manager.minimize(&id));
        assert_eq!(manager.active_window_id(), None);
        assert!(!manager.minimize(&id));
        assert_eq!(kinds(&mut manager), vec![WindowEventKind::Minimized]);
    }

    #[test]
    fn close_promotes_most_recent_non_minimized_window() {
        let mut manager = manager();
        let a = open(&mut manager, "editor");
        let b = open(&mut manager, "editor");
        let c = open(&mut manager, "about");
        manager.minimize(&b);
        manager.set_active(&c);
        manager.drain_events();

        assert!(manager.close(&c));
        assert_eq!(manager.active_window_id(), Some(&a));
        assert_eq!(
            kinds(&mut manager),
            vec![WindowEventKind::Closed, WindowEventKind::Focused]
        );
        assert!(!manager.close(&c));
    }

    #[test]
    fn close_all_emits_closed_per_window_in_creation_order() {
        let mut manager = manager();
        let a = open(&mut manager, "editor");
        let b = open(&mut manager, "about");
        manager.drain_events();

        assert_eq!(manager.close_all(), 2);
        let closed: Vec<WindowId> = manager
            .drain_events()
            .into_iter()
            .map(|event| event.window_id)
            .collect();
        assert_eq!(closed, vec![a, b]);
        assert_eq!(manager.active_window_id(), None);
        assert!(manager.stacking_order().is_empty());
    }

    #[test]
    fn capture_routes_moves_and_is_released_on_minimize() {
        let mut manager = manager();
        let a = open(&mut manager, "editor");
        let b = open(&mut manager, "about");

        assert_eq!(manager.begin_drag(&a, PointerPosition::new(300, 140)), Ok(true));
        assert_eq!(
            manager.begin_drag(&b, PointerPosition::new(0, 0)),
            Err(GestureError::Busy)
        );
        assert!(manager.pointer_move(PointerPosition::new(310, 150)));
        assert_eq!(manager.window(&a).map(|w| w.rect().x), Some(250));

        manager.minimize(&a);
        assert_eq!(manager.captured_window_id(), None);
        assert!(!manager.pointer_move(PointerPosition::new(400, 400)));
        assert_eq!(
            manager.begin_drag(&b, PointerPosition::new(0, 0)),
            Ok(true)
        );
    }

    #[test]
    fn maximize_restore_and_viewport_refit() {
        let mut manager = manager();
        let id = open(&mut manager, "editor");
        let before = manager.window(&id).map(Window::rect).expect("window");

        assert!(manager.toggle_maximize(&id));
        assert_eq!(
            manager.window(&id).map(Window::rect),
            Some(WindowRect {
                x: 0,
                y: 0,
                w: 1280,
                h: 752
            })
        );
        assert_eq!(manager.set_viewport(ViewportSize::new(1024, 700)), 1);
        assert_eq!(
            manager.window(&id).map(Window::rect),
            Some(WindowRect {
                x: 0,
                y: 0,
                w: 1024,
                h: 652
            })
        );

        assert!(manager.toggle_maximize(&id));
        assert_eq!(manager.window(&id).map(Window::rect), Some(before));
        assert_eq!(
            manager.window(&id).map(Window::visibility),
            Some(WindowVisibility::Normal)
        );
    }

    #[test]
    fn hit_test_prefers_topmost_and_skips_minimized() {
        let mut manager = manager();
        let a = open(&mut manager, "editor");
        let b = open(&mut manager, "editor");

        // b sits 24 units right/down of a; (300, 200) lies inside both bodies.
        let hit = manager.hit_test(PointerPosition::new(300, 200)).expect("hit");
        assert_eq!(hit.window_id, b);
        assert_eq!(hit.region, WindowRegion::Body);

        manager.minimize(&b);
        let hit = manager.hit_test(PointerPosition::new(300, 200)).expect("hit");
        assert_eq!(hit.window_id, a);

        // Close button of a: right edge at 1040, header 126..158.
        let hit = manager.hit_test(PointerPosition::new(1020, 140)).expect("hit");
        assert_eq!(hit.region, WindowRegion::Control(WindowControl::Close));
        assert_eq!(manager.hit_test(PointerPosition::new(5, 5)), None);
    }
}
