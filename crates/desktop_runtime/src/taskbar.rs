//! Taskbar grouping and the exclusive window preview panel.
//!
//! The projector holds no window state of its own beyond the open preview. Every manager
//! notification triggers a full recompute from the manager's query surface, which is also where
//! the preview heals itself when its group shrinks below two windows.

use desktop_app_contract::{AppIcon, ApplicationId};

use crate::{
    icons::{app_icon_ref, IconName, LiveTheme},
    model::{WindowEvent, WindowId},
    window::Window,
    window_manager::WindowManager,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One taskbar button: every open window of an application.
pub struct TaskbarGroup {
    pub app_id: ApplicationId,
    /// Window ids in creation order.
    pub window_ids: Vec<WindowId>,
    /// Icon of the group's first window.
    pub icon: AppIcon,
    theme: LiveTheme,
    /// Tooltip: the window title, or `"N windows"` for groups.
    pub label: String,
    /// Whether the active, non-minimized window belongs to this group.
    pub is_active: bool,
}

impl TaskbarGroup {
    /// Icon reference for the current theme.
    pub fn icon_ref(&self) -> &str {
        app_icon_ref(&self.icon, self.theme.get())
    }

    /// Whether activation toggles a preview instead of the window itself.
    pub fn is_grouped(&self) -> bool {
        self.window_ids.len() >= 2
    }

    pub fn badge(&self) -> Option<IconName> {
        self.is_grouped().then_some(IconName::WindowMultiple)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub window_id: WindowId,
    pub title: String,
    pub icon: AppIcon,
    theme: LiveTheme,
    pub is_active: bool,
}

impl PreviewEntry {
    pub fn icon_ref(&self) -> &str {
        app_icon_ref(&self.icon, self.theme.get())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Disclosure listing every window of one grouped application.
pub struct PreviewPanel {
    pub app_id: ApplicationId,
    pub entries: Vec<PreviewEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of activating a taskbar button.
pub enum TaskbarActivation {
    /// The single window was active and got minimized.
    Minimized,
    /// The single window was restored if needed and focused.
    Focused,
    PreviewOpened,
    PreviewClosed,
    /// No open window belongs to the application.
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskbarProjector {
    groups: Vec<TaskbarGroup>,
    preview: Option<PreviewPanel>,
}

fn is_shown_active(manager: &WindowManager, window: &Window) -> bool {
    manager.active_window_id() == Some(window.id()) && !window.is_minimized()
}

impl TaskbarProjector {
    pub fn new(manager: &WindowManager) -> Self {
        let mut projector = Self::default();
        projector.recompute(manager);
        projector
    }

    /// Buttons in order of each application's first open window.
    pub fn groups(&self) -> &[TaskbarGroup] {
        &self.groups
    }

    pub fn group(&self, app_id: &ApplicationId) -> Option<&TaskbarGroup> {
        self.groups.iter().find(|group| &group.app_id == app_id)
    }

    pub fn preview(&self) -> Option<&PreviewPanel> {
        self.preview.as_ref()
    }

    pub fn preview_app_id(&self) -> Option<&ApplicationId> {
        self.preview.as_ref().map(|panel| &panel.app_id)
    }

    /// Reacts to one manager notification.
    pub fn on_event(&mut self, manager: &WindowManager, _event: &WindowEvent) {
        self.recompute(manager);
    }

    /// Rebuilds the groups and re-renders or closes the open preview.
    pub fn recompute(&mut self, manager: &WindowManager) {
        let mut groups: Vec<TaskbarGroup> = Vec::new();
        for window in manager.windows() {
            let shown_active = is_shown_active(manager, window);
            match groups
                .iter_mut()
                .find(|group| &group.app_id == window.app_id())
            {
                Some(group) => {
                    group.window_ids.push(window.id().clone());
                    group.is_active |= shown_active;
                }
                None => groups.push(TaskbarGroup {
                    app_id: window.app_id().clone(),
                    window_ids: vec![window.id().clone()],
                    icon: window.icon().clone(),
                    theme: manager.live_theme().clone(),
                    label: window.title().to_string(),
                    is_active: shown_active,
                }),
            }
        }
        for group in &mut groups {
            if group.is_grouped() {
                group.label = format!("{} windows", group.window_ids.len());
            }
        }
        self.groups = groups;

        if let Some(app_id) = self.preview_app_id().cloned() {
            self.preview = build_preview(manager, &app_id);
        }
    }

    /// Handles a click on an application's taskbar button.
    ///
    /// A single window toggles between minimized and focused and closes any open preview. A
    /// group toggles its own preview, replacing another application's preview.
    pub fn activate_app(
        &mut self,
        manager: &mut WindowManager,
        app_id: &ApplicationId,
    ) -> TaskbarActivation {
        let window_ids: Vec<WindowId> = manager
            .windows_for_app(app_id)
            .map(|window| window.id().clone())
            .collect();

        match window_ids.as_slice() {
            [] => TaskbarActivation::Ignored,
            [only] => {
                let minimize = {
                    let manager: &WindowManager = manager;
                    manager
                        .window(only)
                        .is_some_and(|window| is_shown_active(manager, window))
                };
                let activation = if minimize {
                    manager.minimize(only);
                    TaskbarActivation::Minimized
                } else {
                    manager.show_window(only);
                    TaskbarActivation::Focused
                };
                self.preview = None;
                self.recompute(manager);
                activation
            }
            _ => {
                if self.preview_app_id() == Some(app_id) {
                    self.preview = None;
                    TaskbarActivation::PreviewClosed
                } else {
                    self.preview = build_preview(manager, app_id);
                    TaskbarActivation::PreviewOpened
                }
            }
        }
    }

    /// Restores and focuses a previewed window, then closes the preview.
    pub fn select_preview_window(
        &mut self,
        manager: &mut WindowManager,
        window_id: &WindowId,
    ) -> bool {
        if !self.previews(window_id) {
            return false;
        }
        manager.show_window(window_id);
        self.preview = None;
        self.recompute(manager);
        true
    }

    /// Closes one previewed window. The preview stays open while its group keeps two windows.
    pub fn close_preview_window(
        &mut self,
        manager: &mut WindowManager,
        window_id: &WindowId,
    ) -> bool {
        if !self.previews(window_id) {
            return false;
        }
        let closed = manager.close(window_id);
        self.recompute(manager);
        closed
    }

    /// Dismisses the preview. Returns `true` when one was open.
    pub fn close_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    fn previews(&self, window_id: &WindowId) -> bool {
        self.preview.as_ref().is_some_and(|panel| {
            panel
                .entries
                .iter()
                .any(|entry| &entry.window_id == window_id)
        })
    }
}

fn build_preview(manager: &WindowManager, app_id: &ApplicationId) -> Option<PreviewPanel> {
    let entries: Vec<PreviewEntry> = manager
        .windows_for_app(app_id)
        .map(|window| PreviewEntry {
            window_id: window.id().clone(),
            title: window.title().to_string(),
            icon: window.icon().clone(),
            theme: manager.live_theme().clone(),
            is_active: is_shown_active(manager, window),
        })
        .collect();

    (entries.len() >= 2).then(|| PreviewPanel {
        app_id: app_id.clone(),
        entries,
    })
}
