//! Desktop actions and the dispatcher that routes them through the session.

use desktop_app_contract::{ApplicationId, ThemeMode};
use leptos::logging;

use crate::{
    error::ShellError,
    model::{PointerPosition, ViewportSize, WindowControl, WindowEvent, WindowId, WindowRegion},
    runtime_context::DesktopSession,
    window::GestureError,
};

/// Key name that abandons an in-progress gesture and dismisses the preview.
pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, PartialEq)]
/// Inputs accepted by [`DesktopSession::dispatch`].
pub enum DesktopAction {
    /// Open a new window of an application from the catalog.
    OpenApp { app_id: ApplicationId },
    /// Activate and raise a window.
    FocusWindow { window_id: WindowId },
    MinimizeWindow { window_id: WindowId },
    MaximizeWindow { window_id: WindowId },
    RestoreWindow { window_id: WindowId },
    /// Maximize a normal window, restore a maximized one.
    ToggleMaximize { window_id: WindowId },
    CloseWindow { window_id: WindowId },
    CloseAll,
    /// Primary button pressed on the desktop.
    PointerDown { pointer: PointerPosition },
    PointerMove { pointer: PointerPosition },
    PointerUp { pointer: PointerPosition },
    /// Double click; toggles maximize when it lands on a window header.
    HeaderDoubleClick { pointer: PointerPosition },
    /// Click on an application's taskbar button.
    ActivateTaskbarApp { app_id: ApplicationId },
    SelectPreviewWindow { window_id: WindowId },
    ClosePreviewWindow { window_id: WindowId },
    DismissPreview,
    KeyPress { key: String },
    ResizeViewport { viewport: ViewportSize },
    SetTheme { mode: ThemeMode },
}

impl DesktopSession {
    /// Applies one action and returns the notifications it produced, in emission order.
    ///
    /// Theme changes observed through settings are applied first, so every action sees
    /// current icons.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::NotFound`] when [`DesktopAction::OpenApp`] names an unknown
    /// application, and [`ShellError::SessionEnded`] when opening after shutdown. Every other
    /// action targeting a missing window is a no-op.
    pub fn dispatch(&mut self, action: DesktopAction) -> Result<Vec<WindowEvent>, ShellError> {
        self.settle_ready_content();
        match action {
            DesktopAction::OpenApp { app_id } => {
                self.launch(&app_id)?;
            }
            DesktopAction::FocusWindow { window_id } => {
                self.manager_mut().set_active(&window_id);
            }
            DesktopAction::MinimizeWindow { window_id } => {
                self.manager_mut().minimize(&window_id);
            }
            DesktopAction::MaximizeWindow { window_id } => {
                self.manager_mut().maximize(&window_id);
            }
            DesktopAction::RestoreWindow { window_id } => {
                self.manager_mut().restore(&window_id);
            }
            DesktopAction::ToggleMaximize { window_id } => {
                self.manager_mut().toggle_maximize(&window_id);
            }
            DesktopAction::CloseWindow { window_id } => {
                self.manager_mut().close(&window_id);
            }
            DesktopAction::CloseAll => {
                self.manager_mut().close_all();
            }
            DesktopAction::PointerDown { pointer } => self.pointer_down(pointer),
            DesktopAction::PointerMove { pointer } => {
                self.manager_mut().pointer_move(pointer);
            }
            DesktopAction::PointerUp { pointer } => {
                let manager = self.manager_mut();
                manager.pointer_move(pointer);
                manager.pointer_release();
            }
            DesktopAction::HeaderDoubleClick { pointer } => {
                if let Some(hit) = self.manager().hit_test(pointer) {
                    if hit.region == WindowRegion::Header {
                        self.manager_mut().toggle_maximize(&hit.window_id);
                    }
                }
            }
            DesktopAction::ActivateTaskbarApp { app_id } => {
                let (taskbar, manager) = self.taskbar_and_manager();
                taskbar.activate_app(manager, &app_id);
            }
            DesktopAction::SelectPreviewWindow { window_id } => {
                let (taskbar, manager) = self.taskbar_and_manager();
                taskbar.select_preview_window(manager, &window_id);
            }
            DesktopAction::ClosePreviewWindow { window_id } => {
                let (taskbar, manager) = self.taskbar_and_manager();
                taskbar.close_preview_window(manager, &window_id);
            }
            DesktopAction::DismissPreview => {
                let (taskbar, _) = self.taskbar_and_manager();
                taskbar.close_preview();
            }
            DesktopAction::KeyPress { key } => {
                if key == ESCAPE_KEY {
                    let (taskbar, manager) = self.taskbar_and_manager();
                    manager.cancel_interaction();
                    taskbar.close_preview();
                }
            }
            DesktopAction::ResizeViewport { viewport } => {
                let refitted = self.manager_mut().set_viewport(viewport);
                if refitted > 0 {
                    logging::log!("viewport resized; {refitted} maximized windows refitted");
                }
            }
            DesktopAction::SetTheme { mode } => {
                self.set_theme(mode);
            }
        }
        Ok(self.flush_events())
    }

    fn pointer_down(&mut self, pointer: PointerPosition) {
        let (taskbar, manager) = self.taskbar_and_manager();
        taskbar.close_preview();

        let Some(hit) = manager.hit_test(pointer) else {
            return;
        };
        manager.set_active(&hit.window_id);

        let started = match hit.region {
            WindowRegion::Header => manager.begin_drag(&hit.window_id, pointer),
            WindowRegion::ResizeHandle(edge) => manager.begin_resize(&hit.window_id, edge, pointer),
            WindowRegion::Control(control) => {
                match control {
                    WindowControl::Minimize => manager.minimize(&hit.window_id),
                    WindowControl::Maximize => manager.toggle_maximize(&hit.window_id),
                    WindowControl::Close => manager.close(&hit.window_id),
                };
                Ok(false)
            }
            WindowRegion::Body => Ok(false),
        };
        if let Err(err) = started {
            log_rejected_gesture(&hit.window_id, err);
        }
    }
}

fn log_rejected_gesture(window_id: &WindowId, err: GestureError) {
    logging::warn!("ignoring gesture on window `{window_id}`: {err}");
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppDescriptor, AppIcon};
    use platform_host::{HostServices, MemoryAppCatalog, MemoryContentSource};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::ShellConfig,
        model::{WindowEventKind, WindowRect, WindowVisibility},
    };

    fn session() -> DesktopSession {
        let app = |id: &str, name: &str| {
            AppDescriptor::new(
                ApplicationId::trusted(id),
                name,
                AppIcon::Single(format!("{id}.svg")),
                format!("apps/{id}/index.html"),
            )
        };
        let catalog = MemoryAppCatalog::new(vec![app("editor", "Editor"), app("notes", "Notes")]);
        DesktopSession::new(
            HostServices::in_memory(catalog, MemoryContentSource::default()),
            ShellConfig::default(),
        )
    }

    fn open(session: &mut DesktopSession, app: &str) -> WindowId {
        session
            .dispatch(DesktopAction::OpenApp {
                app_id: ApplicationId::trusted(app),
            })
            .expect("open app");
        session
            .manager()
            .active_window_id()
            .cloned()
            .expect("opened window is active")
    }

    fn rect_of(session: &DesktopSession, window_id: &WindowId) -> WindowRect {
        session
            .manager()
            .window(window_id)
            .map(|window| window.rect())
            .expect("window exists")
    }

    fn kinds(events: &[WindowEvent]) -> Vec<WindowEventKind> {
        events.iter().map(|event| event.kind).collect()
    }

    #[test]
    fn open_unknown_app_reports_not_found() {
        let mut session = session();
        let err = session
            .dispatch(DesktopAction::OpenApp {
                app_id: ApplicationId::trusted("ghost"),
            })
            .expect_err("unknown app");
        assert_eq!(
            err,
            ShellError::NotFound {
                app_id: ApplicationId::trusted("ghost")
            }
        );
        assert!(session.manager().is_empty());
    }

    #[test]
    fn open_returns_opened_notification() {
        let mut session = session();
        let events = session
            .dispatch(DesktopAction::OpenApp {
                app_id: ApplicationId::trusted("editor"),
            })
            .expect("open");
        assert_eq!(kinds(&events), vec![WindowEventKind::Opened]);
    }

    #[test]
    fn header_drag_moves_window_by_pointer_delta() {
        let mut session = session();
        let id = open(&mut session, "editor");
        let start = rect_of(&session, &id);
        let grab = PointerPosition::new(start.x + 40, start.y + 10);

        session
            .dispatch(DesktopAction::PointerDown { pointer: grab })
            .expect("down");
        assert_eq!(session.manager().captured_window_id(), Some(&id));
        session
            .dispatch(DesktopAction::PointerMove {
                pointer: PointerPosition::new(grab.x + 30, grab.y + 15),
            })
            .expect("move");
        session
            .dispatch(DesktopAction::PointerUp {
                pointer: PointerPosition::new(grab.x + 50, grab.y + 25),
            })
            .expect("up");

        assert_eq!(session.manager().captured_window_id(), None);
        assert_eq!(rect_of(&session, &id), start.offset(50, 25));
    }

    #[test]
    fn escape_reverts_gesture_in_progress() {
        let mut session = session();
        let id = open(&mut session, "editor");
        let start = rect_of(&session, &id);
        let grab = PointerPosition::new(start.x + 40, start.y + 10);

        session
            .dispatch(DesktopAction::PointerDown { pointer: grab })
            .expect("down");
        session
            .dispatch(DesktopAction::PointerMove {
                pointer: PointerPosition::new(grab.x + 100, grab.y),
            })
            .expect("move");
        session
            .dispatch(DesktopAction::KeyPress {
                key: ESCAPE_KEY.to_string(),
            })
            .expect("escape");

        assert_eq!(session.manager().captured_window_id(), None);
        assert_eq!(rect_of(&session, &id), start);
    }

    #[test]
    fn control_buttons_act_on_pointer_down() {
        let mut session = session();
        let id = open(&mut session, "editor");
        let rect = rect_of(&session, &id);
        let chrome = session.manager().config().chrome;
        let header_y = rect.y + chrome.header_height / 2;
        let close = PointerPosition::new(rect.right() - chrome.control_width / 2, header_y);
        let maximize =
            PointerPosition::new(rect.right() - chrome.control_width * 3 / 2, header_y);

        let events = session
            .dispatch(DesktopAction::PointerDown { pointer: maximize })
            .expect("maximize");
        assert_eq!(
            kinds(&events),
            vec![WindowEventKind::Focused, WindowEventKind::Maximized]
        );
        assert_eq!(
            session.manager().window(&id).map(|window| window.visibility()),
            Some(WindowVisibility::Maximized)
        );

        session
            .dispatch(DesktopAction::HeaderDoubleClick {
                pointer: PointerPosition::new(100, chrome.header_height / 2),
            })
            .expect("double click");
        assert_eq!(rect_of(&session, &id), rect);

        let events = session
            .dispatch(DesktopAction::PointerDown { pointer: close })
            .expect("close");
        assert_eq!(
            kinds(&events),
            vec![WindowEventKind::Focused, WindowEventKind::Closed]
        );
        assert!(session.manager().is_empty());
    }

    #[test]
    fn focusing_the_active_window_still_notifies() {
        let mut session = session();
        let first = open(&mut session, "editor");
        let second = open(&mut session, "notes");

        let events = session
            .dispatch(DesktopAction::FocusWindow {
                window_id: second.clone(),
            })
            .expect("focus");
        assert_eq!(kinds(&events), vec![WindowEventKind::Focused]);
        assert_eq!(events[0].window_id, second);
        assert_eq!(session.manager().stacking_order(), &[first, second.clone()]);
        assert_eq!(session.manager().active_window_id(), Some(&second));
    }

    #[test]
    fn pointer_down_on_lower_window_focuses_it_and_dismisses_preview() {
        let mut session = session();
        let first = open(&mut session, "editor");
        let second = open(&mut session, "editor");
        let notes = open(&mut session, "notes");
        session
            .dispatch(DesktopAction::ActivateTaskbarApp {
                app_id: ApplicationId::trusted("editor"),
            })
            .expect("preview");
        assert!(session.taskbar().preview().is_some());

        session
            .dispatch(DesktopAction::MinimizeWindow {
                window_id: notes.clone(),
            })
            .expect("minimize notes");
        session
            .dispatch(DesktopAction::MinimizeWindow {
                window_id: second.clone(),
            })
            .expect("minimize second");

        let rect = rect_of(&session, &first);
        let events = session
            .dispatch(DesktopAction::PointerDown {
                pointer: PointerPosition::new(rect.x + rect.w / 2, rect.y + rect.h / 2),
            })
            .expect("body click");

        assert_eq!(session.taskbar().preview(), None);
        assert_eq!(kinds(&events), vec![WindowEventKind::Focused]);
        assert_eq!(session.manager().active_window_id(), Some(&first));
    }

    #[test]
    fn stale_window_ids_are_ignored() {
        let mut session = session();
        let id = open(&mut session, "editor");
        session
            .dispatch(DesktopAction::CloseWindow {
                window_id: id.clone(),
            })
            .expect("close");

        let events = session
            .dispatch(DesktopAction::MinimizeWindow { window_id: id })
            .expect("stale minimize");
        assert!(events.is_empty());
    }

    #[test]
    fn viewport_resize_refits_maximized_windows() {
        let mut session = session();
        let id = open(&mut session, "editor");
        session
            .dispatch(DesktopAction::MaximizeWindow {
                window_id: id.clone(),
            })
            .expect("maximize");
        session
            .dispatch(DesktopAction::ResizeViewport {
                viewport: ViewportSize {
                    width: 1600,
                    height: 900,
                },
            })
            .expect("resize");

        assert_eq!(
            rect_of(&session, &id),
            WindowRect {
                x: 0,
                y: 0,
                w: 1600,
                h: 852
            }
        );
    }
}
