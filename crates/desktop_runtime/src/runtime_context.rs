//! Explicit desktop session context.
//!
//! One [`DesktopSession`] owns the window manager, the taskbar projector, the notification bus,
//! and in-flight content loads for a desktop session. Host collaborators arrive through
//! [`HostServices`]; nothing here reaches for global state.

use std::rc::Rc;

use desktop_app_contract::{AppBehavior, ApplicationId, Subscription, ThemeMode, THEME_MODE_KEY};
use futures::{
    future::LocalBoxFuture,
    task::{LocalSpawn, LocalSpawnExt},
};
use leptos::logging;
use platform_host::{subscribe_theme_mode, theme_mode_with, HostServices};
use serde_json::Value;

use crate::{
    config::ShellConfig,
    content::{
        settle_content, BehaviorRegistry, ContentInbox, ContentOutcome, PendingContentLoad,
        SettingsView,
    },
    error::ShellError,
    events::EventBus,
    model::{WindowEvent, WindowId},
    taskbar::TaskbarProjector,
    window_manager::WindowManager,
};

/// Live desktop session.
pub struct DesktopSession {
    services: HostServices,
    config: ShellConfig,
    manager: WindowManager,
    taskbar: TaskbarProjector,
    bus: EventBus,
    behaviors: BehaviorRegistry,
    pending_loads: Vec<PendingContentLoad>,
    inbox: ContentInbox,
    theme_subscription: Option<Subscription>,
}

impl DesktopSession {
    /// Boots a session on `services` with the theme currently stored in settings.
    pub fn new(services: HostServices, config: ShellConfig) -> Self {
        let theme = theme_mode_with(services.settings.as_ref());
        let manager = WindowManager::new(config, theme);
        let taskbar = TaskbarProjector::new(&manager);
        let mut session = Self {
            services,
            config,
            manager,
            taskbar,
            bus: EventBus::default(),
            behaviors: BehaviorRegistry::default(),
            pending_loads: Vec::new(),
            inbox: ContentInbox::default(),
            theme_subscription: None,
        };
        session.subscribe_theme();
        session
    }

    /// Replaces the behavior registry.
    pub fn with_behaviors(mut self, behaviors: BehaviorRegistry) -> Self {
        self.behaviors = behaviors;
        self
    }

    pub fn register_behavior(
        &mut self,
        locator: impl Into<String>,
        behavior: impl AppBehavior + 'static,
    ) {
        self.behaviors.register(locator, behavior);
    }

    fn subscribe_theme(&mut self) {
        let theme = self.manager.live_theme().clone();
        self.theme_subscription = Some(subscribe_theme_mode(
            self.services.settings.as_ref(),
            move |mode| {
                if theme.set(mode) {
                    logging::log!("theme switched to {}", mode.token());
                }
            },
        ));
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    pub fn manager(&self) -> &WindowManager {
        &self.manager
    }

    pub(crate) fn manager_mut(&mut self) -> &mut WindowManager {
        &mut self.manager
    }

    pub fn taskbar(&self) -> &TaskbarProjector {
        &self.taskbar
    }

    pub(crate) fn taskbar_and_manager(&mut self) -> (&mut TaskbarProjector, &mut WindowManager) {
        (&mut self.taskbar, &mut self.manager)
    }

    /// Notification bus; subscribe through it to observe window lifecycle events.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn theme(&self) -> ThemeMode {
        self.manager.theme()
    }

    pub fn is_running(&self) -> bool {
        self.theme_subscription.is_some()
    }

    /// Loads queued but not yet handed to an executor.
    pub fn pending_load_count(&self) -> usize {
        self.pending_loads.len()
    }

    /// Loads that finished and wait for [`DesktopSession::settle_ready_content`].
    pub fn ready_content_count(&self) -> usize {
        self.inbox.len()
    }

    /// Opens `app_id`, queues its content load, and publishes the resulting notifications.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::NotFound`] for unknown applications and
    /// [`ShellError::SessionEnded`] after [`DesktopSession::shutdown`].
    pub fn open_app(&mut self, app_id: &ApplicationId) -> Result<WindowId, ShellError> {
        self.settle_ready_content();
        let window_id = self.launch(app_id)?;
        self.flush_events();
        Ok(window_id)
    }

    /// Opens a window and queues its content load without publishing.
    pub(crate) fn launch(&mut self, app_id: &ApplicationId) -> Result<WindowId, ShellError> {
        if !self.is_running() {
            return Err(ShellError::SessionEnded);
        }
        let window_id = self
            .manager
            .open_app(self.services.catalog.as_ref(), app_id)?;
        self.queue_content_load(&window_id);
        Ok(window_id)
    }

    fn queue_content_load(&mut self, window_id: &WindowId) {
        let Some(window) = self.manager.window(window_id) else {
            return;
        };
        let locator = window.descriptor().content_locator.clone();
        self.pending_loads.push(PendingContentLoad::fetch(
            window_id.clone(),
            Rc::clone(&self.services.content),
            locator,
            self.inbox.clone(),
        ));
    }

    /// Hands every queued load to the caller as an independent task.
    ///
    /// Hosts spawn each task on their own local executor. Tasks only touch the session's inbox,
    /// never the window manager.
    pub fn take_content_tasks(&mut self) -> Vec<LocalBoxFuture<'static, ()>> {
        self.pending_loads
            .drain(..)
            .map(PendingContentLoad::into_task)
            .collect()
    }

    /// Spawns every queued load on `spawner`. Returns how many were spawned.
    pub fn spawn_content_loads<S>(&mut self, spawner: &S) -> usize
    where
        S: LocalSpawn + ?Sized,
    {
        let mut spawned = 0;
        for load in self.pending_loads.drain(..) {
            let window_id = load.window_id().clone();
            match spawner.spawn_local(load.into_task()) {
                Ok(()) => spawned += 1,
                Err(err) => {
                    logging::warn!("content load for window `{window_id}` not spawned: {err}");
                }
            }
        }
        spawned
    }

    /// Installs every load that has finished since the last call.
    ///
    /// Results for windows closed in the meantime are discarded. Runs at the start of every
    /// dispatch; hosts may also call it directly when a task completes.
    pub fn settle_ready_content(&mut self) -> Vec<ContentOutcome> {
        let ready = self.inbox.take_ready();
        if ready.is_empty() {
            return Vec::new();
        }
        let settings = SettingsView(self.services.settings.as_ref());
        ready
            .into_iter()
            .map(|load| {
                settle_content(
                    &mut self.manager,
                    &self.behaviors,
                    &settings,
                    &load.window_id,
                    load.result,
                )
            })
            .collect()
    }

    /// Drains manager notifications, refreshes the taskbar for each, and publishes them.
    pub fn flush_events(&mut self) -> Vec<WindowEvent> {
        let events = self.manager.drain_events();
        for event in &events {
            self.taskbar.on_event(&self.manager, event);
            self.bus.publish(event);
        }
        events
    }

    /// Stores `mode` in settings. Window and taskbar icons follow immediately. Returns `true`
    /// when the theme changed.
    pub fn set_theme(&mut self, mode: ThemeMode) -> bool {
        let before = self.manager.theme();
        self.services
            .settings
            .set(THEME_MODE_KEY, Value::from(mode.token()));
        self.manager.live_theme().set(mode);
        before != mode
    }

    /// Closes every window, drops in-flight loads, and releases the settings subscription.
    pub fn shutdown(&mut self) -> Vec<WindowEvent> {
        self.manager.cancel_interaction();
        self.taskbar.close_preview();
        self.manager.close_all();
        self.pending_loads.clear();
        self.inbox = ContentInbox::default();
        self.theme_subscription = None;
        self.flush_events()
    }

    /// Shuts down and starts a fresh, empty session on the same host services.
    pub fn reboot(&mut self) -> Vec<WindowEvent> {
        let events = self.shutdown();
        let theme = theme_mode_with(self.services.settings.as_ref());
        let mut config = self.config;
        config.viewport = self.manager.config().viewport;
        self.manager = WindowManager::new(config, theme);
        self.taskbar = TaskbarProjector::new(&self.manager);
        self.subscribe_theme();
        events
    }
}

impl std::fmt::Debug for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopSession")
            .field("windows", &self.manager.len())
            .field("active", &self.manager.active_window_id())
            .field("pending_loads", &self.pending_loads.len())
            .field("ready_content", &self.inbox.len())
            .field("behaviors", &self.behaviors)
            .finish_non_exhaustive()
    }
}
