//! Asynchronous window body loading and capability-scoped behavior execution.
//!
//! Loads are fire-and-forget: every fetch runs as its own task and drops its result into a
//! [`ContentInbox`] the moment it completes. The session installs whatever has arrived at its
//! next boundary, so a slow fetch never holds back another window or a manager mutation. A
//! window shows its loading placeholder until its fetch settles, and a result arriving after the
//! window closed is dropped.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    fmt,
    rc::Rc,
};

use desktop_app_contract::{
    AppBehavior, ApplicationId, BehaviorContext, BehaviorError, ContentRoot, SettingsAccess,
};
use futures::future::{FutureExt, LocalBoxFuture};
use leptos::logging;
use platform_host::{ContentSource, SettingsStore};
use serde_json::Value;
use thiserror::Error;

use crate::{model::WindowId, window::WindowContent, window_manager::WindowManager};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Window body retrieval failure. The window stays usable and shows an inline failure body.
#[error("failed to load content for window `{window_id}`: {message}")]
pub struct ContentLoadFailure {
    pub window_id: WindowId,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Behavior module failure, contained to the window it ran in.
pub enum BehaviorFailure {
    /// No behavior is registered under the descriptor's locator.
    #[error("behavior `{locator}` is not registered")]
    Unregistered { locator: String },
    /// The behavior ran and reported an error.
    #[error("behavior `{locator}` failed: {source}")]
    Failed {
        locator: String,
        source: BehaviorError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How one settled load was applied.
pub enum ContentOutcome {
    /// Body installed; carries the behavior failure if the app's behavior did not complete.
    Ready {
        window_id: WindowId,
        behavior: Option<BehaviorFailure>,
    },
    Failed(ContentLoadFailure),
    /// The window closed before the load settled.
    Discarded { window_id: WindowId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A finished fetch waiting to be installed into its window.
pub struct SettledLoad {
    pub window_id: WindowId,
    pub result: Result<String, String>,
}

#[derive(Debug, Clone, Default)]
/// Arrival queue shared between running fetch tasks and the session that installs them.
pub struct ContentInbox(Rc<RefCell<VecDeque<SettledLoad>>>);

impl ContentInbox {
    pub(crate) fn deliver(&self, load: SettledLoad) {
        self.0.borrow_mut().push_back(load);
    }

    /// Removes every settled load in arrival order.
    pub fn take_ready(&self) -> Vec<SettledLoad> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Body fetch for one window, not yet handed to an executor.
pub struct PendingContentLoad {
    window_id: WindowId,
    task: LocalBoxFuture<'static, ()>,
}

impl PendingContentLoad {
    /// Prepares a fetch of `locator` from `source` on behalf of `window_id`. The result lands in
    /// `inbox` as soon as this fetch alone completes.
    pub fn fetch(
        window_id: WindowId,
        source: Rc<dyn ContentSource>,
        locator: String,
        inbox: ContentInbox,
    ) -> Self {
        let id = window_id.clone();
        let task = async move {
            let result = source.fetch_text(&locator).await;
            inbox.deliver(SettledLoad {
                window_id: id,
                result,
            });
        }
        .boxed_local();
        Self { window_id, task }
    }

    pub fn window_id(&self) -> &WindowId {
        &self.window_id
    }

    /// Future to spawn on a local executor.
    pub fn into_task(self) -> LocalBoxFuture<'static, ()> {
        self.task
    }
}

impl fmt::Debug for PendingContentLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingContentLoad")
            .field("window_id", &self.window_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
/// Behavior implementations keyed by the locator an [`desktop_app_contract::AppDescriptor`]
/// names in its behavior field.
pub struct BehaviorRegistry {
    behaviors: HashMap<String, Rc<dyn AppBehavior>>,
}

impl BehaviorRegistry {
    /// Registers `behavior` under `locator`, replacing any previous registration.
    pub fn register(&mut self, locator: impl Into<String>, behavior: impl AppBehavior + 'static) {
        self.behaviors.insert(locator.into(), Rc::new(behavior));
    }

    pub fn with(mut self, locator: impl Into<String>, behavior: impl AppBehavior + 'static) -> Self {
        self.register(locator, behavior);
        self
    }

    pub fn get(&self, locator: &str) -> Option<Rc<dyn AppBehavior>> {
        self.behaviors.get(locator).cloned()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut locators: Vec<&String> = self.behaviors.keys().collect();
        locators.sort();
        f.debug_struct("BehaviorRegistry")
            .field("locators", &locators)
            .finish()
    }
}

/// Narrows a settings store to the accessor handed to behaviors.
pub(crate) struct SettingsView<'a>(pub(crate) &'a dyn SettingsStore);

impl SettingsAccess for SettingsView<'_> {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: Value) {
        self.0.set(key, value);
    }
}

/// Installs a settled fetch into its window and runs the app's behavior against the new body.
pub fn settle_content(
    manager: &mut WindowManager,
    behaviors: &BehaviorRegistry,
    settings: &dyn SettingsAccess,
    window_id: &WindowId,
    result: Result<String, String>,
) -> ContentOutcome {
    let Some(window) = manager.window_mut(window_id) else {
        logging::log!("discarding content for closed window `{window_id}`");
        return ContentOutcome::Discarded {
            window_id: window_id.clone(),
        };
    };

    let markup = match result {
        Ok(markup) => markup,
        Err(message) => {
            let failure = ContentLoadFailure {
                window_id: window_id.clone(),
                message: message.clone(),
            };
            logging::warn!("{failure}");
            window.set_content(WindowContent::Failed { message });
            return ContentOutcome::Failed(failure);
        }
    };

    let mut root = ContentRoot::new(markup);
    let behavior = window
        .descriptor()
        .behavior_locator
        .clone()
        .and_then(|locator| {
            let app_id = window.app_id().clone();
            let outcome =
                run_behavior(behaviors, &locator, window_id, &app_id, &mut root, settings);
            outcome.err()
        });
    if let Some(failure) = &behavior {
        logging::warn!("window `{window_id}`: {failure}");
    }
    window.set_content(WindowContent::Ready(root));

    ContentOutcome::Ready {
        window_id: window_id.clone(),
        behavior,
    }
}

fn run_behavior(
    behaviors: &BehaviorRegistry,
    locator: &str,
    window_id: &WindowId,
    app_id: &ApplicationId,
    root: &mut ContentRoot,
    settings: &dyn SettingsAccess,
) -> Result<(), BehaviorFailure> {
    let behavior = behaviors
        .get(locator)
        .ok_or_else(|| BehaviorFailure::Unregistered {
            locator: locator.to_string(),
        })?;
    let mut context = BehaviorContext::new(window_id.as_str(), app_id, root, settings);
    behavior
        .run(&mut context)
        .map_err(|source| BehaviorFailure::Failed {
            locator: locator.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppDescriptor, AppIcon, ThemeMode};
    use futures::executor::block_on;
    use platform_host::{MemoryContentSource, MemorySettingsStore};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::ShellConfig, window::LOAD_FAILED_MARKUP};

    struct Greeter;

    impl AppBehavior for Greeter {
        fn run(&self, context: &mut BehaviorContext<'_>) -> Result<(), BehaviorError> {
            let mode = context
                .settings()
                .get("theme.mode")
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default();
            context
                .content_mut()
                .append_markup(&format!("<p>theme={mode}</p>"));
            Ok(())
        }
    }

    struct Broken;

    impl AppBehavior for Broken {
        fn run(&self, _context: &mut BehaviorContext<'_>) -> Result<(), BehaviorError> {
            Err(BehaviorError::new("boom"))
        }
    }

    fn manager_with(descriptor: AppDescriptor) -> (WindowManager, WindowId) {
        let mut manager = WindowManager::new(ShellConfig::default(), ThemeMode::Dark);
        let id = manager.open_window(descriptor);
        (manager, id)
    }

    fn descriptor(behavior: Option<&str>) -> AppDescriptor {
        let descriptor = AppDescriptor::new(
            ApplicationId::trusted("about"),
            "About",
            AppIcon::Single("about.svg".to_string()),
            "apps/about/index.html",
        );
        match behavior {
            Some(locator) => descriptor.with_behavior(locator),
            None => descriptor,
        }
    }

    #[test]
    fn each_load_delivers_on_its_own_completion() {
        let source: Rc<dyn ContentSource> =
            Rc::new(MemoryContentSource::default().with_entry("a.html", "<p>a</p>"));
        let app_id = ApplicationId::trusted("about");
        let inbox = ContentInbox::default();
        let first = PendingContentLoad::fetch(
            WindowId::for_app(&app_id, 1),
            Rc::clone(&source),
            "a.html".to_string(),
            inbox.clone(),
        );
        let second = PendingContentLoad::fetch(
            WindowId::for_app(&app_id, 2),
            source,
            "missing.html".to_string(),
            inbox.clone(),
        );
        assert!(inbox.is_empty());

        block_on(second.into_task());
        assert_eq!(inbox.len(), 1);
        block_on(first.into_task());

        let ready = inbox.take_ready();
        assert_eq!(
            ready.iter().map(|load| load.window_id.as_str()).collect::<Vec<_>>(),
            vec!["about-2", "about-1"]
        );
        assert!(ready[0].result.is_err());
        assert_eq!(ready[1].result, Ok("<p>a</p>".to_string()));
        assert!(inbox.is_empty());
    }

    #[test]
    fn behavior_runs_against_window_body_only() {
        let (mut manager, id) = manager_with(descriptor(Some("apps/about/script.js")));
        let behaviors = BehaviorRegistry::default().with("apps/about/script.js", Greeter);
        let settings = MemorySettingsStore::with_defaults();

        let outcome = settle_content(
            &mut manager,
            &behaviors,
            &settings,
            &id,
            Ok("<h1>About</h1>".to_string()),
        );

        assert_eq!(
            outcome,
            ContentOutcome::Ready {
                window_id: id.clone(),
                behavior: None
            }
        );
        assert_eq!(
            manager.window(&id).map(|window| window.content().markup()),
            Some("<h1>About</h1><p>theme=dark</p>")
        );
    }

    #[test]
    fn behavior_failures_are_contained() {
        let (mut manager, id) = manager_with(descriptor(Some("broken.js")));
        let behaviors = BehaviorRegistry::default().with("broken.js", Broken);
        let settings = MemorySettingsStore::default();

        let outcome = settle_content(&mut manager, &behaviors, &settings, &id, Ok("<p/>".into()));
        assert!(matches!(
            outcome,
            ContentOutcome::Ready {
                behavior: Some(BehaviorFailure::Failed { .. }),
                ..
            }
        ));
        assert_eq!(
            manager.window(&id).map(|window| window.content().markup()),
            Some("<p/>")
        );

        let (mut manager, id) = manager_with(descriptor(Some("missing.js")));
        let outcome = settle_content(
            &mut manager,
            &BehaviorRegistry::default(),
            &settings,
            &id,
            Ok("<p/>".into()),
        );
        assert!(matches!(
            outcome,
            ContentOutcome::Ready {
                behavior: Some(BehaviorFailure::Unregistered { .. }),
                ..
            }
        ));
    }

    #[test]
    fn fetch_failure_shows_inline_body() {
        let (mut manager, id) = manager_with(descriptor(None));
        let settings = MemorySettingsStore::default();
        let outcome = settle_content(
            &mut manager,
            &BehaviorRegistry::default(),
            &settings,
            &id,
            Err("Not Found".to_string()),
        );

        assert!(matches!(outcome, ContentOutcome::Failed(_)));
        assert_eq!(
            manager.window(&id).map(|window| window.content().markup()),
            Some(LOAD_FAILED_MARKUP)
        );
    }

    #[test]
    fn late_results_for_closed_windows_are_discarded() {
        let (mut manager, id) = manager_with(descriptor(None));
        manager.close(&id);
        let settings = MemorySettingsStore::default();
        let outcome = settle_content(
            &mut manager,
            &BehaviorRegistry::default(),
            &settings,
            &id,
            Ok("<p/>".to_string()),
        );
        assert_eq!(outcome, ContentOutcome::Discarded { window_id: id });
    }
}
