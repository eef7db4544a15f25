//! Shared contract types between the desktop window manager runtime, its host collaborators, and
//! per-application behavior modules.
//!
//! Applications are described by immutable [`AppDescriptor`] records. Optional behavior modules
//! run behind the capability-scoped [`AppBehavior`] trait: they only ever see their own window's
//! [`ContentRoot`] and a [`SettingsAccess`] handle, never the window manager itself.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings key holding the current theme mode (`"light"` or `"dark"`).
pub const THEME_MODE_KEY: &str = "theme.mode";

/// Stable identifier for a launchable application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` is one or more dot-separated lowercase segments.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected lowercase dotted segments"
            ))
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ApplicationId> for String {
    fn from(id: ApplicationId) -> Self {
        id.0
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 120 {
        return false;
    }

    raw.split('.').all(|part| {
        let bytes = part.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 32
            && bytes[0].is_ascii_lowercase()
            && bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'_')
            && !part.ends_with('-')
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Desktop theme mode used to pick icon variants.
pub enum ThemeMode {
    /// Light theme.
    Light,
    /// Dark theme (the default).
    #[default]
    Dark,
}

impl ThemeMode {
    /// Stable string token stored in settings.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Interprets a raw settings value. Anything other than `"light"` is dark.
    pub fn from_setting(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("light") => Self::Light,
            _ => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// Icon reference for an app: one image for every theme, or a light/dark pair.
pub enum AppIcon {
    /// Single icon reference used for every theme.
    Single(String),
    /// Theme-dependent icon references.
    Themed {
        /// Icon used by the light theme.
        light: String,
        /// Icon used by the dark theme.
        dark: String,
    },
}

impl AppIcon {
    /// Picks the icon reference for `mode`.
    ///
    /// This is the only place theme-variant selection happens; window chrome and the taskbar
    /// both go through it.
    pub fn resolve(&self, mode: ThemeMode) -> &str {
        match (self, mode) {
            (Self::Single(icon), _) => icon.as_str(),
            (Self::Themed { light, .. }, ThemeMode::Light) => light.as_str(),
            (Self::Themed { dark, .. }, ThemeMode::Dark) => dark.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Immutable record describing one launchable application.
pub struct AppDescriptor {
    /// Application identifier.
    pub id: ApplicationId,
    /// Display name, also used as the window title.
    pub name: String,
    /// Icon reference or theme pair.
    pub icon: AppIcon,
    /// Locator of the window body content.
    #[serde(rename = "contentUrl")]
    pub content_locator: String,
    /// Optional stylesheet locator.
    #[serde(rename = "styleUrl", default, skip_serializing_if = "Option::is_none")]
    pub style_locator: Option<String>,
    /// Optional behavior module locator.
    #[serde(rename = "scriptUrl", default, skip_serializing_if = "Option::is_none")]
    pub behavior_locator: Option<String>,
    /// Preferred window width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    /// Preferred window height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

impl AppDescriptor {
    /// Creates a descriptor with a single icon and no optional locators.
    pub fn new(
        id: ApplicationId,
        name: impl Into<String>,
        icon: AppIcon,
        content_locator: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            icon,
            content_locator: content_locator.into(),
            style_locator: None,
            behavior_locator: None,
            width: None,
            height: None,
        }
    }

    /// Sets the preferred window size.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the behavior module locator.
    pub fn with_behavior(mut self, locator: impl Into<String>) -> Self {
        self.behavior_locator = Some(locator.into());
        self
    }

    /// Sets the stylesheet locator.
    pub fn with_style(mut self, locator: impl Into<String>) -> Self {
        self.style_locator = Some(locator.into());
        self
    }
}

/// Narrow settings handle handed to behavior modules and other non-owning consumers.
pub trait SettingsAccess {
    /// Reads a raw settings value.
    fn get(&self, key: &str) -> Option<Value>;

    /// Writes a raw settings value, notifying subscribers when it changed.
    fn set(&self, key: &str, value: Value);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Body markup of one window, the only surface a behavior module may touch.
pub struct ContentRoot {
    markup: String,
}

impl ContentRoot {
    /// Wraps fetched body markup.
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// Current body markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Replaces the body markup.
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
    }

    /// Appends markup to the end of the body.
    pub fn append_markup(&mut self, markup: &str) {
        self.markup.push_str(markup);
    }
}

/// Capability handle passed to a behavior module for the duration of one run.
pub struct BehaviorContext<'a> {
    window_id: &'a str,
    app_id: &'a ApplicationId,
    content: &'a mut ContentRoot,
    settings: &'a dyn SettingsAccess,
}

impl<'a> BehaviorContext<'a> {
    /// Builds a context scoped to one window.
    pub fn new(
        window_id: &'a str,
        app_id: &'a ApplicationId,
        content: &'a mut ContentRoot,
        settings: &'a dyn SettingsAccess,
    ) -> Self {
        Self {
            window_id,
            app_id,
            content,
            settings,
        }
    }

    /// Identifier of the window the behavior runs in.
    pub fn window_id(&self) -> &str {
        self.window_id
    }

    /// Application the behavior belongs to.
    pub fn app_id(&self) -> &ApplicationId {
        self.app_id
    }

    /// Read access to the window body.
    pub fn content(&self) -> &ContentRoot {
        &*self.content
    }

    /// Write access to the window body.
    pub fn content_mut(&mut self) -> &mut ContentRoot {
        &mut *self.content
    }

    /// Settings accessor.
    pub fn settings(&self) -> &dyn SettingsAccess {
        self.settings
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Failure reported by a behavior module run.
pub struct BehaviorError {
    message: String,
}

impl BehaviorError {
    /// Creates an error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior failed: {}", self.message)
    }
}

impl std::error::Error for BehaviorError {}

/// Per-application behavior module executed once the window body has loaded.
pub trait AppBehavior {
    /// Runs the behavior against its window's content.
    ///
    /// # Errors
    ///
    /// Returns [`BehaviorError`] when the behavior cannot complete. The runtime logs it and
    /// leaves the window chrome untouched.
    fn run(&self, context: &mut BehaviorContext<'_>) -> Result<(), BehaviorError>;
}

/// Drop-based handle for an observer registration.
///
/// The release callback runs exactly once, either through [`Subscription::release`] or when the
/// handle is dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a handle from a release callback.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Releases the registration now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}
