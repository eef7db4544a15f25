//! Key/value settings store with change subscriptions.
//!
//! The store is the only shared mutable state the desktop runtime observes from outside. Writes
//! notify subscribers of the written key, and only when the stored value actually changed.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use desktop_app_contract::{SettingsAccess, Subscription, ThemeMode, THEME_MODE_KEY};
use serde::de::DeserializeOwned;
use serde_json::Value;

type SettingsCallback = Rc<dyn Fn(&Value)>;

/// Settings store with per-key change notification.
pub trait SettingsStore: SettingsAccess {
    /// Registers `callback` for changes of `key`. Dropping the returned handle unsubscribes.
    fn subscribe(&self, key: &str, callback: Rc<dyn Fn(&Value)>) -> Subscription;
}

#[derive(Default)]
struct SettingsInner {
    values: HashMap<String, Value>,
    subscribers: HashMap<String, Vec<(u64, SettingsCallback)>>,
    next_subscriber_id: u64,
}

#[derive(Clone, Default)]
/// In-memory settings store. Clones share the same underlying state.
pub struct MemorySettingsStore {
    inner: Rc<RefCell<SettingsInner>>,
}

impl MemorySettingsStore {
    /// Creates a store seeded with the default theme mode (`"dark"`).
    pub fn with_defaults() -> Self {
        let store = Self::default();
        store
            .inner
            .borrow_mut()
            .values
            .insert(THEME_MODE_KEY.to_string(), Value::from(ThemeMode::Dark.token()));
        store
    }

    /// Number of live subscribers for `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(key)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for MemorySettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemorySettingsStore")
            .field("values", &inner.values)
            .field(
                "subscribers",
                &inner.subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl SettingsAccess for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.values.get(key) == Some(&value) {
                return;
            }
            inner.values.insert(key.to_string(), value.clone());
            inner
                .subscribers
                .get(key)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|(_, callback)| Rc::clone(callback))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        };

        // Borrow released above so callbacks may read or write the store.
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn subscribe(&self, key: &str, callback: Rc<dyn Fn(&Value)>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            inner
                .subscribers
                .entry(key.to_string())
                .or_default()
                .push((id, callback));
            id
        };

        let weak: Weak<RefCell<SettingsInner>> = Rc::downgrade(&self.inner);
        let key = key.to_string();
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.borrow_mut();
            if let Some(entries) = inner.subscribers.get_mut(&key) {
                entries.retain(|(entry_id, _)| *entry_id != id);
                if entries.is_empty() {
                    inner.subscribers.remove(&key);
                }
            }
        })
    }
}

/// Reads the current theme mode, defaulting to dark for absent or unknown values.
pub fn theme_mode_with(settings: &(impl SettingsAccess + ?Sized)) -> ThemeMode {
    ThemeMode::from_setting(settings.get(THEME_MODE_KEY).as_ref())
}

/// Subscribes to theme mode changes with a typed callback.
pub fn subscribe_theme_mode(
    store: &(impl SettingsStore + ?Sized),
    on_change: impl Fn(ThemeMode) + 'static,
) -> Subscription {
    store.subscribe(
        THEME_MODE_KEY,
        Rc::new(move |value: &Value| on_change(ThemeMode::from_setting(Some(value)))),
    )
}

/// Reads and deserializes a typed setting.
///
/// # Errors
///
/// Returns an error when the stored value does not match `T`. An absent key is `Ok(None)`.
pub fn load_setting_with<T: DeserializeOwned>(
    settings: &(impl SettingsAccess + ?Sized),
    key: &str,
) -> Result<Option<T>, String> {
    match settings.get(key) {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| format!("setting `{key}` has unexpected shape: {e}")),
        None => Ok(None),
    }
}
