//! Host service bundle injected into the desktop runtime.

use std::{fmt, rc::Rc};

use crate::{
    AppCatalog, ContentSource, MemoryAppCatalog, MemoryContentSource, MemorySettingsStore,
    SettingsStore,
};

/// Runtime-selected host service bundle.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `desktop_runtime`, which keeps the window manager decoupled from how apps are catalogued,
/// where content comes from, and where settings persist.
#[derive(Clone)]
pub struct HostServices {
    /// Application lookup.
    pub catalog: Rc<dyn AppCatalog>,
    /// Window body retrieval.
    pub content: Rc<dyn ContentSource>,
    /// Settings and theme store.
    pub settings: Rc<dyn SettingsStore>,
}

impl HostServices {
    /// Bundles explicit service implementations.
    pub fn new(
        catalog: Rc<dyn AppCatalog>,
        content: Rc<dyn ContentSource>,
        settings: Rc<dyn SettingsStore>,
    ) -> Self {
        Self {
            catalog,
            content,
            settings,
        }
    }

    /// Bundles in-memory adapters, seeding settings with defaults.
    pub fn in_memory(catalog: MemoryAppCatalog, content: MemoryContentSource) -> Self {
        Self::new(
            Rc::new(catalog),
            Rc::new(content),
            Rc::new(MemorySettingsStore::with_defaults()),
        )
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("apps", &self.catalog.apps().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppDescriptor, AppIcon, ApplicationId, ThemeMode};
    use futures::executor::block_on;

    use super::*;
    use crate::theme_mode_with;

    #[test]
    fn in_memory_bundle_wires_every_service() {
        let catalog = MemoryAppCatalog::new(vec![AppDescriptor::new(
            ApplicationId::trusted("notes"),
            "Notes",
            AppIcon::Single("notes.svg".to_string()),
            "apps/notes/index.html",
        )]);
        let content = MemoryContentSource::default().with_entry("apps/notes/index.html", "<p/>");
        let services = HostServices::in_memory(catalog, content);

        assert!(services.catalog.app(&ApplicationId::trusted("notes")).is_some());
        assert_eq!(
            block_on(services.content.fetch_text("apps/notes/index.html")),
            Ok("<p/>".to_string())
        );
        assert_eq!(theme_mode_with(services.settings.as_ref()), ThemeMode::Dark);
    }
}
