//! Application lookup contracts and the in-memory catalog adapter.

use desktop_app_contract::{AppDescriptor, ApplicationId};

/// Host service resolving application identifiers to descriptors.
pub trait AppCatalog {
    /// Looks up one application. `None` means the id is unknown.
    fn app(&self, app_id: &ApplicationId) -> Option<AppDescriptor>;

    /// Lists every known application in catalog order.
    fn apps(&self) -> Vec<AppDescriptor>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// In-memory catalog backed by a descriptor list.
pub struct MemoryAppCatalog {
    apps: Vec<AppDescriptor>,
}

impl MemoryAppCatalog {
    /// Creates a catalog from descriptors. Later duplicates of an id shadow nothing; the first
    /// entry wins on lookup.
    pub fn new(apps: Vec<AppDescriptor>) -> Self {
        Self { apps }
    }

    /// Parses an `apps.json` style array of descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or an entry carries an invalid id.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let apps: Vec<AppDescriptor> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        Ok(Self::new(apps))
    }

    /// Adds a descriptor to the end of the catalog.
    pub fn insert(&mut self, descriptor: AppDescriptor) {
        self.apps.push(descriptor);
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl AppCatalog for MemoryAppCatalog {
    fn app(&self, app_id: &ApplicationId) -> Option<AppDescriptor> {
        self.apps.iter().find(|app| &app.id == app_id).cloned()
    }

    fn apps(&self) -> Vec<AppDescriptor> {
        self.apps.clone()
    }
}
