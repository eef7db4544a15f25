//! Typed host-domain contracts for the collaborators the desktop runtime consumes.
//!
//! The runtime never reaches for ambient services: app lookup, content retrieval, and the
//! settings/theme store all cross into `desktop_runtime` through the [`HostServices`] bundle
//! assembled here. In-memory adapters back tests and headless embeddings.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod catalog;
pub mod content;
pub mod host;
pub mod settings;
pub mod time;

pub use catalog::{AppCatalog, MemoryAppCatalog};
pub use content::{ContentSource, ContentSourceFuture, MemoryContentSource, NoopContentSource};
pub use host::HostServices;
pub use settings::{
    load_setting_with, subscribe_theme_mode, theme_mode_with, MemorySettingsStore, SettingsStore,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
