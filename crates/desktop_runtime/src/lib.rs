//! Desktop shell core: window lifecycle, stacking and focus, pointer gestures, taskbar grouping,
//! and asynchronous window content, driven through one explicit [`DesktopSession`].

pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod icons;
pub mod model;
pub mod reducer;
pub mod runtime_context;
pub mod taskbar;
pub mod window;
pub mod window_manager;

pub use config::{ChromeMetrics, ShellConfig, WindowMetrics};
pub use content::{
    settle_content, BehaviorFailure, BehaviorRegistry, ContentInbox, ContentLoadFailure,
    ContentOutcome, PendingContentLoad, SettledLoad,
};
pub use error::ShellError;
pub use events::EventBus;
pub use icons::{app_icon_ref, control_glyph, descriptor_icon_ref, IconName, LiveTheme};
pub use model::*;
pub use reducer::{DesktopAction, ESCAPE_KEY};
pub use runtime_context::DesktopSession;
pub use taskbar::{PreviewEntry, PreviewPanel, TaskbarActivation, TaskbarGroup, TaskbarProjector};
pub use window::{GestureError, Window, WindowContent, LOADING_MARKUP, LOAD_FAILED_MARKUP};
pub use window_manager::WindowManager;
