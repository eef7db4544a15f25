//! Shell layout configuration loaded from TOML.

use serde::{Deserialize, Serialize};

use crate::{
    error::ShellError,
    model::{
        ViewportSize, WindowRect, CASCADE_OFFSET, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
        EDGE_MARGIN, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH, TASKBAR_HEIGHT,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Window sizing and placement rules.
pub struct WindowMetrics {
    pub min_width: i32,
    pub min_height: i32,
    pub default_width: i32,
    pub default_height: i32,
    pub cascade_offset: i32,
    pub edge_margin: i32,
}

impl Default for WindowMetrics {
    fn default() -> Self {
        Self {
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            default_width: DEFAULT_WINDOW_WIDTH,
            default_height: DEFAULT_WINDOW_HEIGHT,
            cascade_offset: CASCADE_OFFSET,
            edge_margin: EDGE_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Window chrome geometry used for hit testing.
pub struct ChromeMetrics {
    /// Title bar height measured from the window's top edge.
    pub header_height: i32,
    /// Width of each title bar control button.
    pub control_width: i32,
    /// Thickness of the edge resize band inside the window border.
    pub resize_handle: i32,
    /// Side length of the square corner resize handles.
    pub resize_corner: i32,
}

impl Default for ChromeMetrics {
    fn default() -> Self {
        Self {
            header_height: 32,
            control_width: 46,
            resize_handle: 6,
            resize_corner: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Desktop shell configuration.
///
/// Every field has a default, so an empty document is a valid configuration:
///
/// ```toml
/// taskbar_height = 48
///
/// [viewport]
/// width = 1440
/// height = 900
///
/// [window]
/// min_width = 320
/// min_height = 200
/// ```
pub struct ShellConfig {
    pub viewport: ViewportSize,
    pub taskbar_height: i32,
    pub window: WindowMetrics,
    pub chrome: ChromeMetrics,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportSize::default(),
            taskbar_height: TASKBAR_HEIGHT,
            window: WindowMetrics::default(),
            chrome: ChromeMetrics::default(),
        }
    }
}

impl ShellConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] when the text is not valid TOML for this shape or when a
    /// size is not positive.
    pub fn from_toml_str(raw: &str) -> Result<Self, ShellError> {
        let config: Self = toml::from_str(raw).map_err(|err| ShellError::Config {
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that sizes used as floors and divisors are positive.
    pub fn validate(&self) -> Result<(), ShellError> {
        let checks = [
            ("viewport.width", self.viewport.width),
            ("viewport.height", self.viewport.height),
            ("window.min_width", self.window.min_width),
            ("window.min_height", self.window.min_height),
            ("window.default_width", self.window.default_width),
            ("window.default_height", self.window.default_height),
        ];
        if let Some((field, _)) = checks.iter().find(|(_, value)| *value <= 0) {
            return Err(ShellError::Config {
                message: format!("`{field}` must be positive"),
            });
        }
        if self.taskbar_height < 0 {
            return Err(ShellError::Config {
                message: "`taskbar_height` must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Area a maximized window fills for the configured viewport.
    pub fn workspace(&self) -> WindowRect {
        self.viewport.workspace(self.taskbar_height)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ShellConfig::from_toml_str("").expect("config");
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.window.min_width, 320);
        assert_eq!(config.taskbar_height, 48);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = ShellConfig::from_toml_str(
            r#"
            taskbar_height = 40

            [viewport]
            width = 1440
            height = 900

            [chrome]
            header_height = 28
            "#,
        )
        .expect("config");

        assert_eq!(config.viewport, ViewportSize::new(1440, 900));
        assert_eq!(config.taskbar_height, 40);
        assert_eq!(config.chrome.header_height, 28);
        assert_eq!(config.chrome.control_width, 46);
        assert_eq!(config.window, WindowMetrics::default());
    }

    #[test]
    fn invalid_documents_are_config_errors() {
        assert!(matches!(
            ShellConfig::from_toml_str("taskbar_height = \"tall\""),
            Err(ShellError::Config { .. })
        ));
        assert!(matches!(
            ShellConfig::from_toml_str("[window]\nmin_width = 0"),
            Err(ShellError::Config { .. })
        ));
    }
}
