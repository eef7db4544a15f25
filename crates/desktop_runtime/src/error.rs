//! Shell-level error type shared by configuration, the window manager, and the session.

use desktop_app_contract::ApplicationId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Shell-level failures reported to the caller.
pub enum ShellError {
    /// The application id does not resolve in the catalog.
    #[error("application `{app_id}` not found")]
    NotFound { app_id: ApplicationId },
    /// Shell configuration text could not be parsed or is out of range.
    #[error("invalid shell configuration: {message}")]
    Config { message: String },
    /// The session was shut down and has not been rebooted.
    #[error("desktop session has ended")]
    SessionEnded,
}
