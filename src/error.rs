//! Error types for the server monitor

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for server monitor operations
pub type Result<T> = std::result::Result<T, ServermonError>;

/// Errors surfaced to callers of the monitor and trigger manager.
///
/// Nothing on the line-processing path returns these: unrecognized lines and
/// invalid registry mutations degrade to no-ops instead.
#[derive(Debug, Error)]
pub enum ServermonError {
    /// A trigger rejected the proposed parameter string
    #[error("invalid parameters for trigger '{trigger}': {parameters:?}")]
    InvalidParameters { trigger: String, parameters: String },

    /// No trigger registered under this name
    #[error("unknown trigger: {0}")]
    UnknownTrigger(String),

    /// A trigger with this name is already registered
    #[error("trigger already registered: {0}")]
    DuplicateTrigger(String),

    /// The monitor read loop is already running
    #[error("server monitor already running")]
    AlreadyRunning,

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
