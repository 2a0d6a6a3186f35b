//! Error handling module for audio-setup
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Only fatal conditions travel as `SetupError`; degraded steps are recorded
//! as `StepIssue`s in the run context and never abort the provisioner.

use crate::provision::stage::StageTransitionError;
use thiserror::Error;

/// Main error type for audio-setup
#[derive(Error, Debug)]
pub enum SetupError {
    /// IO errors (log file, config file, artifact copy)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Not running with superuser privileges
    #[error("Permission error: {0}")]
    Permission(String),

    /// Artifact download failed
    #[error("Download failed: {0}")]
    Download(String),

    /// External command could not be spawned or waited on
    #[error("Command failed: {0}")]
    Command(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provision stage machine misuse
    #[error("Stage transition error: {0}")]
    StageTransition(#[from] StageTransitionError),
}

/// Result type alias for audio-setup operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Returns true for errors raised before any system state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Permission(_) | Self::Config(_))
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
