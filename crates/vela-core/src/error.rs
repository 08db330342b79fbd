//! Error types for the Vela control core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Engine availability
    #[error("playback engine is not available")]
    EngineUnavailable,

    #[error("native playback library failure: {0}")]
    NativeLibrary(String),

    #[error("engine worker is gone")]
    EngineGone,

    // Advisory property traffic
    #[error("failed to read engine property: {name}")]
    PropertyRead { name: String },

    #[error("failed to write engine property: {name}")]
    PropertyWrite { name: String },

    #[error("engine command failed: {name}: {reason}")]
    CommandFailed { name: String, reason: String },

    // Subtitle handling
    #[error("failed to load subtitle: {url}")]
    SubtitleLoad { url: String },

    // Session lifecycle
    #[error("invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error must tear the session down.
    ///
    /// Everything else is advisory: callers substitute a placeholder value
    /// or log and carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NativeLibrary(_) | Error::EngineGone)
    }

    /// Stable code string surfaced through the host bridge
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EngineUnavailable => "ENGINE_UNAVAILABLE",
            Error::NativeLibrary(_) => "NATIVE_LIBRARY",
            Error::EngineGone => "ENGINE_GONE",
            Error::PropertyRead { .. } => "PROPERTY_READ",
            Error::PropertyWrite { .. } => "PROPERTY_WRITE",
            Error::CommandFailed { .. } => "COMMAND_FAILED",
            Error::SubtitleLoad { .. } => "SUBTITLE_LOAD",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
