//! Error types for realtime calls.

use thiserror::Error;

/// Result type for realtime operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Shown when microphone access is refused.
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Could not access the microphone. Please check permissions.";
/// Shown when no API key is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "API key is not set.";
/// Shown when a call could not be set up.
pub const START_FAILED_MESSAGE: &str = "Failed to start live conversation.";
/// Shown when an open call fails.
pub const CONNECTION_ERROR_MESSAGE: &str = "A connection error occurred.";

/// Errors that can occur during realtime operations.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Microphone (or other device) access was refused.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No credential available for the remote model.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// WebSocket connection error.
    #[error("WebSocket connection error: {0}")]
    ConnectionError(String),

    /// WebSocket message error.
    #[error("WebSocket message error: {0}")]
    MessageError(String),

    /// Audio device error.
    #[error("Audio device error: {0}")]
    DeviceError(String),

    /// Session not connected.
    #[error("Session not connected")]
    NotConnected,

    /// Session already closed.
    #[error("Session already closed")]
    SessionClosed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Audio format error.
    #[error("Audio format error: {0}")]
    AudioFormatError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RealtimeError {
    /// Create a new permission error.
    pub fn permission<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a new missing credential error.
    pub fn missing_credential<S: Into<String>>(msg: S) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a new protocol error.
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::MessageError(msg.into())
    }

    /// Create a new device error.
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Self::DeviceError(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new audio format error.
    pub fn audio<S: Into<String>>(msg: S) -> Self {
        Self::AudioFormatError(msg.into())
    }

    /// A single malformed server message. The connection itself is still usable.
    pub fn is_malformed_message(&self) -> bool {
        matches!(self, Self::MessageError(_) | Self::SerializationError(_))
    }

    /// Status line shown to the user when a call fails to start.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => PERMISSION_DENIED_MESSAGE,
            Self::MissingCredential(_) => MISSING_CREDENTIAL_MESSAGE,
            _ => START_FAILED_MESSAGE,
        }
    }
}
