//! Error types for ssh-key-setup

use thiserror::Error;

/// Main error type for ssh-key-setup
#[derive(Debug, Error)]
pub enum KeySetupError {
    /// SSH connection failed
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Authentication failed (password or key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Channel could not be opened or a command could not be started
    #[error("SSH channel error: {0}")]
    Channel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH key parsing error
    #[error("SSH key error: {0}")]
    SshKey(String),
}

/// Result type alias using KeySetupError
pub type Result<T> = std::result::Result<T, KeySetupError>;

/// Coarse classification of a failed run, used for user-facing hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationFailed,
    ConnectionFailed,
    Unknown,
}

impl ErrorKind {
    /// Advisory hint printed next to a failure of this kind
    pub fn hint(self) -> Option<&'static str> {
        match self {
            ErrorKind::AuthenticationFailed => Some("Please check your username and password."),
            ErrorKind::ConnectionFailed => Some("Please check the host and port configuration."),
            ErrorKind::Unknown => None,
        }
    }
}

impl KeySetupError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        KeySetupError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        KeySetupError::Authentication(msg.into())
    }

    /// Create a channel error from a string
    pub fn channel(msg: impl Into<String>) -> Self {
        KeySetupError::Channel(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        KeySetupError::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KeySetupError::Authentication(_) => ErrorKind::AuthenticationFailed,
            KeySetupError::Connection(_) => ErrorKind::ConnectionFailed,
            _ => ErrorKind::Unknown,
        }
    }
}
