//! Replwarden Error Types

use thiserror::Error;

/// Result type alias for replwarden operations
pub type Result<T> = std::result::Result<T, Error>;

/// Replwarden error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Polling errors
    #[error("Timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection failed to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Connection timeout to {0}")]
    ConnectionTimeout(String),

    // Control endpoint errors
    #[error("Command {command} rejected by control endpoint: {reason}")]
    Rejected { command: String, reason: String },

    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("Command serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Keyfile errors
    #[error("Key file destination {path} is not writable: {detail}")]
    KeyfileUnwritable { path: String, detail: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is a bounded-poll timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this error is a rejection from the control endpoint
    /// (the command was delivered and explicitly refused)
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected { .. })
    }
}
