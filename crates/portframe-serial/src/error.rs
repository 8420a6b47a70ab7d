//! Error types for transport operations.
//!
//! This module defines errors raised while opening, reading and writing a
//! transport. Per-packet conditions never show up here; they are handled
//! inside the dispatcher.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, SerialError>;

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The port could not be opened.
    #[error("Failed to open {port}: {message}")]
    Open { port: String, message: String },

    /// The port or its background reader has gone away.
    #[error("Port disconnected: {port}")]
    Disconnected { port: String },

    /// Error reported by the serial port driver.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Invalid configuration or payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] portframe_core::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Create a new open error.
    pub fn open(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(port: impl Into<String>) -> Self {
        Self::Disconnected { port: port.into() }
    }

    /// Whether the transport can no longer be used.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}
