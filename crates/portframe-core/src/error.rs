use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Hex conversion errors
    #[error("Invalid hex digit pair '{pair}' at position {position}")]
    InvalidHexDigit { pair: String, position: usize },

    // Packet errors
    #[error("Valid-data window out of range: start {start}, length {length:?}, packet length {packet_len}")]
    WindowOutOfRange {
        start: usize,
        length: Option<usize>,
        packet_len: usize,
    },

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // Configuration errors
    #[error("Invalid event key window: start {start}, length {length}")]
    InvalidKeyWindow { start: i64, length: i64 },

    #[error("Duplicate event name: {0}")]
    DuplicateEventName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for errors caused by configuration rather than by
    /// the data on the wire.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyWindow { .. } | Self::DuplicateEventName(_) | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
