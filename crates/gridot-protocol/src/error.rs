//! Protocol error types

use thiserror::Error;

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Message too large: {size} > {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid MessagePack: {0}")]
    InvalidMsgpack(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Core error: {0}")]
    Core(#[from] gridot_core::Error),
}

impl ProtocolError {
    /// Short machine-readable code sent back to peers in error messages
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidMessage(_) => "INVALID_MSG",
            ProtocolError::MessageTooLarge { .. } => "TOO_LARGE",
            ProtocolError::InvalidJson(_) | ProtocolError::InvalidMsgpack(_) => "PARSE",
            ProtocolError::UnknownFormat(_) => "FORMAT",
            ProtocolError::Core(gridot_core::Error::Apply { .. }) => "DOES_NOT_APPLY",
            ProtocolError::Core(gridot_core::Error::UnknownOperation(_)) => "UNKNOWN_OP",
            ProtocolError::Core(gridot_core::Error::InvalidSide(_)) => "INVALID_SIDE",
            ProtocolError::Core(gridot_core::Error::Serialization(_)) => "SERIALIZATION",
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
