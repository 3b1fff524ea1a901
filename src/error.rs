//! Error types shared across the crate.

use thiserror::Error;

use crate::api::central_event::CentralState;
use crate::gatt::registry::KnownCharacteristic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Scanning or connecting needs a powered-on radio.
    #[error("radio unavailable: {0}")]
    RadioUnavailable(CentralState),

    /// The characteristic has not been discovered, or lacks the needed capability.
    #[error("{0} characteristic unavailable")]
    CharacteristicUnavailable(KnownCharacteristic),

    #[error("not connected")]
    NotConnected,

    /// A handle from an earlier connection was used.
    #[error("invalid handle")]
    InvalidHandle,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Failure reported by the radio stack.
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("timed out while {0}")]
    Timeout(TimeoutPhase),

    #[error("radio channel closed")]
    ChannelClosed,
}

impl Error {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Errors the client treats as "nothing to do yet" rather than failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::RadioUnavailable(_)
                | Error::CharacteristicUnavailable(_)
                | Error::NotConnected
                | Error::InvalidHandle
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Body sensor location read returned no bytes.
    #[error("empty payload")]
    Empty,

    #[error("malformed payload: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connecting,
    Discovering,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPhase::Connecting => f.write_str("connecting"),
            TimeoutPhase::Discovering => f.write_str("discovering"),
        }
    }
}
