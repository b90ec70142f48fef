//! # Decoder Error Types
//!
//! Error taxonomy shared by the synchronous handle, the worker host and the
//! asynchronous proxy. Errors cross the worker boundary as an [`ErrorKind`]
//! tag plus a message and are rebuilt with [`DecoderError::from_wire`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while opening or decoding audio.
#[derive(Error, Debug)]
pub enum DecoderError {
    // ========================================================================
    // Open Errors
    // ========================================================================
    /// Container or codec is not recognised, or not compiled into this build.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Container was recognised but its headers are unreadable or truncated.
    #[error("Corrupt audio file: {0}")]
    CorruptFile(String),

    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// Range decoding failed (too many bad packets, or nothing decodable).
    #[error("Decoding error: {0}")]
    Decode(String),

    /// The decoder was disposed and cannot serve further requests.
    #[error("Decoder has been disposed")]
    Disposed,

    /// Request parameters are not usable (e.g. a NaN start time).
    #[error("Invalid decode request: {0}")]
    InvalidRequest(String),

    // ========================================================================
    // Worker Errors
    // ========================================================================
    /// Worker channel closed, or a reply did not match its request.
    #[error("Worker protocol error: {0}")]
    Protocol(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Configuration failed validation.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    /// Reading a path input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialisable tag identifying a [`DecoderError`] variant on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnsupportedFormat,
    CorruptFile,
    Decode,
    Disposed,
    InvalidRequest,
    Protocol,
    InvalidConfig,
    Io,
}

impl DecoderError {
    /// Wire tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecoderError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            DecoderError::CorruptFile(_) => ErrorKind::CorruptFile,
            DecoderError::Decode(_) => ErrorKind::Decode,
            DecoderError::Disposed => ErrorKind::Disposed,
            DecoderError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            DecoderError::Protocol(_) => ErrorKind::Protocol,
            DecoderError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            DecoderError::Io(_) => ErrorKind::Io,
        }
    }

    /// Message carried next to the kind on the wire.
    pub fn wire_message(&self) -> String {
        match self {
            DecoderError::UnsupportedFormat(msg)
            | DecoderError::CorruptFile(msg)
            | DecoderError::Decode(msg)
            | DecoderError::InvalidRequest(msg)
            | DecoderError::Protocol(msg)
            | DecoderError::InvalidConfig(msg) => msg.clone(),
            DecoderError::Disposed => String::new(),
            DecoderError::Io(err) => err.to_string(),
        }
    }

    /// Rebuild an error received from a worker.
    pub fn from_wire(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::UnsupportedFormat => DecoderError::UnsupportedFormat(message),
            ErrorKind::CorruptFile => DecoderError::CorruptFile(message),
            ErrorKind::Decode => DecoderError::Decode(message),
            ErrorKind::Disposed => DecoderError::Disposed,
            ErrorKind::InvalidRequest => DecoderError::InvalidRequest(message),
            ErrorKind::Protocol => DecoderError::Protocol(message),
            ErrorKind::InvalidConfig => DecoderError::InvalidConfig(message),
            ErrorKind::Io => DecoderError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                message,
            )),
        }
    }

    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecoderError::UnsupportedFormat(_) | DecoderError::CorruptFile(_)
        )
    }

    /// Returns `true` if the decoder stays usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecoderError::Decode(_) | DecoderError::InvalidRequest(_)
        )
    }
}

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, DecoderError>;
