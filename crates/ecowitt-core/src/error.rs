//! Error types for ecowitt-core.
//!
//! This module defines all error types that can occur when talking to an
//! Ecowitt gateway over its binary API.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::InvalidChecksum`] | Retry | Corrupted frame on the wire |
//! | [`Error::InvalidCommandCode`] | Retry | Stale or foreign reply |
//! | [`Error::ResponseTooShort`] | Retry | Connection closed mid-frame |
//! | [`Error::Timeout`] | Retry | Gateway busy or briefly offline |
//! | [`Error::Io`] | Retry, then rediscover | Address may have changed |
//! | [`Error::RetriesExhausted`] | Rediscover | Retry budget spent |
//! | [`Error::UnknownApiCommand`] | Do not retry | Programming error |
//! | [`Error::UnknownFieldCode`] | Do not retry | Firmware newer than the decode table |
//! | [`Error::Parse`] | Do not retry | Payload layout mismatch |
//! | [`Error::InvalidConfig`] | Do not retry | Fix configuration and restart |
//!
//! Decoded sensor values that carry a "no data" sentinel are never errors;
//! they surface as named absences in [`ecowitt_types::Observations`].

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when communicating with a gateway.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Response checksum did not match its contents.
    #[error("Invalid checksum: expected {expected:#04x}, got {actual:#04x}")]
    InvalidChecksum {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum byte carried by the response.
        actual: u8,
    },

    /// Response echoed a different command code than the one sent.
    #[error("Invalid command code in response: expected {expected:#04x}, got {actual:#04x}")]
    InvalidCommandCode {
        /// Code that was sent.
        expected: u8,
        /// Code found in the response.
        actual: u8,
    },

    /// Response is shorter than the minimum frame.
    #[error("Response too short: {length} bytes")]
    ResponseTooShort {
        /// Number of bytes received.
        length: usize,
    },

    /// Command code is not part of the API.
    #[error("Unknown API command code: {0:#04x}")]
    UnknownApiCommand(u8),

    /// Command name is not part of the API.
    #[error("Unknown API command: {0}")]
    UnknownCommandName(String),

    /// Live data contained a field tag with no decode table entry.
    #[error("Unknown field code {tag:#04x} at offset {offset}")]
    UnknownFieldCode {
        /// The unrecognised tag.
        tag: u8,
        /// Offset of the tag within the payload.
        offset: usize,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Every attempt at a command failed.
    #[error("Failed to obtain response to command '{command}' after {attempts} attempts")]
    RetriesExhausted {
        /// Symbolic name of the command.
        command: &'static str,
        /// Number of attempts made.
        attempts: u32,
        /// Cause of the final failure.
        #[source]
        source: Box<Error>,
    },

    /// Gateway rejected a write command.
    #[error("Gateway did not confirm write command '{command}'")]
    WriteFailed {
        /// Symbolic name of the command.
        command: &'static str,
    },

    /// Payload does not fit the frame's length field.
    #[error("Payload of {length} bytes exceeds the maximum of {max}")]
    PayloadTooLarge {
        /// Payload length.
        length: usize,
        /// Largest payload the length field can describe.
        max: usize,
    },

    /// Failed to parse a response payload.
    #[error("Parse error: {0}")]
    Parse(ecowitt_types::ParseError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Discovery found no gateway.
    #[error("No gateway found")]
    NoDeviceFound,
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the failure is transient and the command worth repeating.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // Frame validation failures
            Error::InvalidChecksum { .. } => true,
            Error::InvalidCommandCode { .. } => true,
            Error::ResponseTooShort { .. } => true,
            // Transport failures
            Error::Timeout { .. } => true,
            Error::Io(_) => true,
            Error::RetriesExhausted { .. } => false,
            Error::UnknownApiCommand(_) => false,
            Error::UnknownCommandName(_) => false,
            Error::UnknownFieldCode { .. } => false,
            Error::WriteFailed { .. } => false,
            Error::PayloadTooLarge { .. } => false,
            Error::Parse(_) => false,
            Error::InvalidConfig(_) => false,
            Error::NoDeviceFound => false,
        }
    }
}

impl From<ecowitt_types::ParseError> for Error {
    fn from(err: ecowitt_types::ParseError) -> Self {
        Error::Parse(err)
    }
}

/// Result type alias using ecowitt-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
