//! Error types for data parsing in ecowitt-types.

use thiserror::Error;

/// Errors that can occur when parsing gateway response payloads.
///
/// This error type is transport-agnostic and does not include socket or
/// framing errors (those belong in ecowitt-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Generic invalid data error.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Payload is shorter than its fixed layout requires.
    #[error("Insufficient bytes: requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Number of bytes the layout requires.
        expected: usize,
        /// Number of bytes actually present.
        actual: usize,
    },

    /// A field held a value outside its documented range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl ParseError {
    /// Create an insufficient bytes error.
    pub fn insufficient(expected: usize, actual: usize) -> Self {
        Self::InsufficientBytes { expected, actual }
    }
}

/// Result type alias using ecowitt-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
